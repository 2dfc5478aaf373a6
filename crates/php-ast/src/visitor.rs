use crate::ast::*;

/// Read-only traversal over the tree. Every method defaults to the matching
/// `walk_*` function, so an implementor overrides only the nodes it cares
/// about and calls `walk_*` itself to keep descending.
pub trait Visitor {
    fn visit_program(&mut self, program: &Program) {
        walk_program(self, program);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }

    fn visit_param(&mut self, param: &Param) {
        walk_param(self, param);
    }

    fn visit_arg(&mut self, arg: &Arg) {
        walk_arg(self, arg);
    }

    fn visit_attribute(&mut self, attribute: &Attribute) {
        walk_attribute(self, attribute);
    }

    fn visit_class_member(&mut self, member: &ClassMember) {
        walk_class_member(self, member);
    }

    fn visit_property_hook(&mut self, hook: &PropertyHook) {
        walk_property_hook(self, hook);
    }

    fn visit_catch(&mut self, catch: &CatchClause) {
        walk_catch(self, catch);
    }
}

pub fn walk_program<V: Visitor + ?Sized>(visitor: &mut V, program: &Program) {
    walk_stmts(visitor, &program.stmts);
}

pub fn walk_stmts<V: Visitor + ?Sized>(visitor: &mut V, stmts: &[Stmt]) {
    for stmt in stmts {
        visitor.visit_stmt(stmt);
    }
}

fn walk_exprs<V: Visitor + ?Sized>(visitor: &mut V, exprs: &[Expr]) {
    for expr in exprs {
        visitor.visit_expr(expr);
    }
}

fn walk_attributes<V: Visitor + ?Sized>(visitor: &mut V, attributes: &[Attribute]) {
    for attribute in attributes {
        visitor.visit_attribute(attribute);
    }
}

fn walk_params<V: Visitor + ?Sized>(visitor: &mut V, params: &[Param]) {
    for param in params {
        visitor.visit_param(param);
    }
}

fn walk_args<V: Visitor + ?Sized>(visitor: &mut V, args: &[Arg]) {
    for arg in args {
        visitor.visit_arg(arg);
    }
}

/// Attributes, parents and members of a class-like. Names are not visited;
/// they are not expressions.
pub fn walk_class<V: Visitor + ?Sized>(visitor: &mut V, class: &ClassDecl) {
    walk_attributes(visitor, &class.attributes);
    walk_members(visitor, &class.members);
}

fn walk_members<V: Visitor + ?Sized>(visitor: &mut V, members: &[ClassMember]) {
    for member in members {
        visitor.visit_class_member(member);
    }
}

pub fn walk_stmt<V: Visitor + ?Sized>(visitor: &mut V, stmt: &Stmt) {
    match &stmt.kind {
        StmtKind::Expression(expr) | StmtKind::Throw(expr) => visitor.visit_expr(expr),
        StmtKind::Echo(exprs) | StmtKind::Unset(exprs) | StmtKind::Global(exprs) => walk_exprs(visitor, exprs),
        StmtKind::Return(expr) | StmtKind::Break(expr) | StmtKind::Continue(expr) => {
            if let Some(expr) = expr {
                visitor.visit_expr(expr);
            }
        }
        StmtKind::Block(stmts) => walk_stmts(visitor, stmts),
        StmtKind::If(if_stmt) => {
            visitor.visit_expr(&if_stmt.condition);
            visitor.visit_stmt(&if_stmt.then_branch);
            for elseif in &if_stmt.elseifs {
                visitor.visit_expr(&elseif.condition);
                visitor.visit_stmt(&elseif.body);
            }
            if let Some(else_branch) = &if_stmt.else_branch {
                visitor.visit_stmt(else_branch);
            }
        }
        StmtKind::While(while_stmt) => {
            visitor.visit_expr(&while_stmt.condition);
            visitor.visit_stmt(&while_stmt.body);
        }
        StmtKind::DoWhile(do_while) => {
            visitor.visit_stmt(&do_while.body);
            visitor.visit_expr(&do_while.condition);
        }
        StmtKind::For(for_stmt) => {
            walk_exprs(visitor, &for_stmt.init);
            walk_exprs(visitor, &for_stmt.condition);
            walk_exprs(visitor, &for_stmt.update);
            visitor.visit_stmt(&for_stmt.body);
        }
        StmtKind::Foreach(foreach) => {
            visitor.visit_expr(&foreach.expr);
            if let Some(key) = &foreach.key {
                visitor.visit_expr(key);
            }
            visitor.visit_expr(&foreach.value);
            visitor.visit_stmt(&foreach.body);
        }
        StmtKind::Switch(switch) => {
            visitor.visit_expr(&switch.subject);
            for case in &switch.cases {
                if let Some(value) = &case.value {
                    visitor.visit_expr(value);
                }
                walk_stmts(visitor, &case.body);
            }
        }
        StmtKind::Declare(declare) => {
            for directive in &declare.directives {
                visitor.visit_expr(&directive.value);
            }
            if let Some(body) = &declare.body {
                visitor.visit_stmt(body);
            }
        }
        StmtKind::Try(try_stmt) => {
            walk_stmts(visitor, &try_stmt.body);
            for catch in &try_stmt.catches {
                visitor.visit_catch(catch);
            }
            if let Some(finally) = &try_stmt.finally {
                walk_stmts(visitor, finally);
            }
        }
        StmtKind::StaticVar(vars) => {
            for var in vars {
                if let Some(default) = &var.default {
                    visitor.visit_expr(default);
                }
            }
        }
        StmtKind::Function(func) => {
            walk_attributes(visitor, &func.attributes);
            walk_params(visitor, &func.params);
            walk_stmts(visitor, &func.body);
        }
        StmtKind::Class(class) => walk_class(visitor, class),
        StmtKind::Interface(iface) => {
            walk_attributes(visitor, &iface.attributes);
            walk_members(visitor, &iface.members);
        }
        StmtKind::Trait(trait_decl) => {
            walk_attributes(visitor, &trait_decl.attributes);
            walk_members(visitor, &trait_decl.members);
        }
        StmtKind::Enum(enum_decl) => {
            walk_attributes(visitor, &enum_decl.attributes);
            walk_members(visitor, &enum_decl.members);
        }
        StmtKind::Namespace(ns) => {
            if let NamespaceBody::Braced(stmts) = &ns.body {
                walk_stmts(visitor, stmts);
            }
        }
        StmtKind::Const(items) => {
            for item in items {
                visitor.visit_expr(&item.value);
            }
        }
        StmtKind::Use(_)
        | StmtKind::Goto(_)
        | StmtKind::Label(_)
        | StmtKind::HaltCompiler(_)
        | StmtKind::Nop
        | StmtKind::InlineHtml(_)
        | StmtKind::Error => {}
    }
}

fn walk_parts<V: Visitor + ?Sized>(visitor: &mut V, parts: &[StringPart]) {
    for part in parts {
        if let StringPart::Expr(expr) = part {
            visitor.visit_expr(expr);
        }
    }
}

pub fn walk_expr<V: Visitor + ?Sized>(visitor: &mut V, expr: &Expr) {
    match &expr.kind {
        ExprKind::InterpolatedString(parts) | ExprKind::ShellExec(parts) | ExprKind::Heredoc { parts, .. } => {
            walk_parts(visitor, parts)
        }
        ExprKind::Array(elements) => {
            for element in elements {
                if let Some(key) = &element.key {
                    visitor.visit_expr(key);
                }
                visitor.visit_expr(&element.value);
            }
        }
        ExprKind::Assign(assign) => {
            visitor.visit_expr(&assign.target);
            visitor.visit_expr(&assign.value);
        }
        ExprKind::Binary(binary) => {
            visitor.visit_expr(&binary.left);
            visitor.visit_expr(&binary.right);
        }
        ExprKind::Unary(unary) => visitor.visit_expr(&unary.operand),
        ExprKind::Ternary(ternary) => {
            visitor.visit_expr(&ternary.condition);
            if let Some(then_expr) = &ternary.then_expr {
                visitor.visit_expr(then_expr);
            }
            visitor.visit_expr(&ternary.else_expr);
        }
        ExprKind::NullCoalesce(coalesce) => {
            visitor.visit_expr(&coalesce.left);
            visitor.visit_expr(&coalesce.right);
        }
        ExprKind::VariableVariable(inner)
        | ExprKind::Cast(_, inner)
        | ExprKind::ErrorSuppress(inner)
        | ExprKind::Parenthesized(inner)
        | ExprKind::Clone(inner)
        | ExprKind::Print(inner)
        | ExprKind::Empty(inner)
        | ExprKind::Include(_, inner)
        | ExprKind::Eval(inner)
        | ExprKind::ThrowExpr(inner)
        | ExprKind::YieldFrom(inner) => visitor.visit_expr(inner),
        ExprKind::Exit(code) => {
            if let Some(code) = code {
                visitor.visit_expr(code);
            }
        }
        ExprKind::Isset(exprs) => walk_exprs(visitor, exprs),
        ExprKind::FunctionCall(call) => {
            visitor.visit_expr(&call.name);
            walk_args(visitor, &call.args);
        }
        ExprKind::ArrayAccess(access) => {
            visitor.visit_expr(&access.array);
            if let Some(index) = &access.index {
                visitor.visit_expr(index);
            }
        }
        ExprKind::PropertyAccess(access) => {
            visitor.visit_expr(&access.object);
            visitor.visit_expr(&access.property);
        }
        ExprKind::MethodCall(call) => {
            visitor.visit_expr(&call.object);
            visitor.visit_expr(&call.method);
            walk_args(visitor, &call.args);
        }
        ExprKind::StaticPropertyAccess(access) | ExprKind::ClassConstAccess(access) => {
            visitor.visit_expr(&access.class);
        }
        ExprKind::StaticPropertyAccessDynamic { class, member }
        | ExprKind::ClassConstAccessDynamic { class, member } => {
            visitor.visit_expr(class);
            visitor.visit_expr(member);
        }
        ExprKind::StaticMethodCall(call) => {
            visitor.visit_expr(&call.class);
            walk_args(visitor, &call.args);
        }
        ExprKind::CallableCreate(callable) => match &callable.kind {
            CallableCreateKind::Function(name) => visitor.visit_expr(name),
            CallableCreateKind::Method { object, method, .. } => {
                visitor.visit_expr(object);
                visitor.visit_expr(method);
            }
            CallableCreateKind::StaticMethod { class, .. } => visitor.visit_expr(class),
        },
        ExprKind::New(new) => {
            visitor.visit_expr(&new.class);
            walk_args(visitor, &new.args);
        }
        ExprKind::AnonymousClass(class) => walk_class(visitor, class),
        ExprKind::Yield(yield_expr) => {
            if let Some(key) = &yield_expr.key {
                visitor.visit_expr(key);
            }
            if let Some(value) = &yield_expr.value {
                visitor.visit_expr(value);
            }
        }
        ExprKind::Closure(closure) => {
            walk_attributes(visitor, &closure.attributes);
            walk_params(visitor, &closure.params);
            walk_stmts(visitor, &closure.body);
        }
        ExprKind::ArrowFunction(arrow) => {
            walk_attributes(visitor, &arrow.attributes);
            walk_params(visitor, &arrow.params);
            visitor.visit_expr(&arrow.body);
        }
        ExprKind::Match(match_expr) => {
            visitor.visit_expr(&match_expr.subject);
            for arm in &match_expr.arms {
                if let Some(conditions) = &arm.conditions {
                    walk_exprs(visitor, conditions);
                }
                visitor.visit_expr(&arm.body);
            }
        }
        ExprKind::Int(_)
        | ExprKind::Float(_)
        | ExprKind::Bool(_)
        | ExprKind::Null
        | ExprKind::String(_)
        | ExprKind::Nowdoc { .. }
        | ExprKind::MagicConst(_)
        | ExprKind::Variable(_)
        | ExprKind::Identifier(_)
        | ExprKind::Error => {}
    }
}

pub fn walk_param<V: Visitor + ?Sized>(visitor: &mut V, param: &Param) {
    walk_attributes(visitor, &param.attributes);
    if let Some(default) = &param.default {
        visitor.visit_expr(default);
    }
    for hook in &param.hooks {
        visitor.visit_property_hook(hook);
    }
}

pub fn walk_arg<V: Visitor + ?Sized>(visitor: &mut V, arg: &Arg) {
    visitor.visit_expr(&arg.value);
}

pub fn walk_attribute<V: Visitor + ?Sized>(visitor: &mut V, attribute: &Attribute) {
    walk_args(visitor, &attribute.args);
}

pub fn walk_class_member<V: Visitor + ?Sized>(visitor: &mut V, member: &ClassMember) {
    match &member.kind {
        ClassMemberKind::Property(prop) => {
            walk_attributes(visitor, &prop.attributes);
            if let Some(default) = &prop.default {
                visitor.visit_expr(default);
            }
            for hook in &prop.hooks {
                visitor.visit_property_hook(hook);
            }
        }
        ClassMemberKind::Method(method) => {
            walk_attributes(visitor, &method.attributes);
            walk_params(visitor, &method.params);
            if let Some(body) = &method.body {
                walk_stmts(visitor, body);
            }
        }
        ClassMemberKind::ClassConst(constant) => {
            walk_attributes(visitor, &constant.attributes);
            visitor.visit_expr(&constant.value);
        }
        ClassMemberKind::EnumCase(case) => {
            walk_attributes(visitor, &case.attributes);
            if let Some(value) = &case.value {
                visitor.visit_expr(value);
            }
        }
        ClassMemberKind::TraitUse(_) => {}
    }
}

pub fn walk_property_hook<V: Visitor + ?Sized>(visitor: &mut V, hook: &PropertyHook) {
    walk_attributes(visitor, &hook.attributes);
    walk_params(visitor, &hook.params);
    match &hook.body {
        PropertyHookBody::Block(stmts) => walk_stmts(visitor, stmts),
        PropertyHookBody::Expression(expr) => visitor.visit_expr(expr),
        PropertyHookBody::Abstract => {}
    }
}

pub fn walk_catch<V: Visitor + ?Sized>(visitor: &mut V, catch: &CatchClause) {
    walk_stmts(visitor, &catch.body);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Span;

    fn expr(kind: ExprKind) -> Expr {
        Expr::new(kind, Span::new(0, 0))
    }

    fn var(name: &str) -> Expr {
        expr(ExprKind::Variable(name.to_string()))
    }

    #[derive(Default)]
    struct Variables(Vec<String>);

    impl Visitor for Variables {
        fn visit_expr(&mut self, expr: &Expr) {
            if let ExprKind::Variable(name) = &expr.kind {
                self.0.push(name.clone());
            }
            walk_expr(self, expr);
        }
    }

    #[test]
    fn walks_nested_statements_in_source_order() {
        let assign = expr(ExprKind::Assign(AssignExpr {
            target: Box::new(var("a")),
            op: AssignOp::Assign,
            value: Box::new(var("b")),
            by_ref: false,
        }));
        let body = Stmt::new(StmtKind::Expression(assign), Span::new(0, 0));
        let stmt = Stmt::new(
            StmtKind::While(WhileStmt {
                condition: var("cond"),
                body: Box::new(Stmt::new(StmtKind::Block(vec![body]), Span::new(0, 0))),
            }),
            Span::new(0, 0),
        );
        let program = Program {
            stmts: vec![stmt],
            span: Span::new(0, 0),
        };

        let mut collector = Variables::default();
        collector.visit_program(&program);
        assert_eq!(collector.0, ["cond", "a", "b"]);
    }

    #[test]
    fn walks_interpolated_parts_and_closure_bodies() {
        let closure = expr(ExprKind::Closure(ClosureExpr {
            is_static: false,
            by_ref: false,
            params: Vec::new(),
            use_vars: Vec::new(),
            return_type: None,
            body: vec![Stmt::new(StmtKind::Echo(vec![var("inner")]), Span::new(0, 0))],
            attributes: Vec::new(),
        }));
        let string = expr(ExprKind::InterpolatedString(vec![
            StringPart::Literal("x".to_string()),
            StringPart::Expr(var("part")),
        ]));

        let mut collector = Variables::default();
        collector.visit_expr(&string);
        collector.visit_expr(&closure);
        assert_eq!(collector.0, ["part", "inner"]);
    }
}
