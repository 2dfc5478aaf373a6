use std::collections::HashMap;

use php_ast::visitor::{self, Visitor};
use php_ast::*;
use serde::Serialize;

use super::{BasicBlock, BlockId, BlockKind, ControlFlowGraph, Edge, EdgeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FunctionKind {
    /// Top-level code of the file.
    Script,
    Function,
    Method,
    Closure,
    ArrowFunction,
}

#[derive(Debug, Clone)]
pub struct FunctionCfg {
    pub kind: FunctionKind,
    pub name: Option<String>,
    /// Span of the declaring node, or of the whole program for the script.
    pub span: Span,
    pub cfg: ControlFlowGraph,
}

/// Build the graph of one function-like body.
pub fn build_cfg(body: &[Stmt]) -> ControlFlowGraph {
    let mut builder = Builder::new();
    for stmt in body {
        builder.build_stmt(stmt);
    }
    builder.finish()
}

/// Graph of an arrow function: the body expression is the return value.
fn build_expr_cfg(body: &Expr) -> ControlFlowGraph {
    let mut builder = Builder::new();
    let block = builder.append(body.span);
    builder.add_edge(block, builder.exit, EdgeKind::Return);
    builder.current = None;
    builder.finish()
}

/// One graph for the top-level script plus one per function, method,
/// property hook, closure and arrow function in the program.
pub fn build_all(program: &Program) -> Vec<FunctionCfg> {
    let mut collector = FunctionCollector {
        functions: vec![FunctionCfg {
            kind: FunctionKind::Script,
            name: None,
            span: program.span,
            cfg: build_cfg(&program.stmts),
        }],
    };
    collector.visit_program(program);

    tracing::trace!(
        functions = collector.functions.len(),
        blocks = collector.functions.iter().map(|f| f.cfg.blocks().len()).sum::<usize>(),
        "built control-flow graphs"
    );
    collector.functions
}

struct FunctionCollector {
    functions: Vec<FunctionCfg>,
}

impl FunctionCollector {
    fn push(&mut self, kind: FunctionKind, name: Option<String>, span: Span, cfg: ControlFlowGraph) {
        self.functions.push(FunctionCfg { kind, name, span, cfg });
    }

    fn push_method(&mut self, method: &MethodDecl, span: Span) {
        if let Some(body) = &method.body {
            self.push(FunctionKind::Method, Some(method.name.clone()), span, build_cfg(body));
        }
    }

    fn push_hooks(&mut self, property: &str, hooks: &[PropertyHook]) {
        for hook in hooks {
            let name = match hook.kind {
                PropertyHookKind::Get => format!("{property}::get"),
                PropertyHookKind::Set => format!("{property}::set"),
            };
            let cfg = match &hook.body {
                PropertyHookBody::Block(stmts) => build_cfg(stmts),
                PropertyHookBody::Expression(expr) => build_expr_cfg(expr),
                PropertyHookBody::Abstract => continue,
            };
            self.push(FunctionKind::Method, Some(name), hook.span, cfg);
        }
    }
}

impl Visitor for FunctionCollector {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        if let StmtKind::Function(func) = &stmt.kind {
            self.push(FunctionKind::Function, Some(func.name.clone()), stmt.span, build_cfg(&func.body));
        }
        visitor::walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Closure(closure) => {
                self.push(FunctionKind::Closure, None, expr.span, build_cfg(&closure.body));
            }
            ExprKind::ArrowFunction(arrow) => {
                self.push(FunctionKind::ArrowFunction, None, expr.span, build_expr_cfg(&arrow.body));
            }
            _ => {}
        }
        visitor::walk_expr(self, expr);
    }

    fn visit_class_member(&mut self, member: &ClassMember) {
        match &member.kind {
            ClassMemberKind::Method(method) => {
                self.push_method(method, member.span);
                for param in &method.params {
                    self.push_hooks(&param.name, &param.hooks);
                }
            }
            ClassMemberKind::Property(prop) => self.push_hooks(&prop.name, &prop.hooks),
            _ => {}
        }
        visitor::walk_class_member(self, member);
    }
}

// =============================================================================
// Builder
// =============================================================================

struct LoopFrame {
    break_target: BlockId,
    continue_target: BlockId,
    /// Number of enclosing `try` statements when the loop started. Jumps out
    /// of the loop cross every `finally` above this depth.
    try_depth: usize,
}

/// A jump parked on a `finally` block, resumed from its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingJump {
    Return,
    Break(usize),
    Continue(usize),
}

struct TryFrame {
    catches: Vec<BlockId>,
    finally: Option<BlockId>,
    in_catch: bool,
    pending: Vec<PendingJump>,
}

struct Builder {
    blocks: Vec<BasicBlock>,
    /// Block receiving the next statement. `None` right after a jump.
    current: Option<BlockId>,
    exit: BlockId,
    unknown_exit: BlockId,
    loops: Vec<LoopFrame>,
    tries: Vec<TryFrame>,
    labels: HashMap<String, BlockId>,
    gotos: Vec<(BlockId, String)>,
    stmt_blocks: HashMap<Span, BlockId>,
}

impl Builder {
    fn new() -> Self {
        let mut builder = Builder {
            blocks: Vec::new(),
            current: None,
            exit: BlockId(1),
            unknown_exit: BlockId(2),
            loops: Vec::new(),
            tries: Vec::new(),
            labels: HashMap::new(),
            gotos: Vec::new(),
            stmt_blocks: HashMap::new(),
        };
        let entry = builder.new_block(BlockKind::Entry);
        builder.exit = builder.new_block(BlockKind::Exit);
        builder.unknown_exit = builder.new_block(BlockKind::Unknown);
        let first = builder.new_block(BlockKind::Normal);
        builder.add_edge(entry, first, EdgeKind::Unconditional);
        builder.current = Some(first);
        builder
    }

    /// Allocate a block. Blocks created inside a `try` get exception edges
    /// to the handlers protecting them.
    fn new_block(&mut self, kind: BlockKind) -> BlockId {
        let id = BlockId(self.blocks.len());
        self.blocks.push(BasicBlock::new(id, kind));
        let (handlers, _) = self.handlers();
        for handler in handlers {
            self.add_edge(id, handler, EdgeKind::Exception);
        }
        id
    }

    /// Handlers an exception raised here can reach, innermost first. The flag
    /// is true when a `finally` intercepts it before it leaves the function.
    fn handlers(&self) -> (Vec<BlockId>, bool) {
        let mut targets = Vec::new();
        for frame in self.tries.iter().rev() {
            if !frame.in_catch {
                targets.extend(&frame.catches);
            }
            if let Some(finally) = frame.finally {
                targets.push(finally);
                return (targets, true);
            }
        }
        (targets, false)
    }

    fn add_edge(&mut self, from: BlockId, to: BlockId, kind: EdgeKind) {
        let edge = Edge { target: to, kind };
        if self.blocks[from.0].successors.contains(&edge) {
            return;
        }
        self.blocks[from.0].successors.push(edge);
        if !self.blocks[to.0].predecessors.contains(&from) {
            self.blocks[to.0].predecessors.push(from);
        }
    }

    fn current_or_new(&mut self) -> BlockId {
        match self.current {
            Some(block) => block,
            None => {
                let block = self.new_block(BlockKind::Normal);
                self.current = Some(block);
                block
            }
        }
    }

    /// Add a statement to the current block, opening an unreachable block
    /// after a jump.
    fn append(&mut self, span: Span) -> BlockId {
        let block = self.current_or_new();
        self.blocks[block.0].statements.push(span);
        self.stmt_blocks.entry(span).or_insert(block);
        block
    }

    /// Open a new block that the current one flows into.
    fn start_block(&mut self, kind: BlockKind) -> BlockId {
        let block = self.new_block(kind);
        if let Some(current) = self.current {
            self.add_edge(current, block, EdgeKind::Unconditional);
        }
        self.current = Some(block);
        block
    }

    /// Merge the given branch ends into a join block.
    fn join(&mut self, ends: Vec<(BlockId, EdgeKind)>) {
        if ends.is_empty() {
            self.current = None;
            return;
        }
        let join = self.new_block(BlockKind::Join);
        for (end, kind) in ends {
            self.add_edge(end, join, kind);
        }
        self.current = Some(join);
    }

    fn finish(mut self) -> ControlFlowGraph {
        if let Some(end) = self.current {
            self.add_edge(end, self.exit, EdgeKind::Unconditional);
        }
        for (from, label) in std::mem::take(&mut self.gotos) {
            let target = self.labels.get(&label).copied().unwrap_or(self.unknown_exit);
            self.add_edge(from, target, EdgeKind::Jump);
        }
        let mut cfg = ControlFlowGraph {
            blocks: self.blocks,
            entry: BlockId(0),
            exit: self.exit,
            unknown_exit: self.unknown_exit,
            stmt_blocks: self.stmt_blocks,
        };
        cfg.mark_dead();
        cfg
    }

    // -- jumps ------------------------------------------------------------------

    fn jump_return(&mut self, from: BlockId) {
        let finally = self
            .tries
            .iter()
            .enumerate()
            .rev()
            .find_map(|(i, frame)| frame.finally.map(|f| (i, f)));
        match finally {
            Some((index, finally)) => {
                self.add_edge(from, finally, EdgeKind::Return);
                self.park(index, PendingJump::Return);
            }
            None => self.add_edge(from, self.exit, EdgeKind::Return),
        }
    }

    fn jump_loop(&mut self, from: BlockId, index: usize, is_break: bool) {
        let frame = &self.loops[index];
        let (target, depth) = if is_break {
            (frame.break_target, frame.try_depth)
        } else {
            (frame.continue_target, frame.try_depth)
        };
        let kind = if is_break { EdgeKind::Break } else { EdgeKind::Continue };
        let finally = self
            .tries
            .iter()
            .enumerate()
            .skip(depth)
            .rev()
            .find_map(|(i, frame)| frame.finally.map(|f| (i, f)));
        match finally {
            Some((try_index, finally)) => {
                self.add_edge(from, finally, kind);
                let pending = if is_break {
                    PendingJump::Break(index)
                } else {
                    PendingJump::Continue(index)
                };
                self.park(try_index, pending);
            }
            None => self.add_edge(from, target, kind),
        }
    }

    fn park(&mut self, try_index: usize, jump: PendingJump) {
        let pending = &mut self.tries[try_index].pending;
        if !pending.contains(&jump) {
            pending.push(jump);
        }
    }

    fn resume(&mut self, from: BlockId, jump: PendingJump) {
        match jump {
            PendingJump::Return => self.jump_return(from),
            PendingJump::Break(index) => self.jump_loop(from, index, true),
            PendingJump::Continue(index) => self.jump_loop(from, index, false),
        }
    }

    fn jump_throw(&mut self, from: BlockId) {
        let (handlers, contained) = self.handlers();
        for handler in handlers {
            self.add_edge(from, handler, EdgeKind::Exception);
        }
        if !contained {
            self.add_edge(from, self.exit, EdgeKind::Exception);
        }
    }

    /// `break N` / `continue N`. Levels beyond the loop depth or computed at
    /// runtime go to the unknown exit.
    fn build_loop_jump(&mut self, span: Span, level: Option<&Expr>, is_break: bool) {
        let block = self.append(span);
        let level = match level.map(|e| &e.kind) {
            None => Some(1),
            Some(ExprKind::Int(n)) if *n >= 1 => Some(*n as usize),
            Some(_) => None,
        };
        match level.and_then(|n| self.loops.len().checked_sub(n)) {
            Some(index) => self.jump_loop(block, index, is_break),
            None => {
                let kind = if is_break { EdgeKind::Break } else { EdgeKind::Continue };
                self.add_edge(block, self.unknown_exit, kind);
            }
        }
        self.current = None;
    }

    // -- statements -------------------------------------------------------------

    fn build_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.build_stmt(stmt);
        }
    }

    fn build_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Block(stmts) => self.build_stmts(stmts),
            StmtKind::Namespace(NamespaceDecl {
                body: NamespaceBody::Braced(stmts),
                ..
            }) => {
                self.append(stmt.span);
                self.build_stmts(stmts);
            }
            StmtKind::Declare(DeclareStmt { body: Some(body), .. }) => {
                self.append(stmt.span);
                self.build_stmt(body);
            }
            StmtKind::Expression(expr) => self.build_expression(stmt.span, expr),
            StmtKind::Return(value) => {
                match value.as_ref().and_then(top_level_match) {
                    Some(match_expr) => self.build_match(stmt.span, match_expr),
                    None => {
                        self.append(stmt.span);
                    }
                }
                let block = self.current_or_new();
                self.jump_return(block);
                self.current = None;
            }
            StmtKind::Throw(_) => {
                let block = self.append(stmt.span);
                self.jump_throw(block);
                self.current = None;
            }
            StmtKind::If(if_stmt) => self.build_if(stmt.span, if_stmt),
            StmtKind::While(while_stmt) => {
                let header = self.start_block(BlockKind::LoopHeader);
                self.append(stmt.span);
                let always = is_always_true(&while_stmt.condition);
                self.build_loop(header, header, always, &while_stmt.body);
            }
            StmtKind::For(for_stmt) => {
                self.append(stmt.span);
                let header = self.start_block(BlockKind::LoopHeader);
                let update = self.new_block(BlockKind::Normal);
                let always = for_stmt.condition.last().map_or(true, is_always_true);
                self.build_loop(header, update, always, &for_stmt.body);
                self.add_edge(update, header, EdgeKind::Unconditional);
            }
            StmtKind::Foreach(foreach) => {
                let header = self.start_block(BlockKind::LoopHeader);
                self.append(stmt.span);
                self.build_loop(header, header, false, &foreach.body);
            }
            StmtKind::DoWhile(do_while) => self.build_do_while(stmt.span, do_while),
            StmtKind::Switch(switch) => self.build_switch(stmt.span, switch),
            StmtKind::Break(level) => self.build_loop_jump(stmt.span, level.as_ref(), true),
            StmtKind::Continue(level) => self.build_loop_jump(stmt.span, level.as_ref(), false),
            StmtKind::Try(try_stmt) => self.build_try(stmt.span, try_stmt),
            StmtKind::Goto(label) => {
                let block = self.append(stmt.span);
                self.gotos.push((block, label.clone()));
                self.current = None;
            }
            StmtKind::Label(label) => {
                let block = self.start_block(BlockKind::Normal);
                self.labels.entry(label.clone()).or_insert(block);
                self.append(stmt.span);
            }
            // Declarations are opaque here; their bodies get their own graphs.
            _ => {
                self.append(stmt.span);
            }
        }
    }

    fn build_expression(&mut self, span: Span, expr: &Expr) {
        if let Some(match_expr) = top_level_match(expr) {
            self.build_match(span, match_expr);
            return;
        }
        let block = self.append(span);
        match &unparenthesized(expr).kind {
            // exit() skips finally blocks.
            ExprKind::Exit(_) => {
                self.add_edge(block, self.exit, EdgeKind::Return);
                self.current = None;
            }
            ExprKind::ThrowExpr(_) => {
                self.jump_throw(block);
                self.current = None;
            }
            _ => {}
        }
    }

    fn build_if(&mut self, span: Span, if_stmt: &IfStmt) {
        let mut condition = self.start_block(BlockKind::Condition);
        self.append(span);
        let mut ends = Vec::new();

        let then_block = self.new_block(BlockKind::Normal);
        self.add_edge(condition, then_block, EdgeKind::True);
        self.current = Some(then_block);
        self.build_stmt(&if_stmt.then_branch);
        ends.extend(self.current.map(|end| (end, EdgeKind::Unconditional)));

        for branch in &if_stmt.elseifs {
            let next = self.new_block(BlockKind::Condition);
            self.add_edge(condition, next, EdgeKind::False);
            self.current = Some(next);
            self.append(branch.span);
            condition = next;

            let body = self.new_block(BlockKind::Normal);
            self.add_edge(condition, body, EdgeKind::True);
            self.current = Some(body);
            self.build_stmt(&branch.body);
            ends.extend(self.current.map(|end| (end, EdgeKind::Unconditional)));
        }

        match &if_stmt.else_branch {
            Some(else_branch) => {
                let body = self.new_block(BlockKind::Normal);
                self.add_edge(condition, body, EdgeKind::False);
                self.current = Some(body);
                self.build_stmt(else_branch);
                ends.extend(self.current.map(|end| (end, EdgeKind::Unconditional)));
            }
            None => ends.push((condition, EdgeKind::False)),
        }
        self.join(ends);
    }

    /// Shared shape of `while`, `for` and `foreach`: header with a true edge
    /// into the body and, unless the condition is constant, a false edge out.
    fn build_loop(&mut self, header: BlockId, continue_target: BlockId, always: bool, body: &Stmt) {
        let body_block = self.new_block(BlockKind::Normal);
        let after = self.new_block(BlockKind::Normal);
        self.add_edge(header, body_block, EdgeKind::True);
        if !always {
            self.add_edge(header, after, EdgeKind::False);
        }

        self.loops.push(LoopFrame {
            break_target: after,
            continue_target,
            try_depth: self.tries.len(),
        });
        self.current = Some(body_block);
        self.build_stmt(body);
        if let Some(end) = self.current {
            self.add_edge(end, continue_target, EdgeKind::Unconditional);
        }
        self.loops.pop();
        self.current = Some(after);
    }

    fn build_do_while(&mut self, span: Span, do_while: &DoWhileStmt) {
        let body = self.start_block(BlockKind::Normal);
        let condition = self.new_block(BlockKind::LoopHeader);
        let after = self.new_block(BlockKind::Normal);

        self.loops.push(LoopFrame {
            break_target: after,
            continue_target: condition,
            try_depth: self.tries.len(),
        });
        self.build_stmt(&do_while.body);
        if let Some(end) = self.current {
            self.add_edge(end, condition, EdgeKind::Unconditional);
        }
        self.loops.pop();

        self.blocks[condition.0].statements.push(span);
        self.stmt_blocks.insert(span, condition);
        self.add_edge(condition, body, EdgeKind::True);
        if !is_always_true(&do_while.condition) {
            self.add_edge(condition, after, EdgeKind::False);
        }
        self.current = Some(after);
    }

    fn build_switch(&mut self, span: Span, switch: &SwitchStmt) {
        let condition = self.start_block(BlockKind::Condition);
        self.append(span);
        let after = self.new_block(BlockKind::Join);

        // `continue` inside a switch acts like `break`.
        self.loops.push(LoopFrame {
            break_target: after,
            continue_target: after,
            try_depth: self.tries.len(),
        });

        let mut previous_end = None;
        let mut has_default = false;
        for case in &switch.cases {
            let block = self.new_block(BlockKind::Case);
            let kind = match case.value {
                Some(_) => EdgeKind::Case,
                None => {
                    has_default = true;
                    EdgeKind::Default
                }
            };
            self.add_edge(condition, block, kind);
            if let Some(end) = previous_end {
                self.add_edge(end, block, EdgeKind::Fallthrough);
            }
            self.current = Some(block);
            self.build_stmts(&case.body);
            previous_end = self.current;
        }
        if let Some(end) = previous_end {
            self.add_edge(end, after, EdgeKind::Unconditional);
        }
        if !has_default {
            self.add_edge(condition, after, EdgeKind::Default);
        }

        self.loops.pop();
        self.current = Some(after);
    }

    /// `match` at statement level: one case edge per arm, and an exception
    /// edge for the unhandled-match error when there is no default arm.
    fn build_match(&mut self, span: Span, match_expr: &MatchExpr) {
        let condition = self.start_block(BlockKind::Condition);
        self.append(span);

        let mut ends = Vec::new();
        let mut has_default = false;
        for arm in &match_expr.arms {
            let block = self.new_block(BlockKind::Case);
            let kind = match arm.conditions {
                Some(_) => EdgeKind::Case,
                None => {
                    has_default = true;
                    EdgeKind::Default
                }
            };
            self.add_edge(condition, block, kind);
            self.blocks[block.0].statements.push(arm.span);
            match &unparenthesized(&arm.body).kind {
                ExprKind::ThrowExpr(_) => self.jump_throw(block),
                ExprKind::Exit(_) => self.add_edge(block, self.exit, EdgeKind::Return),
                _ => ends.push((block, EdgeKind::Unconditional)),
            }
        }
        if !has_default {
            self.jump_throw(condition);
        }
        self.join(ends);
    }

    fn build_try(&mut self, span: Span, try_stmt: &TryStmt) {
        let finally = try_stmt
            .finally
            .as_ref()
            .map(|_| self.new_block(BlockKind::Finally));

        // Catch blocks are protected by this statement's finally only.
        self.tries.push(TryFrame {
            catches: Vec::new(),
            finally,
            in_catch: true,
            pending: Vec::new(),
        });
        let catches: Vec<BlockId> = try_stmt
            .catches
            .iter()
            .map(|_| self.new_block(BlockKind::Catch))
            .collect();
        if let Some(frame) = self.tries.last_mut() {
            frame.catches = catches.clone();
            frame.in_catch = false;
        }
        self.start_block(BlockKind::Normal);
        self.append(span);
        self.build_stmts(&try_stmt.body);
        let mut ends: Vec<BlockId> = self.current.into_iter().collect();

        if let Some(frame) = self.tries.last_mut() {
            frame.in_catch = true;
        }
        for (clause, &block) in try_stmt.catches.iter().zip(&catches) {
            self.blocks[block.0].statements.push(clause.span);
            self.current = Some(block);
            self.build_stmts(&clause.body);
            ends.extend(self.current);
        }
        let pending = self.tries.pop().map(|frame| frame.pending).unwrap_or_default();

        let (Some(finally), Some(finally_body)) = (finally, &try_stmt.finally) else {
            self.join(ends.into_iter().map(|end| (end, EdgeKind::Unconditional)).collect());
            return;
        };

        for end in &ends {
            self.add_edge(*end, finally, EdgeKind::Unconditional);
        }
        self.current = Some(finally);
        self.build_stmts(finally_body);
        let Some(finally_end) = self.current else {
            return;
        };
        for jump in pending {
            self.resume(finally_end, jump);
        }
        // An exception that entered the finally block keeps propagating.
        self.jump_throw(finally_end);
        if ends.is_empty() {
            self.current = None;
        } else {
            let after = self.new_block(BlockKind::Normal);
            self.add_edge(finally_end, after, EdgeKind::Unconditional);
            self.current = Some(after);
        }
    }
}

fn unparenthesized(mut expr: &Expr) -> &Expr {
    while let ExprKind::Parenthesized(inner) = &expr.kind {
        expr = inner;
    }
    expr
}

/// `match` used as a statement, assigned, or returned.
fn top_level_match(expr: &Expr) -> Option<&MatchExpr> {
    match &unparenthesized(expr).kind {
        ExprKind::Match(match_expr) => Some(match_expr),
        ExprKind::Assign(assign) => match &unparenthesized(&assign.value).kind {
            ExprKind::Match(match_expr) => Some(match_expr),
            _ => None,
        },
        _ => None,
    }
}

fn is_always_true(expr: &Expr) -> bool {
    match &unparenthesized(expr).kind {
        ExprKind::Bool(value) => *value,
        ExprKind::Int(value) => *value != 0,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function_cfg(source: &str) -> (ControlFlowGraph, String) {
        let result = php_parser::parse(source);
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        let cfg = build_all(&result.program)
            .into_iter()
            .find(|f| f.kind == FunctionKind::Function)
            .expect("function graph")
            .cfg;
        (cfg, source.to_string())
    }

    fn stmt_block(cfg: &ControlFlowGraph, source: &str, needle: &str) -> BlockId {
        let start = source.find(needle).expect("needle present") as u32;
        let span = Span::new(start, start + needle.len() as u32);
        cfg.block_of(span).expect("statement has a block")
    }

    fn assert_all_reachable_or_dead(cfg: &ControlFlowGraph) {
        let reachable = cfg.reachable_from_entry();
        for block in cfg.blocks() {
            assert_eq!(block.dead, !reachable.contains(&block.id), "{}", block.id);
        }
    }

    #[test]
    fn test_straight_line_is_one_block() {
        let (cfg, source) = function_cfg("<?php function f() { a(); b(); c(); }");
        let a = stmt_block(&cfg, &source, "a();");
        assert_eq!(stmt_block(&cfg, &source, "c();"), a);
        assert_eq!(cfg.block(a).statements.len(), 3);
        assert!(cfg.block(a).has_edge_to(cfg.exit(), EdgeKind::Unconditional));
        assert_eq!(cfg.exit_blocks(), vec![a]);
    }

    #[test]
    fn test_if_else_joins() {
        let (cfg, source) = function_cfg("<?php function f($x) { if ($x) { a(); } else { b(); } c(); }");
        let condition = stmt_block(&cfg, &source, "if ($x) { a(); } else { b(); }");
        let kinds: Vec<EdgeKind> = cfg.successors(condition).iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EdgeKind::True, EdgeKind::False]);
        let join = stmt_block(&cfg, &source, "c();");
        assert_eq!(cfg.block(join).kind, BlockKind::Join);
        assert_eq!(cfg.predecessors(join).len(), 2);
    }

    #[test]
    fn test_elseif_branch_has_its_condition_block() {
        let (cfg, source) =
            function_cfg("<?php function f($x, $y) { if ($x) { a(); } elseif ($y) { b(); } else { c(); } }");
        let first = stmt_block(&cfg, &source, "if ($x) { a(); } elseif ($y) { b(); } else { c(); }");
        let second = stmt_block(&cfg, &source, "elseif ($y) { b(); }");
        assert_ne!(first, second);
        assert_eq!(cfg.block(second).kind, BlockKind::Condition);
        assert!(cfg.block(first).has_edge_to(second, EdgeKind::False));
        let kinds: Vec<EdgeKind> = cfg.successors(second).iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EdgeKind::True, EdgeKind::False]);
        let body = stmt_block(&cfg, &source, "b();");
        assert!(cfg.block(second).has_edge_to(body, EdgeKind::True));
    }

    #[test]
    fn test_code_after_return_is_dead() {
        let (cfg, source) = function_cfg("<?php function f() { return 1; echo 'never'; }");
        let dead = stmt_block(&cfg, &source, "echo 'never';");
        assert!(cfg.block(dead).dead);
        assert!(!cfg.block(stmt_block(&cfg, &source, "return 1;")).dead);
        assert_all_reachable_or_dead(&cfg);
    }

    #[test]
    fn test_switch_fallthrough() {
        let source = "<?php function f($x) { switch($x){case 1: foo(); case 2: bar(); break; default: baz();} }";
        let (cfg, source) = function_cfg(source);
        let case1 = stmt_block(&cfg, &source, "foo();");
        let case2 = stmt_block(&cfg, &source, "bar();");
        let default = stmt_block(&cfg, &source, "baz();");
        assert!(cfg.block(case1).has_edge_to(case2, EdgeKind::Fallthrough));
        assert!(cfg.successors(case2).iter().all(|e| e.target != default));
        assert!(cfg.successors(case2).iter().any(|e| e.kind == EdgeKind::Break));
        assert_all_reachable_or_dead(&cfg);
    }

    #[test]
    fn test_return_routes_through_finally() {
        let (cfg, source) = function_cfg("<?php function f() { try { return 1; } finally { cleanup(); } }");
        let body = stmt_block(&cfg, &source, "return 1;");
        let finally = stmt_block(&cfg, &source, "cleanup();");
        assert_eq!(cfg.block(finally).kind, BlockKind::Finally);
        assert!(cfg.block(body).has_edge_to(finally, EdgeKind::Return));
        assert!(cfg.successors(body).iter().all(|e| e.target != cfg.exit()));
        assert!(cfg.block(finally).has_edge_to(cfg.exit(), EdgeKind::Return));
    }

    #[test]
    fn test_try_blocks_reach_catches_in_order() {
        let (cfg, source) = function_cfg(
            "<?php function f() { try { a(); } catch (A $e) { b(); } catch (B $e) { c(); } finally { d(); } }",
        );
        let body = stmt_block(&cfg, &source, "a();");
        let first = stmt_block(&cfg, &source, "b();");
        let second = stmt_block(&cfg, &source, "c();");
        let finally = stmt_block(&cfg, &source, "d();");
        let exception_targets: Vec<BlockId> = cfg
            .successors(body)
            .iter()
            .filter(|e| e.kind == EdgeKind::Exception)
            .map(|e| e.target)
            .collect();
        assert_eq!(exception_targets, vec![first, second, finally]);
        assert!(cfg.block(first).has_edge_to(finally, EdgeKind::Unconditional));
        assert!(!cfg.block(finally).dead);
    }

    #[test]
    fn test_loops_and_break_levels() {
        let (cfg, source) = function_cfg(
            "<?php function f($xs) { foreach ($xs as $x) { while (true) { if ($x) break 2; continue; } } done(); }",
        );
        let done = stmt_block(&cfg, &source, "done();");
        assert!(!cfg.block(done).dead);
        let brk = stmt_block(&cfg, &source, "break 2;");
        assert!(cfg.successors(brk).iter().any(|e| e.kind == EdgeKind::Break && e.target == done));
        let cont = stmt_block(&cfg, &source, "continue;");
        let header = stmt_block(&cfg, &source, "while (true) { if ($x) break 2; continue; }");
        assert!(cfg.block(cont).has_edge_to(header, EdgeKind::Continue));
        assert_all_reachable_or_dead(&cfg);
    }

    #[test]
    fn test_break_beyond_depth_is_unknown() {
        let (cfg, source) = function_cfg("<?php function f() { while (true) { break 3; } }");
        let brk = stmt_block(&cfg, &source, "break 3;");
        assert!(cfg.block(brk).has_edge_to(cfg.unknown_exit(), EdgeKind::Break));
    }

    #[test]
    fn test_infinite_loop_makes_following_code_dead() {
        let (cfg, source) = function_cfg("<?php function f() { while (true) { tick(); } after(); }");
        assert!(cfg.block(stmt_block(&cfg, &source, "after();")).dead);
    }

    #[test]
    fn test_goto_resolves_forward_and_unknown() {
        let (cfg, source) = function_cfg("<?php function f() { goto end; skipped(); end: done(); goto nowhere; }");
        let jump = stmt_block(&cfg, &source, "goto end;");
        let label = stmt_block(&cfg, &source, "end:");
        assert!(cfg.block(jump).has_edge_to(label, EdgeKind::Jump));
        assert!(cfg.block(stmt_block(&cfg, &source, "skipped();")).dead);
        let unknown = stmt_block(&cfg, &source, "goto nowhere;");
        assert!(cfg.block(unknown).has_edge_to(cfg.unknown_exit(), EdgeKind::Jump));
    }

    #[test]
    fn test_match_without_default_can_throw() {
        let (cfg, source) = function_cfg("<?php function f($x) { $y = match($x) { 1 => 'a', 2 => 'b' }; }");
        let condition = stmt_block(&cfg, &source, "$y = match($x) { 1 => 'a', 2 => 'b' };");
        let kinds: Vec<EdgeKind> = cfg.successors(condition).iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EdgeKind::Case, EdgeKind::Case, EdgeKind::Exception]);
    }

    #[test]
    fn test_exit_ends_block() {
        let (cfg, source) = function_cfg("<?php function f() { die('x'); echo 1; }");
        let die = stmt_block(&cfg, &source, "die('x');");
        assert!(cfg.block(die).has_edge_to(cfg.exit(), EdgeKind::Return));
        assert!(cfg.block(stmt_block(&cfg, &source, "echo 1;")).dead);
    }

    #[test]
    fn test_nested_function_is_opaque() {
        let result = php_parser::parse("<?php function f() { function g() { return 1; } $c = function () {}; }");
        let all = build_all(&result.program);
        let kinds: Vec<FunctionKind> = all.iter().map(|f| f.kind).collect();
        assert_eq!(
            kinds,
            vec![FunctionKind::Script, FunctionKind::Function, FunctionKind::Function, FunctionKind::Closure]
        );
        assert_eq!(all[1].cfg.blocks()[3].statements.len(), 2);
    }

    #[test]
    fn test_display_dump() {
        let (cfg, _) = function_cfg("<?php function f($x) { if ($x) { return 1; } return 2; }");
        insta::assert_snapshot!(cfg.to_string(), @r"
        bb0 Entry -> bb3
        bb1 Exit
        bb2 Unknown dead
        bb3 Normal -> bb4
        bb4 Condition [1] -> bb5:true, bb6:false
        bb5 Normal [1] -> bb1:return
        bb6 Join [1] -> bb1:return
        ");
    }
}
