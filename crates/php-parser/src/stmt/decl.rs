//! Named declarations: functions, classes, interfaces, traits and enums.

use php_ast::{
    Attribute, ClassDecl, ClassModifiers, EnumDecl, FunctionDecl, InterfaceDecl, Name, NameKind, Stmt, StmtKind,
    TraitDecl,
};
use php_lexer::{PhpVersion, TokenKind};

use crate::names::MISSING;
use crate::parser::Parser;

/// Names a class-like may not take, nor extend or implement.
const RESERVED_CLASS_NAMES: &[&str] = &["self", "parent", "static"];

fn is_reserved(name: &str) -> bool {
    RESERVED_CLASS_NAMES.iter().any(|reserved| reserved.eq_ignore_ascii_case(name))
}

impl<'src> Parser<'src> {
    /// The name after `class`, `interface`, `trait` or `enum`.
    fn class_like_name(&mut self, what: &str) -> String {
        match self.ident() {
            Some((name, span)) => {
                if is_reserved(&name) {
                    self.forbidden(format!("cannot use '{name}' as {what} name"), span);
                }
                name
            }
            None => {
                self.expected(&format!("{what} name"));
                MISSING.to_string()
            }
        }
    }

    fn check_class_refs(&mut self, names: &[Name]) {
        for name in names {
            if name.kind == NameKind::Unqualified && is_reserved(name.last()) {
                self.forbidden(format!("cannot use '{}' as class name", name.last()), name.span);
            }
        }
    }

    /// Parent list after `extends` / `implements`, up to the body.
    fn class_refs(&mut self) -> Vec<Name> {
        let names = self.name_list(TokenKind::LeftBrace);
        self.check_class_refs(&names);
        names
    }

    pub(super) fn function_decl(&mut self, start: u32, attributes: Vec<Attribute>) -> Stmt {
        self.bump();
        let by_ref = self.eat(TokenKind::Ampersand).is_some();
        let name = self.ident_or("function name");
        let params = self.params();
        let return_type = self.return_type();
        let body = self.braced_body();
        let decl = FunctionDecl {
            name,
            params,
            body,
            return_type,
            by_ref,
            attributes,
        };
        Stmt::new(StmtKind::Function(decl), self.span_from(start))
    }

    /// `[abstract|final|readonly]* class Name ...`
    pub(super) fn class_decl(&mut self, start: u32, attributes: Vec<Attribute>) -> Stmt {
        let mut modifiers = ClassModifiers::default();
        loop {
            let flag = match self.kind() {
                TokenKind::Abstract => &mut modifiers.is_abstract,
                TokenKind::Final => &mut modifiers.is_final,
                TokenKind::Readonly => &mut modifiers.is_readonly,
                _ => break,
            };
            let duplicate = std::mem::replace(flag, true);
            let token = self.bump();
            if duplicate {
                self.forbidden(format!("duplicate class modifier {}", token.kind), token.span);
            }
            if token.kind == TokenKind::Readonly {
                self.require_version("readonly classes", PhpVersion::Php82, token.span);
            }
        }
        if modifiers.is_abstract && modifiers.is_final {
            self.forbidden("cannot use 'abstract' and 'final' on the same class", self.span_from(start));
        }

        self.expect(TokenKind::Class);
        let name = self.class_like_name("class");
        let decl = self.class_rest(Some(name), modifiers, attributes);
        Stmt::new(StmtKind::Class(decl), self.span_from(start))
    }

    /// Everything after the class name: `extends`, `implements` and the
    /// body. Shared with anonymous classes.
    pub(crate) fn class_rest(
        &mut self,
        name: Option<String>,
        modifiers: ClassModifiers,
        attributes: Vec<Attribute>,
    ) -> ClassDecl {
        let extends = self.eat(TokenKind::Extends).map(|_| {
            let parent = self.parse_name();
            self.check_class_refs(std::slice::from_ref(&parent));
            parent
        });
        let implements = match self.eat(TokenKind::Implements) {
            Some(_) => self.class_refs(),
            None => Vec::new(),
        };
        let members = self.class_body();
        ClassDecl {
            name,
            modifiers,
            extends,
            implements,
            members,
            attributes,
        }
    }

    pub(super) fn interface_decl(&mut self, start: u32, attributes: Vec<Attribute>) -> Stmt {
        self.bump();
        let name = self.class_like_name("interface");
        let extends = match self.eat(TokenKind::Extends) {
            Some(_) => self.class_refs(),
            None => Vec::new(),
        };
        let members = self.class_body();
        let decl = InterfaceDecl {
            name,
            extends,
            members,
            attributes,
        };
        Stmt::new(StmtKind::Interface(decl), self.span_from(start))
    }

    pub(super) fn trait_decl(&mut self, start: u32, attributes: Vec<Attribute>) -> Stmt {
        self.bump();
        let name = self.class_like_name("trait");
        let members = self.class_body();
        let decl = TraitDecl {
            name,
            members,
            attributes,
        };
        Stmt::new(StmtKind::Trait(decl), self.span_from(start))
    }

    /// `enum Suit: string implements HasLabel { case Hearts = 'H'; ... }`
    pub(super) fn enum_decl(&mut self, start: u32, attributes: Vec<Attribute>) -> Stmt {
        let keyword = self.bump();
        self.require_version("enum declarations", PhpVersion::Php81, keyword.span);
        let name = self.class_like_name("enum");
        let scalar_type = self.eat(TokenKind::Colon).map(|_| self.backing_type());
        let implements = match self.eat(TokenKind::Implements) {
            Some(_) => self.class_refs(),
            None => Vec::new(),
        };
        let members = self.class_body();
        let decl = EnumDecl {
            name,
            scalar_type,
            implements,
            members,
            attributes,
        };
        Stmt::new(StmtKind::Enum(decl), self.span_from(start))
    }

    /// `int` or `string`; anything else is reported but kept.
    fn backing_type(&mut self) -> Name {
        let name = self.parse_name();
        let valid = name.kind == NameKind::Unqualified
            && (name.last().eq_ignore_ascii_case("int") || name.last().eq_ignore_ascii_case("string"));
        if !valid {
            self.forbidden("enum backing type must be int or string", name.span);
        }
        name
    }
}
