//! Class-like bodies: properties, methods, constants, trait uses, enum
//! cases, and the modifiers and property hooks they share with promoted
//! constructor parameters.

use php_ast::{
    Attribute, ClassConstDecl, ClassMember, ClassMemberKind, EnumCase, MemberModifiers, MethodDecl, Name, NameKind,
    PropertyDecl, PropertyHook, PropertyHookBody, PropertyHookKind, Span, TraitAdaptation, TraitAdaptationKind, TraitUseDecl,
    Visibility,
};
use php_lexer::{PhpVersion, TokenKind};

use crate::names::MISSING;
use crate::parser::Parser;

/// Tokens that can begin a member; recovery inside a body stops there.
const MEMBER_STARTS: &[TokenKind] = &[
    TokenKind::Public,
    TokenKind::Protected,
    TokenKind::Private,
    TokenKind::Static,
    TokenKind::Abstract,
    TokenKind::Final,
    TokenKind::Readonly,
    TokenKind::Function,
    TokenKind::Const,
    TokenKind::Use,
    TokenKind::Case,
    TokenKind::HashBracket,
    TokenKind::RightBrace,
];

/// Modifier keywords in front of a member or a promoted parameter. The
/// flags keep the keyword's span for diagnostics.
#[derive(Debug, Default)]
pub(crate) struct Modifiers {
    pub visibility: Option<Visibility>,
    /// `private(set)` of asymmetric visibility.
    pub set_visibility: Option<Visibility>,
    pub is_static: Option<Span>,
    pub is_abstract: Option<Span>,
    pub is_final: Option<Span>,
    pub is_readonly: Option<Span>,
}

impl Modifiers {
    fn is_empty(&self) -> bool {
        self.visibility.is_none()
            && self.set_visibility.is_none()
            && [self.is_static, self.is_abstract, self.is_final, self.is_readonly]
                .iter()
                .all(Option::is_none)
    }

    /// The tree form, without keyword spans.
    pub(crate) fn written(&self) -> MemberModifiers {
        MemberModifiers {
            visibility: self.visibility,
            set_visibility: self.set_visibility,
            is_static: self.is_static.is_some(),
            is_abstract: self.is_abstract.is_some(),
            is_final: self.is_final.is_some(),
            is_readonly: self.is_readonly.is_some(),
        }
    }
}

fn visibility_of(kind: TokenKind) -> Option<Visibility> {
    match kind {
        TokenKind::Public => Some(Visibility::Public),
        TokenKind::Protected => Some(Visibility::Protected),
        TokenKind::Private => Some(Visibility::Private),
        _ => None,
    }
}

impl<'src> Parser<'src> {
    pub(crate) fn modifiers(&mut self) -> Modifiers {
        let mut modifiers = Modifiers::default();
        loop {
            if let Some(visibility) = visibility_of(self.kind()) {
                let token = self.bump();
                if self.at(TokenKind::LeftParen) && self.peek_text().eq_ignore_ascii_case("set") {
                    self.bump();
                    self.bump();
                    self.expect(TokenKind::RightParen);
                    self.require_version("asymmetric visibility", PhpVersion::Php84, token.span);
                    if modifiers.set_visibility.replace(visibility).is_some() {
                        self.forbidden("multiple set visibility modifiers", token.span);
                    }
                } else if modifiers.visibility.replace(visibility).is_some() {
                    self.forbidden("multiple access type modifiers are not allowed", token.span);
                }
                continue;
            }
            let slot = match self.kind() {
                TokenKind::Static => &mut modifiers.is_static,
                TokenKind::Abstract => &mut modifiers.is_abstract,
                TokenKind::Final => &mut modifiers.is_final,
                TokenKind::Readonly => &mut modifiers.is_readonly,
                _ => break,
            };
            let token = self.bump();
            if slot.replace(token.span).is_some() {
                self.forbidden(format!("duplicate modifier {}", token.kind), token.span);
            }
        }
        if let (Some(_), Some(span)) = (modifiers.is_abstract, modifiers.is_final) {
            self.forbidden("cannot use 'abstract' and 'final' together", span);
        }
        modifiers
    }

    /// `{ ... }` of a class, interface, trait or enum.
    pub(crate) fn class_body(&mut self) -> Vec<ClassMember> {
        if !self.at(TokenKind::LeftBrace) {
            self.expected("'{'");
            return Vec::new();
        }
        let open = self.bump();
        let mut members = Vec::new();
        while !self.at(TokenKind::RightBrace) && !self.at_eof() {
            if self.eat(TokenKind::Semicolon).is_some() {
                continue;
            }
            let before = self.span();
            self.class_member(&mut members);
            if self.span() == before {
                self.bump();
            }
        }
        self.close(TokenKind::RightBrace, open.span);
        members
    }

    fn class_member(&mut self, members: &mut Vec<ClassMember>) {
        let start = self.start();
        let attributes = self.parse_attributes();

        match self.kind() {
            TokenKind::Use => {
                let kind = ClassMemberKind::TraitUse(self.trait_use());
                members.push(ClassMember {
                    kind,
                    span: self.span_from(start),
                });
                return;
            }
            TokenKind::Case => {
                let kind = ClassMemberKind::EnumCase(self.enum_case(attributes));
                members.push(ClassMember {
                    kind,
                    span: self.span_from(start),
                });
                return;
            }
            _ => {}
        }

        // PHP 4 `var` is a public property.
        let legacy_var = self.at_word("var") && self.peek() != TokenKind::LeftParen;
        if legacy_var {
            self.bump();
        }
        let mut modifiers = self.modifiers();
        if legacy_var {
            modifiers.visibility.get_or_insert(Visibility::Public);
        }

        match self.kind() {
            TokenKind::Const if !legacy_var => self.class_consts(start, modifiers, attributes, members),
            TokenKind::Function if !legacy_var => {
                let method = self.method(modifiers, attributes);
                members.push(ClassMember {
                    kind: ClassMemberKind::Method(method),
                    span: self.span_from(start),
                });
            }
            _ if self.at(TokenKind::Variable) || self.at_type_start() => {
                self.properties(start, modifiers, attributes, members)
            }
            _ => {
                self.expected("class member");
                self.skip_member();
            }
        }
    }

    /// Recovery: skip to the end of the broken member.
    fn skip_member(&mut self) {
        while !self.at_eof() && !self.at_any(MEMBER_STARTS) {
            if self.bump().kind == TokenKind::Semicolon {
                break;
            }
        }
    }

    fn method(&mut self, modifiers: Modifiers, attributes: Vec<Attribute>) -> MethodDecl {
        self.bump();
        let by_ref = self.eat(TokenKind::Ampersand).is_some();
        let name = self.ident_or("method name");
        if let Some(span) = modifiers.is_readonly {
            self.forbidden("cannot use 'readonly' as method modifier", span);
        }
        let params = self.params();
        let return_type = self.return_type();
        let body = if self.at(TokenKind::LeftBrace) {
            Some(self.braced_body())
        } else {
            self.expect_semi("method declaration");
            None
        };
        MethodDecl {
            name,
            modifiers: modifiers.written(),
            by_ref,
            params,
            return_type,
            body,
            attributes,
        }
    }

    /// `const A = 1, B = 2;` and the typed form `const int A = 1;`. Every
    /// constant becomes its own member; the first one's span covers the
    /// modifiers.
    fn class_consts(
        &mut self,
        start: u32,
        modifiers: Modifiers,
        attributes: Vec<Attribute>,
        members: &mut Vec<ClassMember>,
    ) {
        let keyword = self.bump();
        for span in [modifiers.is_static, modifiers.is_abstract, modifiers.is_readonly].into_iter().flatten() {
            self.forbidden("invalid modifier on class constant", span);
        }
        let typed = self.at_type_start() && !matches!(self.peek(), TokenKind::Equals | TokenKind::Comma);
        let type_hint = if typed {
            let hint = self.parse_type();
            self.require_version("typed class constants", PhpVersion::Php83, hint.span);
            Some(hint)
        } else {
            None
        };

        let items = self.const_items();
        if items.len() > 1 && !attributes.is_empty() {
            self.forbidden("cannot use attributes on multi-constant declaration", keyword.span);
        }
        for (i, item) in items.into_iter().enumerate() {
            let span = if i == 0 {
                Span::new(start, item.span.end)
            } else {
                item.span
            };
            let decl = ClassConstDecl {
                name: item.name,
                modifiers: modifiers.written(),
                type_hint: type_hint.clone(),
                value: item.value,
                attributes: attributes.clone(),
            };
            members.push(ClassMember {
                kind: ClassMemberKind::ClassConst(decl),
                span,
            });
        }
        self.expect_semi("class constant");
    }

    /// `public ?int $a = 1, $b;` or a single property with hooks.
    fn properties(
        &mut self,
        start: u32,
        modifiers: Modifiers,
        attributes: Vec<Attribute>,
        members: &mut Vec<ClassMember>,
    ) {
        let type_hint = (!self.at(TokenKind::Variable)).then(|| self.parse_type());
        if modifiers.is_empty() {
            self.expected("property modifier");
        }

        let mut first = true;
        loop {
            let item_start = if first { start } else { self.start() };
            let name = match self.variable() {
                Some((name, _)) => name,
                None => {
                    self.expected("property name");
                    MISSING.to_string()
                }
            };
            let default = self.eat(TokenKind::Equals).map(|_| self.parse_expr());
            let hooks = if first && self.at(TokenKind::LeftBrace) {
                self.property_hooks()
            } else {
                Vec::new()
            };
            let hooked = !hooks.is_empty();
            let decl = PropertyDecl {
                name,
                modifiers: modifiers.written(),
                type_hint: type_hint.clone(),
                default,
                attributes: attributes.clone(),
                hooks,
            };
            members.push(ClassMember {
                kind: ClassMemberKind::Property(decl),
                span: self.span_from(item_start),
            });
            if hooked {
                return;
            }
            first = false;
            if self.eat(TokenKind::Comma).is_none() || !self.at(TokenKind::Variable) {
                break;
            }
        }
        self.expect_semi("property declaration");
    }

    /// `{ get => ...; set(int $v) { ... } }` of a property or promoted
    /// parameter.
    pub(crate) fn property_hooks(&mut self) -> Vec<PropertyHook> {
        let open = self.bump();
        self.require_version("property hooks", PhpVersion::Php84, open.span);
        let mut hooks = Vec::new();
        while !self.at(TokenKind::RightBrace) && !self.at_eof() {
            let before = self.span();
            if let Some(hook) = self.property_hook() {
                hooks.push(hook);
            }
            if self.span() == before {
                self.bump();
            }
        }
        self.close(TokenKind::RightBrace, open.span);
        hooks
    }

    fn property_hook(&mut self) -> Option<PropertyHook> {
        let start = self.start();
        let attributes = self.parse_attributes();
        let is_final = self.eat(TokenKind::Final).is_some();
        let by_ref = self.eat(TokenKind::Ampersand).is_some();

        let kind = if self.at_word("get") {
            PropertyHookKind::Get
        } else if self.at_word("set") {
            PropertyHookKind::Set
        } else {
            self.expected("'get' or 'set'");
            while !self.at_eof() && !self.at(TokenKind::RightBrace) {
                if self.bump().kind == TokenKind::Semicolon {
                    break;
                }
            }
            return None;
        };
        self.bump();

        let params = if self.at(TokenKind::LeftParen) {
            self.params()
        } else {
            Vec::new()
        };
        let body = match self.kind() {
            TokenKind::LeftBrace => PropertyHookBody::Block(self.braced_body()),
            TokenKind::FatArrow => {
                self.bump();
                let value = self.parse_expr();
                self.expect_semi("hook expression");
                PropertyHookBody::Expression(value)
            }
            _ => {
                self.expect_semi("abstract hook");
                PropertyHookBody::Abstract
            }
        };
        Some(PropertyHook {
            kind,
            body,
            is_final,
            by_ref,
            params,
            attributes,
            span: self.span_from(start),
        })
    }

    /// `case Hearts;` or `case Hearts = 'H';`
    fn enum_case(&mut self, attributes: Vec<Attribute>) -> EnumCase {
        self.bump();
        if self.at(TokenKind::Class) {
            self.forbidden("'class' cannot be used as an enum case name", self.span());
        }
        let name = self.ident_or("case name");
        let value = self.eat(TokenKind::Equals).map(|_| self.parse_expr());
        self.expect_semi("enum case");
        EnumCase {
            name,
            value,
            attributes,
        }
    }

    /// `use A, B;` or `use A, B { A::f insteadof B; g as protected h; }`
    fn trait_use(&mut self) -> TraitUseDecl {
        self.bump();
        let traits = self.comma_list(TokenKind::LeftBrace, |p| {
            if p.at(TokenKind::Semicolon) {
                p.expected("trait name");
            }
            p.parse_name()
        });
        let adaptations = match self.eat(TokenKind::LeftBrace) {
            Some(open) => {
                let mut adaptations = Vec::new();
                while !self.at(TokenKind::RightBrace) && !self.at_eof() {
                    let before = self.span();
                    adaptations.push(self.trait_adaptation());
                    if self.span() == before {
                        self.bump();
                    }
                }
                self.close(TokenKind::RightBrace, open.span);
                adaptations
            }
            None => {
                self.expect_semi("trait use");
                Vec::new()
            }
        };
        TraitUseDecl { traits, adaptations }
    }

    fn trait_adaptation(&mut self) -> TraitAdaptation {
        let start = self.start();
        let first = self.parse_name();
        let (trait_name, method) = if self.eat(TokenKind::DoubleColon).is_some() {
            (Some(first), self.ident_or("method name"))
        } else {
            (None, first.joined())
        };

        let kind = if self.at_word("insteadof") {
            self.bump();
            let insteadof = self.name_list(TokenKind::Semicolon);
            let trait_name = trait_name.unwrap_or_else(|| {
                let span = Span::new(start, start);
                self.forbidden("'insteadof' needs a trait-qualified method", span);
                Name {
                    parts: vec![MISSING.to_string()],
                    kind: NameKind::Unqualified,
                    span,
                }
            });
            TraitAdaptationKind::Precedence {
                trait_name,
                method,
                insteadof,
            }
        } else {
            self.expect_after(TokenKind::As, "trait method reference");
            let new_modifier = visibility_of(self.kind());
            if new_modifier.is_some() {
                self.bump();
            }
            let new_name = self.ident().map(|(name, _)| name);
            if new_modifier.is_none() && new_name.is_none() {
                self.expected("visibility or alias");
            }
            TraitAdaptationKind::Alias {
                trait_name,
                method,
                new_modifier,
                new_name,
            }
        };
        self.expect_semi("trait adaptation");
        TraitAdaptation {
            kind,
            span: self.span_from(start),
        }
    }
}
