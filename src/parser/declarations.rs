//! Declaration parsing implementation
//!
//! This module handles declarations at file, block and member scope:
//!
//! - Declaration specifiers: storage classes, qualifiers, builtin types,
//!   typedef names, `struct`/`union`/`class` and `enum` specifiers
//! - Init-declarator lists, typedefs and bitfields
//! - Function definitions, including C++ method qualifiers and constructor
//!   initializer lists
//! - C++ templates, namespaces, `using` and `static_assert`
//!
//! # Grammar
//!
//! ```text
//! declaration     ::= decl_specifiers (init_declarator ("," init_declarator)*)? ";"
//!                   | decl_specifiers declarator function_rest
//! init_declarator ::= declarator (":" bit_width)? initializer?
//! initializer     ::= "=" (assignment | braced_list) | braced_list | "(" args ")"
//! record          ::= ("struct" | "union" | "class") name? bases? ("{" member* "}")?
//! enum            ::= "enum" ("class" | "struct")? name? (":" type)? ("{" enumerator,* "}")?
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::diagnostics::DiagnosticKind;
use crate::parser::ast::*;
use crate::parser::consteval::eval_const;
use crate::parser::declarators::DeclaratorMode;
use crate::parser::parse::{ParseError, Parser, ScannedName};
use crate::parser::scope::{NameKind, ScopeKind};
use crate::parser::token::{Keyword, LiteralValue, Punct, TokenKind};

/// Where a declaration appears. Decides which constructs are allowed and how
/// an identifier after the specifiers is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeclContext {
    File,
    Block,
    Member,
    Param,
    TypeName,
    ForInit,
}

/// Declaration specifiers plus what the parser learned while reading them.
#[derive(Debug, Clone)]
pub(crate) struct ParsedSpecs {
    pub specs: DeclSpecs,
    pub is_typedef: bool,
    /// False when no type specifier was written at all.
    pub has_type: bool,
}

/// Builtin type keywords seen so far.
#[derive(Debug, Default)]
struct TypeWords {
    void: u8,
    bool_: u8,
    char_: u8,
    short: u8,
    int: u8,
    long: u8,
    float: u8,
    double: u8,
    signed: u8,
    unsigned: u8,
    wide: Option<&'static str>,
}

impl TypeWords {
    fn any(&self) -> bool {
        self.primaries() > 0 || self.short + self.long + self.signed + self.unsigned > 0
    }

    fn primaries(&self) -> u8 {
        self.void
            + self.bool_
            + self.char_
            + self.int
            + self.float
            + self.double
            + u8::from(self.wide.is_some())
    }

    fn resolve(&self) -> BaseType {
        if self.void > 0 {
            BaseType::Void
        } else if self.bool_ > 0 {
            BaseType::Bool
        } else if let Some(name) = self.wide {
            BaseType::Named(QualifiedName::simple(name))
        } else if self.char_ > 0 {
            let signed = if self.unsigned > 0 {
                Some(false)
            } else if self.signed > 0 {
                Some(true)
            } else {
                None
            };
            BaseType::Char { signed }
        } else if self.float > 0 {
            BaseType::Float
        } else if self.double > 0 {
            if self.long > 0 {
                BaseType::LongDouble
            } else {
                BaseType::Double
            }
        } else {
            let width = match (self.short, self.long) {
                (s, _) if s > 0 => IntWidth::Short,
                (_, 0) => IntWidth::Int,
                (_, 1) => IntWidth::Long,
                _ => IntWidth::LongLong,
            };
            BaseType::Int {
                width,
                signed: self.unsigned == 0,
            }
        }
    }
}

impl<'src> Parser<'src> {
    /// Parse a top-level declaration
    pub(crate) fn parse_external_declaration(&mut self) -> Result<Decl, ParseError> {
        if self.check_punct(Punct::Semicolon) {
            let span = self.advance().span;
            return Ok(Decl::Empty(span));
        }
        // inline namespace v1 { ... }
        if self.is_cpp()
            && self.check_keyword(Keyword::Inline)
            && self.peek(1).is_keyword(Keyword::Namespace)
        {
            self.advance();
            return self.parse_namespace();
        }
        self.parse_declaration(DeclContext::File)
    }

    /// Parse any declaration allowed in `ctx`, including the trailing `;` or
    /// function body.
    pub(crate) fn parse_declaration(&mut self, ctx: DeclContext) -> Result<Decl, ParseError> {
        match self.peek_kind(0) {
            TokenKind::Keyword(Keyword::StaticAssert) => return self.parse_static_assert(),
            TokenKind::Keyword(Keyword::Using) if self.is_cpp() => return self.parse_using(),
            TokenKind::Keyword(Keyword::Template) if self.is_cpp() => {
                return self.parse_template_declaration(ctx)
            }
            TokenKind::Keyword(Keyword::Namespace) if self.is_cpp() => {
                return self.parse_namespace();
            }
            _ => {}
        }

        let start = self.current_start();
        self.skip_attributes()?;
        let parsed = self.parse_decl_specifiers(ctx)?;

        if self.check_punct(Punct::Semicolon) {
            self.advance();
            return Ok(self.bare_specifiers(parsed, start));
        }

        if !parsed.has_type {
            self.check_implicit_type(ctx)?;
        }

        let first = self.parse_declarator(DeclaratorMode::Named, true)?;
        let first_span = first.span;
        let (name, ty) = first.apply(parsed.specs.ty.clone());
        let name =
            name.ok_or_else(|| ParseError::new("Expected a name in declaration", first_span))?;

        if ty.is_function() && !parsed.is_typedef && !self.check_punct(Punct::Comma) {
            return self.parse_function_rest(parsed.specs, name, ty, start);
        }

        if parsed.is_typedef {
            self.parse_typedef_rest(parsed.specs, name, ty, first_span, start)
        } else {
            self.parse_variable_rest(parsed.specs, ctx, name, ty, first_span, start)
        }
    }

    /// `struct S { ... };`, `enum E;`, `int;`
    fn bare_specifiers(&mut self, parsed: ParsedSpecs, start: Position) -> Decl {
        let span = self.span_from(start);
        let ParsedSpecs { specs, .. } = parsed;
        if let Some(definition) = specs.definition {
            return *definition;
        }
        match specs.ty.base() {
            BaseType::Record { kind, name } => Decl::Record(RecordDecl {
                kind: *kind,
                name: name.clone(),
                bases: Vec::new(),
                is_final: false,
                members: None,
                span,
            }),
            BaseType::Enum { name } => Decl::Enum(EnumDecl {
                name: name.clone(),
                scoped: false,
                underlying: None,
                enumerators: None,
                span,
            }),
            _ => {
                self.diagnostics
                    .warning(DiagnosticKind::Syntax, "declaration does not declare anything", span);
                Decl::Variable(VariableDecl {
                    specs,
                    declarators: Vec::new(),
                    span,
                })
            }
        }
    }

    /// No type specifier: implicit `int` in C, constructors, destructors and
    /// conversion functions in C++.
    fn check_implicit_type(&mut self, ctx: DeclContext) -> Result<(), ParseError> {
        if self.is_cpp() {
            if self.at_special_member() {
                return Ok(());
            }
            return Err(self.error_here("Expected type specifier"));
        }
        if self.peek(0).is_identifier() && matches!(ctx, DeclContext::File | DeclContext::Member) {
            let span = self.peek(0).span;
            let name = self.peek(0).lexeme.to_string();
            self.diagnostics.warning(
                DiagnosticKind::Syntax,
                format!("type defaults to 'int' in declaration of '{}'", name),
                span,
            );
            return Ok(());
        }
        Err(self.error_here("Expected type specifier"))
    }

    /// Does a constructor, destructor or conversion function name start here?
    fn at_special_member(&mut self) -> bool {
        match self.peek_kind(0) {
            TokenKind::Punct(Punct::Tilde) | TokenKind::Keyword(Keyword::Operator) => true,
            TokenKind::Identifier | TokenKind::Punct(Punct::ColonColon) => {
                let Some(name) = self.scan_qualified_name(0) else {
                    return false;
                };
                let after = self.peek_kind(name.len);
                if after == TokenKind::Punct(Punct::ColonColon) {
                    return matches!(
                        self.peek_kind(name.len + 1),
                        TokenKind::Punct(Punct::Tilde) | TokenKind::Keyword(Keyword::Operator)
                    );
                }
                after == TokenKind::Punct(Punct::LParen)
                    && (self.types.is_type(&name.path) || repeats_last_segment(&name))
            }
            _ => false,
        }
    }

    fn parse_variable_rest(
        &mut self,
        specs: DeclSpecs,
        ctx: DeclContext,
        name: QualifiedName,
        ty: Type,
        name_span: Span,
        start: Position,
    ) -> Result<Decl, ParseError> {
        let mut declarators = Vec::new();
        let (mut name, mut ty, mut decl_start) = (name, ty, name_span.start);

        loop {
            if name.is_simple() {
                self.types.declare(name.last(), NameKind::Ordinary);
            }
            let bit_width = if ctx == DeclContext::Member && self.match_punct(Punct::Colon) {
                Some(self.parse_conditional()?)
            } else {
                None
            };
            let init = self.parse_initializer()?;
            declarators.push(InitDeclarator {
                name,
                ty,
                init,
                bit_width,
                span: self.span_from(decl_start),
            });

            if !self.match_punct(Punct::Comma) {
                break;
            }
            decl_start = self.current_start();
            let next = self.parse_declarator(DeclaratorMode::Named, true)?;
            let next_span = next.span;
            let (next_name, next_ty) = next.apply(specs.ty.clone());
            name = next_name
                .ok_or_else(|| ParseError::new("Expected a name in declaration", next_span))?;
            ty = next_ty;
        }

        if ctx != DeclContext::ForInit {
            self.expect_semicolon("after declaration")?;
        }
        Ok(Decl::Variable(VariableDecl {
            specs,
            declarators,
            span: self.span_from(start),
        }))
    }

    fn parse_typedef_rest(
        &mut self,
        specs: DeclSpecs,
        name: QualifiedName,
        ty: Type,
        name_span: Span,
        start: Position,
    ) -> Result<Decl, ParseError> {
        let mut names = Vec::new();
        let (mut name, mut ty, mut span) = (name, ty, name_span);

        loop {
            self.types.declare(name.last(), NameKind::Type);
            names.push(TypedefName {
                name: name.last().to_string(),
                ty,
                span,
            });
            if !self.match_punct(Punct::Comma) {
                break;
            }
            let next = self.parse_declarator(DeclaratorMode::Named, false)?;
            span = next.span;
            let (next_name, next_ty) = next.apply(specs.ty.clone());
            name = next_name.ok_or_else(|| ParseError::new("Expected a name in typedef", span))?;
            ty = next_ty;
        }

        self.expect_semicolon("after typedef")?;
        Ok(Decl::Typedef(TypedefDecl {
            specs,
            names,
            span: self.span_from(start),
        }))
    }

    /// `= expr`, `= { ... }`, and in C++ `{ ... }` or `( args )`.
    fn parse_initializer(&mut self) -> Result<Option<Initializer>, ParseError> {
        if self.match_punct(Punct::Assign) {
            if self.check_punct(Punct::LBrace) {
                let (items, _) = self.parse_braced_init_list()?;
                return Ok(Some(Initializer::Brace(items)));
            }
            return Ok(Some(Initializer::Assign(self.parse_assignment()?)));
        }
        if self.is_cpp() && self.check_punct(Punct::LBrace) {
            let (items, _) = self.parse_braced_init_list()?;
            return Ok(Some(Initializer::Brace(items)));
        }
        if self.is_cpp() && self.match_punct(Punct::LParen) {
            let args = self.parse_call_arguments()?;
            return Ok(Some(Initializer::Direct(args)));
        }
        Ok(None)
    }

    // ===== Declaration specifiers =====

    pub(crate) fn parse_decl_specifiers(
        &mut self,
        ctx: DeclContext,
    ) -> Result<ParsedSpecs, ParseError> {
        let start = self.current_start();
        let mut specifiers = Specifiers::default();
        let mut quals = Qualifiers::default();
        let mut is_typedef = false;
        let mut words = TypeWords::default();
        let mut named: Option<BaseType> = None;
        let mut definition: Option<Box<Decl>> = None;
        let mut conflict = false;

        loop {
            let has_type = named.is_some() || words.any();
            if self.angle_pending() {
                break;
            }
            match self.peek_kind(0) {
                TokenKind::Keyword(kw) => match kw {
                    Keyword::Typedef => is_typedef = true,
                    Keyword::Static => specifiers.storage = Some(StorageClass::Static),
                    Keyword::Extern => specifiers.storage = Some(StorageClass::Extern),
                    Keyword::Register => specifiers.storage = Some(StorageClass::Register),
                    Keyword::ThreadLocal => specifiers.storage = Some(StorageClass::ThreadLocal),
                    Keyword::Mutable => specifiers.storage = Some(StorageClass::Mutable),
                    Keyword::Auto if self.is_cpp() => {
                        conflict |= has_type;
                        named = Some(BaseType::Auto);
                    }
                    Keyword::Auto => specifiers.storage = Some(StorageClass::Auto),
                    Keyword::Inline => specifiers.is_inline = true,
                    Keyword::Virtual => specifiers.is_virtual = true,
                    Keyword::Explicit => specifiers.is_explicit = true,
                    Keyword::Friend => specifiers.is_friend = true,
                    Keyword::Constexpr => specifiers.is_constexpr = true,
                    Keyword::Noreturn => specifiers.is_noreturn = true,
                    Keyword::Const => quals.is_const = true,
                    Keyword::Volatile => quals.is_volatile = true,
                    Keyword::Restrict => quals.is_restrict = true,
                    Keyword::Atomic | Keyword::Complex | Keyword::Imaginary => {}
                    Keyword::Alignas => {
                        self.advance();
                        self.skip_balanced(Punct::LParen, Punct::RParen)?;
                        continue;
                    }
                    Keyword::Void => words.void += 1,
                    Keyword::Bool => words.bool_ += 1,
                    Keyword::Char => words.char_ += 1,
                    Keyword::Short => words.short += 1,
                    Keyword::Int => words.int += 1,
                    Keyword::Long => words.long += 1,
                    Keyword::Float => words.float += 1,
                    Keyword::Double => words.double += 1,
                    Keyword::Signed => words.signed += 1,
                    Keyword::Unsigned => words.unsigned += 1,
                    Keyword::WcharT | Keyword::Char16T | Keyword::Char32T => {
                        conflict |= words.wide.is_some();
                        words.wide = Some(kw.as_str());
                    }
                    Keyword::Struct | Keyword::Union | Keyword::Class => {
                        conflict |= has_type;
                        let (base, def) = self.parse_record_specifier()?;
                        named = Some(base);
                        if def.is_some() {
                            definition = def.map(Box::new);
                        }
                        continue;
                    }
                    Keyword::Enum => {
                        conflict |= has_type;
                        let (base, def) = self.parse_enum_specifier()?;
                        named = Some(base);
                        if def.is_some() {
                            definition = def.map(Box::new);
                        }
                        continue;
                    }
                    Keyword::Typename if self.is_cpp() => {
                        self.advance();
                        conflict |= has_type;
                        named = Some(BaseType::Named(self.parse_qualified_name()?));
                        continue;
                    }
                    _ => break,
                },
                TokenKind::Identifier if self.peek(0).lexeme == "__attribute__" => {
                    self.skip_attributes()?;
                    continue;
                }
                TokenKind::Punct(Punct::LBracket) if self.peek(1).is_punct(Punct::LBracket) => {
                    self.skip_attributes()?;
                    continue;
                }
                TokenKind::Identifier | TokenKind::Punct(Punct::ColonColon) if !has_type => {
                    let Some(scanned) = self.scan_qualified_name(0) else {
                        break;
                    };
                    if !self.types.is_type(&scanned.path)
                        || self.is_constructor_name(ctx, &scanned)
                    {
                        break;
                    }
                    named = Some(BaseType::Named(self.parse_qualified_name()?));
                    continue;
                }
                _ => break,
            }
            self.advance();
        }

        let has_type = named.is_some() || words.any();
        conflict |= words.primaries() > 1 || (named.is_some() && words.any());
        if conflict {
            let span = self.span_from(start);
            self.diagnostics.error(
                DiagnosticKind::Syntax,
                "two or more data types in declaration specifiers",
                span,
            );
        }

        let base = match named {
            Some(base) => base,
            None if words.any() => words.resolve(),
            None if self.is_cpp() => BaseType::Void,
            None => BaseType::Int {
                width: IntWidth::Int,
                signed: true,
            },
        };

        Ok(ParsedSpecs {
            specs: DeclSpecs {
                ty: Type::Base { base, quals },
                specifiers,
                definition,
                span: self.span_from(start),
            },
            is_typedef,
            has_type,
        })
    }

    /// A known type name that actually names a constructor, e.g. `Shape(` in
    /// the body of `class Shape` or `Shape::Shape(` out of line.
    fn is_constructor_name(&mut self, ctx: DeclContext, name: &ScannedName) -> bool {
        if !self.is_cpp() || matches!(ctx, DeclContext::TypeName | DeclContext::Param) {
            return false;
        }
        let after = self.peek_kind(name.len);
        if after == TokenKind::Punct(Punct::ColonColon) {
            return matches!(
                self.peek_kind(name.len + 1),
                TokenKind::Punct(Punct::Tilde) | TokenKind::Keyword(Keyword::Operator)
            );
        }
        if after != TokenKind::Punct(Punct::LParen) {
            return false;
        }
        match name.segments.as_slice() {
            [only] => ctx == DeclContext::Member && self.record_names.last() == Some(only),
            _ => repeats_last_segment(name),
        }
    }

    /// Skip GNU `__attribute__((...))` and C++ `[[...]]` attributes.
    pub(crate) fn skip_attributes(&mut self) -> Result<(), ParseError> {
        loop {
            if self.peek(0).is_identifier() && self.peek(0).lexeme == "__attribute__" {
                self.advance();
                self.skip_balanced(Punct::LParen, Punct::RParen)?;
            } else if self.check_punct(Punct::LBracket) && self.peek(1).is_punct(Punct::LBracket) {
                self.skip_balanced(Punct::LBracket, Punct::RBracket)?;
            } else {
                return Ok(());
            }
        }
    }

    /// Skip from an opening delimiter through its match.
    pub(crate) fn skip_balanced(&mut self, open: Punct, close: Punct) -> Result<(), ParseError> {
        self.expect_punct(open, &format!("Expected '{}'", open))?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.peek_kind(0) {
                TokenKind::Eof => return Err(self.error_here(&format!("Expected '{}'", close))),
                TokenKind::Punct(p) if p == open => depth += 1,
                TokenKind::Punct(p) if p == close => depth -= 1,
                _ => {}
            }
            self.advance();
        }
        Ok(())
    }

    // ===== Records =====

    /// `struct`/`union`/`class` specifier. Returns the referenced type and,
    /// when a body or base list follows, the definition.
    fn parse_record_specifier(&mut self) -> Result<(BaseType, Option<Decl>), ParseError> {
        let start = self.current_start();
        let kind = match self.advance().kind {
            TokenKind::Keyword(Keyword::Union) => RecordKind::Union,
            TokenKind::Keyword(Keyword::Class) => RecordKind::Class,
            _ => RecordKind::Struct,
        };
        self.skip_attributes()?;

        let name = if self.peek(0).is_identifier() {
            Some(self.advance().lexeme.to_string())
        } else {
            None
        };

        if let Some(name) = &name {
            // Explicit specialization: `struct Box<int> { ... }`
            if self.is_cpp() && self.check_punct(Punct::Lt) && self.types.is_template(name) {
                self.parse_template_args()?;
            }
        }

        let is_final = self.is_cpp()
            && self.check_contextual("final")
            && matches!(self.peek_kind(1), TokenKind::Punct(Punct::LBrace | Punct::Colon));
        if is_final {
            self.advance();
        }

        let has_bases = self.is_cpp() && name.is_some() && self.check_punct(Punct::Colon);
        let has_body = has_bases || self.check_punct(Punct::LBrace);

        if let (true, Some(name)) = (self.is_cpp(), &name) {
            if has_body || !self.types.is_type(name) {
                if self.template_context > 0 {
                    self.types.declare_outside_template(name, NameKind::Template);
                } else {
                    self.types.declare(name, NameKind::Type);
                }
            }
        }

        let base = BaseType::Record {
            kind,
            name: name.clone(),
        };
        if !has_body {
            return Ok((base, None));
        }

        let bases = if has_bases {
            self.advance();
            self.parse_base_specifiers()?
        } else {
            Vec::new()
        };

        self.expect_punct(Punct::LBrace, &format!("Expected '{{' after {} name", kind.keyword()))?;
        let record_name = name.clone();
        let members = self.with_scope(ScopeKind::Record, record_name.clone(), |p| {
            p.record_names.push(record_name.unwrap_or_default());
            let saved = std::mem::replace(&mut p.template_context, 0);
            let members = p.nested(|p| p.parse_member_list(kind));
            p.template_context = saved;
            p.record_names.pop();
            members
        })?;

        let decl = Decl::Record(RecordDecl {
            kind,
            name,
            bases,
            is_final,
            members: Some(members),
            span: self.span_from(start),
        });
        Ok((base, Some(decl)))
    }

    /// `public Base, virtual protected Other<int>`
    fn parse_base_specifiers(&mut self) -> Result<Vec<BaseSpecifier>, ParseError> {
        let mut bases = Vec::new();
        loop {
            let start = self.current_start();
            let mut access = None;
            let mut is_virtual = false;
            loop {
                match self.peek_kind(0) {
                    TokenKind::Keyword(Keyword::Public) => access = Some(Access::Public),
                    TokenKind::Keyword(Keyword::Protected) => access = Some(Access::Protected),
                    TokenKind::Keyword(Keyword::Private) => access = Some(Access::Private),
                    TokenKind::Keyword(Keyword::Virtual) => is_virtual = true,
                    _ => break,
                }
                self.advance();
            }
            let name = self.parse_qualified_name()?;
            bases.push(BaseSpecifier {
                access,
                is_virtual,
                name,
                span: self.span_from(start),
            });
            if !self.match_punct(Punct::Comma) {
                return Ok(bases);
            }
        }
    }

    /// Members up to and including the closing `}`.
    fn parse_member_list(&mut self, kind: RecordKind) -> Result<Vec<Member>, ParseError> {
        let depth = self.stream.depth_at(0);
        let mut access = kind.default_access();
        let mut members = Vec::new();

        while !self.check_punct(Punct::RBrace) && !self.is_at_end() {
            if self.is_cpp() && self.peek(1).is_punct(Punct::Colon) {
                let label = match self.peek_kind(0) {
                    TokenKind::Keyword(Keyword::Public) => Some(Access::Public),
                    TokenKind::Keyword(Keyword::Protected) => Some(Access::Protected),
                    TokenKind::Keyword(Keyword::Private) => Some(Access::Private),
                    _ => None,
                };
                if let Some(label) = label {
                    self.advance();
                    self.advance();
                    access = label;
                    continue;
                }
            }
            if self.match_punct(Punct::Semicolon) {
                continue;
            }

            let mark = self.stream.mark();
            match self.parse_declaration(DeclContext::Member) {
                Ok(decl) => members.push(Member { access, decl }),
                Err(err) => self.recover(err, mark, depth),
            }
        }

        // An unclosed body at end of input is reported as a nesting error.
        if !self.is_at_end() {
            let message = format!("Expected '}}' after {} members", kind.keyword());
            self.expect_punct(Punct::RBrace, &message)?;
        }
        Ok(members)
    }

    // ===== Enums =====

    fn parse_enum_specifier(&mut self) -> Result<(BaseType, Option<Decl>), ParseError> {
        let start = self.current_start();
        self.expect_keyword(Keyword::Enum, "Expected 'enum'")?;
        let scoped = self.is_cpp()
            && (self.match_keyword(Keyword::Class) || self.match_keyword(Keyword::Struct));
        self.skip_attributes()?;

        let name = if self.peek(0).is_identifier() {
            Some(self.advance().lexeme.to_string())
        } else {
            None
        };
        if scoped && name.is_none() {
            return Err(self.error_here("Expected identifier after 'enum class'"));
        }

        let underlying = if self.is_cpp() && self.match_punct(Punct::Colon) {
            Some(self.parse_type_name()?)
        } else {
            None
        };

        if let (true, Some(name)) = (self.is_cpp(), &name) {
            self.types.declare(name, NameKind::Type);
        }

        let base = BaseType::Enum { name: name.clone() };
        if !self.match_punct(Punct::LBrace) {
            if underlying.is_some() {
                // Opaque declaration: `enum class E : int;`
                let decl = Decl::Enum(EnumDecl {
                    name,
                    scoped,
                    underlying,
                    enumerators: None,
                    span: self.span_from(start),
                });
                return Ok((base, Some(decl)));
            }
            return Ok((base, None));
        }

        let enumerators = self.parse_enumerators(name.as_deref(), scoped)?;
        let decl = Decl::Enum(EnumDecl {
            name,
            scoped,
            underlying,
            enumerators: Some(enumerators),
            span: self.span_from(start),
        });
        Ok((base, Some(decl)))
    }

    /// Enumerators up to and including `}`. A missing value continues from
    /// the previous discriminant, starting at 0.
    fn parse_enumerators(
        &mut self,
        enum_name: Option<&str>,
        scoped: bool,
    ) -> Result<Vec<Enumerator>, ParseError> {
        let mut enumerators = Vec::new();
        let mut next: Option<i64> = Some(0);

        while !self.check_punct(Punct::RBrace) {
            let start = self.current_start();
            let name = self.expect_identifier("in enumerator list")?;
            let value = if self.match_punct(Punct::Assign) {
                Some(self.parse_conditional()?)
            } else {
                None
            };
            let discriminant = match &value {
                Some(expr) => eval_const(expr, &self.types),
                None => next,
            };
            next = discriminant.and_then(|d| d.checked_add(1));

            match discriminant {
                Some(d) if !scoped => self.types.declare_constant(&name, d),
                _ if !scoped => self.types.declare(&name, NameKind::Ordinary),
                _ => {}
            }
            if let (Some(d), Some(enum_name)) = (discriminant, enum_name) {
                self.types.declare_constant(&format!("{}::{}", enum_name, name), d);
            }

            enumerators.push(Enumerator {
                name,
                value,
                discriminant,
                span: self.span_from(start),
            });
            if !self.match_punct(Punct::Comma) {
                break;
            }
        }

        self.expect_punct(Punct::RBrace, "Expected '}' after enumerator list")?;
        Ok(enumerators)
    }

    // ===== Functions =====

    /// Everything after a function declarator: method qualifiers, `= 0`,
    /// constructor initializers and the body or `;`.
    fn parse_function_rest(
        &mut self,
        specs: DeclSpecs,
        name: QualifiedName,
        ty: Type,
        start: Position,
    ) -> Result<Decl, ParseError> {
        let Type::Function {
            ret,
            params,
            variadic,
        } = ty
        else {
            return Err(self.error_here("Expected function declarator"));
        };
        let mut return_type = *ret;
        let mut method = MethodQualifiers::default();

        loop {
            match self.peek_kind(0) {
                TokenKind::Keyword(Keyword::Const) => method.is_const = true,
                TokenKind::Keyword(Keyword::Volatile) => {}
                TokenKind::Punct(Punct::Amp | Punct::AndAnd) if self.is_cpp() => {}
                TokenKind::Keyword(Keyword::Noexcept) => {
                    method.is_noexcept = true;
                    self.advance();
                    if self.check_punct(Punct::LParen) {
                        self.skip_balanced(Punct::LParen, Punct::RParen)?;
                    }
                    continue;
                }
                TokenKind::Keyword(Keyword::Throw) => {
                    self.advance();
                    self.skip_balanced(Punct::LParen, Punct::RParen)?;
                    continue;
                }
                TokenKind::Identifier if self.check_contextual("override") => {
                    method.is_override = true
                }
                TokenKind::Identifier if self.check_contextual("final") => method.is_final = true,
                TokenKind::Identifier if self.check_contextual("__attribute__") => {
                    self.skip_attributes()?;
                    continue;
                }
                TokenKind::Punct(Punct::Arrow) if self.is_cpp() => {
                    self.advance();
                    return_type = self.parse_type_name()?;
                    continue;
                }
                _ => break,
            }
            self.advance();
        }

        if self.is_cpp() && self.match_punct(Punct::Assign) {
            match self.peek_kind(0) {
                TokenKind::IntLiteral if self.peek(0).lexeme == "0" => method.is_pure = true,
                TokenKind::Keyword(Keyword::Default) => method.is_defaulted = true,
                TokenKind::Keyword(Keyword::Delete) => method.is_deleted = true,
                _ => return Err(self.error_here("Expected '0', 'default' or 'delete' after '='")),
            }
            self.advance();
        }

        if name.is_simple() && !self.types.is_type(name.last()) {
            if self.template_context > 0 {
                self.types.declare_outside_template(name.last(), NameKind::Template);
            } else {
                self.types.declare(name.last(), NameKind::Ordinary);
            }
        }

        let has_body =
            self.check_punct(Punct::LBrace) || (self.is_cpp() && self.check_punct(Punct::Colon));
        let (initializers, body) = if has_body {
            let saved = std::mem::replace(&mut self.template_context, 0);
            let result = self.with_scope(ScopeKind::Function, None, |p| {
                for param in &params {
                    if let Some(param_name) = &param.name {
                        p.types.declare(param_name, NameKind::Ordinary);
                    }
                }
                let initializers = if p.match_punct(Punct::Colon) {
                    p.parse_member_initializers()?
                } else {
                    Vec::new()
                };
                let body = p.parse_block()?;
                Ok((initializers, Some(body)))
            });
            self.template_context = saved;
            result?
        } else {
            self.expect_semicolon("after function declaration")?;
            (Vec::new(), None)
        };

        Ok(Decl::Function(FunctionDecl {
            specs,
            name,
            return_type,
            params,
            variadic,
            method,
            initializers,
            body,
            span: self.span_from(start),
        }))
    }

    /// `: radius(r), Base{1, 2}`
    fn parse_member_initializers(&mut self) -> Result<Vec<MemberInit>, ParseError> {
        let mut initializers = Vec::new();
        loop {
            let start = self.current_start();
            let name = self.parse_qualified_name()?;
            let (args, braced) = if self.match_punct(Punct::LParen) {
                (self.parse_call_arguments()?, false)
            } else if self.check_punct(Punct::LBrace) {
                let (items, _) = self.parse_braced_init_list()?;
                (items.into_iter().map(|item| item.value).collect(), true)
            } else {
                return Err(self.error_here("Expected '(' or '{' in member initializer"));
            };
            initializers.push(MemberInit {
                name,
                args,
                braced,
                span: self.span_from(start),
            });
            if !self.match_punct(Punct::Comma) {
                return Ok(initializers);
            }
        }
    }

    // ===== C++ declarations =====

    /// `template <...> declaration`
    fn parse_template_declaration(&mut self, ctx: DeclContext) -> Result<Decl, ParseError> {
        let start = self.current_start();
        self.expect_keyword(Keyword::Template, "Expected 'template'")?;

        // Explicit instantiation: `template class Box<int>;`
        if !self.check_punct(Punct::Lt) {
            let decl = self.parse_declaration(ctx)?;
            return Ok(Decl::Template(TemplateDecl {
                params: Vec::new(),
                decl: Box::new(decl),
                span: self.span_from(start),
            }));
        }

        self.with_scope(ScopeKind::Template, None, |p| {
            let params = p.parse_template_params()?;
            p.template_context += 1;
            let decl = p.parse_declaration(ctx);
            p.template_context -= 1;
            Ok(Decl::Template(TemplateDecl {
                params,
                decl: Box::new(decl?),
                span: p.span_from(start),
            }))
        })
    }

    /// `<typename T, int N = 4>` including both angle brackets. Parameter
    /// names are declared in the current (template) scope.
    fn parse_template_params(&mut self) -> Result<Vec<TemplateParam>, ParseError> {
        self.expect_punct(Punct::Lt, "Expected '<' after 'template'")?;
        self.template_arg_depth += 1;
        let result = self.parse_template_params_inner();
        self.template_arg_depth -= 1;
        let params = result?;
        self.expect_closing_angle("Expected '>' after template parameters")?;
        Ok(params)
    }

    fn parse_template_params_inner(&mut self) -> Result<Vec<TemplateParam>, ParseError> {
        let mut params = Vec::new();
        if self.check_punct(Punct::Gt) {
            return Ok(params);
        }
        loop {
            params.push(self.parse_template_param()?);
            if !self.match_punct(Punct::Comma) {
                return Ok(params);
            }
        }
    }

    fn parse_template_param(&mut self) -> Result<TemplateParam, ParseError> {
        let start = self.current_start();

        // template <typename> class Container
        if self.check_keyword(Keyword::Template) {
            self.advance();
            self.with_scope(ScopeKind::Template, None, |p| p.parse_template_params())?;
            if !self.match_keyword(Keyword::Class) {
                self.expect_keyword(
                    Keyword::Typename,
                    "Expected 'class' after template parameter list",
                )?;
            }
            let name = self.expect_identifier("in template template parameter")?;
            self.types.declare(&name, NameKind::Template);
            return Ok(TemplateParam::Type {
                name: Some(name),
                default: None,
                span: self.span_from(start),
            });
        }

        let is_type_param = matches!(
            self.peek_kind(0),
            TokenKind::Keyword(Keyword::Typename | Keyword::Class)
        ) && matches!(
            self.peek_kind(1),
            TokenKind::Identifier
                | TokenKind::Punct(Punct::Comma | Punct::Gt | Punct::Assign | Punct::Ellipsis)
        );

        if is_type_param {
            self.advance();
            self.match_punct(Punct::Ellipsis);
            let name = if self.peek(0).is_identifier() {
                Some(self.advance().lexeme.to_string())
            } else {
                None
            };
            if let Some(name) = &name {
                self.types.declare(name, NameKind::Type);
            }
            let default = if self.match_punct(Punct::Assign) {
                Some(self.parse_type_name()?)
            } else {
                None
            };
            return Ok(TemplateParam::Type {
                name,
                default,
                span: self.span_from(start),
            });
        }

        let parsed = self.parse_decl_specifiers(DeclContext::Param)?;
        if !parsed.has_type {
            return Err(self.error_here("Expected template parameter"));
        }
        let declarator = self.parse_declarator(DeclaratorMode::Either, false)?;
        let (name, ty) = declarator.apply(parsed.specs.ty);
        let name = name.map(|n| n.last().to_string());
        if let Some(name) = &name {
            self.types.declare(name, NameKind::Ordinary);
        }
        let default = if self.match_punct(Punct::Assign) {
            Some(self.in_template_argument(|p| p.parse_conditional())?)
        } else {
            None
        };
        Ok(TemplateParam::Value {
            ty,
            name,
            default,
            span: self.span_from(start),
        })
    }

    /// `namespace a { }`, `namespace a::b { }`, `namespace { }`,
    /// `namespace fs = std::filesystem;`
    fn parse_namespace(&mut self) -> Result<Decl, ParseError> {
        let start = self.current_start();
        self.expect_keyword(Keyword::Namespace, "Expected 'namespace'")?;

        let mut segments = Vec::new();
        if self.peek(0).is_identifier() {
            segments.push(self.advance().lexeme.to_string());
            while self.check_punct(Punct::ColonColon) && self.peek(1).is_identifier() {
                self.advance();
                segments.push(self.advance().lexeme.to_string());
            }
        }

        if segments.len() == 1 && self.match_punct(Punct::Assign) {
            let target = self.parse_qualified_name()?;
            self.expect_semicolon("after namespace alias")?;
            return Ok(Decl::Using(UsingDecl {
                kind: UsingKind::NamespaceAlias {
                    name: segments.remove(0),
                    target,
                },
                span: self.span_from(start),
            }));
        }

        self.expect_punct(Punct::LBrace, "Expected '{' after namespace name")?;
        if segments.is_empty() {
            self.types.push(ScopeKind::Namespace, None);
        }
        for segment in &segments {
            self.types.push(ScopeKind::Namespace, Some(segment.clone()));
        }

        let mut items = Vec::new();
        while !self.check_punct(Punct::RBrace) && !self.is_at_end() {
            self.parse_external_item(&mut items);
        }
        self.match_punct(Punct::RBrace);

        for _ in 0..segments.len().max(1) {
            self.types.pop();
        }

        let name = if segments.is_empty() {
            None
        } else {
            Some(QualifiedName {
                global: false,
                segments: segments
                    .into_iter()
                    .map(|name| NameSegment {
                        name,
                        template_args: None,
                    })
                    .collect(),
            })
        };
        Ok(Decl::Namespace(NamespaceDecl {
            name,
            items,
            span: self.span_from(start),
        }))
    }

    /// `using namespace std;`, `using Alias = T;`, `using std::vector;`
    fn parse_using(&mut self) -> Result<Decl, ParseError> {
        let start = self.current_start();
        self.expect_keyword(Keyword::Using, "Expected 'using'")?;

        let kind = if self.match_keyword(Keyword::Namespace) {
            let name = self.parse_qualified_name()?;
            self.types.add_using_namespace(&name.path());
            UsingKind::Namespace(name)
        } else if self.peek(0).is_identifier() && self.peek(1).is_punct(Punct::Assign) {
            let name = self.advance().lexeme.to_string();
            self.advance();
            let ty = self.parse_type_name()?;
            if self.template_context > 0 {
                self.types.declare_outside_template(&name, NameKind::Template);
            } else {
                self.types.declare(&name, NameKind::Type);
            }
            UsingKind::Alias { name, ty }
        } else {
            self.match_keyword(Keyword::Typename);
            let name = self.parse_qualified_name()?;
            if let Some(kind) = self.types.lookup_qualified(&name.path()) {
                if kind != NameKind::Ordinary {
                    self.types.declare(name.last(), kind);
                }
            }
            UsingKind::Declaration(name)
        };

        self.expect_semicolon("after using declaration")?;
        Ok(Decl::Using(UsingDecl {
            kind,
            span: self.span_from(start),
        }))
    }

    /// `static_assert(cond, "message");`
    fn parse_static_assert(&mut self) -> Result<Decl, ParseError> {
        let start = self.current_start();
        self.expect_keyword(Keyword::StaticAssert, "Expected 'static_assert'")?;
        self.expect_punct(Punct::LParen, "Expected '(' after 'static_assert'")?;
        let cond = self.grouped(|p| p.parse_assignment())?;

        let message = if self.match_punct(Punct::Comma) {
            let mut text = String::new();
            while self.peek_kind(0) == TokenKind::StringLiteral {
                if let Some(LiteralValue::Str(part)) = &self.advance().value {
                    text.push_str(part);
                }
            }
            Some(text)
        } else {
            None
        };

        self.expect_punct(Punct::RParen, "Expected ')' after static assertion")?;
        self.expect_semicolon("after static assertion")?;
        Ok(Decl::StaticAssert(StaticAssertDecl {
            cond,
            message,
            span: self.span_from(start),
        }))
    }
}

/// `Shape::Shape` or `ns::Shape::Shape`
fn repeats_last_segment(name: &ScannedName) -> bool {
    match name.segments.as_slice() {
        [.., outer, last] => outer == last,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ParseOptions;
    use crate::parser::ast::*;
    use crate::parser::parse::{ParseOutput, Parser};

    fn parse_c(source: &str) -> ParseOutput {
        Parser::new(source, &ParseOptions::c()).parse_program()
    }

    fn parse_cpp(source: &str) -> ParseOutput {
        Parser::new(source, &ParseOptions::cpp()).parse_program()
    }

    #[test]
    fn test_struct_definition_members_in_order() {
        let output = parse_c("struct Point { int x; int y; char *label; };");
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        match &output.program.items[0] {
            Decl::Record(record) => {
                assert_eq!(record.kind, RecordKind::Struct);
                assert_eq!(record.name.as_deref(), Some("Point"));
                let names: Vec<String> = record
                    .members
                    .iter()
                    .flatten()
                    .filter_map(|m| m.decl.name())
                    .collect();
                assert_eq!(names, vec!["x", "y", "label"]);
            }
            other => panic!("Expected struct, got {:?}", other),
        }
    }

    #[test]
    fn test_enum_discriminants() {
        let output = parse_c("enum Color { RED, GREEN = 5, BLUE, ALPHA = GREEN * 2 };");
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        match &output.program.items[0] {
            Decl::Enum(e) => {
                let values: Vec<Option<i64>> = e
                    .enumerators
                    .iter()
                    .flatten()
                    .map(|en| en.discriminant)
                    .collect();
                assert_eq!(values, vec![Some(0), Some(5), Some(6), Some(10)]);
            }
            other => panic!("Expected enum, got {:?}", other),
        }
    }

    fn enum_values(decl: &Decl) -> Vec<Option<i64>> {
        match decl {
            Decl::Enum(e) => e.enumerators.iter().flatten().map(|en| en.discriminant).collect(),
            other => panic!("Expected enum, got {:?}", other),
        }
    }

    #[test]
    fn test_enumerators_follow_block_scope() {
        let source = r#"
            enum Base { BASE = 100 };
            void f(void) {
                enum { LOCAL = 3 };
                int BASE = 1;
                enum { NEXT = BASE };
            }
            enum After { A = BASE + 1, B = LOCAL };
        "#;
        let output = parse_c(source);
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);

        let Decl::Function(f) = &output.program.items[1] else {
            panic!("Expected function");
        };
        let stmts = &f.body.as_ref().expect("body").stmts;
        let StmtKind::Decl(inner) = &stmts[2].kind else {
            panic!("Expected declaration, got {:?}", stmts[2].kind);
        };
        assert_eq!(enum_values(inner), vec![None]);
        assert_eq!(enum_values(&output.program.items[2]), vec![Some(101), None]);
    }

    #[test]
    fn test_typedef_registers_type_name() {
        let output = parse_c("typedef unsigned long ulong;\nulong *p, q;\n");
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        match &output.program.items[1] {
            Decl::Variable(var) => {
                assert_eq!(var.declarators.len(), 2);
                assert_eq!(var.declarators[0].ty.to_string(), "ulong*");
            }
            other => panic!("Expected variable, got {:?}", other),
        }
    }

    #[test]
    fn test_bitfields() {
        let output = parse_c("struct Flags { unsigned int ready : 1; unsigned int mode : 3; };");
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        let Decl::Record(record) = &output.program.items[0] else {
            panic!("Expected struct");
        };
        let members = record.members.as_ref().map(|m| m.len());
        assert_eq!(members, Some(2));
    }

    #[test]
    fn test_implicit_int_warns() {
        let output = parse_c("main() { return 0; }");
        assert!(!output.has_errors());
        assert_eq!(output.diagnostics.len(), 1);
        assert!(output.diagnostics[0].message.contains("defaults to 'int'"));
    }

    #[test]
    fn test_class_with_access_and_methods() {
        let source = "class Shape {\npublic:\n  Shape(double r) : radius(r) {}\n  \
                      virtual ~Shape() = default;\n  virtual double area() const = 0;\n\
                      private:\n  double radius;\n};";
        let output = parse_cpp(source);
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        let Decl::Record(record) = &output.program.items[0] else {
            panic!("Expected class");
        };
        let members = record.members.as_deref().unwrap_or_default();
        assert_eq!(members.len(), 4);
        assert_eq!(members[0].access, Access::Public);
        assert_eq!(members[3].access, Access::Private);
        match &members[2].decl {
            Decl::Function(f) => {
                assert!(f.method.is_pure);
                assert!(f.method.is_const);
                assert!(f.is_virtual());
            }
            other => panic!("Expected method, got {:?}", other),
        }
        match &members[0].decl {
            Decl::Function(f) => assert_eq!(f.initializers.len(), 1),
            other => panic!("Expected constructor, got {:?}", other),
        }
    }

    #[test]
    fn test_inheritance() {
        let output = parse_cpp("class Shape {};\nclass Circle final : public Shape { };");
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        let Decl::Record(record) = &output.program.items[1] else {
            panic!("Expected class");
        };
        assert!(record.is_final);
        assert_eq!(record.bases.len(), 1);
        assert_eq!(record.bases[0].access, Some(Access::Public));
    }

    #[test]
    fn test_template_class_and_use() {
        let source = "template <typename T>\nclass Box { T value; };\nBox<int> b;";
        let output = parse_cpp(source);
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        assert!(matches!(output.program.items[0], Decl::Template(_)));
        match &output.program.items[1] {
            Decl::Variable(var) => assert_eq!(var.specs.ty.to_string(), "Box<int>"),
            other => panic!("Expected variable, got {:?}", other),
        }
    }

    #[test]
    fn test_template_params_named_and_unnamed() {
        let source = "template <typename, int N = 4>\nstruct Grid { int cells[N]; };";
        let output = parse_cpp(source);
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        let Decl::Template(template) = &output.program.items[0] else {
            panic!("Expected template");
        };
        let names: Vec<Option<&str>> = template.params.iter().map(TemplateParam::name).collect();
        assert_eq!(names, vec![None, Some("N")]);
    }

    #[test]
    fn test_namespace_types_visible_qualified() {
        let source = "namespace geo { struct Point { int x; }; }\ngeo::Point origin;";
        let output = parse_cpp(source);
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        assert!(matches!(output.program.items[1], Decl::Variable(_)));
    }

    #[test]
    fn test_enum_class_with_underlying_type() {
        let output = parse_cpp("enum class Mode : unsigned char { Off, On = 4, Auto };");
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        let Decl::Enum(e) = &output.program.items[0] else {
            panic!("Expected enum");
        };
        assert!(e.scoped);
        assert!(e.underlying.is_some());
        let last = e.enumerators.as_ref().and_then(|v| v.last()).and_then(|en| en.discriminant);
        assert_eq!(last, Some(5));
    }

    #[test]
    fn test_direct_initialization() {
        let output = parse_cpp("struct P { P(int, int); };\nP p(1, 2);\nint v{3};");
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        match &output.program.items[1] {
            Decl::Variable(var) => {
                assert!(matches!(
                    var.declarators[0].init,
                    Some(Initializer::Direct(ref args)) if args.len() == 2
                ))
            }
            other => panic!("Expected variable, got {:?}", other),
        }
        match &output.program.items[2] {
            Decl::Variable(var) => {
                assert!(matches!(var.declarators[0].init, Some(Initializer::Brace(_))))
            }
            other => panic!("Expected variable, got {:?}", other),
        }
    }

    #[test]
    fn test_using_alias_and_static_assert() {
        let source =
            "using Id = unsigned long;\nstatic_assert(sizeof(Id) >= 4, \"too small\");\nId next;";
        let output = parse_cpp(source);
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        match &output.program.items[1] {
            Decl::StaticAssert(sa) => assert_eq!(sa.message.as_deref(), Some("too small")),
            other => panic!("Expected static_assert, got {:?}", other),
        }
        assert!(matches!(output.program.items[2], Decl::Variable(_)));
    }

    #[test]
    fn test_conflicting_type_specifiers() {
        let output = parse_c("int float x;");
        assert_eq!(output.error_count(), 1);
        assert!(output.diagnostics[0].message.contains("two or more data types"));
    }
}
