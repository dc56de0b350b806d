//! Declarator parsing
//!
//! A declarator wraps the specifier type in pointer, reference, array and
//! function derivations. Derivations are collected while parsing and applied
//! inside-out afterwards, so `int (*fp)(int)` becomes a pointer to a function
//! returning `int`.
//!
//! ```text
//! declarator        ::= ptr_op* direct_declarator suffix*
//! ptr_op            ::= '*' cv* | '&' | '&&'
//! direct_declarator ::= name | '(' declarator ')'
//! suffix            ::= '[' expr? ']' | '(' parameter_list ')'
//! ```

use crate::parser::ast::*;
use crate::parser::declarations::DeclContext;
use crate::parser::parse::{ParseError, Parser};
use crate::parser::scope::{NameKind, ScopeKind};
use crate::parser::token::{Keyword, Punct, TokenKind};

/// One type derivation, in application order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Derivation {
    Pointer(Qualifiers),
    Reference { rvalue: bool },
    Array(Option<Expr>),
    Function { params: Vec<Param>, variadic: bool },
}

/// Whether a declarator must, may or must not name something.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeclaratorMode {
    /// Variables, functions, members
    Named,
    /// Type names in casts, `sizeof` and template arguments
    Abstract,
    /// Parameters
    Either,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Declarator {
    pub name: Option<QualifiedName>,
    pub derivations: Vec<Derivation>,
    pub span: Span,
}

impl Declarator {
    /// Wrap `base` in the derivations, innermost first.
    pub fn apply(self, base: Type) -> (Option<QualifiedName>, Type) {
        let ty = self
            .derivations
            .into_iter()
            .fold(base, |ty, derivation| match derivation {
                Derivation::Pointer(quals) => Type::Pointer {
                    pointee: Box::new(ty),
                    quals,
                },
                Derivation::Reference { rvalue } => Type::Reference {
                    referent: Box::new(ty),
                    rvalue,
                },
                Derivation::Array(size) => ty.with_array(size),
                Derivation::Function { params, variadic } => Type::Function {
                    ret: Box::new(ty),
                    params,
                    variadic,
                },
            });
        (self.name, ty)
    }
}

impl<'src> Parser<'src> {
    /// Parse a declarator. With `direct_init`, a `(` after the name that does
    /// not look like a parameter list is left for the caller as a C++ direct
    /// initializer.
    pub(crate) fn parse_declarator(
        &mut self,
        mode: DeclaratorMode,
        direct_init: bool,
    ) -> Result<Declarator, ParseError> {
        self.nested(|p| p.parse_declarator_inner(mode, direct_init))
    }

    fn parse_declarator_inner(
        &mut self,
        mode: DeclaratorMode,
        direct_init: bool,
    ) -> Result<Declarator, ParseError> {
        let start = self.current_start();
        let mut derivations = self.parse_pointer_ops();

        let mut name = None;
        let mut inner = Vec::new();
        let pending = self.angle_pending();
        if !pending
            && self.check_punct(Punct::LParen)
            && self.paren_starts_nested_declarator(mode)
        {
            self.advance();
            let nested = self.parse_declarator(mode, false)?;
            self.expect_punct(Punct::RParen, "Expected ')' after nested declarator")?;
            name = nested.name;
            inner = nested.derivations;
        } else if !pending && mode != DeclaratorMode::Abstract && self.is_declarator_name_start() {
            name = Some(self.parse_declarator_name()?);
        } else if mode == DeclaratorMode::Named {
            return Err(self.error_here("Expected identifier or '(' in declarator"));
        }

        let mut suffixes = Vec::new();
        loop {
            if self.angle_pending() {
                break;
            } else if self.match_punct(Punct::LBracket) {
                let size = if self.check_punct(Punct::RBracket) {
                    None
                } else {
                    Some(self.grouped(|p| p.parse_assignment())?)
                };
                self.expect_punct(Punct::RBracket, "Expected ']' after array size")?;
                suffixes.push(Derivation::Array(size));
            } else if self.check_punct(Punct::LParen) {
                if direct_init
                    && self.is_cpp()
                    && name.is_some()
                    && inner.is_empty()
                    && suffixes.is_empty()
                    && !self.paren_starts_parameters()
                {
                    break;
                }
                self.advance();
                let (params, variadic) = self.parse_parameter_list()?;
                suffixes.push(Derivation::Function { params, variadic });
            } else {
                break;
            }
        }

        derivations.extend(suffixes.into_iter().rev());
        derivations.extend(inner);
        Ok(Declarator {
            name,
            derivations,
            span: self.span_from(start),
        })
    }

    /// `*`, `* const`, and in C++ `&` / `&&`.
    pub(crate) fn parse_pointer_ops(&mut self) -> Vec<Derivation> {
        let mut ops = Vec::new();
        loop {
            if self.angle_pending() {
                return ops;
            } else if self.match_punct(Punct::Star) {
                ops.push(Derivation::Pointer(self.parse_cv_qualifiers()));
            } else if self.is_cpp() && self.match_punct(Punct::Amp) {
                ops.push(Derivation::Reference { rvalue: false });
            } else if self.is_cpp() && self.match_punct(Punct::AndAnd) {
                ops.push(Derivation::Reference { rvalue: true });
            } else {
                return ops;
            }
        }
    }

    pub(crate) fn parse_cv_qualifiers(&mut self) -> Qualifiers {
        let mut quals = Qualifiers::default();
        loop {
            match self.peek_kind(0) {
                TokenKind::Keyword(Keyword::Const) => quals.is_const = true,
                TokenKind::Keyword(Keyword::Volatile) => quals.is_volatile = true,
                TokenKind::Keyword(Keyword::Restrict) => quals.is_restrict = true,
                TokenKind::Keyword(Keyword::Atomic) => {}
                TokenKind::Identifier if self.peek(0).lexeme == "__restrict" => {
                    quals.is_restrict = true
                }
                _ => return quals,
            }
            self.advance();
        }
    }

    /// At `(`: does it open a parenthesized declarator rather than a
    /// parameter list?
    fn paren_starts_nested_declarator(&mut self, mode: DeclaratorMode) -> bool {
        match self.peek_kind(1) {
            TokenKind::Punct(Punct::Star | Punct::Caret) => true,
            TokenKind::Punct(Punct::Amp | Punct::AndAnd) => self.is_cpp(),
            TokenKind::Punct(Punct::LParen) => mode == DeclaratorMode::Named,
            TokenKind::Identifier | TokenKind::Punct(Punct::ColonColon) => match mode {
                DeclaratorMode::Named => true,
                DeclaratorMode::Abstract => false,
                DeclaratorMode::Either => !self.is_type_start_at(1),
            },
            TokenKind::Punct(Punct::Tilde) | TokenKind::Keyword(Keyword::Operator) => {
                mode != DeclaratorMode::Abstract
            }
            _ => false,
        }
    }

    /// At `(` after a declarator name: a parameter list (as opposed to a
    /// direct initializer) starts with `)`, `...` or a type.
    fn paren_starts_parameters(&mut self) -> bool {
        matches!(
            self.peek_kind(1),
            TokenKind::Punct(Punct::RParen | Punct::Ellipsis)
        ) || self.is_type_start_at(1)
    }

    fn is_declarator_name_start(&mut self) -> bool {
        match self.peek_kind(0) {
            TokenKind::Identifier => true,
            TokenKind::Punct(Punct::ColonColon) => self.is_cpp(),
            TokenKind::Punct(Punct::Tilde) => self.is_cpp() && self.peek(1).is_identifier(),
            TokenKind::Keyword(Keyword::Operator) => true,
            _ => false,
        }
    }

    /// `x`, `Shape::area`, `~Shape`, `operator==`, `Box<T>::get`.
    pub(crate) fn parse_declarator_name(&mut self) -> Result<QualifiedName, ParseError> {
        let global = self.is_cpp() && self.match_punct(Punct::ColonColon);
        let mut segments: Vec<NameSegment> = Vec::new();
        let mut path = String::new();

        loop {
            let name = if self.is_cpp() && self.check_punct(Punct::Tilde) {
                self.advance();
                format!("~{}", self.expect_identifier("after '~'")?)
            } else if self.check_keyword(Keyword::Operator) {
                self.parse_operator_name()?
            } else {
                self.expect_identifier("in declarator")?
            };
            if !path.is_empty() {
                path.push_str("::");
            }
            path.push_str(&name);

            let template_args = if self.is_cpp()
                && self.check_punct(Punct::Lt)
                && self.types.is_template(&path)
            {
                Some(self.parse_template_args()?)
            } else {
                None
            };
            let is_terminal = name.starts_with('~') || name.starts_with("operator");
            segments.push(NameSegment {
                name,
                template_args,
            });

            if is_terminal || !self.is_cpp() || !self.check_punct(Punct::ColonColon) {
                break;
            }
            match self.peek_kind(1) {
                TokenKind::Identifier
                | TokenKind::Punct(Punct::Tilde)
                | TokenKind::Keyword(Keyword::Operator) => {
                    self.advance();
                }
                _ => break,
            }
        }

        Ok(QualifiedName { global, segments })
    }

    /// `operator+`, `operator()`, `operator[]`, `operator new`, `operator bool`.
    fn parse_operator_name(&mut self) -> Result<String, ParseError> {
        self.expect_keyword(Keyword::Operator, "Expected 'operator'")?;
        let token = self.peek(0).clone();
        match token.kind {
            TokenKind::Punct(Punct::LParen) => {
                self.advance();
                self.expect_punct(Punct::RParen, "Expected ')' after 'operator('")?;
                Ok("operator()".to_string())
            }
            TokenKind::Punct(Punct::LBracket) => {
                self.advance();
                self.expect_punct(Punct::RBracket, "Expected ']' after 'operator['")?;
                Ok("operator[]".to_string())
            }
            TokenKind::Punct(p) if p.is_operator() || p == Punct::Comma => {
                self.advance();
                Ok(format!("operator{}", p))
            }
            TokenKind::Keyword(kw @ (Keyword::New | Keyword::Delete)) => {
                self.advance();
                if self.match_punct(Punct::LBracket) {
                    self.expect_punct(Punct::RBracket, "Expected ']' in operator name")?;
                    Ok(format!("operator {}[]", kw))
                } else {
                    Ok(format!("operator {}", kw))
                }
            }
            _ => {
                // Conversion function: `operator bool`, `operator const char*`
                let parsed = self.parse_decl_specifiers(DeclContext::TypeName)?;
                if !parsed.has_type {
                    return Err(self.error_here("Expected operator or type after 'operator'"));
                }
                let mut ty = parsed.specs.ty;
                for op in self.parse_pointer_ops() {
                    ty = Declarator {
                        name: None,
                        derivations: vec![op],
                        span: Span::default(),
                    }
                    .apply(ty)
                    .1;
                }
                Ok(format!("operator {}", ty))
            }
        }
    }

    /// Parameter list after the opening `(`, through the closing `)`.
    pub(crate) fn parse_parameter_list(&mut self) -> Result<(Vec<Param>, bool), ParseError> {
        self.with_scope(ScopeKind::Function, None, |p| {
            let mut params = Vec::new();
            let mut variadic = false;

            if p.match_punct(Punct::RParen) {
                return Ok((params, variadic));
            }
            if p.check_keyword(Keyword::Void) && p.peek(1).is_punct(Punct::RParen) {
                p.advance();
                p.advance();
                return Ok((params, variadic));
            }

            loop {
                if p.match_punct(Punct::Ellipsis) {
                    variadic = true;
                    break;
                }
                params.push(p.parse_parameter()?);
                if !p.match_punct(Punct::Comma) {
                    break;
                }
            }
            p.expect_punct(Punct::RParen, "Expected ')' after parameters")?;
            Ok((params, variadic))
        })
    }

    pub(crate) fn parse_parameter(&mut self) -> Result<Param, ParseError> {
        let start = self.current_start();
        let parsed = self.parse_decl_specifiers(DeclContext::Param)?;
        if !parsed.has_type {
            return Err(self.error_here("Expected parameter type"));
        }
        let declarator = self.parse_declarator(DeclaratorMode::Either, false)?;
        let (name, ty) = declarator.apply(parsed.specs.ty);

        let default = if self.is_cpp() && self.match_punct(Punct::Assign) {
            Some(self.parse_assignment()?)
        } else {
            None
        };

        let name = name.map(|n| n.last().to_string());
        if let Some(name) = &name {
            self.types.declare(name, NameKind::Ordinary);
        }
        Ok(Param {
            name,
            ty,
            default,
            span: self.span_from(start),
        })
    }

    /// A type name: specifiers plus an abstract declarator, as in casts,
    /// `sizeof` and template arguments.
    pub(crate) fn parse_type_name(&mut self) -> Result<Type, ParseError> {
        let parsed = self.parse_decl_specifiers(DeclContext::TypeName)?;
        if !parsed.has_type {
            return Err(self.error_here("Expected type name"));
        }
        let declarator = self.parse_declarator(DeclaratorMode::Abstract, false)?;
        Ok(declarator.apply(parsed.specs.ty).1)
    }
}
