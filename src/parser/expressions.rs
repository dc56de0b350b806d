//! Expression parsing implementation
//!
//! This module handles parsing of expressions using precedence climbing
//! for binary operators and recursive descent for other expression forms.
//!
//! # Supported Expressions
//!
//! - Literals: integers, floats, characters, strings (adjacent strings are
//!   concatenated), `true`/`false`/`nullptr`/`this`
//! - Qualified identifiers with template arguments: `std::max<int>`
//! - Binary operators: arithmetic, comparison, logical, bitwise, comma
//! - Unary operators: `-`, `+`, `!`, `~`, `&`, `*`, `++`, `--`
//! - Postfix: `[]`, `.`, `->`, `()`, `++`, `--`
//! - Ternary `? :` and (compound) assignment, both right-associative
//! - Casts: `(type)expr`, compound literals, C++ named casts and
//!   functional casts
//! - `sizeof`, `alignof`, brace initializer lists with designators
//! - C++ lambdas, `new` and `delete`
//!
//! # Precedence
//!
//! Binary operators use precedence climbing over the table in
//! [`binary_op`]. Assignment, the conditional operator and the comma operator
//! sit above it as their own productions.
//!
//! # Template arguments
//!
//! `<` after a known template name opens an argument list. Inside the list a
//! `>` ends the argument instead of comparing, and a `>>` that closes two
//! nested lists is split: the first list consumes the token and leaves one
//! pending `>` for the enclosing list.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::declarations::DeclContext;
use crate::parser::declarators::Declarator;
use crate::parser::parse::{ParseError, Parser};
use crate::parser::scope::{NameKind, ScopeKind};
use crate::parser::token::{Keyword, LiteralValue, Punct, TokenKind};

/// Binary operator and precedence for a token, higher binds tighter.
fn binary_op(kind: TokenKind) -> Option<(BinaryOp, u8)> {
    let TokenKind::Punct(punct) = kind else {
        return None;
    };
    let entry = match punct {
        Punct::OrOr => (BinaryOp::LogicalOr, 4),
        Punct::AndAnd => (BinaryOp::LogicalAnd, 5),
        Punct::Pipe => (BinaryOp::BitOr, 6),
        Punct::Caret => (BinaryOp::BitXor, 7),
        Punct::Amp => (BinaryOp::BitAnd, 8),
        Punct::EqEq => (BinaryOp::Eq, 9),
        Punct::NotEq => (BinaryOp::Ne, 9),
        Punct::Lt => (BinaryOp::Lt, 10),
        Punct::Gt => (BinaryOp::Gt, 10),
        Punct::Le => (BinaryOp::Le, 10),
        Punct::Ge => (BinaryOp::Ge, 10),
        Punct::Shl => (BinaryOp::Shl, 11),
        Punct::Shr => (BinaryOp::Shr, 11),
        Punct::Plus => (BinaryOp::Add, 12),
        Punct::Minus => (BinaryOp::Sub, 12),
        Punct::Star => (BinaryOp::Mul, 13),
        Punct::Slash => (BinaryOp::Div, 13),
        Punct::Percent => (BinaryOp::Mod, 13),
        _ => return None,
    };
    Some(entry)
}

fn assign_op(kind: TokenKind) -> Option<AssignOp> {
    let TokenKind::Punct(punct) = kind else {
        return None;
    };
    let op = match punct {
        Punct::Assign => AssignOp::Assign,
        Punct::PlusAssign => AssignOp::Add,
        Punct::MinusAssign => AssignOp::Sub,
        Punct::StarAssign => AssignOp::Mul,
        Punct::SlashAssign => AssignOp::Div,
        Punct::PercentAssign => AssignOp::Mod,
        Punct::ShlAssign => AssignOp::Shl,
        Punct::ShrAssign => AssignOp::Shr,
        Punct::AmpAssign => AssignOp::BitAnd,
        Punct::CaretAssign => AssignOp::BitXor,
        Punct::PipeAssign => AssignOp::BitOr,
        _ => return None,
    };
    Some(op)
}

fn is_builtin_type_keyword(kw: Keyword) -> bool {
    matches!(
        kw,
        Keyword::Void
            | Keyword::Bool
            | Keyword::Char
            | Keyword::Short
            | Keyword::Int
            | Keyword::Long
            | Keyword::Float
            | Keyword::Double
            | Keyword::Signed
            | Keyword::Unsigned
            | Keyword::WcharT
            | Keyword::Char16T
            | Keyword::Char32T
    )
}

impl<'src> Parser<'src> {
    // ===== Context helpers =====

    /// Run `f` where `>` compares again, e.g. inside parentheses.
    pub(crate) fn grouped<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        let saved = std::mem::replace(&mut self.in_template_args, false);
        let result = f(self);
        self.in_template_args = saved;
        result
    }

    /// Run `f` where `>` ends the current template argument.
    pub(crate) fn in_template_argument<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        let saved = std::mem::replace(&mut self.in_template_args, true);
        let result = f(self);
        self.in_template_args = saved;
        result
    }

    /// A `>` split off a `>>` is waiting to close the enclosing list.
    pub(crate) fn angle_pending(&self) -> bool {
        self.split_angles > 0
    }

    // ===== Expressions =====

    /// Parse expression (top-level entry point, includes the comma operator)
    pub(crate) fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_assignment()?;
        while !self.angle_pending() && self.match_punct(Punct::Comma) {
            let rhs = self.parse_assignment()?;
            let span = expr.span.to(rhs.span);
            expr = Expr::new(
                ExprKind::Binary {
                    op: BinaryOp::Comma,
                    lhs: Box::new(expr),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        Ok(expr)
    }

    /// Parse assignment or conditional (right-associative)
    pub(crate) fn parse_assignment(&mut self) -> Result<Expr, ParseError> {
        self.nested(|p| {
            let target = p.parse_conditional()?;
            if p.angle_pending() {
                return Ok(target);
            }
            let Some(op) = assign_op(p.peek_kind(0)) else {
                return Ok(target);
            };
            p.advance();

            let value = if p.is_cpp() && p.check_punct(Punct::LBrace) {
                let (items, span) = p.parse_braced_init_list()?;
                Expr::new(ExprKind::InitList(items), span)
            } else {
                p.parse_assignment()?
            };
            let span = target.span.to(value.span);
            Ok(Expr::new(
                ExprKind::Assign {
                    op,
                    target: Box::new(target),
                    value: Box::new(value),
                },
                span,
            ))
        })
    }

    /// Parse ternary conditional (right-associative)
    pub(crate) fn parse_conditional(&mut self) -> Result<Expr, ParseError> {
        let cond = self.parse_binary(4)?;
        if self.angle_pending() || !self.match_punct(Punct::Question) {
            return Ok(cond);
        }

        let then_expr = self.grouped(|p| p.parse_expression())?;
        self.expect_punct(Punct::Colon, "Expected ':' in conditional expression")?;
        let else_expr = if self.is_cpp() {
            self.parse_assignment()?
        } else {
            self.parse_conditional()?
        };

        let span = cond.span.to(else_expr.span);
        Ok(Expr::new(
            ExprKind::Ternary {
                cond: Box::new(cond),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
            span,
        ))
    }

    /// Precedence climbing over the binary operator table.
    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_cast()?;

        loop {
            if self.angle_pending() {
                break;
            }
            let kind = self.peek_kind(0);
            let Some((op, prec)) = binary_op(kind) else {
                break;
            };
            if prec < min_prec {
                break;
            }
            if self.in_template_args && matches!(kind, TokenKind::Punct(Punct::Gt | Punct::Shr)) {
                break;
            }
            self.advance();

            let rhs = self.parse_binary(prec + 1)?;
            let span = lhs.span.to(rhs.span);
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }

        Ok(lhs)
    }

    /// Parse a C-style cast or compound literal, falling back to a unary
    /// expression when the parenthesized part is not a type name.
    fn parse_cast(&mut self) -> Result<Expr, ParseError> {
        self.nested(|p| {
            if p.check_punct(Punct::LParen) && p.is_type_start_at(1) {
                let start = p.current_start();
                let parsed = p.speculate("cast", |p| {
                    p.advance();
                    let ty = p.grouped(|p| p.parse_type_name())?;
                    p.expect_punct(Punct::RParen, "Expected ')' after type name")?;
                    if !p.check_punct(Punct::LBrace) && !p.can_start_expression() {
                        return Err(p.error_here("Expected expression after cast"));
                    }
                    Ok(ty)
                });

                if let Some(ty) = parsed {
                    if p.check_punct(Punct::LBrace) {
                        let (items, _) = p.parse_braced_init_list()?;
                        let literal =
                            Expr::new(ExprKind::CompoundLiteral { ty, items }, p.span_from(start));
                        return p.parse_postfix_ops(literal);
                    }
                    let operand = p.parse_cast()?;
                    return Ok(Expr::new(
                        ExprKind::Cast {
                            style: CastStyle::C,
                            ty,
                            expr: Box::new(operand),
                        },
                        p.span_from(start),
                    ));
                }
            }
            p.parse_unary()
        })
    }

    fn can_start_expression(&mut self) -> bool {
        match self.peek_kind(0) {
            TokenKind::Identifier
            | TokenKind::IntLiteral
            | TokenKind::FloatLiteral
            | TokenKind::StringLiteral
            | TokenKind::CharLiteral
            | TokenKind::Error => true,
            TokenKind::Keyword(kw) => {
                is_builtin_type_keyword(kw)
                    || matches!(
                        kw,
                        Keyword::Sizeof
                            | Keyword::Alignof
                            | Keyword::True
                            | Keyword::False
                            | Keyword::Nullptr
                            | Keyword::This
                            | Keyword::New
                            | Keyword::Delete
                            | Keyword::StaticCast
                            | Keyword::DynamicCast
                            | Keyword::ConstCast
                            | Keyword::ReinterpretCast
                    )
            }
            TokenKind::Punct(p) => matches!(
                p,
                Punct::LParen
                    | Punct::PlusPlus
                    | Punct::MinusMinus
                    | Punct::Plus
                    | Punct::Minus
                    | Punct::Bang
                    | Punct::Tilde
                    | Punct::Star
                    | Punct::Amp
                    | Punct::ColonColon
                    | Punct::LBracket
            ),
            _ => false,
        }
    }

    /// Parse unary expression
    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let start = self.current_start();

        let op = match self.peek_kind(0) {
            TokenKind::Punct(Punct::Minus) => Some(UnaryOp::Neg),
            TokenKind::Punct(Punct::Plus) => Some(UnaryOp::Plus),
            TokenKind::Punct(Punct::Bang) => Some(UnaryOp::Not),
            TokenKind::Punct(Punct::Tilde) => Some(UnaryOp::BitNot),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.parse_cast()?;
            return Ok(Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                self.span_from(start),
            ));
        }

        match self.peek_kind(0) {
            TokenKind::Punct(punct @ (Punct::PlusPlus | Punct::MinusMinus)) => {
                self.advance();
                let operand = self.nested(|p| p.parse_unary())?;
                let op = if punct == Punct::PlusPlus {
                    UnaryOp::PreInc
                } else {
                    UnaryOp::PreDec
                };
                Ok(Expr::new(
                    ExprKind::Unary {
                        op,
                        operand: Box::new(operand),
                    },
                    self.span_from(start),
                ))
            }
            TokenKind::Punct(Punct::Amp) => {
                self.advance();
                let operand = self.parse_cast()?;
                Ok(Expr::new(ExprKind::AddressOf(Box::new(operand)), self.span_from(start)))
            }
            TokenKind::Punct(Punct::Star) => {
                self.advance();
                let operand = self.parse_cast()?;
                Ok(Expr::new(ExprKind::Dereference(Box::new(operand)), self.span_from(start)))
            }
            TokenKind::Keyword(Keyword::Sizeof) => self.parse_sizeof(),
            TokenKind::Keyword(Keyword::Alignof) => {
                self.advance();
                self.expect_punct(Punct::LParen, "Expected '(' after 'alignof'")?;
                let ty = self.grouped(|p| p.parse_type_name())?;
                self.expect_punct(Punct::RParen, "Expected ')' after type name")?;
                Ok(Expr::new(ExprKind::AlignofType(ty), self.span_from(start)))
            }
            TokenKind::Keyword(Keyword::New) => self.parse_new(),
            TokenKind::Keyword(Keyword::Delete) => {
                self.advance();
                let array =
                    self.check_punct(Punct::LBracket) && self.peek(1).is_punct(Punct::RBracket);
                if array {
                    self.advance();
                    self.advance();
                }
                let operand = self.parse_cast()?;
                Ok(Expr::new(
                    ExprKind::Delete {
                        operand: Box::new(operand),
                        array,
                    },
                    self.span_from(start),
                ))
            }
            _ => self.parse_postfix(),
        }
    }

    /// `sizeof(type)` or `sizeof expr`
    fn parse_sizeof(&mut self) -> Result<Expr, ParseError> {
        let start = self.current_start();
        self.advance();

        if self.check_punct(Punct::LParen) && self.is_type_start_at(1) {
            let ty = self.speculate("sizeof type", |p| {
                p.advance();
                let ty = p.grouped(|p| p.parse_type_name())?;
                p.expect_punct(Punct::RParen, "Expected ')' after type name")?;
                if p.check_punct(Punct::LBrace) {
                    return Err(p.error_here("compound literal in sizeof"));
                }
                Ok(ty)
            });
            if let Some(ty) = ty {
                return Ok(Expr::new(ExprKind::SizeofType(ty), self.span_from(start)));
            }
        }

        let operand = self.nested(|p| p.parse_unary())?;
        Ok(Expr::new(ExprKind::SizeofExpr(Box::new(operand)), self.span_from(start)))
    }

    /// `new T`, `new T(args)`, `new T{args}`, `new T[n]`
    fn parse_new(&mut self) -> Result<Expr, ParseError> {
        let start = self.current_start();
        self.advance();

        let parsed = self.parse_decl_specifiers(DeclContext::TypeName)?;
        if !parsed.has_type {
            return Err(self.error_here("Expected type after 'new'"));
        }
        let derivations = self.parse_pointer_ops();
        let (_, ty) = Declarator {
            name: None,
            derivations,
            span: Span::default(),
        }
        .apply(parsed.specs.ty);

        let array_size = if self.match_punct(Punct::LBracket) {
            let size = self.grouped(|p| p.parse_expression())?;
            self.expect_punct(Punct::RBracket, "Expected ']' after array size")?;
            Some(Box::new(size))
        } else {
            None
        };

        let args = if self.match_punct(Punct::LParen) {
            Some(self.parse_call_arguments()?)
        } else if self.check_punct(Punct::LBrace) {
            let (items, _) = self.parse_braced_init_list()?;
            Some(items.into_iter().map(|item| item.value).collect())
        } else {
            None
        };

        Ok(Expr::new(
            ExprKind::New { ty, array_size, args },
            self.span_from(start),
        ))
    }

    /// Parse postfix operators
    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_primary()?;
        self.parse_postfix_ops(expr)
    }

    fn parse_postfix_ops(&mut self, mut expr: Expr) -> Result<Expr, ParseError> {
        let start = expr.span.start;

        loop {
            if self.angle_pending() {
                break;
            }
            match self.peek_kind(0) {
                TokenKind::Punct(Punct::LBracket) => {
                    self.advance();
                    let index = self.grouped(|p| p.parse_expression())?;
                    self.expect_punct(Punct::RBracket, "Expected ']' after array index")?;
                    expr = Expr::new(
                        ExprKind::Index {
                            base: Box::new(expr),
                            index: Box::new(index),
                        },
                        self.span_from(start),
                    );
                }
                TokenKind::Punct(Punct::LParen) => {
                    self.advance();
                    let args = self.parse_call_arguments()?;
                    expr = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        self.span_from(start),
                    );
                }
                TokenKind::Punct(punct @ (Punct::Dot | Punct::Arrow)) => {
                    self.advance();
                    let member = if self.is_cpp() && self.match_punct(Punct::Tilde) {
                        format!("~{}", self.expect_identifier("after '~'")?)
                    } else {
                        let ctx = if punct == Punct::Dot { "after '.'" } else { "after '->'" };
                        self.expect_identifier(ctx)?
                    };
                    expr = Expr::new(
                        ExprKind::MemberAccess {
                            object: Box::new(expr),
                            member,
                            arrow: punct == Punct::Arrow,
                        },
                        self.span_from(start),
                    );
                }
                TokenKind::Punct(punct @ (Punct::PlusPlus | Punct::MinusMinus)) => {
                    self.advance();
                    let op = if punct == Punct::PlusPlus {
                        UnaryOp::PostInc
                    } else {
                        UnaryOp::PostDec
                    };
                    expr = Expr::new(
                        ExprKind::Unary {
                            op,
                            operand: Box::new(expr),
                        },
                        self.span_from(start),
                    );
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    /// Arguments after an opening `(`, through the closing `)`.
    pub(crate) fn parse_call_arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.grouped(|p| {
            let mut args = Vec::new();
            if p.match_punct(Punct::RParen) {
                return Ok(args);
            }
            loop {
                args.push(p.parse_assignment()?);
                if !p.match_punct(Punct::Comma) {
                    break;
                }
            }
            p.expect_punct(Punct::RParen, "Expected ')' after arguments")?;
            Ok(args)
        })
    }

    /// Parse primary expression
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let start = self.current_start();
        let token = self.peek(0).clone();

        match token.kind {
            TokenKind::IntLiteral => {
                self.advance();
                let value = match token.value {
                    Some(LiteralValue::Integer(v)) => v,
                    _ => 0,
                };
                Ok(Expr::new(
                    ExprKind::IntLiteral {
                        value,
                        text: token.lexeme.to_string(),
                    },
                    token.span,
                ))
            }
            TokenKind::FloatLiteral => {
                self.advance();
                let value = match token.value {
                    Some(LiteralValue::Float(v)) => v,
                    _ => 0.0,
                };
                Ok(Expr::new(
                    ExprKind::FloatLiteral {
                        value,
                        text: token.lexeme.to_string(),
                    },
                    token.span,
                ))
            }
            TokenKind::CharLiteral => {
                self.advance();
                let value = match token.value {
                    Some(LiteralValue::Char(v)) => v,
                    _ => 0,
                };
                Ok(Expr::new(
                    ExprKind::CharLiteral {
                        value,
                        text: token.lexeme.to_string(),
                    },
                    token.span,
                ))
            }
            TokenKind::StringLiteral => {
                let mut value = String::new();
                while self.peek_kind(0) == TokenKind::StringLiteral {
                    if let Some(LiteralValue::Str(part)) = &self.advance().value {
                        value.push_str(part);
                    }
                }
                Ok(Expr::new(ExprKind::StringLiteral { value }, self.span_from(start)))
            }
            // Already reported by the lexer.
            TokenKind::Error => {
                self.advance();
                Ok(Expr::new(ExprKind::Invalid, token.span))
            }
            TokenKind::Keyword(Keyword::True | Keyword::False) => {
                self.advance();
                let value = token.kind == TokenKind::Keyword(Keyword::True);
                Ok(Expr::new(ExprKind::BoolLiteral(value), token.span))
            }
            TokenKind::Keyword(Keyword::Nullptr) => {
                self.advance();
                Ok(Expr::new(ExprKind::Nullptr, token.span))
            }
            TokenKind::Keyword(Keyword::This) => {
                self.advance();
                Ok(Expr::new(ExprKind::This, token.span))
            }
            TokenKind::Keyword(
                kw @ (Keyword::StaticCast
                | Keyword::DynamicCast
                | Keyword::ConstCast
                | Keyword::ReinterpretCast),
            ) => self.parse_named_cast(kw),
            TokenKind::Keyword(kw) if self.is_cpp() && is_builtin_type_keyword(kw) => {
                // Functional cast: `double(x)`, `int{}`
                let parsed = self.parse_decl_specifiers(DeclContext::TypeName)?;
                self.parse_construct(parsed.specs.ty, start)
            }
            TokenKind::Punct(Punct::LParen) => {
                self.advance();
                let expr = self.grouped(|p| p.parse_expression())?;
                self.expect_punct(Punct::RParen, "Expected ')' after expression")?;
                Ok(Expr::new(expr.kind, self.span_from(start)))
            }
            TokenKind::Punct(Punct::LBrace) if self.is_cpp() => {
                let (items, span) = self.parse_braced_init_list()?;
                Ok(Expr::new(ExprKind::InitList(items), span))
            }
            TokenKind::Punct(Punct::LBracket) if self.is_cpp() => self.parse_lambda(),
            TokenKind::Identifier | TokenKind::Punct(Punct::ColonColon) => {
                let name = self.parse_qualified_name()?;
                let is_class = self.types.lookup_qualified(&name.path()) == Some(NameKind::Type);
                let opens_args = self.check_punct(Punct::LParen) || self.check_punct(Punct::LBrace);
                if self.is_cpp() && is_class && opens_args {
                    return self.parse_construct(Type::new(BaseType::Named(name)), start);
                }
                Ok(Expr::new(ExprKind::Identifier(name), self.span_from(start)))
            }
            _ => Err(self.error_here("Expected expression")),
        }
    }

    /// `T(args)` or `T{args}` after the type has been read.
    fn parse_construct(&mut self, ty: Type, start: Position) -> Result<Expr, ParseError> {
        let (args, braced) = if self.match_punct(Punct::LParen) {
            (self.parse_call_arguments()?, false)
        } else if self.check_punct(Punct::LBrace) {
            let (items, _) = self.parse_braced_init_list()?;
            (items.into_iter().map(|item| item.value).collect(), true)
        } else {
            return Err(self.error_here("Expected '(' or '{' after type name"));
        };
        Ok(Expr::new(ExprKind::Construct { ty, args, braced }, self.span_from(start)))
    }

    /// `static_cast<T>(expr)` and friends.
    fn parse_named_cast(&mut self, kw: Keyword) -> Result<Expr, ParseError> {
        let start = self.current_start();
        self.advance();
        let style = match kw {
            Keyword::DynamicCast => CastStyle::Dynamic,
            Keyword::ConstCast => CastStyle::Const,
            Keyword::ReinterpretCast => CastStyle::Reinterpret,
            _ => CastStyle::Static,
        };

        self.expect_punct(Punct::Lt, &format!("Expected '<' after '{}'", kw))?;
        self.template_arg_depth += 1;
        let ty = self.in_template_argument(|p| p.parse_type_name());
        self.template_arg_depth -= 1;
        let ty = ty?;
        self.expect_closing_angle("Expected '>' after cast type")?;

        self.expect_punct(Punct::LParen, &format!("Expected '(' after '{}<...>'", kw))?;
        let expr = self.grouped(|p| p.parse_expression())?;
        self.expect_punct(Punct::RParen, "Expected ')' after cast operand")?;

        Ok(Expr::new(
            ExprKind::Cast {
                style,
                ty,
                expr: Box::new(expr),
            },
            self.span_from(start),
        ))
    }

    // ===== Names and template arguments =====

    /// A possibly qualified name, with template arguments after known
    /// templates: `x`, `::count`, `std::vector<int>`, `Box<T>::get`.
    pub(crate) fn parse_qualified_name(&mut self) -> Result<QualifiedName, ParseError> {
        let global = self.is_cpp() && self.match_punct(Punct::ColonColon);
        let mut segments = Vec::new();
        let mut path = String::new();

        loop {
            let name = self.expect_identifier("in qualified name")?;
            if !path.is_empty() {
                path.push_str("::");
            }
            path.push_str(&name);

            let opens_args =
                self.is_cpp() && self.check_punct(Punct::Lt) && self.types.is_template(&path);
            let template_args = if opens_args {
                Some(self.parse_template_args()?)
            } else {
                None
            };
            segments.push(NameSegment { name, template_args });

            if self.is_cpp()
                && !self.angle_pending()
                && self.check_punct(Punct::ColonColon)
                && self.peek(1).is_identifier()
            {
                self.advance();
                continue;
            }
            break;
        }

        Ok(QualifiedName { global, segments })
    }

    /// `<...>` after a template name, including both angle brackets.
    pub(crate) fn parse_template_args(&mut self) -> Result<Vec<TemplateArg>, ParseError> {
        self.expect_punct(Punct::Lt, "Expected '<'")?;
        self.template_arg_depth += 1;
        let result = self.nested(|p| p.parse_template_arg_list());
        self.template_arg_depth -= 1;
        let args = result?;
        self.expect_closing_angle("Expected '>' after template arguments")?;
        Ok(args)
    }

    fn parse_template_arg_list(&mut self) -> Result<Vec<TemplateArg>, ParseError> {
        let mut args = Vec::new();
        if self.check_punct(Punct::Gt) {
            return Ok(args);
        }

        loop {
            let as_type = if self.is_type_start_at(0) {
                self.speculate("template type argument", |p| {
                    let ty = p.in_template_argument(|p| p.parse_type_name())?;
                    if p.at_template_arg_end() {
                        Ok(ty)
                    } else {
                        Err(p.error_here("Expected ',' or '>' after template argument"))
                    }
                })
            } else {
                None
            };
            let arg = match as_type {
                Some(ty) => TemplateArg::Type(ty),
                None => TemplateArg::Expr(self.in_template_argument(|p| p.parse_conditional())?),
            };
            args.push(arg);

            if self.angle_pending() || !self.match_punct(Punct::Comma) {
                return Ok(args);
            }
        }
    }

    fn at_template_arg_end(&mut self) -> bool {
        self.angle_pending()
            || matches!(
                self.peek_kind(0),
                TokenKind::Punct(Punct::Gt | Punct::Shr | Punct::Comma)
            )
    }

    /// Close a template argument or parameter list. A `>>` closes this list
    /// and leaves one `>` pending for the enclosing one.
    pub(crate) fn expect_closing_angle(&mut self, message: &str) -> Result<(), ParseError> {
        if self.split_angles > 0 {
            self.split_angles -= 1;
            return Ok(());
        }
        if self.match_punct(Punct::Gt) {
            return Ok(());
        }
        if self.template_arg_depth > 0 && self.check_punct(Punct::Shr) {
            self.advance();
            self.split_angles += 1;
            return Ok(());
        }
        Err(self.error_here(message))
    }

    // ===== Initializer lists and lambdas =====

    /// `{ 1, .y = 2, [3] = 4, {5}, }` including both braces.
    pub(crate) fn parse_braced_init_list(&mut self) -> Result<(Vec<InitItem>, Span), ParseError> {
        let start = self.current_start();
        self.expect_punct(Punct::LBrace, "Expected '{'")?;

        let items = self.grouped(|p| {
            let mut items = Vec::new();
            while !p.check_punct(Punct::RBrace) {
                let item_start = p.current_start();
                let mut designators = Vec::new();
                loop {
                    if p.check_punct(Punct::Dot) && p.peek(1).is_identifier() {
                        p.advance();
                        designators.push(Designator::Field(p.advance().lexeme.to_string()));
                    } else if !p.is_cpp() && p.match_punct(Punct::LBracket) {
                        let index = p.parse_conditional()?;
                        p.expect_punct(Punct::RBracket, "Expected ']' after designator index")?;
                        designators.push(Designator::Index(index));
                    } else {
                        break;
                    }
                }
                if !designators.is_empty() {
                    p.expect_punct(Punct::Assign, "Expected '=' after designator")?;
                }

                let value = if p.check_punct(Punct::LBrace) {
                    let (nested, span) = p.nested(|p| p.parse_braced_init_list())?;
                    Expr::new(ExprKind::InitList(nested), span)
                } else {
                    p.parse_assignment()?
                };
                items.push(InitItem {
                    designators,
                    value,
                    span: p.span_from(item_start),
                });

                if !p.match_punct(Punct::Comma) {
                    break;
                }
            }
            p.expect_punct(Punct::RBrace, "Expected '}' after initializer list")?;
            Ok(items)
        })?;

        Ok((items, self.span_from(start)))
    }

    /// `[captures](params) mutable -> T { body }`
    fn parse_lambda(&mut self) -> Result<Expr, ParseError> {
        let start = self.current_start();
        self.expect_punct(Punct::LBracket, "Expected '[' to begin lambda")?;

        let mut captures = Vec::new();
        while !self.check_punct(Punct::RBracket) {
            captures.push(self.parse_capture()?);
            if !self.match_punct(Punct::Comma) {
                break;
            }
        }
        self.expect_punct(Punct::RBracket, "Expected ']' after lambda captures")?;

        let params = if self.match_punct(Punct::LParen) {
            self.parse_parameter_list()?.0
        } else {
            Vec::new()
        };

        let mut is_mutable = false;
        loop {
            match self.peek_kind(0) {
                TokenKind::Keyword(Keyword::Mutable) => is_mutable = true,
                TokenKind::Keyword(Keyword::Constexpr) => {}
                TokenKind::Keyword(Keyword::Noexcept) => {
                    self.advance();
                    if self.check_punct(Punct::LParen) {
                        self.skip_balanced(Punct::LParen, Punct::RParen)?;
                    }
                    continue;
                }
                _ => break,
            }
            self.advance();
        }

        let return_type = if self.match_punct(Punct::Arrow) {
            Some(self.parse_type_name()?)
        } else {
            None
        };

        let saved = std::mem::replace(&mut self.template_context, 0);
        let body = self.with_scope(ScopeKind::Function, None, |p| {
            for param in &params {
                if let Some(name) = &param.name {
                    p.types.declare(name, NameKind::Ordinary);
                }
            }
            for capture in &captures {
                match capture {
                    Capture::Copy(name) | Capture::Ref(name) | Capture::Init { name, .. } => {
                        p.types.declare(name, NameKind::Ordinary)
                    }
                    _ => {}
                }
            }
            p.grouped(|p| p.parse_block())
        });
        self.template_context = saved;
        let body = body?;

        Ok(Expr::new(
            ExprKind::Lambda(Box::new(Lambda {
                captures,
                params,
                return_type,
                is_mutable,
                body,
            })),
            self.span_from(start),
        ))
    }

    fn parse_capture(&mut self) -> Result<Capture, ParseError> {
        match self.peek_kind(0) {
            TokenKind::Punct(Punct::Assign) => {
                self.advance();
                Ok(Capture::DefaultCopy)
            }
            TokenKind::Punct(Punct::Amp) if !self.peek(1).is_identifier() => {
                self.advance();
                Ok(Capture::DefaultRef)
            }
            TokenKind::Keyword(Keyword::This) => {
                self.advance();
                Ok(Capture::This)
            }
            TokenKind::Punct(Punct::Star) if self.peek(1).is_keyword(Keyword::This) => {
                self.advance();
                self.advance();
                Ok(Capture::This)
            }
            _ => {
                let by_ref = self.match_punct(Punct::Amp);
                let name = self.expect_identifier("in lambda capture")?;
                if self.match_punct(Punct::Assign) {
                    let init = self.parse_assignment()?;
                    return Ok(Capture::Init { name, by_ref, init });
                }
                Ok(if by_ref { Capture::Ref(name) } else { Capture::Copy(name) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ParseOptions;
    use crate::parser::ast::*;
    use crate::parser::parse::Parser;

    /// Parse `expr` as the right side of an assignment after `decls`.
    fn init_expr(decls: &str, expr: &str, options: &ParseOptions) -> Expr {
        let source = format!("{}\nvoid check(void) {{ result = {}; }}", decls, expr);
        let output = Parser::new(&source, options).parse_program();
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        let Some(Decl::Function(FunctionDecl {
            body: Some(body), ..
        })) = output.program.items.last()
        else {
            panic!("Expected the wrapping function");
        };
        match &body.stmts[0].kind {
            StmtKind::Expr(Expr {
                kind: ExprKind::Assign { value, .. },
                ..
            }) => (**value).clone(),
            other => panic!("Expected assignment, got {:?}", other),
        }
    }

    fn c_expr(expr: &str) -> Expr {
        init_expr("", expr, &ParseOptions::c())
    }

    #[test]
    fn test_precedence() {
        let expr = c_expr("1 + 2 * 3");
        match expr.kind {
            ExprKind::Binary { op: BinaryOp::Add, rhs, .. } => {
                assert!(matches!(rhs.kind, ExprKind::Binary { op: BinaryOp::Mul, .. }));
            }
            other => panic!("Expected addition, got {:?}", other),
        }
    }

    #[test]
    fn test_left_associative_subtraction() {
        let expr = c_expr("10 - 4 - 3");
        match expr.kind {
            ExprKind::Binary { op: BinaryOp::Sub, lhs, .. } => {
                assert!(matches!(lhs.kind, ExprKind::Binary { op: BinaryOp::Sub, .. }));
            }
            other => panic!("Expected subtraction, got {:?}", other),
        }
    }

    #[test]
    fn test_assignment_is_right_associative() {
        let expr = c_expr("a = b = 1");
        assert!(matches!(
            expr.kind,
            ExprKind::Assign { ref value, .. } if matches!(value.kind, ExprKind::Assign { .. })
        ));
    }

    #[test]
    fn test_cast_vs_parenthesized() {
        let cast = init_expr("typedef int T;", "(T)x", &ParseOptions::c());
        assert!(matches!(cast.kind, ExprKind::Cast { style: CastStyle::C, .. }));
        let paren = c_expr("(x) - 1");
        assert!(matches!(paren.kind, ExprKind::Binary { op: BinaryOp::Sub, .. }));
    }

    #[test]
    fn test_sizeof_forms() {
        assert!(matches!(c_expr("sizeof(int)").kind, ExprKind::SizeofType(_)));
        assert!(matches!(c_expr("sizeof x").kind, ExprKind::SizeofExpr(_)));
        assert!(matches!(c_expr("sizeof(x)").kind, ExprKind::SizeofExpr(_)));
    }

    #[test]
    fn test_compound_literal_and_designators() {
        let expr = init_expr(
            "struct P { int x, y; };",
            "(struct P){ .y = 2, .x = 1 }",
            &ParseOptions::c(),
        );
        match expr.kind {
            ExprKind::CompoundLiteral { items, .. } => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[0].designators, vec![Designator::Field("y".to_string())]);
            }
            other => panic!("Expected compound literal, got {:?}", other),
        }
    }

    #[test]
    fn test_postfix_chain() {
        let expr = c_expr("list->items[i].name");
        match expr.kind {
            ExprKind::MemberAccess { object, member, arrow } => {
                assert_eq!(member, "name");
                assert!(!arrow);
                assert!(matches!(object.kind, ExprKind::Index { .. }));
            }
            other => panic!("Expected member access, got {:?}", other),
        }
    }

    #[test]
    fn test_string_concatenation() {
        match c_expr("\"ab\" \"cd\"").kind {
            ExprKind::StringLiteral { value } => assert_eq!(value, "abcd"),
            other => panic!("Expected string, got {:?}", other),
        }
    }

    #[test]
    fn test_template_call_and_nested_close() {
        let expr = init_expr(
            "",
            "std::make_unique<std::vector<std::vector<int>>>(3)",
            &ParseOptions::cpp(),
        );
        match expr.kind {
            ExprKind::Call { callee, args } => {
                assert_eq!(args.len(), 1);
                match callee.kind {
                    ExprKind::Identifier(name) => {
                        assert_eq!(name.path(), "std::make_unique");
                        assert_eq!(
                            name.to_string(),
                            "std::make_unique<std::vector<std::vector<int>>>"
                        );
                    }
                    other => panic!("Expected identifier, got {:?}", other),
                }
            }
            other => panic!("Expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_less_than_is_comparison_for_non_templates() {
        let expr = init_expr("int a, b, c;", "a < b > c", &ParseOptions::cpp());
        assert!(matches!(expr.kind, ExprKind::Binary { op: BinaryOp::Gt, .. }));
    }

    #[test]
    fn test_lambda() {
        let lambda_source = "[&total, n](int x) mutable { return x + n; }";
        let expr = init_expr("", lambda_source, &ParseOptions::cpp());
        match expr.kind {
            ExprKind::Lambda(lambda) => {
                assert_eq!(
                    lambda.captures,
                    vec![Capture::Ref("total".to_string()), Capture::Copy("n".to_string())]
                );

                assert_eq!(lambda.params.len(), 1);
                assert!(lambda.is_mutable);
                assert_eq!(lambda.body.stmts.len(), 1);
            }
            other => panic!("Expected lambda, got {:?}", other),
        }
    }

    #[test]
    fn test_new_delete_and_named_cast() {
        let opts = ParseOptions::cpp();
        assert!(matches!(
            init_expr("", "new int[10]", &opts).kind,
            ExprKind::New { array_size: Some(_), .. }
        ));
        assert!(matches!(
            init_expr("", "static_cast<double>(n) / 2", &opts).kind,
            ExprKind::Binary { op: BinaryOp::Div, .. }
        ));
        let source = "void f(int *p) { delete[] p; }";
        let output = Parser::new(source, &opts).parse_program();
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    }

    #[test]
    fn test_ternary_nests_right() {
        match c_expr("a ? b : c ? d : e").kind {
            ExprKind::Ternary { else_expr, .. } => {
                assert!(matches!(else_expr.kind, ExprKind::Ternary { .. }))
            }
            other => panic!("Expected ternary, got {:?}", other),
        }
    }
}
