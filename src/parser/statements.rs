//! Statement parsing implementation
//!
//! This module handles parsing of all statement types:
//!
//! - Declarations inside blocks: `int x = 42;`, `Rectangle r;`
//! - Control flow: `if`, `while`, `for` (including C++ range-for),
//!   `do-while`, `switch`
//! - Jump statements: `return`, `break`, `continue`, `goto`
//! - Labels, compound statements and expression statements
//!
//! # Grammar
//!
//! ```text
//! statement ::= block | if_stmt | switch_stmt | while_stmt | do_while_stmt
//!             | for_stmt | goto_stmt | return_stmt | break_stmt
//!             | continue_stmt | label ":" | declaration | expr_stmt | ";"
//! ```
//!
//! A statement that starts like a type is first tried as a declaration. When
//! that fails and the start was an identifier, the parser rewinds and reads an
//! expression statement instead.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::diagnostics::DiagnosticKind;
use crate::parser::ast::*;
use crate::parser::declarations::DeclContext;
use crate::parser::declarators::DeclaratorMode;
use crate::parser::parse::{ParseError, Parser};
use crate::parser::scope::{NameKind, ScopeKind};
use crate::parser::token::{Keyword, Punct, TokenKind};

impl<'src> Parser<'src> {
    /// Parse a `{ ... }` block in its own scope. Statements that fail are
    /// reported and skipped, so a block only fails on a missing `{`.
    pub(crate) fn parse_block(&mut self) -> Result<Block, ParseError> {
        let start = self.current_start();
        self.expect_punct(Punct::LBrace, "Expected '{' to begin block")?;

        self.with_scope(ScopeKind::Block, None, |p| {
            let depth = p.stream.depth_at(0);
            let mut stmts = Vec::new();

            while !p.check_punct(Punct::RBrace) && !p.is_at_end() {
                let mark = p.stream.mark();
                match p.parse_statement() {
                    Ok(stmt) => stmts.push(stmt),
                    Err(err) => p.recover(err, mark, depth),
                }
            }
            // At end of input the unclosed '{' is reported by nesting tracking.
            p.match_punct(Punct::RBrace);

            Ok(Block {
                stmts,
                span: p.span_from(start),
            })
        })
    }

    /// Parse a statement
    pub(crate) fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        self.nested(|p| p.parse_statement_inner())
    }

    fn parse_statement_inner(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_start();

        match self.peek_kind(0) {
            TokenKind::Punct(Punct::LBrace) => {
                let block = self.parse_block()?;
                let span = block.span;
                Ok(Stmt::new(StmtKind::Block(block), span))
            }
            TokenKind::Punct(Punct::Semicolon) => {
                self.advance();
                Ok(Stmt::new(StmtKind::Empty, self.span_from(start)))
            }
            TokenKind::Keyword(Keyword::If) => self.parse_if_statement(),
            TokenKind::Keyword(Keyword::Switch) => self.parse_switch_statement(),
            TokenKind::Keyword(Keyword::While) => self.parse_while_statement(),
            TokenKind::Keyword(Keyword::Do) => self.parse_do_while_statement(),
            TokenKind::Keyword(Keyword::For) => self.parse_for_statement(),
            TokenKind::Keyword(Keyword::Return) => self.parse_return_statement(),
            TokenKind::Keyword(Keyword::Break) => {
                self.advance();
                self.expect_semicolon("after 'break'")?;
                Ok(Stmt::new(StmtKind::Break, self.span_from(start)))
            }
            TokenKind::Keyword(Keyword::Continue) => {
                self.advance();
                self.expect_semicolon("after 'continue'")?;
                Ok(Stmt::new(StmtKind::Continue, self.span_from(start)))
            }
            TokenKind::Keyword(Keyword::Goto) => {
                self.advance();
                let label = self.expect_identifier("after 'goto'")?;
                self.expect_semicolon("after 'goto'")?;
                Ok(Stmt::new(StmtKind::Goto(label), self.span_from(start)))
            }
            TokenKind::Keyword(kw @ (Keyword::Case | Keyword::Default)) => Err(ParseError::new(
                format!("'{}' label not within a switch statement", kw),
                self.stream.current_span(),
            )),
            TokenKind::Identifier if self.peek(1).is_punct(Punct::Colon) => {
                let label = self.advance().lexeme.to_string();
                self.advance();
                Ok(Stmt::new(StmtKind::Label(label), self.span_from(start)))
            }
            _ if self.is_declaration_start() => self.parse_declaration_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    /// Try a declaration; fall back to an expression statement when the
    /// statement began with an identifier that could also be an expression.
    fn parse_declaration_statement(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_start();
        let keyword_start = matches!(self.peek_kind(0), TokenKind::Keyword(_));
        let checkpoint = self.checkpoint();

        match self.parse_declaration(DeclContext::Block) {
            Ok(decl) => Ok(Stmt::new(StmtKind::Decl(Box::new(decl)), self.span_from(start))),
            Err(err) if keyword_start => Err(err),
            Err(decl_err) => {
                tracing::trace!(
                    reason = %decl_err.message,
                    "declaration attempt failed, trying expression"
                );
                self.restore(checkpoint);
                self.parse_expression_statement().map_err(|expr_err| {
                    // Report whichever reading got further.
                    if decl_err.span.start.offset > expr_err.span.start.offset {
                        decl_err
                    } else {
                        expr_err
                    }
                })
            }
        }
    }

    fn parse_expression_statement(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_start();
        let expr = self.parse_expression()?;
        self.expect_semicolon("after expression")?;
        Ok(Stmt::new(StmtKind::Expr(expr), self.span_from(start)))
    }

    /// Parse a return statement
    fn parse_return_statement(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_start();
        self.advance();

        let value = if self.check_punct(Punct::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_semicolon("after return")?;
        Ok(Stmt::new(StmtKind::Return(value), self.span_from(start)))
    }

    /// `( expression )` after `if`, `while` and `switch`.
    fn parse_condition(&mut self, keyword: &str) -> Result<Expr, ParseError> {
        self.expect_punct(Punct::LParen, &format!("Expected '(' after '{}'", keyword))?;
        let cond = self.grouped(|p| p.parse_expression())?;
        self.expect_punct(Punct::RParen, &format!("Expected ')' after {} condition", keyword))?;
        Ok(cond)
    }

    /// Parse an if statement. A trailing `else` belongs to the innermost `if`.
    fn parse_if_statement(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_start();
        self.advance();
        let cond = self.parse_condition("if")?;
        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.match_keyword(Keyword::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(Stmt::new(
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            },
            self.span_from(start),
        ))
    }

    fn parse_while_statement(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_start();
        self.advance();
        let cond = self.parse_condition("while")?;
        let body = Box::new(self.parse_statement()?);
        Ok(Stmt::new(StmtKind::While { cond, body }, self.span_from(start)))
    }

    fn parse_do_while_statement(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_start();
        self.advance();
        let body = Box::new(self.parse_statement()?);
        self.expect_keyword(Keyword::While, "Expected 'while' after do body")?;
        let cond = self.parse_condition("do-while")?;
        self.expect_semicolon("after do-while")?;
        Ok(Stmt::new(StmtKind::DoWhile { body, cond }, self.span_from(start)))
    }

    /// Parse a for statement: the classic three-clause form or, in C++,
    /// `for (decl : range)`.
    fn parse_for_statement(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_start();
        self.advance();
        self.expect_punct(Punct::LParen, "Expected '(' after 'for'")?;

        self.with_scope(ScopeKind::Block, None, |p| {
            if p.is_cpp() && p.is_declaration_start() {
                if let Some(var) = p.speculate("range-based for", |p| p.parse_range_for_head()) {
                    let range = if p.check_punct(Punct::LBrace) {
                        let (items, span) = p.parse_braced_init_list()?;
                        Expr::new(ExprKind::InitList(items), span)
                    } else {
                        p.grouped(|p| p.parse_expression())?
                    };
                    p.expect_punct(Punct::RParen, "Expected ')' after range expression")?;
                    let body = Box::new(p.parse_statement()?);
                    let kind = StmtKind::RangeFor { var, range, body };
                    return Ok(Stmt::new(kind, p.span_from(start)));
                }
            }

            let init = p.parse_for_init()?;
            let cond = if p.check_punct(Punct::Semicolon) {
                None
            } else {
                Some(p.grouped(|p| p.parse_expression())?)
            };
            p.expect_punct(Punct::Semicolon, "Expected ';' after for condition")?;
            let step = if p.check_punct(Punct::RParen) {
                None
            } else {
                Some(p.grouped(|p| p.parse_expression())?)
            };
            p.expect_punct(Punct::RParen, "Expected ')' after for clauses")?;
            let body = Box::new(p.parse_statement()?);

            Ok(Stmt::new(
                StmtKind::For {
                    init,
                    cond,
                    step,
                    body,
                },
                p.span_from(start),
            ))
        })
    }

    /// `const auto &item :` in a range-based for.
    fn parse_range_for_head(&mut self) -> Result<Param, ParseError> {
        let start = self.current_start();
        let parsed = self.parse_decl_specifiers(DeclContext::ForInit)?;
        if !parsed.has_type {
            return Err(self.error_here("Expected type in range-based for"));
        }
        let declarator = self.parse_declarator(DeclaratorMode::Named, false)?;
        let (name, ty) = declarator.apply(parsed.specs.ty);
        self.expect_punct(Punct::Colon, "Expected ':' in range-based for")?;
        let name = name.map(|n| n.last().to_string());
        if let Some(name) = &name {
            self.types.declare(name, NameKind::Ordinary);
        }
        Ok(Param {
            name,
            ty,
            default: None,
            span: self.span_from(start),
        })
    }

    /// The first clause of a for statement, including its `;`.
    fn parse_for_init(&mut self) -> Result<Option<ForInit>, ParseError> {
        if self.match_punct(Punct::Semicolon) {
            return Ok(None);
        }

        if self.is_declaration_start() {
            let keyword_start = matches!(self.peek_kind(0), TokenKind::Keyword(_));
            let checkpoint = self.checkpoint();
            match self.parse_declaration(DeclContext::ForInit) {
                Ok(decl) => {
                    self.expect_punct(Punct::Semicolon, "Expected ';' after for init")?;
                    return Ok(Some(ForInit::Decl(Box::new(decl))));
                }
                Err(err) if keyword_start => return Err(err),
                Err(err) => {
                    tracing::trace!(reason = %err.message, "for-init declaration attempt failed");
                    self.restore(checkpoint);
                }
            }
        }

        let expr = self.grouped(|p| p.parse_expression())?;
        self.expect_punct(Punct::Semicolon, "Expected ';' after for init")?;
        Ok(Some(ForInit::Expr(expr)))
    }

    /// Parse a switch statement. Statements accumulate under the most
    /// recent `case` or `default` label.
    fn parse_switch_statement(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_start();
        self.advance();
        let cond = self.parse_condition("switch")?;
        self.expect_punct(Punct::LBrace, "Expected '{' before switch body")?;

        let cases = self.with_scope(ScopeKind::Block, None, |p| {
            let depth = p.stream.depth_at(0);
            let mut cases: Vec<SwitchCase> = Vec::new();

            while !p.check_punct(Punct::RBrace) && !p.is_at_end() {
                let mark = p.stream.mark();
                if let Err(err) = p.parse_switch_item(&mut cases) {
                    p.recover(err, mark, depth);
                }
            }
            p.match_punct(Punct::RBrace);
            Ok(cases)
        })?;

        Ok(Stmt::new(StmtKind::Switch { cond, cases }, self.span_from(start)))
    }

    fn parse_switch_item(&mut self, cases: &mut Vec<SwitchCase>) -> Result<(), ParseError> {
        let start = self.current_start();

        if self.match_keyword(Keyword::Case) {
            let value = self.parse_conditional()?;
            self.expect_punct(Punct::Colon, "Expected ':' after case value")?;
            cases.push(SwitchCase::Case {
                value,
                body: Vec::new(),
                span: self.span_from(start),
            });
            return Ok(());
        }
        if self.match_keyword(Keyword::Default) {
            self.expect_punct(Punct::Colon, "Expected ':' after 'default'")?;
            cases.push(SwitchCase::Default {
                body: Vec::new(),
                span: self.span_from(start),
            });
            return Ok(());
        }

        let stmt = self.parse_statement()?;
        match cases.last_mut() {
            Some(SwitchCase::Case { body, span, .. })
            | Some(SwitchCase::Default { body, span }) => {
                *span = span.to(stmt.span);
                body.push(stmt);
            }
            None => self.diagnostics.warning(
                DiagnosticKind::Syntax,
                "statement before the first case label is unreachable",
                stmt.span,
            ),
        }
        Ok(())
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

    fn body_of(output: &ParseOutput) -> &[Stmt] {
        match &output.program.items[0] {
            Decl::Function(FunctionDecl { body: Some(body), .. }) => &body.stmts,
            other => panic!("Expected function definition, got {:?}", other),
        }
    }

    #[test]
    fn test_dangling_else_binds_inner() {
        let output = parse_c("void f(int a, int b) { if (a) if (b) a = 1; else a = 2; }");
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        match &body_of(&output)[0].kind {
            StmtKind::If {
                then_branch,
                else_branch,
                ..
            } => {
                assert!(else_branch.is_none());
                assert!(matches!(then_branch.kind, StmtKind::If { else_branch: Some(_), .. }));
            }
            other => panic!("Expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_switch_cases() {
        let source = "int f(int x) { switch (x) { case 1: x++; break; \
                      case 2: default: return 0; } return x; }";

        let output = parse_c(source);
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        match &body_of(&output)[0].kind {
            StmtKind::Switch { cases, .. } => {
                assert_eq!(cases.len(), 3);
                assert_eq!(cases[0].body().len(), 2);
                assert!(cases[1].body().is_empty());
                assert!(matches!(cases[2], SwitchCase::Default { .. }));
            }
            other => panic!("Expected switch, got {:?}", other),
        }
    }

    #[test]
    fn test_for_with_declaration() {
        let output = parse_c("void f(void) { for (int i = 0; i < 10; i++) { } }");
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        match &body_of(&output)[0].kind {
            StmtKind::For { init, cond, step, .. } => {
                assert!(matches!(init, Some(ForInit::Decl(_))));
                assert!(cond.is_some());
                assert!(step.is_some());
            }
            other => panic!("Expected for, got {:?}", other),
        }
    }

    #[test]
    fn test_goto_and_label() {
        let output = parse_c("void f(void) { goto done; done: return; }");
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        let kinds: Vec<&str> = body_of(&output).iter().map(|s| s.kind.name()).collect();
        assert_eq!(kinds, vec!["Goto", "Label", "Return"]);
    }

    #[test]
    fn test_typedef_name_shadowed_by_variable() {
        // After `int T;` in the block, `T * x` is a multiplication.
        let source = "typedef int T;\nvoid f(int x) { int T = 2; T * x; }";
        let output = parse_c(source);
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        let Decl::Function(FunctionDecl { body: Some(body), .. }) = &output.program.items[1] else {
            panic!("Expected function");
        };
        assert!(matches!(body.stmts[1].kind, StmtKind::Expr(_)));
    }

    #[test]
    fn test_error_in_block_recovers() {
        let output = parse_c("void f(void) { int a = ; a = 1; }\nint g;");
        assert_eq!(output.error_count(), 1);
        assert_eq!(output.program.items.len(), 2);
    }

    #[test]
    fn test_case_outside_switch() {
        let output = parse_c("void f(void) { case 1: ; }");
        assert_eq!(output.error_count(), 1);
        assert!(output.diagnostics[0].message.contains("not within a switch"));
    }

    #[test]
    fn test_range_for() {
        let source = "void f() { int xs[3]; for (const int &x : xs) { } }";
        let output = Parser::new(source, &ParseOptions::cpp()).parse_program();
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        assert!(matches!(body_of(&output)[1].kind, StmtKind::RangeFor { .. }));
    }
}
