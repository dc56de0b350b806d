//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure:
//! the error type, token helpers, speculation checkpoints, error recovery and
//! the program entry point.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, helper methods, and coordination
//! - `declarations`: declaration specifiers, records, enums, functions,
//!   templates, namespaces
//! - `declarators`: declarators, parameters and type names
//! - `statements`: statements and blocks
//! - `expressions`: expressions with precedence climbing
//!
//! Parser methods are split across these files using `impl Parser` blocks.
//!
//! # Recovery
//!
//! Grammar violations surface as a [`ParseError`] returned with `?` up to the
//! nearest statement, member or top-level loop. There the error becomes a
//! diagnostic and the parser skips to a statement boundary, so a parse always
//! completes with a (possibly partial) [`Program`].

use crate::config::ParseOptions;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Recovery};
use crate::parser::ast::*;
use crate::parser::scope::{ScopeKind, TableMark, TypeNameTable};
use crate::parser::stream::{Mark, TokenStream};
use crate::parser::token::{Keyword, Punct, Token, TokenKind};

/// Remaining stack below which `nested` moves to a new stack segment.
const STACK_RED_ZONE: usize = 128 * 1024;
/// Size of each stack segment allocated by `nested`.
const STACK_SEGMENT: usize = 1024 * 1024;

/// Parser error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}:{}: {message}", .span.start.line, .span.start.column)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// Result of parsing one source unit.
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub program: Program,
    /// Lexical, nesting and syntax diagnostics ordered by position.
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }
}

/// Snapshot of all parser state that speculation can disturb.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Checkpoint {
    mark: Mark,
    table: TableMark,
    diagnostics: usize,
    split_angles: usize,
    template_arg_depth: usize,
    in_template_args: bool,
}

/// A qualified name found by looking ahead, without consuming tokens.
#[derive(Debug, Clone)]
pub(crate) struct ScannedName {
    /// `::`-joined identifiers, template arguments omitted.
    pub path: String,
    pub segments: Vec<String>,
    /// Number of tokens the name spans.
    pub len: usize,
}

/// Recursive descent parser for C and the C++ subset
pub struct Parser<'src> {
    pub(crate) stream: TokenStream<'src>,
    pub(crate) options: ParseOptions,
    pub(crate) types: TypeNameTable,
    pub(crate) diagnostics: Diagnostics,
    /// Current recursion depth, bounded by `options.max_depth`.
    pub(crate) depth: usize,
    /// `>` tokens still owed after a `>>` closed a nested template list.
    pub(crate) split_angles: usize,
    /// Number of template argument lists currently open.
    pub(crate) template_arg_depth: usize,
    /// `>` ends the current template argument instead of comparing.
    pub(crate) in_template_args: bool,
    /// Number of `template <...>` headers applying to the declaration being
    /// parsed.
    pub(crate) template_context: usize,
    /// Enclosing class names, innermost last.
    pub(crate) record_names: Vec<String>,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str, options: &ParseOptions) -> Self {
        let stream = TokenStream::new(source, options.profile, options.trivia);
        Self::from_stream(stream, options)
    }

    pub fn from_stream(stream: TokenStream<'src>, options: &ParseOptions) -> Self {
        Self {
            stream,
            options: *options,
            types: TypeNameTable::new(options.profile.is_cpp()),
            diagnostics: Diagnostics::new(),
            depth: 0,
            split_angles: 0,
            template_arg_depth: 0,
            in_template_args: false,
            template_context: 0,
            record_names: Vec::new(),
        }
    }

    /// Parse the whole unit. Never fails: problems are reported as
    /// diagnostics next to a best-effort program.
    pub fn parse_program(mut self) -> ParseOutput {
        let _span =
            tracing::debug_span!("parse_program", profile = %self.options.profile).entered();
        let mut items = Vec::new();

        while !self.is_at_end() {
            self.parse_external_item(&mut items);
        }

        let end = self.stream.current_span().end;
        let Parser {
            stream,
            diagnostics,
            ..
        } = self;
        let parts = stream.finish();

        let mut all = Diagnostics::new();
        all.extend(parts.lexical);
        all.extend(parts.nesting);
        all.extend(diagnostics);
        let diagnostics = all.into_sorted();
        tracing::debug!(
            items = items.len(),
            diagnostics = diagnostics.len(),
            "parse completed"
        );

        ParseOutput {
            program: Program {
                items,
                directives: parts.directives,
                comments: parts.comments,
                span: Span::new(Position::start(), end),
            },
            diagnostics,
        }
    }

    /// Parse one top-level item into `items`, recovering on error.
    pub(crate) fn parse_external_item(&mut self, items: &mut Vec<Decl>) {
        let mark = self.stream.mark();
        let depth = self.stream.depth_at(0);

        // extern "C" { ... }
        if self.check_keyword(Keyword::Extern)
            && self.peek_kind(1) == TokenKind::StringLiteral
            && self.peek(2).is_punct(Punct::LBrace)
        {
            self.advance();
            self.advance();
            self.advance();
            while !self.check_punct(Punct::RBrace) && !self.is_at_end() {
                self.parse_external_item(items);
            }
            if let Err(err) = self.expect_punct(Punct::RBrace, "Expected '}' after linkage block") {
                self.recover(err, mark, depth);
            }
            return;
        }

        match self.parse_external_declaration() {
            Ok(decl) => items.push(decl),
            Err(err) => self.recover(err, mark, depth),
        }
    }

    // ===== Token helpers =====

    pub(crate) fn peek(&mut self, k: usize) -> &Token<'src> {
        self.stream.peek(k)
    }

    pub(crate) fn peek_kind(&mut self, k: usize) -> TokenKind {
        self.stream.peek_kind(k)
    }

    pub(crate) fn advance(&mut self) -> Token<'src> {
        self.stream.advance()
    }

    pub(crate) fn is_at_end(&mut self) -> bool {
        self.stream.is_at_end()
    }

    pub(crate) fn is_cpp(&self) -> bool {
        self.options.profile.is_cpp()
    }

    pub(crate) fn check_punct(&mut self, punct: Punct) -> bool {
        self.peek(0).is_punct(punct)
    }

    pub(crate) fn check_keyword(&mut self, keyword: Keyword) -> bool {
        self.peek(0).is_keyword(keyword)
    }

    pub(crate) fn match_punct(&mut self, punct: Punct) -> bool {
        if self.check_punct(punct) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn match_keyword(&mut self, keyword: Keyword) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Identifier with the given spelling, e.g. the contextual `override`.
    pub(crate) fn check_contextual(&mut self, word: &str) -> bool {
        let token = self.peek(0);
        token.is_identifier() && token.lexeme == word
    }

    pub(crate) fn current_start(&mut self) -> Position {
        self.stream.current_span().start
    }

    /// Span from `start` to the end of the last consumed token.
    pub(crate) fn span_from(&self, start: Position) -> Span {
        let end = self.stream.previous_end();
        if end.offset < start.offset {
            Span::point(start)
        } else {
            Span::new(start, end)
        }
    }

    pub(crate) fn error_here(&mut self, message: &str) -> ParseError {
        let token = self.peek(0);
        let found = token.describe();
        let span = token.span;
        ParseError::new(format!("{}, found {}", message, found), span)
    }

    pub(crate) fn expect_punct(&mut self, punct: Punct, message: &str) -> Result<Span, ParseError> {
        if self.check_punct(punct) {
            Ok(self.advance().span)
        } else {
            Err(self.error_here(message))
        }
    }

    pub(crate) fn expect_keyword(
        &mut self,
        keyword: Keyword,
        message: &str,
    ) -> Result<(), ParseError> {
        if self.match_keyword(keyword) {
            Ok(())
        } else {
            Err(self.error_here(message))
        }
    }

    /// Expect a statement-terminating `;`. A missing `;` directly after a
    /// malformed token is accepted silently, since the lexer already reported
    /// the token and it usually swallowed the terminator.
    pub(crate) fn expect_semicolon(&mut self, ctx: &str) -> Result<(), ParseError> {
        if self.match_punct(Punct::Semicolon) {
            return Ok(());
        }
        if self.previous_was_error_token() {
            return Ok(());
        }
        Err(self.error_here(&format!("Expected ';' {ctx}")))
    }

    pub(crate) fn expect_identifier(&mut self, ctx: &str) -> Result<String, ParseError> {
        if self.peek(0).is_identifier() {
            Ok(self.advance().lexeme.to_string())
        } else {
            Err(self.error_here(&format!("Expected identifier {ctx}")))
        }
    }

    fn previous_was_error_token(&self) -> bool {
        self.stream.previous_kind() == Some(TokenKind::Error)
    }

    // ===== Speculation =====

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            mark: self.stream.mark(),
            table: self.types.mark(),
            diagnostics: self.diagnostics.len(),
            split_angles: self.split_angles,
            template_arg_depth: self.template_arg_depth,
            in_template_args: self.in_template_args,
        }
    }

    pub(crate) fn restore(&mut self, checkpoint: Checkpoint) {
        self.stream.reset(checkpoint.mark);
        self.types.reset(checkpoint.table);
        self.diagnostics.truncate(checkpoint.diagnostics);
        self.split_angles = checkpoint.split_angles;
        self.template_arg_depth = checkpoint.template_arg_depth;
        self.in_template_args = checkpoint.in_template_args;
    }

    /// Run `f`; on failure rewind everything it did and return `None`.
    pub(crate) fn speculate<T>(
        &mut self,
        what: &'static str,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Option<T> {
        let checkpoint = self.checkpoint();
        match f(self) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::trace!(what, reason = %err.message, "speculation failed");
                self.restore(checkpoint);
                None
            }
        }
    }

    /// Guard a recursive production against pathological nesting. Within
    /// the depth limit the stack is grown on demand, so deep input parses the
    /// same on a small worker-thread stack as on the main thread.
    pub(crate) fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        self.depth += 1;
        let result = if self.depth > self.options.max_depth {
            let span = self.stream.current_span();
            Err(ParseError::new(
                format!("nesting depth exceeds the limit of {}", self.options.max_depth),
                span,
            ))
        } else {
            stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || f(self))
        };
        self.depth -= 1;
        result
    }

    /// Run `f` inside a new type-name scope, popping it even when `f` fails.
    pub(crate) fn with_scope<T>(
        &mut self,
        kind: ScopeKind,
        name: Option<String>,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        self.types.push(kind, name);
        let result = f(self);
        self.types.pop();
        result
    }

    // ===== Error recovery =====

    /// Record `err` and skip to a statement boundary at nesting depth
    /// `depth`: past a `;` at that depth, past a `}` closing a block opened
    /// while skipping, or up to the `}` that closes the enclosing block.
    pub(crate) fn recover(&mut self, err: ParseError, start: Mark, depth: usize) {
        let suppressed = self.previous_was_error_token() || self.peek_kind(0) == TokenKind::Error;
        let mut skipped = 0usize;

        loop {
            let token_depth = self.stream.depth_at(0);
            let kind = self.peek_kind(0);
            if kind == TokenKind::Eof || token_depth < depth {
                break;
            }
            if kind == TokenKind::Punct(Punct::RBrace) {
                if token_depth == depth {
                    break;
                }
                if token_depth == depth + 1 {
                    self.advance();
                    skipped += 1;
                    break;
                }
            }
            if kind == TokenKind::Punct(Punct::Semicolon) && token_depth == depth {
                self.advance();
                skipped += 1;
                break;
            }
            self.advance();
            skipped += 1;
        }

        // A construct that fails on its very first token must still move on.
        if self.stream.consumed_since(start) == 0 && !self.is_at_end() {
            self.advance();
            skipped += 1;
        }

        let recovery = if self.is_at_end() && skipped > 0 {
            Recovery::ClosedAtEof
        } else {
            Recovery::SkippedTokens(skipped)
        };
        tracing::debug!(message = %err.message, skipped, suppressed, "recovered");
        if !suppressed {
            let diagnostic = Diagnostic::error(DiagnosticKind::Syntax, err.message, err.span);
            self.diagnostics.push(diagnostic.with_recovery(recovery));
        }
    }

    // ===== Lookahead classification =====

    /// Scan a possibly qualified name starting `k` tokens ahead, skipping
    /// template argument lists after known templates.
    pub(crate) fn scan_qualified_name(&mut self, k: usize) -> Option<ScannedName> {
        let mut i = k;
        let mut path = String::new();
        let mut segments = Vec::new();

        if self.peek(i).is_punct(Punct::ColonColon) {
            path.push_str("::");
            i += 1;
        }
        loop {
            let token = self.peek(i);
            if !token.is_identifier() {
                return None;
            }
            let name = token.lexeme.to_string();
            if !segments.is_empty() {
                path.push_str("::");
            }
            path.push_str(&name);
            segments.push(name);
            i += 1;

            if self.peek(i).is_punct(Punct::Lt) && self.is_cpp() && self.types.is_template(&path) {
                i = self.skip_angle_brackets(i)?;
            }
            if self.peek(i).is_punct(Punct::ColonColon) && self.peek(i + 1).is_identifier() {
                i += 1;
                continue;
            }
            break;
        }
        Some(ScannedName {
            path,
            segments,
            len: i - k,
        })
    }

    /// Index just past the `>` matching the `<` at `i`.
    fn skip_angle_brackets(&mut self, mut i: usize) -> Option<usize> {
        let mut angles = 0i32;
        let mut parens = 0i32;
        loop {
            match self.peek_kind(i) {
                TokenKind::Punct(Punct::Lt) if parens == 0 => angles += 1,
                TokenKind::Punct(Punct::Gt) if parens == 0 => angles -= 1,
                TokenKind::Punct(Punct::Shr) if parens == 0 => angles -= 2,
                TokenKind::Punct(Punct::LParen) => parens += 1,
                TokenKind::Punct(Punct::RParen) => parens -= 1,
                TokenKind::Punct(Punct::Semicolon | Punct::LBrace | Punct::RBrace)
                | TokenKind::Eof => return None,
                _ => {}
            }
            i += 1;
            if angles <= 0 {
                return Some(i);
            }
        }
    }

    /// Does the token `k` ahead begin a type name?
    pub(crate) fn is_type_start_at(&mut self, k: usize) -> bool {
        match self.peek_kind(k) {
            TokenKind::Keyword(kw) => kw.starts_type(),
            TokenKind::Identifier | TokenKind::Punct(Punct::ColonColon) => self
                .scan_qualified_name(k)
                .is_some_and(|name| self.types.is_type(&name.path)),
            _ => false,
        }
    }

    /// Should a statement starting here be tried as a declaration?
    pub(crate) fn is_declaration_start(&mut self) -> bool {
        match self.peek_kind(0) {
            TokenKind::Keyword(
                Keyword::StaticAssert | Keyword::Using | Keyword::Namespace | Keyword::Template,
            ) => true,
            TokenKind::Punct(Punct::LBracket) => self.peek(1).is_punct(Punct::LBracket),
            _ => self.is_type_start_at(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParseOptions;

    fn parse_c(source: &str) -> ParseOutput {
        Parser::new(source, &ParseOptions::c()).parse_program()
    }

    #[test]
    fn test_parse_simple_function() {
        let output = parse_c("int main() { return 0; }");
        assert!(output.diagnostics.is_empty());
        assert_eq!(output.program.items.len(), 1);
        match &output.program.items[0] {
            Decl::Function(func) => {
                assert_eq!(func.name.to_string(), "main");
                assert!(func.params.is_empty());
                let int = BaseType::Int {
                    width: IntWidth::Int,
                    signed: true,
                };
                assert_eq!(func.return_type, Type::new(int));
                assert_eq!(func.body.as_ref().map(|b| b.stmts.len()), Some(1));
            }
            other => panic!("Expected function definition, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_input() {
        let output = parse_c("");
        assert!(output.program.items.is_empty());
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_recovery_continues_after_error() {
        let output = parse_c("int a = ;\nint b;\n");
        assert_eq!(output.error_count(), 1);
        assert!(output
            .program
            .items
            .iter()
            .any(|d| d.name().as_deref() == Some("b")));
    }

    #[test]
    fn test_stray_closing_brace() {
        let output = parse_c("} int x;");
        assert!(output.has_errors());
        assert_eq!(output.program.items.len(), 1);
    }

    #[test]
    fn test_depth_limit() {
        let source = format!("int x = {}1{};", "(".repeat(300), ")".repeat(300));
        let output = Parser::new(&source, &ParseOptions::c().with_max_depth(64)).parse_program();
        assert!(output
            .diagnostics
            .iter()
            .any(|d| d.message.contains("nesting depth exceeds")));
    }

    /// Parse with default options on a thread with a rayon-sized stack.
    fn parse_on_small_stack(source: String) -> ParseOutput {
        std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(move || parse_c(&source))
            .expect("spawn parser thread")
            .join()
            .expect("parser thread panicked")
    }

    #[test]
    fn test_deep_nesting_on_small_stack() {
        let parens = format!("int x = {}1{};", "(".repeat(100), ")".repeat(100));
        let output = parse_on_small_stack(parens);
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);

        let blocks = format!("void f(void) {{ {}{} }}", "{".repeat(200), "}".repeat(200));
        let output = parse_on_small_stack(blocks);
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);

        let negations = format!("int y = {}1;", "- ".repeat(200));
        let output = parse_on_small_stack(negations);
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);

        let records = format!("{}int v;{}", "struct S { ".repeat(100), " } s;".repeat(100));
        let output = parse_on_small_stack(records);
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    }

    #[test]
    fn test_default_depth_limit_on_small_stack() {
        let source = format!("int x = {}1{};\nint after;", "(".repeat(5000), ")".repeat(5000));
        let output = parse_on_small_stack(source);
        assert!(output
            .diagnostics
            .iter()
            .any(|d| d.message.contains("nesting depth exceeds the limit of 256")));
        assert!(output
            .program
            .items
            .iter()
            .any(|item| item.name().as_deref() == Some("after")));
    }

    #[test]
    fn test_diagnostics_sorted() {
        let output = parse_c("int a = @;\nint b = ;\n");
        let offsets: Vec<usize> = output.diagnostics.iter().map(|d| d.span.start.offset).collect();
        let mut sorted = offsets.clone();
        sorted.sort();
        assert_eq!(offsets, sorted);
    }
}
