//! Buffered token stream with lookahead and backtracking
//!
//! Significant tokens are pulled lazily from the [`Lexer`] and retained, so a
//! [`Mark`] is just a buffer index and [`TokenStream::reset`] never re-lexes.
//! Delimiter nesting is tracked as tokens enter the buffer, which keeps
//! nesting diagnostics independent of how often the parser backtracks.

use super::ast::{Comment, Directive, Position, Span};
use super::lexer::Lexer;
use super::token::{Punct, Token, TokenKind};
use crate::config::{LanguageProfile, TriviaMode};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Recovery};

/// Saved stream position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Mark(usize);

pub struct TokenStream<'src> {
    lexer: Lexer<'src>,
    trivia: TriviaMode,
    buffer: Vec<Token<'src>>,
    /// Delimiter depth before each buffered token.
    depths: Vec<usize>,
    cursor: usize,
    /// Currently open delimiters.
    open: Vec<(Punct, Span)>,
    nesting: Diagnostics,
    directives: Vec<Directive>,
    comments: Vec<Comment>,
    reached_eof: bool,
}

/// Everything the stream collected besides the tokens themselves.
pub struct StreamParts {
    pub directives: Vec<Directive>,
    pub comments: Vec<Comment>,
    pub lexical: Diagnostics,
    pub nesting: Diagnostics,
}

impl<'src> TokenStream<'src> {
    pub fn new(source: &'src str, profile: LanguageProfile, trivia: TriviaMode) -> Self {
        Self::from_lexer(Lexer::new(source, profile), trivia)
    }

    pub fn from_lexer(lexer: Lexer<'src>, trivia: TriviaMode) -> Self {
        Self {
            lexer,
            trivia,
            buffer: Vec::new(),
            depths: Vec::new(),
            cursor: 0,
            open: Vec::new(),
            nesting: Diagnostics::new(),
            directives: Vec::new(),
            comments: Vec::new(),
            reached_eof: false,
        }
    }

    pub fn profile(&self) -> LanguageProfile {
        self.lexer.profile()
    }

    pub fn source(&self) -> &'src str {
        self.lexer.source()
    }

    /// Pull the next significant token from the lexer into the buffer.
    fn fill_one(&mut self) -> bool {
        if self.reached_eof {
            return false;
        }
        let mut pending = Vec::new();
        while let Some(token) = self.lexer.next_token() {
            if token.is_trivia() {
                self.record_trivia(&token);
                if self.trivia != TriviaMode::Discard {
                    pending.push(token);
                }
                continue;
            }

            let mut token = token;
            token.leading_trivia = pending;
            let depth = self.open.len();
            self.track_nesting(&token);
            if token.is_eof() {
                self.reached_eof = true;
            }
            self.buffer.push(token);
            self.depths.push(depth);
            return true;
        }
        self.reached_eof = true;
        false
    }

    fn record_trivia(&mut self, token: &Token<'src>) {
        match token.kind {
            TokenKind::Directive => self.directives.push(Directive {
                text: token.lexeme.to_string(),
                span: token.span,
            }),
            TokenKind::Comment if self.trivia != TriviaMode::Discard => {
                self.comments.push(Comment {
                    text: token.lexeme.to_string(),
                    span: token.span,
                })
            }
            _ => {}
        }
    }

    fn track_nesting(&mut self, token: &Token<'src>) {
        match token.kind {
            TokenKind::Punct(p @ (Punct::LParen | Punct::LBracket | Punct::LBrace)) => {
                self.open.push((p, token.span));
            }
            TokenKind::Punct(p @ (Punct::RParen | Punct::RBracket | Punct::RBrace)) => {
                let found = self
                    .open
                    .iter()
                    .rposition(|(opener, _)| opener.closer() == Some(p));
                match found {
                    Some(index) => {
                        while self.open.len() > index + 1 {
                            if let Some((opener, span)) = self.open.pop() {
                                self.nesting.push(
                                    Diagnostic::error(
                                        DiagnosticKind::Nesting,
                                        format!("'{}' is never closed", opener),
                                        span,
                                    )
                                    .with_recovery(Recovery::IgnoredDelimiter),
                                );
                            }
                        }
                        self.open.pop();
                    }
                    None => {
                        self.nesting.push(
                            Diagnostic::error(
                                DiagnosticKind::Nesting,
                                format!("unmatched '{}'", p),
                                token.span,
                            )
                            .with_recovery(Recovery::IgnoredDelimiter),
                        );
                    }
                }
            }
            TokenKind::Eof => {
                for (opener, span) in self.open.drain(..) {
                    self.nesting.push(
                        Diagnostic::error(
                            DiagnosticKind::Nesting,
                            format!("'{}' is never closed", opener),
                            span,
                        )
                        .with_recovery(Recovery::ClosedAtEof),
                    );
                }
            }
            _ => {}
        }
    }

    fn ensure(&mut self, index: usize) {
        while self.buffer.len() <= index && self.fill_one() {}
    }

    fn clamp(&self, index: usize) -> usize {
        index.min(self.buffer.len().saturating_sub(1))
    }

    /// Token `k` positions ahead of the cursor (0 is the current token).
    /// Past the end this is the end-of-input token.
    pub fn peek(&mut self, k: usize) -> &Token<'src> {
        let index = self.cursor + k;
        self.ensure(index);
        let index = self.clamp(index);
        &self.buffer[index]
    }

    pub fn peek_kind(&mut self, k: usize) -> TokenKind {
        self.peek(k).kind
    }

    /// Delimiter depth before the token `k` positions ahead.
    pub fn depth_at(&mut self, k: usize) -> usize {
        let index = self.cursor + k;
        self.ensure(index);
        let index = self.clamp(index);
        self.depths.get(index).copied().unwrap_or(0)
    }

    /// Consume and return the current token. At end of input the cursor stays
    /// on the end-of-input token.
    pub fn advance(&mut self) -> Token<'src> {
        let token = self.peek(0).clone();
        if !token.is_eof() {
            self.cursor += 1;
        }
        token
    }

    pub fn is_at_end(&mut self) -> bool {
        self.peek(0).is_eof()
    }

    pub fn mark(&self) -> Mark {
        Mark(self.cursor)
    }

    pub fn reset(&mut self, mark: Mark) {
        self.cursor = mark.0;
    }

    /// Number of significant tokens consumed since `mark`.
    pub fn consumed_since(&self, mark: Mark) -> usize {
        self.cursor.saturating_sub(mark.0)
    }

    /// End of the most recently consumed token.
    pub fn previous_end(&self) -> Position {
        match self.cursor.checked_sub(1).and_then(|i| self.buffer.get(i)) {
            Some(token) => token.span.end,
            None => Position::start(),
        }
    }

    /// Kind of the most recently consumed token.
    pub fn previous_kind(&self) -> Option<TokenKind> {
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.buffer.get(i))
            .map(|token| token.kind)
    }

    /// Span of the current token.
    pub fn current_span(&mut self) -> Span {
        self.peek(0).span
    }

    /// Drain the lexer and hand back what was collected along the way.
    pub fn finish(mut self) -> StreamParts {
        while self.fill_one() {}
        StreamParts {
            directives: self.directives,
            comments: self.comments,
            lexical: self.lexer.take_diagnostics(),
            nesting: self.nesting,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(source: &str) -> TokenStream<'_> {
        TokenStream::new(source, LanguageProfile::C, TriviaMode::Discard)
    }

    #[test]
    fn test_peek_does_not_move() {
        let mut s = stream("a b c");
        assert_eq!(s.peek(2).lexeme, "c");
        assert_eq!(s.peek(0).lexeme, "a");
        assert_eq!(s.advance().lexeme, "a");
        assert_eq!(s.peek(0).lexeme, "b");
    }

    #[test]
    fn test_peek_past_end_is_eof() {
        let mut s = stream("x");
        assert!(s.peek(10).is_eof());
        s.advance();
        assert!(s.advance().is_eof());
        assert!(s.advance().is_eof());
    }

    #[test]
    fn test_mark_reset() {
        let mut s = stream("int x = 1;");
        let mark = s.mark();
        s.advance();
        s.advance();
        assert_eq!(s.consumed_since(mark), 2);
        s.reset(mark);
        assert_eq!(s.peek(0).lexeme, "int");
    }

    #[test]
    fn test_depth_tracking() {
        let mut s = stream("f(a[1]) { }");
        let depths: Vec<usize> = (0..9).map(|k| s.depth_at(k)).collect();
        // f ( a [ 1 ] ) { }
        assert_eq!(depths, vec![0, 0, 1, 1, 2, 2, 1, 0, 1]);
    }

    #[test]
    fn test_nesting_diagnostics() {
        let mut s = stream("{ ( ] }");
        while !s.is_at_end() {
            s.advance();
        }
        let parts = s.finish();
        let messages: Vec<String> = parts.nesting.iter().map(|d| d.message.clone()).collect();
        assert_eq!(messages, vec!["unmatched ']'", "'(' is never closed"]);
    }

    #[test]
    fn test_balanced_has_no_nesting_diagnostics() {
        let s = stream("int main(void) { int a[2] = {1, 2}; return (a[0]); }");
        assert!(s.finish().nesting.is_empty());
    }

    #[test]
    fn test_directives_and_comments_collected() {
        let mut s = TokenStream::new(
            "#include <stdio.h>\n/* doc */ int x;",
            LanguageProfile::C,
            TriviaMode::Attach,
        );
        assert_eq!(s.peek(0).lexeme, "int");
        assert_eq!(s.peek(0).leading_trivia.len(), 4);
        let parts = s.finish();
        assert_eq!(parts.directives.len(), 1);
        assert_eq!(parts.comments.len(), 1);
        assert_eq!(parts.comments[0].text, "/* doc */");
    }
}
