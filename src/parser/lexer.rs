//! Lexer (tokenizer) for C and the C++ subset
//!
//! [`Lexer`] is a lazy iterator over the source text. It produces every token,
//! trivia included, so the lexemes of its output concatenate back to the
//! input. Malformed text becomes an [`TokenKind::Error`] token plus a lexical
//! diagnostic and lexing carries on.

use super::ast::{Position, Span};
use super::token::{Keyword, LiteralValue, Token, TokenKind, PUNCTUATORS};
use crate::config::{LanguageProfile, TriviaMode};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Recovery};

/// Saved lexer state. Resuming from it yields the same tokens as an
/// uninterrupted run from the same point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexerCheckpoint {
    position: Position,
    at_line_start: bool,
    finished: bool,
}

impl LexerCheckpoint {
    pub fn position(&self) -> Position {
        self.position
    }
}

/// Lexer for C-family source code
pub struct Lexer<'src> {
    source: &'src str,
    bytes: &'src [u8],
    pos: usize,
    line: usize,
    column: usize,
    /// Only blanks have been seen since the last newline.
    at_line_start: bool,
    finished: bool,
    profile: LanguageProfile,
    diagnostics: Diagnostics,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str, profile: LanguageProfile) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
            at_line_start: true,
            finished: false,
            profile,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Continue lexing `source` from a checkpoint taken on the same text.
    pub fn resume(
        source: &'src str,
        profile: LanguageProfile,
        checkpoint: LexerCheckpoint,
    ) -> Self {
        let mut lexer = Self::new(source, profile);
        lexer.pos = checkpoint.position.offset.min(source.len());
        lexer.line = checkpoint.position.line;
        lexer.column = checkpoint.position.column;
        lexer.at_line_start = checkpoint.at_line_start;
        lexer.finished = checkpoint.finished;
        lexer
    }

    pub fn checkpoint(&self) -> LexerCheckpoint {
        LexerCheckpoint {
            position: self.current_position(),
            at_line_start: self.at_line_start,
            finished: self.finished,
        }
    }

    pub fn profile(&self) -> LanguageProfile {
        self.profile
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }

    fn current_position(&self) -> Position {
        Position::new(self.line, self.column, self.pos)
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek_byte(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn peek_char(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    /// Consume one character, updating line and column.
    fn bump(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    /// Length of a backslash-newline splice at the current position, if any.
    fn splice_len(&self) -> Option<usize> {
        if self.peek_byte(0) != Some(b'\\') {
            return None;
        }
        match (self.peek_byte(1), self.peek_byte(2)) {
            (Some(b'\n'), _) => Some(2),
            (Some(b'\r'), Some(b'\n')) => Some(3),
            _ => None,
        }
    }

    fn bump_n(&mut self, n: usize) {
        for _ in 0..n {
            self.bump();
        }
    }

    fn make_token(&self, kind: TokenKind, start: Position) -> Token<'src> {
        let lexeme = &self.source[start.offset..self.pos];
        Token::new(kind, lexeme, Span::new(start, self.current_position()))
    }

    fn report(&mut self, message: impl Into<String>, start: Position, recovery: Option<Recovery>) {
        let span = Span::new(start, self.current_position());
        let mut diagnostic = Diagnostic::error(DiagnosticKind::Lexical, message, span);
        diagnostic.recovery = recovery;
        self.diagnostics.push(diagnostic);
    }

    fn warn(&mut self, message: impl Into<String>, start: Position) {
        let span = Span::new(start, self.current_position());
        self.diagnostics
            .push(Diagnostic::warning(DiagnosticKind::Lexical, message, span));
    }

    /// Produce the next token, or `None` after end-of-input was returned.
    pub fn next_token(&mut self) -> Option<Token<'src>> {
        if self.finished {
            return None;
        }
        if self.is_at_end() {
            self.finished = true;
            let here = self.current_position();
            return Some(Token::new(TokenKind::Eof, "", Span::point(here)));
        }

        let start = self.current_position();
        let b = self.bytes[self.pos];

        let token = match b {
            b' ' | b'\t' | b'\r' | b'\n' | 0x0b | 0x0c => self.whitespace(start),
            b'\\' if self.splice_len().is_some() => self.whitespace(start),
            b'/' if self.peek_byte(1) == Some(b'/') => self.line_comment(start),
            b'/' if self.peek_byte(1) == Some(b'*') => self.block_comment(start),
            b'#' if self.at_line_start => self.directive(start),
            b'0'..=b'9' => self.number(start),
            b'.' if matches!(self.peek_byte(1), Some(b'0'..=b'9')) => self.number(start),
            b'"' => self.quoted(start, b'"', ""),
            b'\'' => self.quoted(start, b'\'', ""),
            _ if is_ident_start(self.peek_char()) => self.identifier_or_prefixed(start),
            _ => self.punctuator(start),
        };

        match token.kind {
            TokenKind::Whitespace | TokenKind::Comment => {}
            _ => self.at_line_start = false,
        }
        Some(token)
    }

    fn whitespace(&mut self, start: Position) -> Token<'src> {
        loop {
            if let Some(n) = self.splice_len() {
                self.bump_n(n);
                continue;
            }
            match self.peek_byte(0) {
                Some(b'\n') => {
                    self.bump();
                    self.at_line_start = true;
                }
                Some(b' ' | b'\t' | b'\r' | 0x0b | 0x0c) => {
                    self.bump();
                }
                _ => break,
            }
        }
        self.make_token(TokenKind::Whitespace, start)
    }

    /// Consume to the end of the physical line, honouring splices.
    fn rest_of_line(&mut self) {
        while !self.is_at_end() {
            if let Some(n) = self.splice_len() {
                self.bump_n(n);
                continue;
            }
            match self.peek_byte(0) {
                Some(b'\n') => break,
                Some(b'\r') if self.peek_byte(1) == Some(b'\n') => break,
                _ => {
                    self.bump();
                }
            }
        }
    }

    fn line_comment(&mut self, start: Position) -> Token<'src> {
        self.rest_of_line();
        self.make_token(TokenKind::Comment, start)
    }

    fn block_comment(&mut self, start: Position) -> Token<'src> {
        self.bump_n(2);
        loop {
            if self.is_at_end() {
                self.report(
                    "unterminated block comment",
                    start,
                    Some(Recovery::ClosedAtEof),
                );
                break;
            }
            if self.peek_byte(0) == Some(b'*') && self.peek_byte(1) == Some(b'/') {
                self.bump_n(2);
                break;
            }
            self.bump();
        }
        self.make_token(TokenKind::Comment, start)
    }

    fn directive(&mut self, start: Position) -> Token<'src> {
        self.rest_of_line();
        self.make_token(TokenKind::Directive, start)
    }

    fn identifier_or_prefixed(&mut self, start: Position) -> Token<'src> {
        while is_ident_continue(self.peek_char()) {
            self.bump();
        }
        let text = &self.source[start.offset..self.pos];

        match (text, self.peek_byte(0)) {
            ("L" | "u" | "U" | "u8", Some(b'"')) => return self.quoted(start, b'"', text),
            ("L" | "u" | "U", Some(b'\'')) => return self.quoted(start, b'\'', text),
            ("u8", Some(b'\'')) if self.profile.is_cpp() => {
                return self.quoted(start, b'\'', text)
            }
            ("R" | "LR" | "uR" | "UR" | "u8R", Some(b'"')) if self.profile.is_cpp() => {
                return self.raw_string(start)
            }
            _ => {}
        }

        let kind = match Keyword::lookup(text, self.profile) {
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Identifier,
        };
        self.make_token(kind, start)
    }

    fn punctuator(&mut self, start: Position) -> Token<'src> {
        let rest = &self.source[self.pos..];
        let cpp = self.profile.is_cpp();
        let matched = PUNCTUATORS
            .iter()
            .find(|(text, _, cpp_only)| (cpp || !cpp_only) && rest.starts_with(text));

        match matched {
            Some(&(text, punct, _)) => {
                self.bump_n(text.len());
                self.make_token(TokenKind::Punct(punct), start)
            }
            None => {
                let ch = self.bump().unwrap_or('\0');
                self.report(
                    format!("unexpected character '{}'", ch.escape_default()),
                    start,
                    Some(Recovery::ErrorToken),
                );
                self.make_token(TokenKind::Error, start)
            }
        }
    }

    // ===== Numbers =====

    /// Greedy pp-number scan followed by validation.
    fn number(&mut self, start: Position) -> Token<'src> {
        let cpp = self.profile.is_cpp();
        loop {
            match self.peek_byte(0) {
                Some(b'e' | b'E' | b'p' | b'P')
                    if matches!(self.peek_byte(1), Some(b'+' | b'-')) =>
                {
                    self.bump_n(2);
                }
                Some(b'\'')
                    if cpp && matches!(self.peek_byte(1), Some(c) if c.is_ascii_alphanumeric()) =>
                {
                    self.bump();
                }
                Some(c) if c.is_ascii_alphanumeric() || c == b'_' || c == b'.' => {
                    self.bump();
                }
                _ => break,
            }
        }

        let text = &self.source[start.offset..self.pos];
        match classify_number(text) {
            Ok(NumberLiteral::Int(value)) => {
                let value = match value {
                    Some(value) => value,
                    None => {
                        self.report("integer literal is too large", start, None);
                        u64::MAX
                    }
                };
                self.make_token(TokenKind::IntLiteral, start)
                    .with_value(LiteralValue::Integer(value))
            }
            Ok(NumberLiteral::Float(value)) => self
                .make_token(TokenKind::FloatLiteral, start)
                .with_value(LiteralValue::Float(value)),
            Err(message) => {
                self.report(message, start, Some(Recovery::ErrorToken));
                self.make_token(TokenKind::Error, start)
            }
        }
    }

    // ===== Strings and characters =====

    /// Lex a string or character literal. The opening quote is at the current
    /// position; `prefix` has already been consumed.
    fn quoted(&mut self, start: Position, quote: u8, prefix: &str) -> Token<'src> {
        let is_char = quote == b'\'';
        self.bump();
        let mut units: Vec<u32> = Vec::new();

        loop {
            if let Some(n) = self.splice_len() {
                self.bump_n(n);
                continue;
            }
            match self.peek_byte(0) {
                None | Some(b'\n') => return self.unterminated(start, is_char),
                Some(b'\r') if self.peek_byte(1) == Some(b'\n') => {
                    return self.unterminated(start, is_char)
                }
                Some(c) if c == quote => {
                    self.bump();
                    break;
                }
                Some(b'\\') => {
                    let escape_start = self.current_position();
                    self.bump();
                    units.push(self.escape(escape_start));
                }
                Some(_) => {
                    let ch = self.bump().unwrap_or('\0');
                    units.push(ch as u32);
                }
            }
        }

        if is_char {
            self.finish_char(start, prefix, &units)
        } else {
            let value: String = units
                .iter()
                .map(|&u| char::from_u32(u).unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect();
            self.make_token(TokenKind::StringLiteral, start)
                .with_value(LiteralValue::Str(value))
        }
    }

    fn finish_char(&mut self, start: Position, prefix: &str, units: &[u32]) -> Token<'src> {
        match units {
            [] => {
                self.report("empty character constant", start, Some(Recovery::ErrorToken));
                self.make_token(TokenKind::Error, start)
            }
            [single] => self
                .make_token(TokenKind::CharLiteral, start)
                .with_value(LiteralValue::Char(*single)),
            _ => {
                self.warn("multi-character character constant", start);
                // Packed big-endian for narrow constants; wide ones keep the
                // last character.
                let value = if prefix.is_empty() {
                    units
                        .iter()
                        .fold(0u32, |acc, &u| (acc << 8) | (u & 0xff))
                } else {
                    units.last().copied().unwrap_or(0)
                };
                self.make_token(TokenKind::CharLiteral, start)
                    .with_value(LiteralValue::Char(value))
            }
        }
    }

    /// Unterminated literal: the error token runs to the end of the line and
    /// lexing resumes at the newline.
    fn unterminated(&mut self, start: Position, is_char: bool) -> Token<'src> {
        let what = if is_char {
            "unterminated character constant"
        } else {
            "unterminated string literal"
        };
        self.report(what, start, Some(Recovery::ResumeNextLine));
        self.make_token(TokenKind::Error, start)
    }

    /// Decode an escape sequence. The backslash has been consumed.
    fn escape(&mut self, escape_start: Position) -> u32 {
        let Some(ch) = self.peek_char() else {
            return '\\' as u32;
        };
        match ch {
            'n' | 't' | 'r' | 'a' | 'b' | 'f' | 'v' | '\\' | '\'' | '"' | '?' => {
                self.bump();
                match ch {
                    'n' => 0x0a,
                    't' => 0x09,
                    'r' => 0x0d,
                    'a' => 0x07,
                    'b' => 0x08,
                    'f' => 0x0c,
                    'v' => 0x0b,
                    other => other as u32,
                }
            }
            '0'..='7' => {
                let mut value = 0u32;
                for _ in 0..3 {
                    match self.peek_byte(0) {
                        Some(d @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(d - b'0');
                            self.bump();
                        }
                        _ => break,
                    }
                }
                value
            }
            'x' => {
                self.bump();
                let mut value = 0u32;
                let mut digits = 0;
                while let Some(d) = self.peek_byte(0).and_then(|b| (b as char).to_digit(16)) {
                    value = value.wrapping_mul(16).wrapping_add(d);
                    digits += 1;
                    self.bump();
                }
                if digits == 0 {
                    self.warn("\\x used with no following hex digits", escape_start);
                }
                value
            }
            'u' | 'U' => {
                self.bump();
                let want = if ch == 'u' { 4 } else { 8 };
                let mut value = 0u32;
                let mut digits = 0;
                while digits < want {
                    match self.peek_byte(0).and_then(|b| (b as char).to_digit(16)) {
                        Some(d) => {
                            value = value.wrapping_mul(16).wrapping_add(d);
                            digits += 1;
                            self.bump();
                        }
                        None => break,
                    }
                }
                if digits < want {
                    self.warn(
                        format!("incomplete universal character name \\{}", ch),
                        escape_start,
                    );
                }
                value
            }
            other => {
                self.bump();
                self.warn(
                    format!("unknown escape sequence '\\{}'", other.escape_default()),
                    escape_start,
                );
                other as u32
            }
        }
    }

    /// C++ raw string `R"delim(...)delim"`; the identifier prefix has been
    /// consumed.
    fn raw_string(&mut self, start: Position) -> Token<'src> {
        self.bump();
        let delim_start = self.pos;
        while let Some(b) = self.peek_byte(0) {
            if b == b'(' || b == b')' || b == b'\\' || b.is_ascii_whitespace() || b == b'"' {
                break;
            }
            self.bump();
        }
        let delimiter = &self.source[delim_start..self.pos];
        if self.peek_byte(0) != Some(b'(') || delimiter.len() > 16 {
            self.rest_of_line();
            self.report(
                "invalid raw string delimiter",
                start,
                Some(Recovery::ResumeNextLine),
            );
            return self.make_token(TokenKind::Error, start);
        }
        self.bump();

        let closing = format!("){}\"", delimiter);
        match self.source[self.pos..].find(&closing) {
            Some(found) => {
                let body = &self.source[self.pos..self.pos + found];
                let end = self.pos + found + closing.len();
                while self.pos < end {
                    self.bump();
                }
                self.make_token(TokenKind::StringLiteral, start)
                    .with_value(LiteralValue::Str(body.to_string()))
            }
            None => {
                self.rest_of_line();
                self.unterminated(start, false)
            }
        }
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

fn is_ident_start(ch: Option<char>) -> bool {
    matches!(ch, Some(c) if c == '_' || c.is_alphabetic())
}

fn is_ident_continue(ch: Option<char>) -> bool {
    matches!(ch, Some(c) if c == '_' || c.is_alphanumeric())
}

enum NumberLiteral {
    /// `None` when the value does not fit in `u64`.
    Int(Option<u64>),
    Float(f64),
}

/// Validate a pp-number and compute its value.
fn classify_number(text: &str) -> Result<NumberLiteral, String> {
    let clean: String = text.chars().filter(|&c| c != '\'').collect();
    let lower = clean.to_ascii_lowercase();

    if let Some(body) = lower.strip_prefix("0x") {
        return classify_hex(body, &clean);
    }
    if let Some(body) = lower.strip_prefix("0b") {
        let digits_end = body
            .find(|c: char| !c.is_ascii_alphanumeric() || matches!(c, 'u' | 'l'))
            .unwrap_or(body.len());
        let (digits, suffix) = body.split_at(digits_end);
        if digits.is_empty() {
            return Err("binary literal has no digits".to_string());
        }
        if let Some(bad) = digits.chars().find(|c| !matches!(c, '0' | '1')) {
            return Err(format!("invalid digit '{}' in binary constant", bad));
        }
        check_int_suffix(suffix, &clean)?;
        return Ok(NumberLiteral::Int(u64::from_str_radix(digits, 2).ok()));
    }

    // Decimal or octal, integer or float.
    let bytes = lower.as_bytes();
    let mut i = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut is_float = false;
    if i < bytes.len() && bytes[i] == b'.' {
        is_float = true;
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }
    if i < bytes.len() && bytes[i] == b'e' {
        is_float = true;
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return Err("exponent has no digits".to_string());
        }
    }

    let (number, suffix) = lower.split_at(i);
    if is_float {
        if !matches!(suffix, "" | "f" | "l") {
            return Err(format!(
                "invalid suffix '{}' on floating constant",
                &clean[i..]
            ));
        }
        return number
            .parse::<f64>()
            .map(NumberLiteral::Float)
            .map_err(|_| format!("invalid floating constant '{}'", clean));
    }

    check_int_suffix(suffix, &clean)?;
    if number.len() > 1 && number.starts_with('0') {
        if let Some(bad) = number.chars().find(|c| matches!(c, '8' | '9')) {
            return Err(format!("invalid digit '{}' in octal constant", bad));
        }
        return Ok(NumberLiteral::Int(u64::from_str_radix(&number[1..], 8).ok()));
    }
    Ok(NumberLiteral::Int(number.parse::<u64>().ok()))
}

fn classify_hex(body: &str, original: &str) -> Result<NumberLiteral, String> {
    let mantissa_end = body
        .find(|c: char| !(c.is_ascii_hexdigit() || c == '.'))
        .unwrap_or(body.len());
    let (mantissa, rest) = body.split_at(mantissa_end);
    let is_float = mantissa.contains('.') || rest.starts_with('p');

    if mantissa.chars().all(|c| c == '.') {
        return Err("hexadecimal literal has no digits".to_string());
    }

    if !is_float {
        check_int_suffix(rest, original)?;
        return Ok(NumberLiteral::Int(u64::from_str_radix(mantissa, 16).ok()));
    }

    let Some(exponent) = rest.strip_prefix('p') else {
        return Err("hexadecimal floating constant requires an exponent".to_string());
    };
    let exp_end = exponent
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '+' || c == '-'))))
        .map(|(i, _)| i)
        .unwrap_or(exponent.len());
    let (exp_text, suffix) = exponent.split_at(exp_end);
    let exp: i32 = exp_text
        .parse()
        .map_err(|_| "exponent has no digits".to_string())?;
    if !matches!(suffix, "" | "f" | "l") {
        return Err(format!("invalid suffix '{}' on floating constant", suffix));
    }

    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let mut value = 0f64;
    for d in int_part.chars().filter_map(|c| c.to_digit(16)) {
        value = value * 16.0 + f64::from(d);
    }
    let mut scale = 1.0 / 16.0;
    for d in frac_part.chars().filter_map(|c| c.to_digit(16)) {
        value += f64::from(d) * scale;
        scale /= 16.0;
    }
    Ok(NumberLiteral::Float(value * 2f64.powi(exp)))
}

/// Integer suffixes are combinations of `u` and `l`/`ll` in either order.
fn check_int_suffix(suffix: &str, original: &str) -> Result<(), String> {
    let original_suffix = &original[original.len() - suffix.len()..];
    let valid = matches!(
        suffix,
        "" | "u" | "l" | "ul" | "lu" | "ll" | "ull" | "llu"
    ) && !original_suffix.contains("lL")
        && !original_suffix.contains("Ll");
    if valid {
        Ok(())
    } else {
        Err(format!(
            "invalid suffix '{}' on integer constant",
            original_suffix
        ))
    }
}

/// Lex a whole source text, applying a trivia mode.
///
/// `Discard` drops trivia, `Attach` moves it into the next significant token's
/// `leading_trivia`, and `Keep` returns the lossless sequence.
pub fn tokenize<'src>(
    source: &'src str,
    profile: LanguageProfile,
    trivia: TriviaMode,
) -> (Vec<Token<'src>>, Vec<Diagnostic>) {
    let mut lexer = Lexer::new(source, profile);
    let mut tokens = Vec::new();
    let mut pending = Vec::new();

    while let Some(mut token) = lexer.next_token() {
        if token.is_trivia() {
            match trivia {
                TriviaMode::Keep => tokens.push(token),
                TriviaMode::Attach => pending.push(token),
                TriviaMode::Discard => {}
            }
            continue;
        }
        token.leading_trivia = std::mem::take(&mut pending);
        tokens.push(token);
    }

    (tokens, lexer.take_diagnostics().into_sorted())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::token::Punct;

    fn kinds(source: &str, profile: LanguageProfile) -> Vec<TokenKind> {
        tokenize(source, profile, TriviaMode::Discard)
            .0
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_maximal_munch() {
        let k = kinds("a<<=b>>c...d->e", LanguageProfile::C);
        assert_eq!(
            k,
            vec![
                TokenKind::Identifier,
                TokenKind::Punct(Punct::ShlAssign),
                TokenKind::Identifier,
                TokenKind::Punct(Punct::Shr),
                TokenKind::Identifier,
                TokenKind::Punct(Punct::Ellipsis),
                TokenKind::Identifier,
                TokenKind::Punct(Punct::Arrow),
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_scope_operator_only_in_cpp() {
        assert_eq!(kinds("a::b", LanguageProfile::Cpp)[1], TokenKind::Punct(Punct::ColonColon));
        assert_eq!(kinds("a::b", LanguageProfile::C)[1], TokenKind::Punct(Punct::Colon));
    }

    #[test]
    fn test_numbers() {
        let source = "0x1F 017 0b101 1.5e3f 42ull 0x1p4 1'000";
        let (tokens, diags) = tokenize(source, LanguageProfile::Cpp, TriviaMode::Discard);
        assert!(diags.is_empty());
        assert_eq!(tokens[0].value, Some(LiteralValue::Integer(31)));
        assert_eq!(tokens[1].value, Some(LiteralValue::Integer(15)));
        assert_eq!(tokens[2].value, Some(LiteralValue::Integer(5)));
        assert_eq!(tokens[3].value, Some(LiteralValue::Float(1500.0)));
        assert_eq!(tokens[4].value, Some(LiteralValue::Integer(42)));
        assert_eq!(tokens[5].value, Some(LiteralValue::Float(16.0)));
        assert_eq!(tokens[6].value, Some(LiteralValue::Integer(1000)));
    }

    #[test]
    fn test_malformed_numbers() {
        for source in ["0x", "09", "1e", "12abc", "0b102"] {
            let (tokens, diags) = tokenize(source, LanguageProfile::C, TriviaMode::Discard);
            assert_eq!(tokens[0].kind, TokenKind::Error, "{}", source);
            assert_eq!(diags.len(), 1, "{}", source);
        }
    }

    #[test]
    fn test_integer_overflow() {
        let source = "99999999999999999999";
        let (tokens, diags) = tokenize(source, LanguageProfile::C, TriviaMode::Discard);
        assert_eq!(tokens[0].kind, TokenKind::IntLiteral);
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn test_string_escapes() {
        let source = r#""a\tb\x41\101\n""#;
        let (tokens, diags) = tokenize(source, LanguageProfile::C, TriviaMode::Discard);
        assert!(diags.is_empty());
        assert_eq!(tokens[0].value, Some(LiteralValue::Str("a\tbAA\n".to_string())));
    }

    #[test]
    fn test_unknown_escape_warns() {
        let (tokens, diags) = tokenize(r#""\q""#, LanguageProfile::C, TriviaMode::Discard);
        assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
        assert_eq!(diags.len(), 1);
        assert!(!diags[0].is_error());
    }

    #[test]
    fn test_unterminated_string_resumes_next_line() {
        let source = "char *s = \"oops;\nint x;";
        let (tokens, diags) = tokenize(source, LanguageProfile::C, TriviaMode::Discard);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].recovery, Some(Recovery::ResumeNextLine));
        let error = tokens.iter().find(|t| t.kind == TokenKind::Error);
        assert_eq!(error.map(|t| t.lexeme), Some("\"oops;"));
        assert!(tokens.iter().any(|t| t.lexeme == "x"));
        assert!(tokens.last().is_some_and(|t| t.is_eof()));
    }

    #[test]
    fn test_char_literals() {
        let source = "'a' '\\n' L'x' ''";
        let (tokens, diags) = tokenize(source, LanguageProfile::C, TriviaMode::Discard);
        assert_eq!(tokens[0].value, Some(LiteralValue::Char(97)));
        assert_eq!(tokens[1].value, Some(LiteralValue::Char(10)));
        assert_eq!(tokens[2].kind, TokenKind::CharLiteral);
        assert_eq!(tokens[3].kind, TokenKind::Error);
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn test_raw_string() {
        let source = "R\"x(a \"quoted\" )\nline)x\"";
        let (tokens, diags) = tokenize(source, LanguageProfile::Cpp, TriviaMode::Discard);
        assert!(diags.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[0].value, Some(LiteralValue::Str("a \"quoted\" )\nline".to_string())));
    }

    #[test]
    fn test_directives_only_at_line_start() {
        let source = "#include <stdio.h>\nint a # b;";
        let (tokens, _) = tokenize(source, LanguageProfile::C, TriviaMode::Keep);
        assert_eq!(tokens[0].kind, TokenKind::Directive);
        assert_eq!(tokens[0].lexeme, "#include <stdio.h>");
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Punct(Punct::Hash)));
    }

    #[test]
    fn test_directive_continuation() {
        let source = "  #define M(a) \\\n  (a)\nM(1)";
        let (tokens, _) = tokenize(source, LanguageProfile::C, TriviaMode::Keep);
        assert_eq!(tokens[1].kind, TokenKind::Directive);
        assert_eq!(tokens[1].lexeme, "#define M(a) \\\n  (a)");
    }

    #[test]
    fn test_lossless_with_comments() {
        let source = "int /* c */ x = 1; // tail\n\tchar c = '\\'';\n";
        let (tokens, _) = tokenize(source, LanguageProfile::C, TriviaMode::Keep);
        let rebuilt: String = tokens.iter().map(|t| t.lexeme).collect();
        assert_eq!(rebuilt, source);
    }

    #[test]
    fn test_unterminated_block_comment() {
        let (tokens, diags) = tokenize("x /* never closed", LanguageProfile::C, TriviaMode::Keep);
        assert_eq!(diags.len(), 1);
        assert_eq!(tokens[2].kind, TokenKind::Comment);
        assert!(tokens[3].is_eof());
    }

    #[test]
    fn test_positions() {
        let (tokens, _) = tokenize("a\n  bb", LanguageProfile::C, TriviaMode::Discard);
        assert_eq!(tokens[1].span.start, Position::new(2, 3, 4));
        assert_eq!(tokens[1].span.end, Position::new(2, 5, 6));
    }

    #[test]
    fn test_checkpoint_resume() {
        let source = "int x = 42; float y;";
        let mut lexer = Lexer::new(source, LanguageProfile::C);
        for _ in 0..4 {
            lexer.next_token();
        }
        let checkpoint = lexer.checkpoint();
        let rest: Vec<_> = lexer.collect();
        let resumed: Vec<_> = Lexer::resume(source, LanguageProfile::C, checkpoint).collect();
        assert_eq!(rest, resumed);
    }

    #[test]
    fn test_attach_trivia() {
        let (tokens, _) = tokenize("// hi\nint x;", LanguageProfile::C, TriviaMode::Attach);
        assert_eq!(tokens[0].lexeme, "int");
        assert_eq!(tokens[0].leading_trivia.len(), 2);
        assert_eq!(tokens[0].leading_trivia[0].kind, TokenKind::Comment);
    }
}
