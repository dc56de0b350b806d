// Integration tests for the lexer and token stream

use cfront::parser::lexer::tokenize;
use cfront::parser::token::{Keyword, Punct, TokenCategory, TokenKind};
use cfront::{DiagnosticKind, LanguageProfile, TriviaMode};

fn rebuild(source: &str, profile: LanguageProfile) -> String {
    let (tokens, _) = tokenize(source, profile, TriviaMode::Keep);
    tokens.iter().map(|t| t.lexeme).collect()
}

#[test]
fn test_round_trip_reconstructs_source() {
    let source = r#"#include <stdio.h>
/* header
   comment */
typedef struct { int width; int height; } Rectangle;

int main(void) {
    Rectangle rect = { 3, 4 };   // trailing
    printf("%d\n", rect.width * rect.height);
    return 0x1F >> 2;
}
"#;
    assert_eq!(rebuild(source, LanguageProfile::C), source);
}

#[test]
fn test_round_trip_keeps_malformed_text() {
    let source = "int a = 0x;\nchar *s = \"open\nint b = @;\n";
    assert_eq!(rebuild(source, LanguageProfile::C), source);
}

#[test]
fn test_relexing_is_idempotent() {
    let source = "template <typename T> T max(T a, T b) { return a > b ? a : b; }\n\
                  auto v = std::vector<std::vector<int>>{};\n";
    let (first, first_diags) = tokenize(source, LanguageProfile::Cpp, TriviaMode::Keep);
    let text: String = first.iter().map(|t| t.lexeme).collect();
    let (second, second_diags) = tokenize(&text, LanguageProfile::Cpp, TriviaMode::Keep);
    assert_eq!(first, second);
    assert_eq!(first_diags, second_diags);
}

#[test]
fn test_token_categories() {
    let (tokens, diags) = tokenize(
        "x = 'c' + 1.5 + 2 ; \"s\"",
        LanguageProfile::C,
        TriviaMode::Discard,
    );
    assert!(diags.is_empty());
    let categories: Vec<&str> = tokens.iter().map(|t| t.category().name()).collect();
    assert_eq!(
        categories,
        vec![
            "identifier",
            "operator",
            "char-literal",
            "operator",
            "float-literal",
            "operator",
            "integer-literal",
            "punctuation",
            "string-literal",
            "end-of-input",
        ]
    );
}

#[test]
fn test_profile_controls_keywords() {
    let source = "class template namespace";
    let (c_tokens, _) = tokenize(source, LanguageProfile::C, TriviaMode::Discard);
    let (cpp_tokens, _) = tokenize(source, LanguageProfile::Cpp, TriviaMode::Discard);

    assert!(c_tokens[..3].iter().all(|t| t.kind == TokenKind::Identifier));
    assert_eq!(cpp_tokens[0].kind, TokenKind::Keyword(Keyword::Class));
    assert_eq!(cpp_tokens[1].kind, TokenKind::Keyword(Keyword::Template));
    assert_eq!(cpp_tokens[2].kind, TokenKind::Keyword(Keyword::Namespace));
}

#[test]
fn test_angle_brackets_are_plain_punctuation() {
    // The lexer never splits `>>`; the parser does when closing templates.
    let (tokens, _) = tokenize("a<b<c>>d", LanguageProfile::Cpp, TriviaMode::Discard);
    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(kinds[1], TokenKind::Punct(Punct::Lt));
    assert_eq!(kinds[3], TokenKind::Punct(Punct::Lt));
    assert_eq!(kinds[5], TokenKind::Punct(Punct::Shr));
}

#[test]
fn test_unterminated_string_single_diagnostic() {
    let (tokens, diags) = tokenize(
        "char *s = \"never closed;\nint after;\n",
        LanguageProfile::C,
        TriviaMode::Discard,
    );
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].kind, DiagnosticKind::Lexical);
    assert_eq!(diags[0].span.start.line, 1);
    assert!(tokens.iter().any(|t| t.lexeme == "after"));
    assert_eq!(tokens.last().map(|t| t.category()), Some(TokenCategory::EndOfInput));
}

#[test]
fn test_unterminated_string_at_end_of_input() {
    let (tokens, diags) = tokenize("\"abc", LanguageProfile::C, TriviaMode::Discard);
    assert_eq!(diags.len(), 1);
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].kind, TokenKind::Error);
    assert!(tokens[1].is_eof());
}

#[test]
fn test_positions_never_overlap() {
    let source = "int\tmain ( ) {\n  return 1+2 ;\n}\n";
    let (tokens, _) = tokenize(source, LanguageProfile::C, TriviaMode::Keep);
    for pair in tokens.windows(2) {
        assert!(pair[0].span.start.offset <= pair[0].span.end.offset);
        assert!(pair[0].span.end.offset <= pair[1].span.start.offset);
        assert_eq!(pair[0].span.end, pair[1].span.start);
    }
}

#[test]
fn test_empty_input_is_just_eof() {
    let (tokens, diags) = tokenize("", LanguageProfile::Cpp, TriviaMode::Keep);
    assert!(diags.is_empty());
    assert_eq!(tokens.len(), 1);
    assert!(tokens[0].is_eof());
}
