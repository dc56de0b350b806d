//! Token definitions shared by the lexer, token stream and parser
//!
//! A [`Token`] borrows its lexeme from the source text, so the concatenated
//! lexemes of a trivia-inclusive token sequence reproduce the input exactly.

use super::ast::Span;
use crate::config::LanguageProfile;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::OnceLock;

/// Reserved words of the C and C++ profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    // C11
    Auto,
    Break,
    Case,
    Char,
    Const,
    Continue,
    Default,
    Do,
    Double,
    Else,
    Enum,
    Extern,
    Float,
    For,
    Goto,
    If,
    Inline,
    Int,
    Long,
    Register,
    Restrict,
    Return,
    Short,
    Signed,
    Sizeof,
    Static,
    Struct,
    Switch,
    Typedef,
    Union,
    Unsigned,
    Void,
    Volatile,
    While,
    Alignas,
    Alignof,
    Atomic,
    Bool,
    Complex,
    Generic,
    Imaginary,
    Noreturn,
    StaticAssert,
    ThreadLocal,
    // C++
    Catch,
    Class,
    ConstCast,
    Constexpr,
    Decltype,
    Delete,
    DynamicCast,
    Explicit,
    False,
    Friend,
    Mutable,
    Namespace,
    New,
    Noexcept,
    Nullptr,
    Operator,
    Private,
    Protected,
    Public,
    ReinterpretCast,
    StaticCast,
    Template,
    This,
    Throw,
    True,
    Try,
    Typeid,
    Typename,
    Using,
    Virtual,
    WcharT,
    Char16T,
    Char32T,
}

/// Spelling, keyword, and whether the spelling is reserved only in C++.
const KEYWORDS: &[(&str, Keyword, Option<LanguageProfile>)] = &[
    ("auto", Keyword::Auto, None),
    ("break", Keyword::Break, None),
    ("case", Keyword::Case, None),
    ("char", Keyword::Char, None),
    ("const", Keyword::Const, None),
    ("continue", Keyword::Continue, None),
    ("default", Keyword::Default, None),
    ("do", Keyword::Do, None),
    ("double", Keyword::Double, None),
    ("else", Keyword::Else, None),
    ("enum", Keyword::Enum, None),
    ("extern", Keyword::Extern, None),
    ("float", Keyword::Float, None),
    ("for", Keyword::For, None),
    ("goto", Keyword::Goto, None),
    ("if", Keyword::If, None),
    ("inline", Keyword::Inline, None),
    ("int", Keyword::Int, None),
    ("long", Keyword::Long, None),
    ("register", Keyword::Register, None),
    ("restrict", Keyword::Restrict, Some(LanguageProfile::C)),
    ("return", Keyword::Return, None),
    ("short", Keyword::Short, None),
    ("signed", Keyword::Signed, None),
    ("sizeof", Keyword::Sizeof, None),
    ("static", Keyword::Static, None),
    ("struct", Keyword::Struct, None),
    ("switch", Keyword::Switch, None),
    ("typedef", Keyword::Typedef, None),
    ("union", Keyword::Union, None),
    ("unsigned", Keyword::Unsigned, None),
    ("void", Keyword::Void, None),
    ("volatile", Keyword::Volatile, None),
    ("while", Keyword::While, None),
    ("_Alignas", Keyword::Alignas, None),
    ("_Alignof", Keyword::Alignof, None),
    ("_Atomic", Keyword::Atomic, None),
    ("_Bool", Keyword::Bool, None),
    ("_Complex", Keyword::Complex, None),
    ("_Generic", Keyword::Generic, None),
    ("_Imaginary", Keyword::Imaginary, None),
    ("_Noreturn", Keyword::Noreturn, None),
    ("_Static_assert", Keyword::StaticAssert, None),
    ("_Thread_local", Keyword::ThreadLocal, None),
    ("alignas", Keyword::Alignas, Some(LanguageProfile::Cpp)),
    ("alignof", Keyword::Alignof, Some(LanguageProfile::Cpp)),
    ("bool", Keyword::Bool, Some(LanguageProfile::Cpp)),
    ("catch", Keyword::Catch, Some(LanguageProfile::Cpp)),
    ("class", Keyword::Class, Some(LanguageProfile::Cpp)),
    ("const_cast", Keyword::ConstCast, Some(LanguageProfile::Cpp)),
    ("constexpr", Keyword::Constexpr, Some(LanguageProfile::Cpp)),
    ("decltype", Keyword::Decltype, Some(LanguageProfile::Cpp)),
    ("delete", Keyword::Delete, Some(LanguageProfile::Cpp)),
    ("dynamic_cast", Keyword::DynamicCast, Some(LanguageProfile::Cpp)),
    ("explicit", Keyword::Explicit, Some(LanguageProfile::Cpp)),
    ("false", Keyword::False, Some(LanguageProfile::Cpp)),
    ("friend", Keyword::Friend, Some(LanguageProfile::Cpp)),
    ("mutable", Keyword::Mutable, Some(LanguageProfile::Cpp)),
    ("namespace", Keyword::Namespace, Some(LanguageProfile::Cpp)),
    ("new", Keyword::New, Some(LanguageProfile::Cpp)),
    ("noexcept", Keyword::Noexcept, Some(LanguageProfile::Cpp)),
    ("nullptr", Keyword::Nullptr, Some(LanguageProfile::Cpp)),
    ("operator", Keyword::Operator, Some(LanguageProfile::Cpp)),
    ("private", Keyword::Private, Some(LanguageProfile::Cpp)),
    ("protected", Keyword::Protected, Some(LanguageProfile::Cpp)),
    ("public", Keyword::Public, Some(LanguageProfile::Cpp)),
    ("reinterpret_cast", Keyword::ReinterpretCast, Some(LanguageProfile::Cpp)),
    ("static_assert", Keyword::StaticAssert, Some(LanguageProfile::Cpp)),
    ("static_cast", Keyword::StaticCast, Some(LanguageProfile::Cpp)),
    ("template", Keyword::Template, Some(LanguageProfile::Cpp)),
    ("this", Keyword::This, Some(LanguageProfile::Cpp)),
    ("thread_local", Keyword::ThreadLocal, Some(LanguageProfile::Cpp)),
    ("throw", Keyword::Throw, Some(LanguageProfile::Cpp)),
    ("true", Keyword::True, Some(LanguageProfile::Cpp)),
    ("try", Keyword::Try, Some(LanguageProfile::Cpp)),
    ("typeid", Keyword::Typeid, Some(LanguageProfile::Cpp)),
    ("typename", Keyword::Typename, Some(LanguageProfile::Cpp)),
    ("using", Keyword::Using, Some(LanguageProfile::Cpp)),
    ("virtual", Keyword::Virtual, Some(LanguageProfile::Cpp)),
    ("wchar_t", Keyword::WcharT, Some(LanguageProfile::Cpp)),
    ("char16_t", Keyword::Char16T, Some(LanguageProfile::Cpp)),
    ("char32_t", Keyword::Char32T, Some(LanguageProfile::Cpp)),
];

fn keyword_table(profile: LanguageProfile) -> &'static FxHashMap<&'static str, Keyword> {
    static C_TABLE: OnceLock<FxHashMap<&'static str, Keyword>> = OnceLock::new();
    static CPP_TABLE: OnceLock<FxHashMap<&'static str, Keyword>> = OnceLock::new();

    let cell = match profile {
        LanguageProfile::C => &C_TABLE,
        LanguageProfile::Cpp => &CPP_TABLE,
    };
    cell.get_or_init(|| {
        KEYWORDS
            .iter()
            .filter(|(_, _, only)| only.map_or(true, |p| p == profile))
            .map(|&(text, kw, _)| (text, kw))
            .collect()
    })
}

impl Keyword {
    /// Look up an identifier run in the keyword set of `profile`.
    pub fn lookup(text: &str, profile: LanguageProfile) -> Option<Keyword> {
        keyword_table(profile).get(text).copied()
    }

    /// Canonical spelling (the C++ spelling for keywords that have two).
    pub fn as_str(self) -> &'static str {
        KEYWORDS
            .iter()
            .rev()
            .find(|(_, kw, _)| *kw == self)
            .map(|(text, _, _)| *text)
            .unwrap_or("")
    }

    /// Keywords that can begin a declaration's specifiers.
    pub fn starts_type(self) -> bool {
        matches!(
            self,
            Keyword::Auto
                | Keyword::Char
                | Keyword::Const
                | Keyword::Double
                | Keyword::Enum
                | Keyword::Extern
                | Keyword::Float
                | Keyword::Inline
                | Keyword::Int
                | Keyword::Long
                | Keyword::Register
                | Keyword::Restrict
                | Keyword::Short
                | Keyword::Signed
                | Keyword::Static
                | Keyword::Struct
                | Keyword::Typedef
                | Keyword::Union
                | Keyword::Unsigned
                | Keyword::Void
                | Keyword::Volatile
                | Keyword::Alignas
                | Keyword::Atomic
                | Keyword::Bool
                | Keyword::Complex
                | Keyword::Noreturn
                | Keyword::ThreadLocal
                | Keyword::Class
                | Keyword::Constexpr
                | Keyword::Explicit
                | Keyword::Friend
                | Keyword::Mutable
                | Keyword::Typename
                | Keyword::Virtual
                | Keyword::WcharT
                | Keyword::Char16T
                | Keyword::Char32T
        )
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operators and punctuators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Punct {
    LParen,    // (
    RParen,    // )
    LBracket,  // [
    RBracket,  // ]
    LBrace,    // {
    RBrace,    // }
    Semicolon, // ;
    Comma,     // ,
    Colon,     // :
    ColonColon, // ::
    Ellipsis,  // ...
    Hash,      // #
    HashHash,  // ##
    Question,  // ?
    Dot,       // .
    Arrow,     // ->
    DotStar,   // .*
    ArrowStar, // ->*

    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    PlusPlus,
    MinusMinus,

    // Bitwise and logical
    Amp,
    Pipe,
    Caret,
    Tilde,
    Bang,
    AndAnd,
    OrOr,
    Shl,
    Shr,

    // Comparison
    Lt,
    Gt,
    Le,
    Ge,
    EqEq,
    NotEq,

    // Assignment
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    AmpAssign,
    PipeAssign,
    CaretAssign,
    ShlAssign,
    ShrAssign,
}

/// Maximal-munch table, longest spellings first. The flag marks C++-only
/// spellings.
pub(crate) const PUNCTUATORS: &[(&str, Punct, bool)] = &[
    ("<<=", Punct::ShlAssign, false),
    (">>=", Punct::ShrAssign, false),
    ("...", Punct::Ellipsis, false),
    ("->*", Punct::ArrowStar, true),
    ("->", Punct::Arrow, false),
    ("++", Punct::PlusPlus, false),
    ("--", Punct::MinusMinus, false),
    ("<<", Punct::Shl, false),
    (">>", Punct::Shr, false),
    ("<=", Punct::Le, false),
    (">=", Punct::Ge, false),
    ("==", Punct::EqEq, false),
    ("!=", Punct::NotEq, false),
    ("&&", Punct::AndAnd, false),
    ("||", Punct::OrOr, false),
    ("+=", Punct::PlusAssign, false),
    ("-=", Punct::MinusAssign, false),
    ("*=", Punct::StarAssign, false),
    ("/=", Punct::SlashAssign, false),
    ("%=", Punct::PercentAssign, false),
    ("&=", Punct::AmpAssign, false),
    ("|=", Punct::PipeAssign, false),
    ("^=", Punct::CaretAssign, false),
    ("##", Punct::HashHash, false),
    ("::", Punct::ColonColon, true),
    (".*", Punct::DotStar, true),
    ("(", Punct::LParen, false),
    (")", Punct::RParen, false),
    ("[", Punct::LBracket, false),
    ("]", Punct::RBracket, false),
    ("{", Punct::LBrace, false),
    ("}", Punct::RBrace, false),
    (";", Punct::Semicolon, false),
    (",", Punct::Comma, false),
    (":", Punct::Colon, false),
    ("#", Punct::Hash, false),
    ("?", Punct::Question, false),
    (".", Punct::Dot, false),
    ("+", Punct::Plus, false),
    ("-", Punct::Minus, false),
    ("*", Punct::Star, false),
    ("/", Punct::Slash, false),
    ("%", Punct::Percent, false),
    ("&", Punct::Amp, false),
    ("|", Punct::Pipe, false),
    ("^", Punct::Caret, false),
    ("~", Punct::Tilde, false),
    ("!", Punct::Bang, false),
    ("<", Punct::Lt, false),
    (">", Punct::Gt, false),
    ("=", Punct::Assign, false),
];

impl Punct {
    pub fn as_str(self) -> &'static str {
        PUNCTUATORS
            .iter()
            .find(|(_, p, _)| *p == self)
            .map(|(text, _, _)| *text)
            .unwrap_or("")
    }

    /// Everything except grouping and separator characters is an operator.
    pub fn is_operator(self) -> bool {
        !matches!(
            self,
            Punct::LParen
                | Punct::RParen
                | Punct::LBracket
                | Punct::RBracket
                | Punct::LBrace
                | Punct::RBrace
                | Punct::Semicolon
                | Punct::Comma
                | Punct::Colon
                | Punct::ColonColon
                | Punct::Ellipsis
                | Punct::Hash
        )
    }

    /// The closing delimiter for an opener.
    pub fn closer(self) -> Option<Punct> {
        match self {
            Punct::LParen => Some(Punct::RParen),
            Punct::LBracket => Some(Punct::RBracket),
            Punct::LBrace => Some(Punct::RBrace),
            _ => None,
        }
    }
}

impl fmt::Display for Punct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable, externally visible token category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenCategory {
    Identifier,
    Keyword,
    IntegerLiteral,
    FloatLiteral,
    StringLiteral,
    CharLiteral,
    Operator,
    Punctuation,
    Comment,
    Whitespace,
    Directive,
    Error,
    EndOfInput,
}

impl TokenCategory {
    pub fn name(self) -> &'static str {
        match self {
            TokenCategory::Identifier => "identifier",
            TokenCategory::Keyword => "keyword",
            TokenCategory::IntegerLiteral => "integer-literal",
            TokenCategory::FloatLiteral => "float-literal",
            TokenCategory::StringLiteral => "string-literal",
            TokenCategory::CharLiteral => "char-literal",
            TokenCategory::Operator => "operator",
            TokenCategory::Punctuation => "punctuation",
            TokenCategory::Comment => "comment",
            TokenCategory::Whitespace => "whitespace",
            TokenCategory::Directive => "directive",
            TokenCategory::Error => "error",
            TokenCategory::EndOfInput => "end-of-input",
        }
    }
}

impl fmt::Display for TokenCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    Keyword(Keyword),
    IntLiteral,
    FloatLiteral,
    StringLiteral,
    CharLiteral,
    Punct(Punct),
    Comment,
    Whitespace,
    /// A preprocessor line such as `#include <stdio.h>`.
    Directive,
    /// Malformed text; a lexical diagnostic was reported for it.
    Error,
    Eof,
}

impl TokenKind {
    pub fn category(self) -> TokenCategory {
        match self {
            TokenKind::Identifier => TokenCategory::Identifier,
            TokenKind::Keyword(_) => TokenCategory::Keyword,
            TokenKind::IntLiteral => TokenCategory::IntegerLiteral,
            TokenKind::FloatLiteral => TokenCategory::FloatLiteral,
            TokenKind::StringLiteral => TokenCategory::StringLiteral,
            TokenKind::CharLiteral => TokenCategory::CharLiteral,
            TokenKind::Punct(p) if p.is_operator() => TokenCategory::Operator,
            TokenKind::Punct(_) => TokenCategory::Punctuation,
            TokenKind::Comment => TokenCategory::Comment,
            TokenKind::Whitespace => TokenCategory::Whitespace,
            TokenKind::Directive => TokenCategory::Directive,
            TokenKind::Error => TokenCategory::Error,
            TokenKind::Eof => TokenCategory::EndOfInput,
        }
    }

    /// Comments, whitespace and directives carry no grammar meaning.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Comment | TokenKind::Whitespace | TokenKind::Directive
        )
    }
}

/// Decoded literal payload.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Integer(u64),
    Float(f64),
    /// Code point, or the packed value of a multi-character constant.
    Char(u32),
    Str(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    /// Exact source slice.
    pub lexeme: &'src str,
    pub span: Span,
    pub value: Option<LiteralValue>,
    /// Trivia preceding this token when the stream attaches trivia.
    pub leading_trivia: Vec<Token<'src>>,
}

impl<'src> Token<'src> {
    pub fn new(kind: TokenKind, lexeme: &'src str, span: Span) -> Self {
        Self {
            kind,
            lexeme,
            span,
            value: None,
            leading_trivia: Vec::new(),
        }
    }

    pub fn with_value(mut self, value: LiteralValue) -> Self {
        self.value = Some(value);
        self
    }

    pub fn category(&self) -> TokenCategory {
        self.kind.category()
    }

    pub fn is_trivia(&self) -> bool {
        self.kind.is_trivia()
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    pub fn is_punct(&self, punct: Punct) -> bool {
        self.kind == TokenKind::Punct(punct)
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }

    pub fn is_identifier(&self) -> bool {
        self.kind == TokenKind::Identifier
    }

    /// The token as it should appear in a diagnostic message.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::Identifier => format!("identifier '{}'", self.lexeme),
            TokenKind::Keyword(kw) => format!("'{}'", kw),
            TokenKind::Punct(p) => format!("'{}'", p),
            TokenKind::IntLiteral | TokenKind::FloatLiteral => {
                format!("number '{}'", self.lexeme)
            }
            TokenKind::StringLiteral => "string literal".to_string(),
            TokenKind::CharLiteral => format!("character constant {}", self.lexeme),
            TokenKind::Error => format!("invalid token '{}'", self.lexeme),
            TokenKind::Comment | TokenKind::Whitespace | TokenKind::Directive => {
                self.kind.category().name().to_string()
            }
        }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_profiles() {
        assert_eq!(Keyword::lookup("int", LanguageProfile::C), Some(Keyword::Int));
        assert_eq!(Keyword::lookup("class", LanguageProfile::C), None);
        assert_eq!(Keyword::lookup("class", LanguageProfile::Cpp), Some(Keyword::Class));
        assert_eq!(Keyword::lookup("restrict", LanguageProfile::Cpp), None);
        assert_eq!(Keyword::lookup("_Bool", LanguageProfile::C), Some(Keyword::Bool));
    }

    #[test]
    fn test_canonical_spelling() {
        assert_eq!(Keyword::Bool.as_str(), "bool");
        assert_eq!(Keyword::StaticAssert.as_str(), "static_assert");
        assert_eq!(Keyword::While.as_str(), "while");
        assert_eq!(Punct::ShlAssign.as_str(), "<<=");
    }

    #[test]
    fn test_categories() {
        assert_eq!(TokenKind::Punct(Punct::Plus).category().name(), "operator");
        assert_eq!(TokenKind::Punct(Punct::Semicolon).category().name(), "punctuation");
        assert_eq!(TokenKind::Eof.category().name(), "end-of-input");
        assert!(TokenKind::Directive.is_trivia());
    }
}
