//! Front-end configuration
//!
//! [`ParseOptions`] selects the keyword/grammar set ([`LanguageProfile`]), what
//! happens to comments and whitespace ([`TriviaMode`]), and how deep the
//! recursive-descent parser may nest before it gives up on a construct.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Default recursion limit for nested statements and expressions.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Keyword and grammar set used by the lexer and parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LanguageProfile {
    /// C11: no classes, templates, namespaces, `::` or `enum class`.
    #[default]
    C,
    /// The C++ subset: C plus classes, templates, namespaces, lambdas,
    /// `new`/`delete` and named casts.
    Cpp,
}

impl LanguageProfile {
    pub fn is_cpp(self) -> bool {
        self == LanguageProfile::Cpp
    }

    /// Guess the profile from a file extension. Anything unrecognized is C.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("cpp" | "cc" | "cxx" | "c++" | "hpp" | "hh" | "hxx" | "h++") => {
                LanguageProfile::Cpp
            }
            _ => LanguageProfile::C,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LanguageProfile::C => "c",
            LanguageProfile::Cpp => "cpp",
        }
    }
}

impl fmt::Display for LanguageProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a profile name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown language profile '{0}' (expected 'c' or 'cpp')")]
pub struct ProfileParseError(pub String);

impl FromStr for LanguageProfile {
    type Err = ProfileParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "c" => Ok(LanguageProfile::C),
            "cpp" | "c++" | "cxx" => Ok(LanguageProfile::Cpp),
            _ => Err(ProfileParseError(s.to_string())),
        }
    }
}

/// What the token stream does with comments, whitespace and directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriviaMode {
    /// Trivia is dropped from the grammar-facing sequence.
    #[default]
    Discard,
    /// Trivia is attached to the following significant token, and comments
    /// are collected on the parsed [`Program`](crate::parser::ast::Program).
    Attach,
    /// Every token is emitted in order (lossless lexer output). The parser
    /// treats this like [`TriviaMode::Attach`].
    Keep,
}

/// Options shared by the lexer, token stream and parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    pub profile: LanguageProfile,
    pub trivia: TriviaMode,
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            profile: LanguageProfile::C,
            trivia: TriviaMode::Discard,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParseOptions {
    pub fn new(profile: LanguageProfile) -> Self {
        Self {
            profile,
            ..Self::default()
        }
    }

    pub fn c() -> Self {
        Self::new(LanguageProfile::C)
    }

    pub fn cpp() -> Self {
        Self::new(LanguageProfile::Cpp)
    }

    pub fn with_trivia(mut self, trivia: TriviaMode) -> Self {
        self.trivia = trivia;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_from_str() {
        assert_eq!("c".parse::<LanguageProfile>(), Ok(LanguageProfile::C));
        assert_eq!("C++".parse::<LanguageProfile>(), Ok(LanguageProfile::Cpp));
        assert!("rust".parse::<LanguageProfile>().is_err());
    }

    #[test]
    fn test_profile_from_path() {
        assert_eq!(LanguageProfile::from_path(Path::new("a/shapes.cpp")), LanguageProfile::Cpp);
        assert_eq!(LanguageProfile::from_path(Path::new("enum.c")), LanguageProfile::C);
        assert_eq!(LanguageProfile::from_path(Path::new("README")), LanguageProfile::C);
    }

    #[test]
    fn test_builder() {
        let options = ParseOptions::cpp().with_trivia(TriviaMode::Attach).with_max_depth(8);
        assert_eq!(options.profile, LanguageProfile::Cpp);
        assert_eq!(options.trivia, TriviaMode::Attach);
        assert_eq!(options.max_depth, 8);
    }
}
