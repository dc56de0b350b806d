//! Pluggable preprocessing pass
//!
//! The front end does not expand macros or evaluate conditionals. Directive
//! lines reach the lexer as [`TokenKind::Directive`](crate::parser::token::TokenKind)
//! trivia and are collected on the program. A caller that needs real
//! preprocessing supplies a [`Preprocessor`] and parses through
//! [`parse_with`]; positions in the resulting diagnostics then refer to the
//! preprocessed text.

use std::borrow::Cow;

use crate::config::ParseOptions;
use crate::parser::{self, ParseOutput};

/// A preprocessing pass that failed to produce text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("preprocessing failed: {0}")]
pub struct PreprocessError(pub String);

/// Source-to-source transformation run before lexing.
pub trait Preprocessor {
    fn preprocess<'a>(
        &self,
        source: &'a str,
        options: &ParseOptions,
    ) -> Result<Cow<'a, str>, PreprocessError>;
}

/// Hands the source to the lexer unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Preprocessor for Passthrough {
    fn preprocess<'a>(
        &self,
        source: &'a str,
        _options: &ParseOptions,
    ) -> Result<Cow<'a, str>, PreprocessError> {
        Ok(Cow::Borrowed(source))
    }
}

/// Any `Fn(&str) -> Result<String, PreprocessError>` works as a pass, e.g. a
/// wrapper around an external `cpp -P` invocation.
impl<F> Preprocessor for F
where
    F: Fn(&str) -> Result<String, PreprocessError>,
{
    fn preprocess<'a>(
        &self,
        source: &'a str,
        _options: &ParseOptions,
    ) -> Result<Cow<'a, str>, PreprocessError> {
        self(source).map(Cow::Owned)
    }
}

/// Preprocess `source` with `pass`, then parse the result.
pub fn parse_with<P: Preprocessor + ?Sized>(
    pass: &P,
    source: &str,
    options: &ParseOptions,
) -> Result<ParseOutput, PreprocessError> {
    let text = pass.preprocess(source, options)?;
    if let Cow::Owned(expanded) = &text {
        tracing::debug!(before = source.len(), after = expanded.len(), "preprocessed source");
    }
    Ok(parser::parse(&text, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::Decl;

    #[test]
    fn test_passthrough_keeps_directives_as_trivia() {
        let source = "#include <stdio.h>\nint x;\n";
        let output = parse_with(&Passthrough, source, &ParseOptions::c()).unwrap();
        assert!(output.diagnostics.is_empty());
        assert_eq!(output.program.directives.len(), 1);
        assert_eq!(output.program.items.len(), 1);
    }

    #[test]
    fn test_closure_pass() {
        let expand =
            |src: &str| -> Result<String, PreprocessError> { Ok(src.replace("COUNT", "4")) };
        let output = parse_with(&expand, "int a[COUNT];", &ParseOptions::c()).unwrap();
        assert!(output.diagnostics.is_empty());
        match &output.program.items[0] {
            Decl::Variable(var) => assert_eq!(var.declarators[0].ty.to_string(), "int[4]"),
            other => panic!("Expected variable, got {:?}", other),
        }
    }

    #[test]
    fn test_failing_pass() {
        let fail = |_: &str| -> Result<String, PreprocessError> {
            Err(PreprocessError("missing header".into()))
        };
        let err = parse_with(&fail, "int x;", &ParseOptions::c()).unwrap_err();
        assert_eq!(err.to_string(), "preprocessing failed: missing header");
    }
}
