//! Property-based tests for the lexer and parser.
//!
//! Case counts stay small so the suite runs quickly in debug builds.

use cfront::parser::ast::{BinaryOp, Decl, ExprKind, Expr, Initializer};
use cfront::parser::lexer::tokenize;
use cfront::{parse, DiagnosticKind, LanguageProfile, ParseOptions, TriviaMode};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

/// Printable ASCII plus line breaks and tabs.
fn arb_source() -> impl Strategy<Value = String> {
    "[ -~\n\t]{0,120}"
}

/// Fragments that look like C, so the lexer sees real token boundaries.
fn arb_c_like() -> impl Strategy<Value = String> {
    let fragment = prop_oneof![
        Just("int".to_string()),
        Just("x".to_string()),
        Just("42".to_string()),
        Just("0x".to_string()),
        Just("1.5e".to_string()),
        Just("'a'".to_string()),
        Just("\"str".to_string()),
        Just("\"ok\"".to_string()),
        Just("/* c */".to_string()),
        Just("/*".to_string()),
        Just("// line\n".to_string()),
        Just("\n#define X 1\n".to_string()),
        Just("<<=".to_string()),
        Just(">>".to_string()),
        Just("->".to_string()),
        Just("...".to_string()),
        Just("\\\n".to_string()),
        Just(" ".to_string()),
        Just("\n".to_string()),
        "[;{}()\\[\\]=+*&|?:]".prop_map(|s| s),
    ];
    prop::collection::vec(fragment, 0..24).prop_map(|parts| parts.concat())
}

#[derive(Debug, Clone)]
enum Arith {
    Num(u8),
    Bin(BinaryOp, Box<Arith>, Box<Arith>),
}

fn arb_op() -> impl Strategy<Value = BinaryOp> {
    prop_oneof![
        Just(BinaryOp::Add),
        Just(BinaryOp::Sub),
        Just(BinaryOp::Mul),
        Just(BinaryOp::Div),
        Just(BinaryOp::Mod),
    ]
}

fn arb_arith() -> impl Strategy<Value = Arith> {
    let leaf = (0u8..100).prop_map(Arith::Num);
    leaf.prop_recursive(4, 24, 2, |inner| {
        (arb_op(), inner.clone(), inner)
            .prop_map(|(op, lhs, rhs)| Arith::Bin(op, Box::new(lhs), Box::new(rhs)))
    })
}

/// Strategy for balanced delimiter soup.
fn arb_balanced() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        Just("x".to_string()),
        Just("1".to_string()),
        Just(";".to_string()),
        Just("+".to_string()),
        Just(",".to_string()),
        Just("int".to_string()),
    ];
    leaf.prop_recursive(5, 40, 4, |inner| {
        (0usize..3, prop::collection::vec(inner, 0..4)).prop_map(|(kind, items)| {
            let body = items.join(" ");
            match kind {
                0 => format!("({})", body),
                1 => format!("[{}]", body),
                _ => format!("{{{}}}", body),
            }
        })
    })
}

// ============================================================================
// Helpers
// ============================================================================

fn precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Add | BinaryOp::Sub => 1,
        _ => 2,
    }
}

/// Render with only the parentheses the grammar needs.
fn render(expr: &Arith) -> String {
    match expr {
        Arith::Num(n) => n.to_string(),
        Arith::Bin(op, lhs, rhs) => {
            let prec = precedence(*op);
            let left = match lhs.as_ref() {
                Arith::Bin(inner, ..) if precedence(*inner) < prec => format!("({})", render(lhs)),
                _ => render(lhs),
            };
            let right = match rhs.as_ref() {
                Arith::Bin(inner, ..) if precedence(*inner) <= prec => format!("({})", render(rhs)),
                _ => render(rhs),
            };
            format!("{} {} {}", left, op.symbol(), right)
        }
    }
}

/// Fully parenthesized shape of the generated tree.
fn shape_of_arith(expr: &Arith) -> String {
    match expr {
        Arith::Num(n) => n.to_string(),
        Arith::Bin(op, lhs, rhs) => {
            format!("({} {} {})", shape_of_arith(lhs), op.name(), shape_of_arith(rhs))
        }
    }
}

/// Fully parenthesized shape of the parsed tree.
fn shape_of_expr(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::IntLiteral { value, .. } => value.to_string(),
        ExprKind::Binary { op, lhs, rhs } => {
            format!("({} {} {})", shape_of_expr(lhs), op.name(), shape_of_expr(rhs))
        }
        other => format!("<{}>", other.name()),
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Concatenated lexemes of the trivia-inclusive stream rebuild the input.
    #[test]
    fn lexemes_rebuild_source(source in arb_source()) {
        let (tokens, _) = tokenize(&source, LanguageProfile::C, TriviaMode::Keep);
        let rebuilt: String = tokens.iter().map(|t| t.lexeme).collect();
        prop_assert_eq!(&rebuilt, &source);
        prop_assert!(tokens.last().is_some_and(|t| t.is_eof()));
    }

    #[test]
    fn lexemes_rebuild_c_like_source(source in arb_c_like()) {
        for profile in [LanguageProfile::C, LanguageProfile::Cpp] {
            let (tokens, _) = tokenize(&source, profile, TriviaMode::Keep);
            let rebuilt: String = tokens.iter().map(|t| t.lexeme).collect();
            prop_assert_eq!(&rebuilt, &source);
        }
    }

    /// Re-lexing the rebuilt text gives the same tokens and diagnostics.
    #[test]
    fn relexing_is_idempotent(source in arb_c_like()) {
        let (first, first_diags) = tokenize(&source, LanguageProfile::Cpp, TriviaMode::Keep);
        let rebuilt: String = first.iter().map(|t| t.lexeme).collect();
        let (second, second_diags) = tokenize(&rebuilt, LanguageProfile::Cpp, TriviaMode::Keep);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(&first_diags, &second_diags);
    }

    /// The parser always finishes and never panics.
    #[test]
    fn parser_terminates(source in arb_source()) {
        let output = parse(&source, &ParseOptions::cpp());
        for diagnostic in &output.diagnostics {
            prop_assert!(diagnostic.span.start.line >= 1);
            prop_assert!(diagnostic.span.start.column >= 1);
        }
    }

    /// Arithmetic follows the usual precedence and left associativity.
    #[test]
    fn arithmetic_precedence(expr in arb_arith()) {
        let source = format!("int r = {};", render(&expr));
        let output = parse(&source, &ParseOptions::c());
        prop_assert!(output.diagnostics.is_empty(), "{}: {:?}", source, output.diagnostics);

        let init = match output.program.items.first() {
            Some(Decl::Variable(var)) => match &var.declarators[0].init {
                Some(Initializer::Assign(init)) => init.clone(),
                other => {
                    let message = format!("unexpected initializer {:?}", other);
                    return Err(TestCaseError::fail(message));
                }
            },
            other => return Err(TestCaseError::fail(format!("unexpected item {:?}", other))),
        };
        prop_assert_eq!(shape_of_expr(&init), shape_of_arith(&expr));
    }

    /// Balanced delimiters never produce nesting diagnostics, whatever the
    /// syntax errors.
    #[test]
    fn balanced_input_has_no_nesting_errors(body in arb_balanced()) {
        let source = format!("void f(void) {{ {} }}", body);
        let output = parse(&source, &ParseOptions::c());
        prop_assert!(
            output.diagnostics.iter().all(|d| d.kind != DiagnosticKind::Nesting),
            "{}: {:?}",
            source,
            output.diagnostics
        );
    }
}
