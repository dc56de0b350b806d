// Integration tests for the parser

use cfront::parser::ast::*;
use cfront::{parse, DiagnosticKind, ParseOptions, ParseOutput, Severity};
use pretty_assertions::assert_eq;

fn parse_c(source: &str) -> ParseOutput {
    parse(source, &ParseOptions::c())
}

fn parse_cpp(source: &str) -> ParseOutput {
    parse(source, &ParseOptions::cpp())
}

fn function<'a>(output: &'a ParseOutput, name: &str) -> &'a FunctionDecl {
    output
        .program
        .items
        .iter()
        .find_map(|item| match item {
            Decl::Function(f) if f.name.to_string() == name => Some(f),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no function named {}", name))
}

fn body<'a>(output: &'a ParseOutput, name: &str) -> &'a [Stmt] {
    match &function(output, name).body {
        Some(block) => &block.stmts,
        None => panic!("{} has no body", name),
    }
}

fn int_value(expr: &Expr) -> u64 {
    match &expr.kind {
        ExprKind::IntLiteral { value, .. } => *value,
        other => panic!("Expected integer literal, got {:?}", other),
    }
}

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    let output = parse_c("int r = 1 + 2 * 3;");
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    let Decl::Variable(var) = &output.program.items[0] else {
        panic!("Expected variable");
    };
    let Some(Initializer::Assign(init)) = &var.declarators[0].init else {
        panic!("Expected initializer");
    };
    match &init.kind {
        ExprKind::Binary { op: BinaryOp::Add, lhs, rhs } => {
            assert_eq!(int_value(lhs), 1);
            match &rhs.kind {
                ExprKind::Binary { op: BinaryOp::Mul, lhs, rhs } => {
                    assert_eq!(int_value(lhs), 2);
                    assert_eq!(int_value(rhs), 3);
                }
                other => panic!("Expected Mul, got {:?}", other),
            }
        }
        other => panic!("Expected Add, got {:?}", other),
    }
}

#[test]
fn test_dangling_else_attaches_to_inner_if() {
    let output = parse_c("void f(int a, int b, int x, int y) { if (a) if (b) x; else y; }");
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    let StmtKind::If {
        then_branch,
        else_branch,
        ..
    } = &body(&output, "f")[0].kind
    else {
        panic!("Expected outer if");
    };
    assert!(else_branch.is_none());
    let StmtKind::If { else_branch: inner_else, .. } = &then_branch.kind else {
        panic!("Expected inner if");
    };
    assert!(matches!(
        inner_else.as_deref().map(|s| &s.kind),
        Some(StmtKind::Expr(Expr { kind: ExprKind::Identifier(_), .. }))
    ));
}

#[test]
fn test_struct_initializer_keeps_declared_order() {
    let source = r#"
        struct Point { int x; int y; };
        struct Point p1 = {10, 20};
    "#;
    let output = parse_c(source);
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);

    let Decl::Record(record) = &output.program.items[0] else {
        panic!("Expected struct");
    };
    let members: Vec<String> = record
        .members
        .iter()
        .flatten()
        .filter_map(|m| m.decl.name())
        .collect();
    assert_eq!(members, vec!["x", "y"]);

    let Decl::Variable(var) = &output.program.items[1] else {
        panic!("Expected variable");
    };
    let Some(Initializer::Brace(items)) = &var.declarators[0].init else {
        panic!("Expected brace initializer");
    };
    let values: Vec<u64> = items.iter().map(|item| int_value(&item.value)).collect();
    assert_eq!(values, vec![10, 20]);
    assert!(items.iter().all(|item| item.designators.is_empty()));
}

#[test]
fn test_enum_discriminants_continue_from_explicit_value() {
    let output = parse_c("enum Letters { A, B, C, D = 10, E };");
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    let Decl::Enum(e) = &output.program.items[0] else {
        panic!("Expected enum");
    };
    let values: Vec<(String, Option<i64>)> = e
        .enumerators
        .iter()
        .flatten()
        .map(|en| (en.name.clone(), en.discriminant))
        .collect();
    assert_eq!(
        values,
        vec![
            ("A".to_string(), Some(0)),
            ("B".to_string(), Some(1)),
            ("C".to_string(), Some(2)),
            ("D".to_string(), Some(10)),
            ("E".to_string(), Some(11)),
        ]
    );
}

#[test]
fn test_typedef_name_starts_a_declaration() {
    let source = r#"
        typedef struct { int width; int height; } Rectangle;

        int main(void) {
            Rectangle rect;
            rect.width = 2;
            return 0;
        }
    "#;
    let output = parse_c(source);
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    assert_eq!(output.program.items[0].kind_name(), "Typedef");

    let stmts = body(&output, "main");
    match &stmts[0].kind {
        StmtKind::Decl(decl) => match decl.as_ref() {
            Decl::Variable(var) => {
                assert_eq!(var.declarators[0].name.to_string(), "rect");
                assert_eq!(var.specs.ty.to_string(), "Rectangle");
            }
            other => panic!("Expected variable, got {:?}", other),
        },
        other => panic!("Expected declaration, got {:?}", other),
    }
    assert!(matches!(stmts[1].kind, StmtKind::Expr(_)));
}

#[test]
fn test_unknown_identifier_pair_is_an_error() {
    // Without the typedef, `Rectangle rect;` cannot be a declaration.
    let output = parse_c("int main(void) { Rectangle rect; return 0; }");
    assert!(output.has_errors());
    assert_eq!(body(&output, "main").last().map(|s| s.kind.name()), Some("Return"));
}

#[test]
fn test_pointer_declaration_vs_multiplication() {
    let source = "typedef int T;\nint a, b;\nvoid f(void) { T * p; a * b; }";
    let output = parse_c(source);
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    let stmts = body(&output, "f");
    assert_eq!(stmts[0].kind.name(), "Declaration");
    assert_eq!(stmts[1].kind.name(), "Expr");
}

#[test]
fn test_goto_label_and_ternary() {
    let source = r#"
        int pick(int a) {
            int r = a ? 1 : 2;
            if (r) goto out;
            r = 3;
        out:
            return r;
        }
    "#;
    let output = parse_c(source);
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    let kinds: Vec<&str> = body(&output, "pick").iter().map(|s| s.kind.name()).collect();
    assert_eq!(kinds, vec!["Declaration", "If", "Expr", "Label", "Return"]);
}

#[test]
fn test_class_hierarchy_as_data() {
    let source = r#"
        class Shape {
        public:
            virtual ~Shape() = default;
            virtual double area() const = 0;
        };

        class Rectangle : public Shape {
        public:
            Rectangle(double w, double h) : width(w), height(h) {}
            double area() const override { return width * height; }
        private:
            double width, height;
        };
    "#;
    let output = parse_cpp(source);
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);

    let Decl::Record(rect) = &output.program.items[1] else {
        panic!("Expected class");
    };
    assert_eq!(rect.kind, RecordKind::Class);
    assert_eq!(rect.bases.len(), 1);
    assert_eq!(rect.bases[0].name.to_string(), "Shape");

    let members = rect.members.as_deref().unwrap_or_default();
    let area = members
        .iter()
        .find_map(|m| match &m.decl {
            Decl::Function(f) if f.name.to_string() == "area" => Some(f),
            _ => None,
        })
        .unwrap_or_else(|| panic!("area not found"));
    assert!(area.method.is_override);
    assert!(area.method.is_const);
    assert!(area.is_definition());
    assert_eq!(members.last().map(|m| m.access), Some(Access::Private));
}

#[test]
fn test_smart_pointer_idioms() {
    let source = r#"
        #include <memory>
        struct Node { int value; };

        int main() {
            std::unique_ptr<Node> head = std::make_unique<Node>();
            std::vector<std::unique_ptr<Node>> nodes;
            nodes.push_back(std::move(head));
            return nodes.size() > 0 ? 0 : 1;
        }
    "#;
    let output = parse_cpp(source);
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    assert_eq!(output.program.directives.len(), 1);
    assert_eq!(output.program.directives[0].name(), "include");

    let stmts = body(&output, "main");
    let kinds: Vec<&str> = stmts.iter().map(|s| s.kind.name()).collect();
    assert_eq!(kinds, vec!["Declaration", "Declaration", "Expr", "Return"]);

    let StmtKind::Decl(decl) = &stmts[1].kind else {
        panic!("Expected declaration");
    };
    let Decl::Variable(var) = decl.as_ref() else {
        panic!("Expected variable");
    };
    assert_eq!(var.specs.ty.to_string(), "std::vector<std::unique_ptr<Node>>");
}

#[test]
fn test_template_parameters_are_scoped() {
    let source = r#"
        template <typename T>
        T twice(T value) { return value + value; }

        int T;
        int main() { return T * 2; }
    "#;
    let output = parse_cpp(source);
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    assert_eq!(output.program.items[0].kind_name(), "Template");
    assert_eq!(output.program.items[1].kind_name(), "Variable");
}

#[test]
fn test_namespace_and_enum_class() {
    let source = r#"
        namespace app {
            enum class State { Idle, Running = 5, Done };
            struct Job { State state; };
        }
        app::Job job;
    "#;
    let output = parse_cpp(source);
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    let Decl::Namespace(ns) = &output.program.items[0] else {
        panic!("Expected namespace");
    };
    let Decl::Enum(state) = &ns.items[0] else {
        panic!("Expected enum");
    };
    assert!(state.scoped);
    let last = state.enumerators.as_ref().and_then(|v| v.last()).and_then(|en| en.discriminant);
    assert_eq!(last, Some(6));
    assert_eq!(output.program.items[1].kind_name(), "Variable");
}

#[test]
fn test_recovery_reports_and_continues() {
    let source = r#"
        int good1;
        int broken = 1 + ;
        int good2;
        void f(void) { int x = ; x = 1; }
        int good3;
    "#;
    let output = parse_c(source);
    assert_eq!(output.error_count(), 2);
    assert!(output.diagnostics.iter().all(|d| d.kind == DiagnosticKind::Syntax));
    let names: Vec<String> = output.program.items.iter().filter_map(|d| d.name()).collect();
    assert!(names.contains(&"good1".to_string()));
    assert!(names.contains(&"good2".to_string()));
    assert!(names.contains(&"f".to_string()));
    assert!(names.contains(&"good3".to_string()));
}

#[test]
fn test_unterminated_string_gives_one_diagnostic() {
    let output = parse_c("char *s = \"abc;\nint x = 1;\n");
    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.diagnostics[0].kind, DiagnosticKind::Lexical);
    assert_eq!(output.diagnostics[0].severity, Severity::Error);
    assert_eq!(output.program.items.len(), 2);
}

#[test]
fn test_unclosed_brace_is_a_nesting_error() {
    let output = parse_c("void f(void) {\n  if (1) {\n    return;\n}\nint after;");
    assert!(output
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::Nesting));
    assert_eq!(output.program.items[0].kind_name(), "Function");
}

#[test]
fn test_balanced_input_has_no_nesting_errors() {
    let source = "int a[2][3] = {{1, 2, 3}, {4, 5, 6}};\n\
                  int f(int (*g)(int)) { return g((a[0][1])); }";
    let output = parse_c(source);
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
}

#[test]
fn test_diagnostic_positions_are_one_based() {
    let output = parse_c("int x = ;");
    assert_eq!(output.diagnostics.len(), 1);
    let position = output.diagnostics[0].position();
    assert_eq!((position.line, position.column), (1, 9));
}
