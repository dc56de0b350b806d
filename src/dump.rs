//! Textual renderings of tokens and syntax trees
//!
//! The AST is flattened into an indented outline of [`OutlineRow`]s. The
//! same rows back the explorer's AST pane and the `--dump ast` output, so
//! both always agree. Labels start with the stable node kind name
//! ([`Decl::kind_name`], [`StmtKind::name`], [`ExprKind::name`]).

use std::fmt::Write as _;

use crate::config::{ParseOptions, TriviaMode};
use crate::diagnostics::Diagnostic;
use crate::parser::ast::*;
use crate::parser::lexer::tokenize;
use crate::parser::token::Token;

/// One line of the AST outline.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineRow {
    pub depth: usize,
    pub label: String,
    pub span: Span,
}

/// Flatten a program into outline rows in source order.
pub fn outline(program: &Program) -> Vec<OutlineRow> {
    let mut out = Outline { rows: Vec::new() };
    for item in &program.items {
        out.decl(item, 0);
    }
    out.rows
}

/// Outline rows joined as text, two spaces of indentation per level.
pub fn dump_ast(program: &Program) -> String {
    let mut text = String::new();
    for row in outline(program) {
        let _ = writeln!(text, "{:indent$}{}", "", row.label, indent = row.depth * 2);
    }
    text
}

/// `line:column  category  lexeme` for every token, end of input included.
pub fn dump_tokens(source: &str, options: &ParseOptions, keep_trivia: bool) -> String {
    let trivia = if keep_trivia {
        TriviaMode::Keep
    } else {
        TriviaMode::Discard
    };
    let (tokens, _) = tokenize(source, options.profile, trivia);
    let mut text = String::new();
    for token in &tokens {
        let _ = writeln!(text, "{}", token_line(token));
    }
    text
}

/// A single token as shown in dumps and the token pane.
pub fn token_line(token: &Token<'_>) -> String {
    format!(
        "{:>4}:{:<3} {:<14} {:?}",
        token.span.start.line,
        token.span.start.column,
        token.category().name(),
        token.lexeme
    )
}

/// One diagnostic per line, prefixed with `path`.
pub fn dump_diagnostics(path: &str, diagnostics: &[Diagnostic]) -> String {
    let mut text = String::new();
    for diagnostic in diagnostics {
        let _ = writeln!(text, "{}:{}", path, diagnostic);
    }
    text
}

struct Outline {
    rows: Vec<OutlineRow>,
}

impl Outline {
    fn push(&mut self, depth: usize, label: String, span: Span) {
        self.rows.push(OutlineRow { depth, label, span });
    }

    fn decl(&mut self, decl: &Decl, depth: usize) {
        self.decl_labeled(decl, depth, None);
    }

    fn decl_labeled(&mut self, decl: &Decl, depth: usize, prefix: Option<Access>) {
        let kind = decl.kind_name();
        let lead = match prefix {
            Some(access) => format!("[{}] {}", access.keyword(), kind),
            None => kind.to_string(),
        };

        match decl {
            Decl::Variable(var) => {
                let names: Vec<String> =
                    var.declarators.iter().map(|d| d.name.to_string()).collect();
                self.push(depth, format!("{} {}", lead, names.join(", ")), var.span);
                self.definition(&var.specs, depth + 1);
                for declarator in &var.declarators {
                    self.declarator(declarator, depth + 1);
                }
            }
            Decl::Function(func) => {
                let mut label = format!("{} {} -> {}", lead, func.name, func.return_type);
                if func.is_virtual() {
                    label.push_str(" virtual");
                }
                if func.method.is_pure {
                    label.push_str(" pure");
                }
                if func.method.is_const {
                    label.push_str(" const");
                }
                if func.body.is_none() {
                    label.push_str(" (prototype)");
                }
                self.push(depth, label, func.span);
                for param in &func.params {
                    self.param(param, depth + 1);
                }
                for init in &func.initializers {
                    self.push(depth + 1, format!("MemberInit {}", init.name), init.span);
                    for arg in &init.args {
                        self.expr(arg, depth + 2);
                    }
                }
                if let Some(body) = &func.body {
                    self.block(body, depth + 1);
                }
            }
            Decl::Record(record) => {
                let name = record.name.as_deref().unwrap_or("<anonymous>");
                let mut label = format!("{} {}", lead, name);
                if !record.bases.is_empty() {
                    let bases: Vec<String> = record
                        .bases
                        .iter()
                        .map(|base| match base.access {
                            Some(access) => format!("{} {}", access.keyword(), base.name),
                            None => base.name.to_string(),
                        })
                        .collect();
                    let _ = write!(label, " : {}", bases.join(", "));
                }
                if record.members.is_none() {
                    label.push_str(" (forward)");
                }
                self.push(depth, label, record.span);
                for member in record.members.iter().flatten() {
                    let access = (record.kind == RecordKind::Class).then_some(member.access);
                    self.decl_labeled(&member.decl, depth + 1, access);
                }
            }
            Decl::Enum(en) => {
                let mut label = format!("{} {}", lead, en.name.as_deref().unwrap_or("<anonymous>"));
                if en.scoped {
                    label.push_str(" (scoped)");
                }
                if let Some(ty) = &en.underlying {
                    let _ = write!(label, " : {}", ty);
                }
                self.push(depth, label, en.span);
                for enumerator in en.enumerators.iter().flatten() {
                    let value = match enumerator.discriminant {
                        Some(value) => value.to_string(),
                        None => "?".to_string(),
                    };
                    let label = format!("Enumerator {} = {}", enumerator.name, value);
                    self.push(depth + 1, label, enumerator.span);
                }
            }
            Decl::Typedef(typedef) => {
                let names: Vec<String> = typedef
                    .names
                    .iter()
                    .map(|n| format!("{}: {}", n.name, n.ty))
                    .collect();
                self.push(depth, format!("{} {}", lead, names.join(", ")), typedef.span);
                self.definition(&typedef.specs, depth + 1);
            }
            Decl::Template(template) => {
                let params: Vec<&str> =
                    template.params.iter().map(|p| p.name().unwrap_or("_")).collect();
                self.push(depth, format!("{} <{}>", lead, params.join(", ")), template.span);
                self.decl(&template.decl, depth + 1);
            }
            Decl::Namespace(ns) => {
                let name = ns
                    .name
                    .as_ref()
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "<anonymous>".to_string());
                self.push(depth, format!("{} {}", lead, name), ns.span);
                for item in &ns.items {
                    self.decl(item, depth + 1);
                }
            }
            Decl::Using(using) => {
                let detail = match &using.kind {
                    UsingKind::Namespace(name) => format!("namespace {}", name),
                    UsingKind::Declaration(name) => name.to_string(),
                    UsingKind::Alias { name, ty } => format!("{} = {}", name, ty),
                    UsingKind::NamespaceAlias { name, target } => {
                        format!("namespace {} = {}", name, target)
                    }
                };
                self.push(depth, format!("{} {}", lead, detail), using.span);
            }
            Decl::StaticAssert(assert) => {
                let label = match &assert.message {
                    Some(message) => format!("{} {:?}", lead, message),
                    None => lead,
                };
                self.push(depth, label, assert.span);
                self.expr(&assert.cond, depth + 1);
            }
            Decl::Empty(span) => self.push(depth, lead, *span),
        }
    }

    /// A record or enum defined inside declaration specifiers.
    fn definition(&mut self, specs: &DeclSpecs, depth: usize) {
        if let Some(definition) = &specs.definition {
            self.decl(definition, depth);
        }
    }

    fn declarator(&mut self, declarator: &InitDeclarator, depth: usize) {
        let mut label = format!("Declarator {}: {}", declarator.name, declarator.ty);
        if declarator.bit_width.is_some() {
            label.push_str(" (bitfield)");
        }
        self.push(depth, label, declarator.span);
        if let Some(width) = &declarator.bit_width {
            self.expr(width, depth + 1);
        }
        match &declarator.init {
            Some(Initializer::Assign(expr)) => self.expr(expr, depth + 1),
            Some(Initializer::Direct(args)) => {
                for arg in args {
                    self.expr(arg, depth + 1);
                }
            }
            Some(Initializer::Brace(items)) => self.init_items(items, depth + 1),
            None => {}
        }
    }

    fn param(&mut self, param: &Param, depth: usize) {
        let name = param.name.as_deref().unwrap_or("<unnamed>");
        self.push(depth, format!("Param {}: {}", name, param.ty), param.span);
        if let Some(default) = &param.default {
            self.expr(default, depth + 1);
        }
    }

    fn block(&mut self, block: &Block, depth: usize) {
        self.push(depth, "Block".to_string(), block.span);
        for stmt in &block.stmts {
            self.stmt(stmt, depth + 1);
        }
    }

    fn stmt(&mut self, stmt: &Stmt, depth: usize) {
        let name = stmt.kind.name();
        match &stmt.kind {
            StmtKind::Block(block) => self.block(block, depth),
            StmtKind::Decl(decl) => self.decl(decl, depth),
            StmtKind::Expr(expr) => {
                self.push(depth, name.to_string(), stmt.span);
                self.expr(expr, depth + 1);
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.push(depth, name.to_string(), stmt.span);
                self.expr(cond, depth + 1);
                self.stmt(then_branch, depth + 1);
                if let Some(else_branch) = else_branch {
                    self.push(depth + 1, "Else".to_string(), else_branch.span);
                    self.stmt(else_branch, depth + 2);
                }
            }
            StmtKind::Switch { cond, cases } => {
                self.push(depth, name.to_string(), stmt.span);
                self.expr(cond, depth + 1);
                for case in cases {
                    match case {
                        SwitchCase::Case { value, span, .. } => {
                            self.push(depth + 1, "Case".to_string(), *span);
                            self.expr(value, depth + 2);
                        }
                        SwitchCase::Default { span, .. } => {
                            self.push(depth + 1, "Default".to_string(), *span)
                        }
                    }
                    for inner in case.body() {
                        self.stmt(inner, depth + 2);
                    }
                }
            }
            StmtKind::While { cond, body } | StmtKind::DoWhile { body, cond } => {
                self.push(depth, name.to_string(), stmt.span);
                self.expr(cond, depth + 1);
                self.stmt(body, depth + 1);
            }
            StmtKind::For { init, cond, step, body } => {
                self.push(depth, name.to_string(), stmt.span);
                match init {
                    Some(ForInit::Decl(decl)) => self.decl(decl, depth + 1),
                    Some(ForInit::Expr(expr)) => self.expr(expr, depth + 1),
                    None => {}
                }
                for expr in cond.iter().chain(step.iter()) {
                    self.expr(expr, depth + 1);
                }
                self.stmt(body, depth + 1);
            }
            StmtKind::RangeFor { var, range, body } => {
                self.push(depth, name.to_string(), stmt.span);
                self.param(var, depth + 1);
                self.expr(range, depth + 1);
                self.stmt(body, depth + 1);
            }
            StmtKind::Goto(label) | StmtKind::Label(label) => {
                self.push(depth, format!("{} {}", name, label), stmt.span);
            }
            StmtKind::Return(value) => {
                self.push(depth, name.to_string(), stmt.span);
                if let Some(value) = value {
                    self.expr(value, depth + 1);
                }
            }
            StmtKind::Break | StmtKind::Continue | StmtKind::Empty => {
                self.push(depth, name.to_string(), stmt.span);
            }
        }
    }

    fn init_items(&mut self, items: &[InitItem], depth: usize) {
        for item in items {
            if item.designators.is_empty() {
                self.expr(&item.value, depth);
                continue;
            }
            let mut label = "Designated ".to_string();
            for designator in &item.designators {
                match designator {
                    Designator::Field(name) => {
                        let _ = write!(label, ".{}", name);
                    }
                    Designator::Index(Expr {
                        kind: ExprKind::IntLiteral { value, .. },
                        ..
                    }) => {
                        let _ = write!(label, "[{}]", value);
                    }
                    Designator::Index(_) => label.push_str("[<expr>]"),
                }
            }
            self.push(depth, label, item.span);
            self.expr(&item.value, depth + 1);
        }
    }

    fn expr(&mut self, expr: &Expr, depth: usize) {
        let name = expr.kind.name();
        let child = depth + 1;
        match &expr.kind {
            ExprKind::IntLiteral { text, .. }
            | ExprKind::FloatLiteral { text, .. }
            | ExprKind::CharLiteral { text, .. } => {
                self.push(depth, format!("{} {}", name, text), expr.span);
            }
            ExprKind::StringLiteral { value } => {
                self.push(depth, format!("{} {:?}", name, value), expr.span)
            }
            ExprKind::BoolLiteral(value) => {
                self.push(depth, format!("{} {}", name, value), expr.span)
            }
            ExprKind::Identifier(ident) => {
                self.push(depth, format!("{} {}", name, ident), expr.span)
            }
            ExprKind::Nullptr | ExprKind::This | ExprKind::Invalid => {
                self.push(depth, name.to_string(), expr.span)
            }
            ExprKind::Binary { op, lhs, rhs } => {
                self.push(depth, format!("{} {}", name, op.name()), expr.span);
                self.expr(lhs, child);
                self.expr(rhs, child);
            }
            ExprKind::Unary { op, operand } => {
                self.push(depth, format!("{} {}", name, op.name()), expr.span);
                self.expr(operand, child);
            }
            ExprKind::AddressOf(operand)
            | ExprKind::Dereference(operand)
            | ExprKind::SizeofExpr(operand) => {
                self.push(depth, name.to_string(), expr.span);
                self.expr(operand, child);
            }
            ExprKind::Assign { op, target, value } => {
                self.push(depth, format!("{} {}", name, op.symbol()), expr.span);
                self.expr(target, child);
                self.expr(value, child);
            }
            ExprKind::Ternary {
                cond,
                then_expr,
                else_expr,
            } => {
                self.push(depth, name.to_string(), expr.span);
                self.expr(cond, child);
                self.expr(then_expr, child);
                self.expr(else_expr, child);
            }
            ExprKind::Call { callee, args } => {
                self.push(depth, name.to_string(), expr.span);
                self.expr(callee, child);
                for arg in args {
                    self.expr(arg, child);
                }
            }
            ExprKind::Index { base, index } => {
                self.push(depth, name.to_string(), expr.span);
                self.expr(base, child);
                self.expr(index, child);
            }
            ExprKind::MemberAccess { object, member, arrow } => {
                let access = if *arrow { "->" } else { "." };
                self.push(depth, format!("{} {}{}", name, access, member), expr.span);
                self.expr(object, child);
            }
            ExprKind::Cast { style, ty, expr: operand } => {
                self.push(depth, format!("{} {} {}", name, style.name(), ty), expr.span);
                self.expr(operand, child);
            }
            ExprKind::SizeofType(ty) | ExprKind::AlignofType(ty) => {
                self.push(depth, format!("{} {}", name, ty), expr.span);
            }
            ExprKind::InitList(items) => {
                self.push(depth, name.to_string(), expr.span);
                self.init_items(items, child);
            }
            ExprKind::CompoundLiteral { ty, items } => {
                self.push(depth, format!("{} {}", name, ty), expr.span);
                self.init_items(items, child);
            }
            ExprKind::Construct { ty, args, braced } => {
                let brackets = if *braced { "{}" } else { "()" };
                self.push(depth, format!("{} {}{}", name, ty, brackets), expr.span);
                for arg in args {
                    self.expr(arg, child);
                }
            }
            ExprKind::Lambda(lambda) => {
                let captures: Vec<String> = lambda
                    .captures
                    .iter()
                    .map(|capture| match capture {
                        Capture::DefaultCopy => "=".to_string(),
                        Capture::DefaultRef => "&".to_string(),
                        Capture::This => "this".to_string(),
                        Capture::Copy(n) => n.clone(),
                        Capture::Ref(n) => format!("&{}", n),
                        Capture::Init { name, by_ref, .. } => {
                            format!("{}{} = ..", if *by_ref { "&" } else { "" }, name)
                        }
                    })
                    .collect();
                self.push(depth, format!("{} [{}]", name, captures.join(", ")), expr.span);
                for param in &lambda.params {
                    self.param(param, child);
                }
                self.block(&lambda.body, child);
            }
            ExprKind::New { ty, array_size, args } => {
                self.push(depth, format!("{} {}", name, ty), expr.span);
                if let Some(size) = array_size {
                    self.expr(size, child);
                }
                for arg in args.iter().flatten() {
                    self.expr(arg, child);
                }
            }
            ExprKind::Delete { operand, array } => {
                let label = if *array { format!("{}[]", name) } else { name.to_string() };
                self.push(depth, label, expr.span);
                self.expr(operand, child);
            }
        }
    }
}
