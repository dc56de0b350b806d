// AST (Abstract Syntax Tree) definitions for C and the C++ subset

use std::fmt;

/// A point in the source text.
///
/// `line` and `column` are 1-based (columns count characters); `offset` is the
/// 0-based byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self { line, column, offset }
    }

    /// Position of the first character of a file.
    pub fn start() -> Self {
        Self::new(1, 1, 0)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Half-open source range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Empty span at `pos`.
    pub fn point(pos: Position) -> Self {
        Self::new(pos, pos)
    }

    /// Span from the start of `self` to the end of `other`.
    pub fn to(self, other: Span) -> Span {
        Span::new(self.start, other.end)
    }

    pub fn len(&self) -> usize {
        self.end.offset - self.start.offset
    }

    pub fn is_empty(&self) -> bool {
        self.start.offset == self.end.offset
    }

    pub fn contains_offset(&self, offset: usize) -> bool {
        self.start.offset <= offset && offset < self.end.offset
    }

    pub fn contains(&self, other: Span) -> bool {
        self.start.offset <= other.start.offset && other.end.offset <= self.end.offset
    }
}

// ===== Types =====

/// `const`, `volatile` and `restrict` qualifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Qualifiers {
    pub is_const: bool,
    pub is_volatile: bool,
    pub is_restrict: bool,
}

impl Qualifiers {
    pub fn is_empty(&self) -> bool {
        !self.is_const && !self.is_volatile && !self.is_restrict
    }

    pub fn merge(&mut self, other: Qualifiers) {
        self.is_const |= other.is_const;
        self.is_volatile |= other.is_volatile;
        self.is_restrict |= other.is_restrict;
    }
}

/// Width of an integer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    Short,
    Int,
    Long,
    LongLong,
}

/// The keyword that introduced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Struct,
    Union,
    Class,
}

impl RecordKind {
    pub fn keyword(self) -> &'static str {
        match self {
            RecordKind::Struct => "struct",
            RecordKind::Union => "union",
            RecordKind::Class => "class",
        }
    }

    /// Members of a `class` are private until an access specifier says
    /// otherwise; `struct` and `union` members start public.
    pub fn default_access(self) -> Access {
        match self {
            RecordKind::Class => Access::Private,
            RecordKind::Struct | RecordKind::Union => Access::Public,
        }
    }
}

/// Base (specifier) type before any declarator is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum BaseType {
    Void,
    Bool,
    /// `char`, `signed char` (`Some(true)`) or `unsigned char` (`Some(false)`).
    Char { signed: Option<bool> },
    Int { width: IntWidth, signed: bool },
    Float,
    Double,
    LongDouble,
    /// C++ `auto` type deduction.
    Auto,
    /// A typedef name, class name or template parameter.
    Named(QualifiedName),
    /// Reference to a struct, union or class. The definition, if any, is owned
    /// by the enclosing declaration's [`DeclSpecs::definition`].
    Record { kind: RecordKind, name: Option<String> },
    Enum { name: Option<String> },
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseType::Void => write!(f, "void"),
            BaseType::Bool => write!(f, "bool"),
            BaseType::Char { signed: None } => write!(f, "char"),
            BaseType::Char { signed: Some(true) } => write!(f, "signed char"),
            BaseType::Char { signed: Some(false) } => write!(f, "unsigned char"),
            BaseType::Int { width, signed } => {
                if !signed {
                    write!(f, "unsigned ")?;
                }
                match width {
                    IntWidth::Short => write!(f, "short"),
                    IntWidth::Int => write!(f, "int"),
                    IntWidth::Long => write!(f, "long"),
                    IntWidth::LongLong => write!(f, "long long"),
                }
            }
            BaseType::Float => write!(f, "float"),
            BaseType::Double => write!(f, "double"),
            BaseType::LongDouble => write!(f, "long double"),
            BaseType::Auto => write!(f, "auto"),
            BaseType::Named(name) => write!(f, "{}", name),
            BaseType::Record { kind, name } => match name {
                Some(name) => write!(f, "{} {}", kind.keyword(), name),
                None => write!(f, "{} <anonymous>", kind.keyword()),
            },
            BaseType::Enum { name } => match name {
                Some(name) => write!(f, "enum {}", name),
                None => write!(f, "enum <anonymous>"),
            },
        }
    }
}

/// A complete type: a base type wrapped by declarator derivations.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Base {
        base: BaseType,
        quals: Qualifiers,
    },
    Pointer {
        pointee: Box<Type>,
        quals: Qualifiers,
    },
    /// C++ `&` (`rvalue == false`) or `&&` reference.
    Reference {
        referent: Box<Type>,
        rvalue: bool,
    },
    Array {
        element: Box<Type>,
        size: Option<Box<Expr>>,
    },
    Function {
        ret: Box<Type>,
        params: Vec<Param>,
        variadic: bool,
    },
}

impl Type {
    pub fn new(base: BaseType) -> Self {
        Type::Base {
            base,
            quals: Qualifiers::default(),
        }
    }

    pub fn with_const(mut self) -> Self {
        match &mut self {
            Type::Base { quals, .. } | Type::Pointer { quals, .. } => quals.is_const = true,
            _ => {}
        }
        self
    }

    pub fn with_pointer(self) -> Self {
        Type::Pointer {
            pointee: Box::new(self),
            quals: Qualifiers::default(),
        }
    }

    pub fn with_array(self, size: Option<Expr>) -> Self {
        Type::Array {
            element: Box::new(self),
            size: size.map(Box::new),
        }
    }

    /// The innermost base type.
    pub fn base(&self) -> &BaseType {
        match self {
            Type::Base { base, .. } => base,
            Type::Pointer { pointee, .. } => pointee.base(),
            Type::Reference { referent, .. } => referent.base(),
            Type::Array { element, .. } => element.base(),
            Type::Function { ret, .. } => ret.base(),
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Type::Function { .. })
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer { .. })
    }

    /// Number of pointer levels directly wrapping the base, e.g. 2 for `char **`.
    pub fn pointer_depth(&self) -> usize {
        match self {
            Type::Pointer { pointee, .. } => 1 + pointee.pointer_depth(),
            _ => 0,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Base { base, quals } => {
                if quals.is_const {
                    write!(f, "const ")?;
                }
                if quals.is_volatile {
                    write!(f, "volatile ")?;
                }
                write!(f, "{}", base)
            }
            Type::Pointer { pointee, quals } => {
                write!(f, "{}*", pointee)?;
                if quals.is_const {
                    write!(f, " const")?;
                }
                if quals.is_restrict {
                    write!(f, " restrict")?;
                }
                Ok(())
            }
            Type::Reference { referent, rvalue } => {
                write!(f, "{}{}", referent, if *rvalue { "&&" } else { "&" })
            }
            Type::Array { element, size } => match size.as_deref() {
                Some(Expr {
                    kind: ExprKind::IntLiteral { value, .. },
                    ..
                }) => write!(f, "{}[{}]", element, value),
                Some(_) => write!(f, "{}[<expr>]", element),
                None => write!(f, "{}[]", element),
            },
            Type::Function { ret, params, variadic } => {
                write!(f, "{}(", ret)?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", param.ty)?;
                }
                if *variadic {
                    if !params.is_empty() {
                        write!(f, ", ")?;
                    }
                    write!(f, "...")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// One `::`-separated component of a name, with optional template arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct NameSegment {
    pub name: String,
    pub template_args: Option<Vec<TemplateArg>>,
}

/// A possibly qualified name such as `x`, `std::vector<int>` or `::Shape::area`.
#[derive(Debug, Clone, PartialEq)]
pub struct QualifiedName {
    /// Leading `::`.
    pub global: bool,
    pub segments: Vec<NameSegment>,
}

impl QualifiedName {
    pub fn simple(name: impl Into<String>) -> Self {
        Self {
            global: false,
            segments: vec![NameSegment {
                name: name.into(),
                template_args: None,
            }],
        }
    }

    pub fn is_simple(&self) -> bool {
        !self.global && self.segments.len() == 1 && self.segments[0].template_args.is_none()
    }

    /// The last segment's identifier.
    pub fn last(&self) -> &str {
        self.segments.last().map(|s| s.name.as_str()).unwrap_or("")
    }

    /// The name without template arguments, e.g. `std::unique_ptr`.
    pub fn path(&self) -> String {
        let mut out = String::new();
        if self.global {
            out.push_str("::");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                out.push_str("::");
            }
            out.push_str(&segment.name);
        }
        out
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.global {
            write!(f, "::")?;
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "::")?;
            }
            write!(f, "{}", segment.name)?;
            if let Some(args) = &segment.template_args {
                write!(f, "<")?;
                for (j, arg) in args.iter().enumerate() {
                    if j > 0 {
                        write!(f, ", ")?;
                    }
                    match arg {
                        TemplateArg::Type(ty) => write!(f, "{}", ty)?,
                        TemplateArg::Expr(expr) => write!(f, "{}", expr.kind.name())?,
                    }
                }
                write!(f, ">")?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateArg {
    Type(Type),
    Expr(Expr),
}

// ===== Expressions =====

/// Binary operators, including the comma operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // Shift
    Shl,
    Shr,
    // Comparison
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    // Bitwise
    BitAnd,
    BitXor,
    BitOr,
    // Logical
    LogicalAnd,
    LogicalOr,
    Comma,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitXor => "^",
            BinaryOp::BitOr => "|",
            BinaryOp::LogicalAnd => "&&",
            BinaryOp::LogicalOr => "||",
            BinaryOp::Comma => ",",
        }
    }

    /// Stable name used in AST dumps.
    pub fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "Add",
            BinaryOp::Sub => "Sub",
            BinaryOp::Mul => "Mul",
            BinaryOp::Div => "Div",
            BinaryOp::Mod => "Mod",
            BinaryOp::Shl => "Shl",
            BinaryOp::Shr => "Shr",
            BinaryOp::Lt => "Lt",
            BinaryOp::Le => "Le",
            BinaryOp::Gt => "Gt",
            BinaryOp::Ge => "Ge",
            BinaryOp::Eq => "Eq",
            BinaryOp::Ne => "Ne",
            BinaryOp::BitAnd => "BitAnd",
            BinaryOp::BitXor => "BitXor",
            BinaryOp::BitOr => "BitOr",
            BinaryOp::LogicalAnd => "LogicalAnd",
            BinaryOp::LogicalOr => "LogicalOr",
            BinaryOp::Comma => "Comma",
        }
    }
}

/// Simple (`=`) and compound assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    BitAnd,
    BitXor,
    BitOr,
}

impl AssignOp {
    pub fn symbol(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Mod => "%=",
            AssignOp::Shl => "<<=",
            AssignOp::Shr => ">>=",
            AssignOp::BitAnd => "&=",
            AssignOp::BitXor => "^=",
            AssignOp::BitOr => "|=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,     // -x
    Plus,    // +x
    Not,     // !x
    BitNot,  // ~x
    PreInc,  // ++x
    PreDec,  // --x
    PostInc, // x++
    PostDec, // x--
}

impl UnaryOp {
    pub fn name(self) -> &'static str {
        match self {
            UnaryOp::Neg => "Neg",
            UnaryOp::Plus => "Plus",
            UnaryOp::Not => "Not",
            UnaryOp::BitNot => "BitNot",
            UnaryOp::PreInc => "PreInc",
            UnaryOp::PreDec => "PreDec",
            UnaryOp::PostInc => "PostInc",
            UnaryOp::PostDec => "PostDec",
        }
    }
}

/// How a cast was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastStyle {
    /// `(T)expr`
    C,
    Static,
    Dynamic,
    Const,
    Reinterpret,
}

impl CastStyle {
    pub fn name(self) -> &'static str {
        match self {
            CastStyle::C => "c",
            CastStyle::Static => "static_cast",
            CastStyle::Dynamic => "dynamic_cast",
            CastStyle::Const => "const_cast",
            CastStyle::Reinterpret => "reinterpret_cast",
        }
    }
}

/// `.field` or `[index]` in a designated initializer.
#[derive(Debug, Clone, PartialEq)]
pub enum Designator {
    Field(String),
    Index(Expr),
}

/// One element of a brace-enclosed initializer list.
#[derive(Debug, Clone, PartialEq)]
pub struct InitItem {
    pub designators: Vec<Designator>,
    pub value: Expr,
    pub span: Span,
}

/// Lambda capture.
#[derive(Debug, Clone, PartialEq)]
pub enum Capture {
    /// `=`
    DefaultCopy,
    /// `&`
    DefaultRef,
    This,
    Copy(String),
    Ref(String),
    Init {
        name: String,
        by_ref: bool,
        init: Expr,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub captures: Vec<Capture>,
    pub params: Vec<Param>,
    pub return_type: Option<Type>,
    pub is_mutable: bool,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    IntLiteral {
        value: u64,
        text: String,
    },
    FloatLiteral {
        value: f64,
        text: String,
    },
    CharLiteral {
        value: u32,
        text: String,
    },
    /// Adjacent string literals are concatenated into one node.
    StringLiteral {
        value: String,
    },
    BoolLiteral(bool),
    Nullptr,
    This,
    Identifier(QualifiedName),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    AddressOf(Box<Expr>),
    Dereference(Box<Expr>),
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Ternary {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    /// `object.member` or `object->member`. The member name is unresolved.
    MemberAccess {
        object: Box<Expr>,
        member: String,
        arrow: bool,
    },
    Cast {
        style: CastStyle,
        ty: Type,
        expr: Box<Expr>,
    },
    SizeofType(Type),
    SizeofExpr(Box<Expr>),
    AlignofType(Type),
    InitList(Vec<InitItem>),
    /// C99 `(T){ ... }`.
    CompoundLiteral {
        ty: Type,
        items: Vec<InitItem>,
    },
    /// C++ `T(args)` or `T{args}` where `T` is a known type.
    Construct {
        ty: Type,
        args: Vec<Expr>,
        braced: bool,
    },
    Lambda(Box<Lambda>),
    New {
        ty: Type,
        array_size: Option<Box<Expr>>,
        args: Option<Vec<Expr>>,
    },
    Delete {
        operand: Box<Expr>,
        array: bool,
    },
    /// Stands in for a malformed token that was already reported.
    Invalid,
}

impl ExprKind {
    /// Stable node kind name used in dumps and fixture comparisons.
    pub fn name(&self) -> &'static str {
        match self {
            ExprKind::IntLiteral { .. } => "IntLiteral",
            ExprKind::FloatLiteral { .. } => "FloatLiteral",
            ExprKind::CharLiteral { .. } => "CharLiteral",
            ExprKind::StringLiteral { .. } => "StringLiteral",
            ExprKind::BoolLiteral(_) => "BoolLiteral",
            ExprKind::Nullptr => "Nullptr",
            ExprKind::This => "This",
            ExprKind::Identifier(_) => "Identifier",
            ExprKind::Binary { .. } => "BinaryOp",
            ExprKind::Unary { .. } => "UnaryOp",
            ExprKind::AddressOf(_) => "AddressOf",
            ExprKind::Dereference(_) => "Dereference",
            ExprKind::Assign { .. } => "Assign",
            ExprKind::Ternary { .. } => "Ternary",
            ExprKind::Call { .. } => "Call",
            ExprKind::Index { .. } => "Index",
            ExprKind::MemberAccess { .. } => "MemberAccess",
            ExprKind::Cast { .. } => "Cast",
            ExprKind::SizeofType(_) => "SizeofType",
            ExprKind::SizeofExpr(_) => "SizeofExpr",
            ExprKind::AlignofType(_) => "AlignofType",
            ExprKind::InitList(_) => "InitList",
            ExprKind::CompoundLiteral { .. } => "CompoundLiteral",
            ExprKind::Construct { .. } => "Construct",
            ExprKind::Lambda(_) => "Lambda",
            ExprKind::New { .. } => "New",
            ExprKind::Delete { .. } => "Delete",
            ExprKind::Invalid => "Invalid",
        }
    }
}

// ===== Statements =====

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

/// Switch arm
#[derive(Debug, Clone, PartialEq)]
pub enum SwitchCase {
    Case {
        value: Expr,
        body: Vec<Stmt>,
        span: Span,
    },
    Default {
        body: Vec<Stmt>,
        span: Span,
    },
}

impl SwitchCase {
    pub fn body(&self) -> &[Stmt] {
        match self {
            SwitchCase::Case { body, .. } | SwitchCase::Default { body, .. } => body,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    Decl(Box<Decl>),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Block(Block),
    Decl(Box<Decl>),
    Expr(Expr),
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    Switch {
        cond: Expr,
        cases: Vec<SwitchCase>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        cond: Expr,
    },
    For {
        init: Option<ForInit>,
        cond: Option<Expr>,
        step: Option<Expr>,
        body: Box<Stmt>,
    },
    /// C++ `for (decl : range)`.
    RangeFor {
        var: Param,
        range: Expr,
        body: Box<Stmt>,
    },
    Goto(String),
    Label(String),
    Return(Option<Expr>),
    Break,
    Continue,
    Empty,
}

impl StmtKind {
    pub fn name(&self) -> &'static str {
        match self {
            StmtKind::Block(_) => "Block",
            StmtKind::Decl(_) => "Declaration",
            StmtKind::Expr(_) => "Expr",
            StmtKind::If { .. } => "If",
            StmtKind::Switch { .. } => "Switch",
            StmtKind::While { .. } => "While",
            StmtKind::DoWhile { .. } => "DoWhile",
            StmtKind::For { .. } => "For",
            StmtKind::RangeFor { .. } => "RangeFor",
            StmtKind::Goto(_) => "Goto",
            StmtKind::Label(_) => "Label",
            StmtKind::Return(_) => "Return",
            StmtKind::Break => "Break",
            StmtKind::Continue => "Continue",
            StmtKind::Empty => "Empty",
        }
    }
}

// ===== Declarations =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageClass {
    Auto,
    Register,
    Static,
    Extern,
    ThreadLocal,
    Mutable,
}

impl StorageClass {
    pub fn keyword(self) -> &'static str {
        match self {
            StorageClass::Auto => "auto",
            StorageClass::Register => "register",
            StorageClass::Static => "static",
            StorageClass::Extern => "extern",
            StorageClass::ThreadLocal => "_Thread_local",
            StorageClass::Mutable => "mutable",
        }
    }
}

/// Non-type declaration specifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Specifiers {
    pub storage: Option<StorageClass>,
    pub is_inline: bool,
    pub is_virtual: bool,
    pub is_explicit: bool,
    pub is_friend: bool,
    pub is_constexpr: bool,
    pub is_noreturn: bool,
}

/// The specifier part of a declaration (`static const struct P { .. }`).
#[derive(Debug, Clone, PartialEq)]
pub struct DeclSpecs {
    /// Base type with its qualifiers.
    pub ty: Type,
    pub specifiers: Specifiers,
    /// A struct/union/class/enum defined inside the specifiers.
    pub definition: Option<Box<Decl>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Initializer {
    /// `= expr` (the expression may be an [`ExprKind::InitList`]).
    Assign(Expr),
    /// C++ `T x(args)`.
    Direct(Vec<Expr>),
    /// C++ `T x{items}`.
    Brace(Vec<InitItem>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InitDeclarator {
    pub name: QualifiedName,
    pub ty: Type,
    pub init: Option<Initializer>,
    /// Bitfield width for struct/union members.
    pub bit_width: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    pub specs: DeclSpecs,
    pub declarators: Vec<InitDeclarator>,
    pub span: Span,
}

/// Function parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Option<String>,
    pub ty: Type,
    pub default: Option<Expr>,
    pub span: Span,
}

/// Trailing qualifiers and markers on functions and methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct MethodQualifiers {
    pub is_const: bool,
    pub is_noexcept: bool,
    pub is_override: bool,
    pub is_final: bool,
    /// `= 0`
    pub is_pure: bool,
    /// `= default`
    pub is_defaulted: bool,
    /// `= delete`
    pub is_deleted: bool,
}

/// Constructor member initializer, `width(w)` or `base{args}`.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberInit {
    pub name: QualifiedName,
    pub args: Vec<Expr>,
    pub braced: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub specs: DeclSpecs,
    pub name: QualifiedName,
    pub return_type: Type,
    pub params: Vec<Param>,
    pub variadic: bool,
    pub method: MethodQualifiers,
    pub initializers: Vec<MemberInit>,
    /// `None` for a prototype.
    pub body: Option<Block>,
    pub span: Span,
}

impl FunctionDecl {
    pub fn is_definition(&self) -> bool {
        self.body.is_some()
    }

    pub fn is_virtual(&self) -> bool {
        self.specs.specifiers.is_virtual
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Public,
    Protected,
    Private,
}

impl Access {
    pub fn keyword(self) -> &'static str {
        match self {
            Access::Public => "public",
            Access::Protected => "protected",
            Access::Private => "private",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BaseSpecifier {
    pub access: Option<Access>,
    pub is_virtual: bool,
    pub name: QualifiedName,
    pub span: Span,
}

/// A record member with the access level in effect where it was declared.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub access: Access,
    pub decl: Decl,
}

/// `struct`, `union` or `class`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDecl {
    pub kind: RecordKind,
    pub name: Option<String>,
    pub bases: Vec<BaseSpecifier>,
    pub is_final: bool,
    /// `None` for a forward declaration; members keep declaration order.
    pub members: Option<Vec<Member>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enumerator {
    pub name: String,
    pub value: Option<Expr>,
    /// Explicit value when it is an integer constant expression, otherwise the
    /// previous discriminant plus one. `None` when it cannot be computed.
    pub discriminant: Option<i64>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub name: Option<String>,
    /// `enum class` / `enum struct`.
    pub scoped: bool,
    pub underlying: Option<Type>,
    pub enumerators: Option<Vec<Enumerator>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedefName {
    pub name: String,
    pub ty: Type,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedefDecl {
    pub specs: DeclSpecs,
    pub names: Vec<TypedefName>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateParam {
    /// `typename T = Default` / `class T`
    Type {
        name: Option<String>,
        default: Option<Type>,
        span: Span,
    },
    /// `int N = 4`
    Value {
        ty: Type,
        name: Option<String>,
        default: Option<Expr>,
        span: Span,
    },
}

impl TemplateParam {
    pub fn name(&self) -> Option<&str> {
        match self {
            TemplateParam::Type { name, .. } | TemplateParam::Value { name, .. } => name.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateDecl {
    pub params: Vec<TemplateParam>,
    pub decl: Box<Decl>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceDecl {
    /// `None` for an anonymous namespace.
    pub name: Option<QualifiedName>,
    pub items: Vec<Decl>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UsingKind {
    /// `using namespace std;`
    Namespace(QualifiedName),
    /// `using std::cout;`
    Declaration(QualifiedName),
    /// `using Alias = Type;`
    Alias { name: String, ty: Type },
    /// `namespace fs = std::filesystem;`
    NamespaceAlias { name: String, target: QualifiedName },
}

#[derive(Debug, Clone, PartialEq)]
pub struct UsingDecl {
    pub kind: UsingKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StaticAssertDecl {
    pub cond: Expr,
    pub message: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Variable(VariableDecl),
    Function(FunctionDecl),
    /// Struct, union or class; see [`RecordDecl::kind`].
    Record(RecordDecl),
    Enum(EnumDecl),
    Typedef(TypedefDecl),
    Template(TemplateDecl),
    Namespace(NamespaceDecl),
    Using(UsingDecl),
    StaticAssert(StaticAssertDecl),
    /// A stray `;`.
    Empty(Span),
}

impl Decl {
    pub fn span(&self) -> Span {
        match self {
            Decl::Variable(d) => d.span,
            Decl::Function(d) => d.span,
            Decl::Record(d) => d.span,
            Decl::Enum(d) => d.span,
            Decl::Typedef(d) => d.span,
            Decl::Template(d) => d.span,
            Decl::Namespace(d) => d.span,
            Decl::Using(d) => d.span,
            Decl::StaticAssert(d) => d.span,
            Decl::Empty(span) => *span,
        }
    }

    /// Stable node kind name used in dumps and fixture comparisons.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Decl::Variable(_) => "Variable",
            Decl::Function(_) => "Function",
            Decl::Record(record) => match record.kind {
                RecordKind::Struct => "Struct",
                RecordKind::Union => "Union",
                RecordKind::Class => "Class",
            },
            Decl::Enum(_) => "Enum",
            Decl::Typedef(_) => "Typedef",
            Decl::Template(_) => "Template",
            Decl::Namespace(_) => "Namespace",
            Decl::Using(_) => "Using",
            Decl::StaticAssert(_) => "StaticAssert",
            Decl::Empty(_) => "Empty",
        }
    }

    /// The declared name, for declarations that have exactly one.
    pub fn name(&self) -> Option<String> {
        match self {
            Decl::Variable(d) if d.declarators.len() == 1 => {
                Some(d.declarators[0].name.to_string())
            }
            Decl::Function(d) => Some(d.name.to_string()),
            Decl::Record(d) => d.name.clone(),
            Decl::Enum(d) => d.name.clone(),
            Decl::Typedef(d) if d.names.len() == 1 => Some(d.names[0].name.clone()),
            Decl::Template(d) => d.decl.name(),
            Decl::Namespace(d) => d.name.as_ref().map(|n| n.to_string()),
            Decl::Using(UsingDecl {
                kind: UsingKind::Alias { name, .. } | UsingKind::NamespaceAlias { name, .. },
                ..
            }) => Some(name.clone()),
            _ => None,
        }
    }
}

// ===== Program =====

/// A preprocessor directive line, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub text: String,
    pub span: Span,
}

impl Directive {
    /// The directive name, e.g. `include` for `#  include <stdio.h>`.
    pub fn name(&self) -> &str {
        let rest = self.text.trim_start_matches('#').trim_start();
        let end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        &rest[..end]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub text: String,
    pub span: Span,
}

impl Comment {
    pub fn is_block(&self) -> bool {
        self.text.starts_with("/*")
    }
}

/// Top-level program structure
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub items: Vec<Decl>,
    pub directives: Vec<Directive>,
    /// Populated only when trivia is attached.
    pub comments: Vec<Comment>,
    pub span: Span,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }

    /// Comments lying entirely inside `span`, in source order.
    pub fn comments_within(&self, span: Span) -> impl Iterator<Item = &Comment> {
        self.comments.iter().filter(move |c| span.contains(c.span))
    }

    /// Comments that end at or before `offset`, nearest last.
    pub fn comments_before(&self, offset: usize) -> impl Iterator<Item = &Comment> {
        self.comments.iter().filter(move |c| c.span.end.offset <= offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_display() {
        let ty = Type::new(BaseType::Char { signed: None }).with_const().with_pointer();
        assert_eq!(ty.to_string(), "const char*");
        assert_eq!(ty.pointer_depth(), 1);

        let unsigned = Type::new(BaseType::Int {
            width: IntWidth::LongLong,
            signed: false,
        });
        assert_eq!(unsigned.to_string(), "unsigned long long");
    }

    #[test]
    fn test_qualified_name_display() {
        let name = QualifiedName {
            global: false,
            segments: vec![
                NameSegment {
                    name: "std".to_string(),
                    template_args: None,
                },
                NameSegment {
                    name: "unique_ptr".to_string(),
                    template_args: Some(vec![TemplateArg::Type(Type::new(BaseType::Named(
                        QualifiedName::simple("Shape"),
                    )))]),
                },
            ],
        };
        assert_eq!(name.to_string(), "std::unique_ptr<Shape>");
        assert_eq!(name.path(), "std::unique_ptr");
        assert_eq!(name.last(), "unique_ptr");
        assert!(!name.is_simple());
    }

    #[test]
    fn test_span_contains() {
        let outer = Span::new(Position::new(1, 1, 0), Position::new(2, 1, 10));
        let inner = Span::new(Position::new(1, 3, 2), Position::new(1, 5, 4));
        assert!(outer.contains(inner));
        assert!(!inner.contains(outer));
        assert!(outer.contains_offset(9));
        assert!(!outer.contains_offset(10));
    }

    #[test]
    fn test_directive_name() {
        let directive = Directive {
            text: "#  include <stdio.h>".to_string(),
            span: Span::default(),
        };
        assert_eq!(directive.name(), "include");
    }

    #[test]
    fn test_statement_kind_names() {
        let names: Vec<&str> = [
            StmtKind::Decl(Box::new(Decl::Empty(Span::default()))),
            StmtKind::Expr(Expr::new(ExprKind::Invalid, Span::default())),
            StmtKind::Goto("out".to_string()),
            StmtKind::Empty,
        ]
        .iter()
        .map(StmtKind::name)
        .collect();
        assert_eq!(names, vec!["Declaration", "Expr", "Goto", "Empty"]);
    }
}
