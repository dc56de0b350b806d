// Scoped type-name table
//
// C's grammar is ambiguous without knowing which identifiers name types
// (`a * b;`, `(T)x`). The parser registers typedef names, class names and
// template names as it goes, and ordinary declarations shadow them.

use rustc_hash::FxHashMap;

/// The kind of scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeKind {
    /// Translation unit
    File,
    Namespace,
    /// Struct, union or class body
    Record,
    /// Function parameters and body
    Function,
    /// Compound statement
    Block,
    /// Template parameter list
    Template,
}

/// What an identifier denotes, as far as parsing is concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NameKind {
    Type,
    /// A class, function or alias template: `<` after it opens an argument list.
    Template,
    /// Variables, functions, enumerators. Shadows outer type names.
    Ordinary,
}

/// Typedef names from the standard C headers, visible in every file.
const PREDECLARED_TYPES: &[&str] = &[
    "size_t", "ssize_t", "ptrdiff_t", "intptr_t", "uintptr_t", "intmax_t", "uintmax_t",
    "int8_t", "int16_t", "int32_t", "int64_t", "uint8_t", "uint16_t", "uint32_t", "uint64_t",
    "off_t", "time_t", "clock_t", "FILE", "va_list", "jmp_buf", "sig_atomic_t", "div_t",
    "ldiv_t", "fpos_t",
];

/// Names that `<stdbool.h>`, `<stddef.h>` and `<uchar.h>` make types in C but
/// that are keywords in C++.
const PREDECLARED_C_ONLY: &[&str] = &["bool", "wchar_t", "char16_t", "char32_t"];

const STD_TYPES: &[&str] = &[
    "string", "wstring", "string_view", "size_t", "ptrdiff_t", "nullptr_t", "byte",
    "ostream", "istream", "iostream", "ostringstream", "istringstream", "stringstream",
    "ofstream", "ifstream", "fstream", "exception", "runtime_error", "logic_error",
    "invalid_argument", "out_of_range", "mutex", "thread", "int8_t", "int16_t", "int32_t",
    "int64_t", "uint8_t", "uint16_t", "uint32_t", "uint64_t",
];

const STD_TEMPLATES: &[&str] = &[
    "vector", "list", "forward_list", "deque", "map", "unordered_map", "multimap", "set",
    "unordered_set", "multiset", "pair", "tuple", "array", "stack", "queue",
    "priority_queue", "basic_string", "unique_ptr", "shared_ptr", "weak_ptr", "optional",
    "variant", "function", "initializer_list", "numeric_limits", "hash", "less", "greater",
    "lock_guard", "unique_lock", "make_unique", "make_shared", "make_pair", "make_tuple",
    "static_pointer_cast", "dynamic_pointer_cast", "get", "max", "min",
];

fn std_kind(name: &str) -> Option<NameKind> {
    if STD_TEMPLATES.contains(&name) {
        Some(NameKind::Template)
    } else if STD_TYPES.contains(&name) {
        Some(NameKind::Type)
    } else {
        None
    }
}

#[derive(Clone, Debug)]
struct Scope {
    kind: ScopeKind,
    /// Namespace or record name, used to qualify exported names.
    name: Option<String>,
    names: FxHashMap<String, NameKind>,
    /// Enumerator values, for names in `names` that have one.
    values: FxHashMap<String, i64>,
    /// Namespaces brought in with `using namespace`.
    using: Vec<String>,
}

impl Scope {
    fn new(kind: ScopeKind, name: Option<String>) -> Self {
        Scope {
            kind,
            name,
            names: FxHashMap::default(),
            values: FxHashMap::default(),
            using: Vec::new(),
        }
    }
}

/// A declaration that can be undone when speculation fails.
#[derive(Clone, Debug)]
struct JournalEntry {
    scope: usize,
    name: String,
    previous: Option<NameKind>,
    previous_value: Option<i64>,
}

/// Saved table state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableMark {
    depth: usize,
    journal: usize,
}

/// Stack of scopes mapping identifiers to [`NameKind`]s.
#[derive(Debug)]
pub struct TypeNameTable {
    scopes: Vec<Scope>,
    journal: Vec<JournalEntry>,
    cpp: bool,
}

impl TypeNameTable {
    /// Create a table whose file scope holds the standard C typedef names.
    pub fn new(cpp: bool) -> Self {
        let mut file = Scope::new(ScopeKind::File, None);
        for name in PREDECLARED_TYPES {
            file.names.insert((*name).to_string(), NameKind::Type);
        }
        if !cpp {
            for name in PREDECLARED_C_ONLY {
                file.names.insert((*name).to_string(), NameKind::Type);
            }
        }
        TypeNameTable {
            scopes: vec![file],
            journal: Vec::new(),
            cpp,
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn current_kind(&self) -> ScopeKind {
        self.scopes.last().map(|s| s.kind).unwrap_or(ScopeKind::File)
    }

    pub fn push(&mut self, kind: ScopeKind, name: Option<String>) {
        self.scopes.push(Scope::new(kind, name));
    }

    /// Leave the current scope. Type and template names and enumerator values
    /// declared in a namespace or record are re-declared in the parent under
    /// their qualified name (`geo::Point`); an anonymous namespace exports them
    /// unqualified.
    pub fn pop(&mut self) {
        if self.scopes.len() <= 1 {
            return;
        }
        let Some(scope) = self.scopes.pop() else {
            return;
        };
        if !matches!(scope.kind, ScopeKind::Namespace | ScopeKind::Record) {
            return;
        }
        // C has no member scopes: enumerators declared in a struct body are
        // visible unqualified after it.
        let cpp = self.cpp;
        let qualify = |name: String| match &scope.name {
            Some(prefix) if cpp => format!("{}::{}", prefix, name),
            _ => name,
        };
        let mut exported: Vec<(String, NameKind, Option<i64>)> = scope
            .names
            .iter()
            .filter(|(name, kind)| **kind != NameKind::Ordinary || scope.values.contains_key(*name))
            .map(|(name, kind)| {
                let value = scope.values.get(name).copied();
                (qualify(name.clone()), *kind, value)
            })
            .collect();
        exported.sort_by(|a, b| a.0.cmp(&b.0));
        for (name, kind, value) in exported {
            match value {
                Some(value) => self.declare_constant(&name, value),
                None => self.declare(&name, kind),
            }
        }
    }

    /// Declare `name` in the current scope.
    pub fn declare(&mut self, name: &str, kind: NameKind) {
        let index = self.scopes.len() - 1;
        self.declare_in(index, name, kind);
    }

    /// Declare in the nearest enclosing scope that is not a template
    /// parameter scope, so `template <class T> class Box` names `Box` outside.
    pub fn declare_outside_template(&mut self, name: &str, kind: NameKind) {
        let index = self
            .scopes
            .iter()
            .rposition(|s| s.kind != ScopeKind::Template)
            .unwrap_or(0);
        self.declare_in(index, name, kind);
    }

    /// Declare an enumerator with a known value in the current scope. Like
    /// any ordinary name it shadows outer declarations of the same name.
    pub fn declare_constant(&mut self, name: &str, value: i64) {
        let index = self.scopes.len() - 1;
        self.declare_value_in(index, name, NameKind::Ordinary, Some(value));
    }

    fn declare_in(&mut self, index: usize, name: &str, kind: NameKind) {
        self.declare_value_in(index, name, kind, None);
    }

    fn declare_value_in(&mut self, index: usize, name: &str, kind: NameKind, value: Option<i64>) {
        let Some(scope) = self.scopes.get_mut(index) else {
            return;
        };
        let previous = scope.names.insert(name.to_string(), kind);
        let previous_value = match value {
            Some(value) => scope.values.insert(name.to_string(), value),
            None => scope.values.remove(name),
        };
        tracing::trace!(name, ?kind, ?value, scope = index, "declare");
        self.journal.push(JournalEntry {
            scope: index,
            name: name.to_string(),
            previous,
            previous_value,
        });
    }

    /// Value of the enumerator `path` refers to, if the innermost declaration
    /// of that name is one.
    pub fn constant(&self, path: &str) -> Option<i64> {
        let path = path.trim_start_matches("::");
        self.scopes
            .iter()
            .rev()
            .find(|scope| scope.names.contains_key(path))
            .and_then(|scope| scope.values.get(path).copied())
    }

    pub fn add_using_namespace(&mut self, namespace: &str) {
        let namespace = namespace.trim_start_matches("::").to_string();
        if let Some(scope) = self.scopes.last_mut() {
            scope.using.push(namespace);
        }
    }

    /// Resolve an unqualified identifier, innermost scope first.
    pub fn lookup(&self, name: &str) -> Option<NameKind> {
        for scope in self.scopes.iter().rev() {
            if let Some(kind) = scope.names.get(name) {
                return Some(*kind);
            }
            for namespace in &scope.using {
                if let Some(kind) = self.lookup_qualified(&format!("{}::{}", namespace, name)) {
                    return Some(kind);
                }
            }
        }
        None
    }

    /// Resolve a `::`-separated path such as `std::vector` or `geo::Point`.
    pub fn lookup_qualified(&self, path: &str) -> Option<NameKind> {
        let path = path.trim_start_matches("::");
        if !path.contains("::") {
            return self.lookup(path);
        }
        if self.cpp {
            if let Some(member) = path.strip_prefix("std::") {
                if let Some(kind) = std_kind(member) {
                    return Some(kind);
                }
            }
        }
        // `geo::Point` written inside `namespace geo` itself.
        for (index, scope) in self.scopes.iter().enumerate() {
            let Some(name) = &scope.name else { continue };
            let rest = path
                .strip_prefix(name.as_str())
                .and_then(|rest| rest.strip_prefix("::"));
            if let Some(rest) = rest {
                for inner in self.scopes[index..].iter().rev() {
                    if let Some(kind) = inner.names.get(rest) {
                        return Some(*kind);
                    }
                }
            }
        }
        // Inside `namespace a`, `b::X` may have been exported as `b::X` into
        // the scope of `a`, or as `a::b::X` further out.
        let mut prefix = String::new();
        for scope in self.scopes.iter() {
            let kind = scope.kind;
            if let (ScopeKind::Namespace | ScopeKind::Record, Some(name)) = (kind, &scope.name) {
                prefix.push_str(name);
                prefix.push_str("::");
            }
        }
        for scope in self.scopes.iter().rev() {
            if let Some(kind) = scope.names.get(path) {
                return Some(*kind);
            }
        }
        if !prefix.is_empty() {
            let full = format!("{}{}", prefix, path);
            for scope in self.scopes.iter().rev() {
                if let Some(kind) = scope.names.get(&full) {
                    return Some(*kind);
                }
            }
        }
        None
    }

    pub fn is_type(&self, path: &str) -> bool {
        matches!(
            self.lookup_qualified(path),
            Some(NameKind::Type | NameKind::Template)
        )
    }

    pub fn is_template(&self, path: &str) -> bool {
        self.lookup_qualified(path) == Some(NameKind::Template)
    }

    pub fn mark(&self) -> TableMark {
        TableMark {
            depth: self.scopes.len(),
            journal: self.journal.len(),
        }
    }

    /// Undo every declaration and scope change made since `mark`.
    pub fn reset(&mut self, mark: TableMark) {
        self.scopes.truncate(mark.depth.max(1));
        while self.journal.len() > mark.journal {
            let Some(entry) = self.journal.pop() else {
                break;
            };
            let Some(scope) = self.scopes.get_mut(entry.scope) else {
                continue;
            };
            match entry.previous_value {
                Some(value) => {
                    scope.values.insert(entry.name.clone(), value);
                }
                None => {
                    scope.values.remove(&entry.name);
                }
            }
            match entry.previous {
                Some(kind) => {
                    scope.names.insert(entry.name, kind);
                }
                None => {
                    scope.names.remove(&entry.name);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinary_shadows_type() {
        let mut table = TypeNameTable::new(false);
        table.declare("T", NameKind::Type);
        table.push(ScopeKind::Block, None);
        table.declare("T", NameKind::Ordinary);
        assert!(!table.is_type("T"));
        table.pop();
        assert!(table.is_type("T"));
    }

    #[test]
    fn test_predeclared_c_names() {
        let c = TypeNameTable::new(false);
        assert!(c.is_type("size_t"));
        assert!(c.is_type("bool"));
        let cpp = TypeNameTable::new(true);
        assert_eq!(cpp.lookup("bool"), None);
    }

    #[test]
    fn test_namespace_export() {
        let mut table = TypeNameTable::new(true);
        table.push(ScopeKind::Namespace, Some("geo".to_string()));
        table.declare("Point", NameKind::Type);
        table.declare("area", NameKind::Ordinary);
        table.pop();
        assert!(table.is_type("geo::Point"));
        assert_eq!(table.lookup_qualified("geo::area"), None);
        assert!(!table.is_type("Point"));

        table.add_using_namespace("geo");
        assert!(table.is_type("Point"));
    }

    #[test]
    fn test_std_names() {
        let mut table = TypeNameTable::new(true);
        assert!(table.is_template("std::unique_ptr"));
        assert!(table.is_type("std::string"));
        assert!(!table.is_type("vector"));
        table.add_using_namespace("std");
        assert!(table.is_template("vector"));
    }

    #[test]
    fn test_template_scope() {
        let mut table = TypeNameTable::new(true);
        table.push(ScopeKind::Template, None);
        table.declare("T", NameKind::Type);
        table.declare_outside_template("Box", NameKind::Template);
        table.pop();
        assert!(!table.is_type("T"));
        assert!(table.is_template("Box"));
    }

    #[test]
    fn test_constants_follow_scopes() {
        let mut table = TypeNameTable::new(false);
        table.declare_constant("RED", 4);
        table.push(ScopeKind::Block, None);
        table.declare_constant("BLUE", 7);
        table.declare("RED", NameKind::Ordinary);
        assert_eq!(table.constant("RED"), None);
        assert_eq!(table.constant("BLUE"), Some(7));
        table.pop();
        assert_eq!(table.constant("RED"), Some(4));
        assert_eq!(table.constant("BLUE"), None);

        let mark = table.mark();
        table.declare_constant("GREEN", 1);
        table.declare_constant("RED", 9);
        table.reset(mark);
        assert_eq!(table.constant("GREEN"), None);
        assert_eq!(table.constant("RED"), Some(4));
    }

    #[test]
    fn test_namespace_exports_constants() {
        let mut table = TypeNameTable::new(true);
        table.push(ScopeKind::Namespace, Some("gfx".to_string()));
        table.declare_constant("DEPTH", 24);
        table.pop();
        assert_eq!(table.constant("gfx::DEPTH"), Some(24));
        assert_eq!(table.constant("DEPTH"), None);
    }

    #[test]
    fn test_reset_undoes_declarations() {
        let mut table = TypeNameTable::new(false);
        let mark = table.mark();
        table.declare("Rect", NameKind::Type);
        table.push(ScopeKind::Block, None);
        table.declare("x", NameKind::Ordinary);
        table.reset(mark);
        assert_eq!(table.depth(), 1);
        assert_eq!(table.lookup("Rect"), None);
    }
}
