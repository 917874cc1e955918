use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

use log::debug;

use crate::codegen::Segment;
use crate::error::{CompileResult, DuplicateSymbolSnafu, UnknownSymbolSnafu};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Static,
    Field,
    Argument,
    Local,
}

impl SymbolKind {
    pub fn scope(self) -> Scope {
        match self {
            SymbolKind::Static | SymbolKind::Field => Scope::Class,
            SymbolKind::Argument | SymbolKind::Local => Scope::Subroutine,
        }
    }

    /// The VM segment variables of this kind live in.
    pub fn segment(self) -> Segment {
        match self {
            SymbolKind::Static => Segment::Static,
            SymbolKind::Field => Segment::This,
            SymbolKind::Argument => Segment::Argument,
            SymbolKind::Local => Segment::Local,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    Class,
    Subroutine,
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Class => write!(f, "class"),
            Scope::Subroutine => write!(f, "subroutine"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub ty: String,
    pub kind: SymbolKind,
    pub index: usize,
}

/// Names declared in one class: statics and fields live for the whole class,
/// arguments and locals only until the next `start_subroutine`.
#[derive(Clone, Debug)]
pub struct SymbolTable {
    class_name: String,
    subroutine_name: String,
    class_scope: HashMap<String, Symbol>,
    subroutine_scope: HashMap<String, Symbol>,
    counts: HashMap<SymbolKind, usize>,
}

impl SymbolTable {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            subroutine_name: "".to_string(),
            class_scope: HashMap::new(),
            subroutine_scope: HashMap::new(),
            counts: HashMap::new(),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn subroutine_name(&self) -> &str {
        &self.subroutine_name
    }

    pub fn start_subroutine(&mut self, name: impl Into<String>) {
        self.subroutine_name = name.into();
        self.subroutine_scope.clear();
        self.counts.remove(&SymbolKind::Argument);
        self.counts.remove(&SymbolKind::Local);
    }

    fn scope_mut(&mut self, scope: Scope) -> &mut HashMap<String, Symbol> {
        match scope {
            Scope::Class => &mut self.class_scope,
            Scope::Subroutine => &mut self.subroutine_scope,
        }
    }

    pub fn define(&mut self, name: &str, ty: &str, kind: SymbolKind) -> CompileResult<()> {
        let scope = kind.scope();
        if self.scope_mut(scope).contains_key(name) {
            return DuplicateSymbolSnafu { name, scope }.fail();
        }

        let count = self.counts.entry(kind).or_insert(0);
        let symbol = Symbol {
            name: name.to_string(),
            ty: ty.to_string(),
            kind,
            index: *count,
        };
        *count += 1;

        debug!(
            "{}.{}: define {} {} {:?} {}",
            self.class_name, self.subroutine_name, symbol.name, symbol.ty, kind, symbol.index
        );
        self.scope_mut(scope).insert(name.to_string(), symbol);
        Ok(())
    }

    /// Subroutine scope shadows class scope. Returns `None` for undeclared
    /// names, which callers may legitimately treat as class names.
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.subroutine_scope
            .get(name)
            .or_else(|| self.class_scope.get(name))
    }

    pub fn lookup(&self, name: &str) -> CompileResult<&Symbol> {
        match self.get(name) {
            Some(symbol) => Ok(symbol),
            None => UnknownSymbolSnafu {
                name,
                subroutine: format!("{}.{}", self.class_name, self.subroutine_name),
            }
            .fail(),
        }
    }

    pub fn var_count(&self, kind: SymbolKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn kind_of(&self, name: &str) -> CompileResult<SymbolKind> {
        Ok(self.lookup(name)?.kind)
    }

    pub fn type_of(&self, name: &str) -> CompileResult<&str> {
        Ok(&self.lookup(name)?.ty)
    }

    pub fn index_of(&self, name: &str) -> CompileResult<usize> {
        Ok(self.lookup(name)?.index)
    }

    /// Argument 0 of a method is the receiver, so every declared argument
    /// moves up one slot.
    pub fn shift_arguments(&mut self) {
        for symbol in self.subroutine_scope.values_mut() {
            if symbol.kind == SymbolKind::Argument {
                symbol.index += 1;
            }
        }
    }
}

impl Display for SymbolTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}.{} static:{} field:{} arg:{} var:{}}}",
            self.class_name,
            self.subroutine_name,
            self.var_count(SymbolKind::Static),
            self.var_count(SymbolKind::Field),
            self.var_count(SymbolKind::Argument),
            self.var_count(SymbolKind::Local),
        )
    }
}
