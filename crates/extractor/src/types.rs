use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A method defined directly in a class body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MethodDecl {
    pub name: String,

    /// Line of the `def` (1-indexed)
    pub line: usize,

    /// Rendered parameters and return annotation, e.g. `speak(self) -> str`.
    /// Informational only.
    pub signature: String,

    pub file_path: PathBuf,
}

/// One class definition occurrence
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Declaration {
    /// Simple class name; not unique across files
    pub name: String,

    /// Base class expressions as written, in declaration order
    pub declared_bases: Vec<String>,

    /// Methods keyed by name, in source order. A later definition with the same name replaces
    /// the earlier one.
    pub methods: IndexMap<String, MethodDecl>,

    pub file_path: PathBuf,

    /// Line of the `class` keyword (1-indexed)
    pub line: usize,
}

impl Declaration {
    #[must_use]
    pub fn new(name: impl Into<String>, file_path: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            name: name.into(),
            declared_bases: Vec::new(),
            methods: IndexMap::new(),
            file_path: file_path.into(),
            line,
        }
    }

    /// Builder: append a declared base
    #[must_use]
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.declared_bases.push(base.into());
        self
    }

    /// Builder: add a method with a signature derived from its name
    #[must_use]
    pub fn with_method(mut self, name: &str, line: usize) -> Self {
        let method = MethodDecl {
            name: name.to_string(),
            line,
            signature: format!("{name}(self)"),
            file_path: self.file_path.clone(),
        };
        self.insert_method(method);
        self
    }

    /// Record a method; redefinitions keep the original position but take the new body
    pub fn insert_method(&mut self, method: MethodDecl) {
        self.methods.insert(method.name.clone(), method);
    }

    pub fn method(&self, name: &str) -> Option<&MethodDecl> {
        self.methods.get(name)
    }

    pub fn defines(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn is_in(&self, path: &Path) -> bool {
        self.file_path == path
    }
}
