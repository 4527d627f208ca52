//! Structural model of a document: classes, their methods and properties,
//! top-level methods and assigned variables.
//!
//! The table is rebuilt from scratch by [`parse`] for every query. It is a
//! line-oriented recovery of structure, not a grammar: unparseable fragments
//! fall back to defaults and the parse never fails.

mod decl;
mod parser;

use crate::token::Position;
use crate::util::fast_map::{FastHashMap, FastHashSet};

pub use decl::{
    is_valid_parameter, parse_accessor, parse_def_header, parse_parameter, AccessorDecl, AccessorKind, DefHeader,
    RawParam,
};
pub use parser::{method_signature, parse};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Protected,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::Protected => "protected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterInfo {
    /// Name with any `@`, splat or block marker removed.
    pub name: String,
    pub type_name: String,
    pub default_value: Option<String>,
    pub is_optional: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInfo {
    pub name: String,
    pub parameters: Vec<ParameterInfo>,
    pub return_type: String,
    pub visibility: Visibility,
    /// Position of the method name on its declaration line.
    pub location: Position,
    pub documentation: String,
    pub is_property: bool,
    pub is_initializer: bool,
    pub is_static: bool,
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyInfo {
    pub name: String,
    pub type_name: String,
    pub visibility: Visibility,
    pub location: Position,
    pub has_getter: bool,
    pub has_setter: bool,
    pub is_read_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfo {
    pub name: String,
    pub superclass: Option<String>,
    /// Keyed by method name; a later declaration replaces an earlier one.
    pub methods: FastHashMap<String, MethodInfo>,
    pub properties: FastHashMap<String, PropertyInfo>,
    /// Position of the class name on its declaration line.
    pub location: Position,
    pub visibility: Visibility,
}

impl ClassInfo {
    pub(crate) fn new(name: &str, superclass: Option<&str>, location: Position) -> Self {
        Self {
            name: name.to_string(),
            superclass: superclass.map(str::to_string),
            methods: FastHashMap::default(),
            properties: FastHashMap::default(),
            location,
            visibility: Visibility::Public,
        }
    }

    /// Method names in a stable order.
    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn initializer(&self) -> Option<&MethodInfo> {
        self.methods.values().find(|m| m.is_initializer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariableScope {
    /// No block-level scoping is modeled.
    #[default]
    Global,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableInfo {
    pub name: String,
    pub type_name: String,
    pub location: Position,
    pub scope: VariableScope,
}

/// Everything the structural parse recovered from one version of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    pub classes: FastHashMap<String, ClassInfo>,
    pub variables: FastHashMap<String, VariableInfo>,
    /// Methods declared outside any class, in document order.
    pub top_level_methods: Vec<MethodInfo>,
}

impl SymbolTable {
    pub fn class(&self, name: &str) -> Option<&ClassInfo> {
        self.classes.get(name)
    }

    pub fn is_class(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn variable(&self, name: &str) -> Option<&VariableInfo> {
        self.variables.get(name)
    }

    /// `name` followed by its local superclasses, nearest first. Stops at the
    /// first class that is not declared in this document or was already seen.
    pub fn class_chain(&self, name: &str) -> Vec<&ClassInfo> {
        let mut chain = Vec::new();
        let mut seen = FastHashSet::default();
        let mut next = Some(name);
        while let Some(current) = next {
            if !seen.insert(current) {
                break;
            }
            let Some(class) = self.classes.get(current) else {
                break;
            };
            chain.push(class);
            next = class.superclass.as_deref();
        }
        chain
    }

    /// Looks `method` up on `class_name` and then its superclasses.
    pub fn find_method(&self, class_name: &str, method: &str) -> Option<&MethodInfo> {
        self.class_chain(class_name)
            .into_iter()
            .find_map(|class| class.methods.get(method))
    }

    /// Methods visible on `class_name` including inherited ones, filtered to
    /// static or instance methods. A subclass definition hides the inherited
    /// one of the same name. Sorted by name.
    pub fn members(&self, class_name: &str, is_static: bool) -> Vec<&MethodInfo> {
        let mut seen: FastHashSet<&str> = FastHashSet::default();
        let mut out = Vec::new();
        for class in self.class_chain(class_name) {
            let mut names = class.method_names();
            names.retain(|n| seen.insert(*n));
            for name in names {
                if let Some(method) = class.methods.get(name) {
                    if method.is_static == is_static {
                        out.push(method);
                    }
                }
            }
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Every declared method, class-scoped and top-level.
    pub fn all_methods(&self) -> impl Iterator<Item = &MethodInfo> {
        self.classes
            .values()
            .flat_map(|c| c.methods.values())
            .chain(self.top_level_methods.iter())
    }

    pub fn is_method(&self, name: &str) -> bool {
        self.all_methods().any(|m| m.name == name)
    }

    /// Class names in a stable order.
    pub fn class_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.classes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
