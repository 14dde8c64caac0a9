// packages/proxy/src/model/descriptor.rs
//! Type and method descriptors
//!
//! Proxies are built against runtime descriptions of types rather than
//! compiled interfaces. A [`TypeDescriptor`] is either a *capability* (a
//! contract, the analogue of an interface) or a *concrete* type; it declares
//! methods, annotations, and supertypes. Types are identified by name.

use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Shared type descriptor
pub type TypeRef = Arc<TypeDescriptor>;

/// Shared method descriptor
pub type MethodRef = Arc<MethodDescriptor>;

/// Name of the root type declaring the identity operations
pub const OBJECT_TYPE: &str = "Object";

/// Primitive return types (cannot represent a missing value)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Bool,
    Int,
    Float,
}

/// Declared return type of a method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnKind {
    Unit,
    Primitive(Primitive),
    Reference,
}

/// Kind of type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Pure contract; proxies can be generated for it
    Capability,
    /// Type with its own implementation
    Concrete,
}

/// The universal identity operations every object supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectMethod {
    ToString,
    Hash,
    Equals,
}

impl ObjectMethod {
    /// Classify a method as an identity operation by name and arity
    pub fn classify(method: &MethodDescriptor) -> Option<Self> {
        match (method.name(), method.param_count()) {
            ("to_string", 0) => Some(ObjectMethod::ToString),
            ("hash", 0) => Some(ObjectMethod::Hash),
            ("equals", 1) => Some(ObjectMethod::Equals),
            _ => None,
        }
    }

    /// Shared descriptor for this operation
    pub fn descriptor(self) -> MethodRef {
        match self {
            ObjectMethod::ToString => Arc::clone(&TO_STRING),
            ObjectMethod::Hash => Arc::clone(&HASH),
            ObjectMethod::Equals => Arc::clone(&EQUALS),
        }
    }
}

static TO_STRING: Lazy<MethodRef> = Lazy::new(|| {
    Arc::new(
        MethodDescriptor::new("to_string")
            .returns(ReturnKind::Reference)
            .declared_by(OBJECT_TYPE),
    )
});

static HASH: Lazy<MethodRef> = Lazy::new(|| {
    Arc::new(
        MethodDescriptor::new("hash")
            .returns(ReturnKind::Primitive(Primitive::Int))
            .declared_by(OBJECT_TYPE),
    )
});

static EQUALS: Lazy<MethodRef> = Lazy::new(|| {
    Arc::new(
        MethodDescriptor::new("equals")
            .arity(1)
            .returns(ReturnKind::Primitive(Primitive::Bool))
            .declared_by(OBJECT_TYPE),
    )
});

/// Description of a single method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    name: String,
    declaring: String,
    arity: usize,
    returns: ReturnKind,
    annotations: BTreeSet<String>,
}

impl MethodDescriptor {
    /// Method with no parameters returning a reference
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declaring: String::new(),
            arity: 0,
            returns: ReturnKind::Reference,
            annotations: BTreeSet::new(),
        }
    }

    pub fn arity(mut self, arity: usize) -> Self {
        self.arity = arity;
        self
    }

    pub fn returns(mut self, kind: ReturnKind) -> Self {
        self.returns = kind;
        self
    }

    pub fn annotated(mut self, annotation: impl Into<String>) -> Self {
        self.annotations.insert(annotation.into());
        self
    }

    /// Set the declaring type (done by [`TypeBuilder::build`])
    pub fn declared_by(mut self, declaring: impl Into<String>) -> Self {
        self.declaring = declaring.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the type that declares this method
    pub fn declaring(&self) -> &str {
        &self.declaring
    }

    pub fn param_count(&self) -> usize {
        self.arity
    }

    pub fn return_kind(&self) -> ReturnKind {
        self.returns
    }

    pub fn returns_primitive(&self) -> bool {
        matches!(self.returns, ReturnKind::Primitive(_))
    }

    pub fn annotations(&self) -> impl Iterator<Item = &str> {
        self.annotations.iter().map(String::as_str)
    }

    pub fn has_annotation(&self, annotation: &str) -> bool {
        self.annotations.contains(annotation)
    }

    /// `Declaring.name`
    pub fn qualified_name(&self) -> String {
        if self.declaring.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.declaring, self.name)
        }
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.qualified_name(), self.arity)
    }
}

/// Description of a type
#[derive(Debug)]
pub struct TypeDescriptor {
    name: String,
    kind: TypeKind,
    supertypes: Vec<TypeRef>,
    methods: Vec<MethodRef>,
    annotations: BTreeSet<String>,
}

impl TypeDescriptor {
    /// Start describing a capability
    pub fn capability(name: impl Into<String>) -> TypeBuilder {
        TypeBuilder::new(name.into(), TypeKind::Capability)
    }

    /// Start describing a concrete type
    pub fn concrete(name: impl Into<String>) -> TypeBuilder {
        TypeBuilder::new(name.into(), TypeKind::Concrete)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn is_capability(&self) -> bool {
        self.kind == TypeKind::Capability
    }

    /// Direct supertypes
    pub fn supertypes(&self) -> &[TypeRef] {
        &self.supertypes
    }

    /// Methods declared on this type (not inherited)
    pub fn declared_methods(&self) -> &[MethodRef] {
        &self.methods
    }

    pub fn annotations(&self) -> impl Iterator<Item = &str> {
        self.annotations.iter().map(String::as_str)
    }

    pub fn has_annotation(&self, annotation: &str) -> bool {
        self.annotations.contains(annotation)
    }

    /// All transitive supertypes, breadth-first, without duplicates
    pub fn ancestors(&self) -> Vec<TypeRef> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut queue: VecDeque<TypeRef> = self.supertypes.iter().cloned().collect();

        while let Some(ty) = queue.pop_front() {
            if ty.name == self.name || !seen.insert(ty.name.clone()) {
                continue;
            }
            queue.extend(ty.supertypes.iter().cloned());
            out.push(ty);
        }

        out
    }

    /// True if `other` is this type or one of its descendants
    pub fn is_assignable_from(&self, other: &TypeDescriptor) -> bool {
        self.name == other.name || other.ancestors().iter().any(|a| a.name == self.name)
    }

    /// Capabilities satisfied by this type: itself (if a capability) and every
    /// capability among its ancestors
    pub fn capabilities(self: &Arc<Self>) -> Vec<TypeRef> {
        let mut out = Vec::new();
        if self.is_capability() {
            out.push(Arc::clone(self));
        }
        out.extend(self.ancestors().into_iter().filter(|t| t.is_capability()));
        out
    }

    /// Find a method by name, searching this type then its ancestors
    pub fn method(&self, name: &str) -> Option<MethodRef> {
        self.methods
            .iter()
            .find(|m| m.name() == name)
            .cloned()
            .or_else(|| {
                self.ancestors()
                    .iter()
                    .find_map(|t| t.methods.iter().find(|m| m.name() == name).cloned())
            })
    }

    /// Declared and inherited methods
    pub fn all_methods(&self) -> Vec<MethodRef> {
        let mut out = self.methods.clone();
        for ancestor in self.ancestors() {
            out.extend(ancestor.methods.iter().cloned());
        }
        out
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Builder for [`TypeDescriptor`]
pub struct TypeBuilder {
    name: String,
    kind: TypeKind,
    supertypes: Vec<TypeRef>,
    methods: Vec<MethodDescriptor>,
    annotations: BTreeSet<String>,
}

impl TypeBuilder {
    fn new(name: String, kind: TypeKind) -> Self {
        Self {
            name,
            kind,
            supertypes: Vec::new(),
            methods: Vec::new(),
            annotations: BTreeSet::new(),
        }
    }

    /// Add a supertype
    pub fn extends(mut self, parent: &TypeRef) -> Self {
        self.supertypes.push(Arc::clone(parent));
        self
    }

    /// Declare a method
    pub fn method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    pub fn annotated(mut self, annotation: impl Into<String>) -> Self {
        self.annotations.insert(annotation.into());
        self
    }

    pub fn build(self) -> TypeRef {
        let name = self.name;
        let methods = self
            .methods
            .into_iter()
            .map(|m| Arc::new(m.declared_by(name.clone())))
            .collect();

        Arc::new(TypeDescriptor {
            name,
            kind: self.kind,
            supertypes: self.supertypes,
            methods,
            annotations: self.annotations,
        })
    }
}
