// packages/proxy/src/model/mod.rs
//! Runtime object model
//!
//! - **Descriptors**: types, capabilities, and methods as data
//! - **Values**: dynamic arguments and results
//! - **Targets**: objects that answer dynamic calls

pub mod descriptor;
pub mod target;
pub mod value;

pub use descriptor::{
    MethodDescriptor, MethodRef, ObjectMethod, Primitive, ReturnKind, TypeBuilder,
    TypeDescriptor, TypeKind, TypeRef, OBJECT_TYPE,
};
pub use target::{FnTarget, Target, TargetRef};
pub use value::{ObjectRef, Value};
