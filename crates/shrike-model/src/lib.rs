//! The resolved program view consumed by the minifier.
//!
//! A [`ProgramModel`] is the class/method/field graph a front end hands to the
//! naming passes: every type mentioned anywhere in the input is interned to a
//! [`TypeId`], classes carry their supertype/interface edges, members, access
//! flags and inner-class attributes, and the model answers hierarchy and
//! method-resolution queries. The model is immutable once built; construction
//! goes through [`ProgramModelBuilder`].

mod hierarchy;
mod model;
mod resolution;

pub use hierarchy::SubtypingInfo;
pub use model::{
    referenced_types, AccessFlags, ClassDef, ClassKind, FieldDef, FieldRef, InnerClassAttribute,
    MethodDef, MethodRef, ModelError, ProgramModel, ProgramModelBuilder, Proto,
    OBJECT_DESCRIPTOR,
};
pub use resolution::{resolve_method, Resolution};

pub use shrike_core::{Name, TypeId};
