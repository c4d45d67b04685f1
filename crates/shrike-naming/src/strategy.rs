//! Naming strategies: who may be renamed, to what, and where fresh
//! candidates come from.
//!
//! The minifiers never decide policy themselves. They ask a
//! [`ClassNamingStrategy`] / [`MemberNamingStrategy`] for reserved names and
//! fresh candidates, and hand it the per-site dictionary/counter position as
//! an [`InternalNamingState`]. [`MinificationStrategy`] is the standard
//! implementation, driven by keep rules and an optional apply-mapping.

use std::collections::{HashMap, HashSet};

use shrike_core::{Name, TypeId};
use shrike_model::{ClassDef, ClassKind, FieldRef, MethodRef, ProgramModel};

use crate::error::MinifyError;
use crate::name_source;

/// Dictionary and counter position of one naming site.
pub trait InternalNamingState {
    fn dictionary_index(&self) -> usize;
    /// Returns the previous index.
    fn increment_dictionary_index(&mut self) -> usize;
    /// Returns the previous index. Counters are 1-based.
    fn increment_name_index(&mut self) -> usize;
}

/// Class-level naming decisions.
pub trait ClassNamingStrategy {
    /// Produce the next candidate descriptor under `prefix` (`"Lcom/x/"` or
    /// `"Lcom/x/A$"`), skipping candidates rejected by `is_used`.
    fn next_type(
        &self,
        ty: TypeId,
        prefix: &str,
        state: &mut dyn InternalNamingState,
        is_used: &dyn Fn(&str) -> bool,
    ) -> String;

    /// The locked-in descriptor for a type: its original descriptor when the
    /// type may not be renamed, the mapped descriptor under apply-mapping,
    /// `None` for free types.
    fn reserved_descriptor(&self, ty: TypeId) -> Option<String>;

    fn is_renamed_by_apply_mapping(&self, ty: TypeId) -> bool;

    fn is_kept_by_keep_rules(&self, ty: TypeId) -> bool;
}

/// Member-level naming decisions.
pub trait MemberNamingStrategy {
    /// Produce the next fresh method name, skipping candidates rejected by
    /// `is_available`.
    fn next_method(
        &self,
        method: &MethodRef,
        state: &mut dyn InternalNamingState,
        is_available: &dyn Fn(&Name) -> bool,
    ) -> Name;

    /// Produce one field-name candidate; the field minifier loops.
    fn next_field(&self, field: &FieldRef, state: &mut dyn InternalNamingState) -> Name;

    /// The locked-in name for a method, or `None` for free members.
    fn reserved_method_name(&self, method: &MethodRef, holder: &ClassDef) -> Option<Name>;

    /// The locked-in name for a field, or `None` for free members.
    fn reserved_field_name(&self, field: &FieldRef, holder: &ClassDef) -> Option<Name>;

    /// Per-class opt-out: when false, no member of `holder` is renamed.
    fn allow_member_renaming(&self, holder: &ClassDef) -> bool;

    /// False for members whose original names must survive; such members
    /// land in the kept table rather than the renaming table.
    fn is_minification_allowed(&self, method: &MethodRef) -> bool;

    /// Whether the field loop should stop on a reserved candidate instead of
    /// drawing the next one. True for pinned apply-mapping names.
    fn break_on_not_available(&self, field: &FieldRef, name: &Name) -> bool;

    fn has_apply_mapping(&self) -> bool;
}

/// Members whose original names must be preserved (`-keep` rules).
#[derive(Debug, Clone, Default)]
pub struct KeepRules {
    types: HashSet<TypeId>,
    methods: HashSet<MethodRef>,
    fields: HashSet<FieldRef>,
}

impl KeepRules {
    pub fn keep_type(&mut self, ty: TypeId) -> &mut Self {
        self.types.insert(ty);
        self
    }

    pub fn keep_method(&mut self, method: MethodRef) -> &mut Self {
        self.methods.insert(method);
        self
    }

    pub fn keep_field(&mut self, field: FieldRef) -> &mut Self {
        self.fields.insert(field);
        self
    }

    pub fn is_type_kept(&self, ty: TypeId) -> bool {
        self.types.contains(&ty)
    }
}

/// Predetermined renames from a previous run (`-applymapping`).
#[derive(Debug, Clone, Default)]
pub struct ApplyMapping {
    types: HashMap<TypeId, String>,
    methods: HashMap<MethodRef, Name>,
    fields: HashMap<FieldRef, Name>,
}

impl ApplyMapping {
    pub fn rename_type(&mut self, ty: TypeId, descriptor: impl Into<String>) -> &mut Self {
        self.types.insert(ty, descriptor.into());
        self
    }

    pub fn rename_method(&mut self, method: MethodRef, name: impl Into<Name>) -> &mut Self {
        self.methods.insert(method, name.into());
        self
    }

    pub fn rename_field(&mut self, field: FieldRef, name: impl Into<Name>) -> &mut Self {
        self.fields.insert(field, name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.methods.is_empty() && self.fields.is_empty()
    }
}

/// The standard strategy: keep rules pin originals, apply-mapping pins
/// targets, everything else draws from the dictionaries and the alphabet.
pub struct MinificationStrategy<'m> {
    model: &'m ProgramModel,
    keep: KeepRules,
    mapping: ApplyMapping,
    class_dictionary: Vec<String>,
    member_dictionary: Vec<String>,
}

impl<'m> MinificationStrategy<'m> {
    /// Validates the configuration up front: an apply-mapping that renames a
    /// kept member, targets a library class, or pins two types to the same
    /// descriptor is rejected before any phase runs.
    pub fn new(
        model: &'m ProgramModel,
        keep: KeepRules,
        mapping: ApplyMapping,
    ) -> Result<Self, MinifyError> {
        let mut targets: HashMap<&str, TypeId> = HashMap::new();
        for (&ty, descriptor) in &mapping.types {
            if keep.types.contains(&ty) && descriptor != model.descriptor(ty) {
                return Err(MinifyError::IllegalConfiguration(format!(
                    "apply-mapping renames kept class {}",
                    model.descriptor(ty)
                )));
            }
            if let Some(def) = model.definition(ty) {
                if def.kind == ClassKind::Library && descriptor != model.descriptor(ty) {
                    return Err(MinifyError::IllegalConfiguration(format!(
                        "apply-mapping renames library class {}",
                        model.descriptor(ty)
                    )));
                }
            }
            if let Some(&other) = targets.get(descriptor.as_str()) {
                if other != ty {
                    return Err(MinifyError::IllegalConfiguration(format!(
                        "apply-mapping pins both {} and {} to {descriptor}",
                        model.descriptor(other),
                        model.descriptor(ty)
                    )));
                }
            }
            targets.insert(descriptor.as_str(), ty);
        }
        for (method, name) in &mapping.methods {
            if keep.methods.contains(method) && *name != method.name {
                return Err(MinifyError::IllegalConfiguration(format!(
                    "apply-mapping renames kept method {}.{}",
                    model.descriptor(method.holder),
                    method.name
                )));
            }
            if let Some(def) = model.definition(method.holder) {
                if def.kind == ClassKind::Library && *name != method.name {
                    return Err(MinifyError::IllegalConfiguration(format!(
                        "apply-mapping renames library method {}.{}",
                        model.descriptor(method.holder),
                        method.name
                    )));
                }
            }
        }
        for (field, name) in &mapping.fields {
            if keep.fields.contains(field) && *name != field.name {
                return Err(MinifyError::IllegalConfiguration(format!(
                    "apply-mapping renames kept field {}.{}",
                    model.descriptor(field.holder),
                    field.name
                )));
            }
        }

        Ok(Self {
            model,
            keep,
            mapping,
            class_dictionary: Vec::new(),
            member_dictionary: Vec::new(),
        })
    }

    /// Words tried for class simple names before the alphabet.
    pub fn with_class_dictionary(mut self, dictionary: Vec<String>) -> Self {
        self.class_dictionary = dictionary;
        self
    }

    /// Words tried for member names before the alphabet.
    pub fn with_member_dictionary(mut self, dictionary: Vec<String>) -> Self {
        self.member_dictionary = dictionary;
        self
    }
}

impl ClassNamingStrategy for MinificationStrategy<'_> {
    fn next_type(
        &self,
        _ty: TypeId,
        prefix: &str,
        state: &mut dyn InternalNamingState,
        is_used: &dyn Fn(&str) -> bool,
    ) -> String {
        loop {
            let word = name_source::next_candidate(&self.class_dictionary, state);
            let candidate = format!("{prefix}{word};");
            if !is_used(&candidate) {
                return candidate;
            }
        }
    }

    fn reserved_descriptor(&self, ty: TypeId) -> Option<String> {
        if let Some(descriptor) = self.mapping.types.get(&ty) {
            return Some(descriptor.clone());
        }
        if self.keep.types.contains(&ty) {
            return Some(self.model.descriptor(ty).to_string());
        }
        None
    }

    fn is_renamed_by_apply_mapping(&self, ty: TypeId) -> bool {
        self.mapping.types.contains_key(&ty)
    }

    fn is_kept_by_keep_rules(&self, ty: TypeId) -> bool {
        self.keep.types.contains(&ty)
    }
}

impl MemberNamingStrategy for MinificationStrategy<'_> {
    fn next_method(
        &self,
        _method: &MethodRef,
        state: &mut dyn InternalNamingState,
        is_available: &dyn Fn(&Name) -> bool,
    ) -> Name {
        loop {
            let candidate = name_source::next_candidate(&self.member_dictionary, state);
            if is_available(&candidate) {
                return candidate;
            }
        }
    }

    fn next_field(&self, _field: &FieldRef, state: &mut dyn InternalNamingState) -> Name {
        name_source::next_candidate(&self.member_dictionary, state)
    }

    fn reserved_method_name(&self, method: &MethodRef, holder: &ClassDef) -> Option<Name> {
        if let Some(name) = self.mapping.methods.get(method) {
            return Some(name.clone());
        }
        if !holder.is_program() || self.keep.methods.contains(method) {
            return Some(method.name.clone());
        }
        None
    }

    fn reserved_field_name(&self, field: &FieldRef, holder: &ClassDef) -> Option<Name> {
        if let Some(name) = self.mapping.fields.get(field) {
            return Some(name.clone());
        }
        if !holder.is_program() || self.keep.fields.contains(field) {
            return Some(field.name.clone());
        }
        None
    }

    fn allow_member_renaming(&self, holder: &ClassDef) -> bool {
        holder.is_program()
    }

    fn is_minification_allowed(&self, method: &MethodRef) -> bool {
        if self.keep.methods.contains(method) {
            return false;
        }
        self.model
            .definition(method.holder)
            .is_some_and(ClassDef::is_program)
    }

    fn break_on_not_available(&self, field: &FieldRef, name: &Name) -> bool {
        self.mapping.fields.get(field) == Some(name)
    }

    fn has_apply_mapping(&self) -> bool {
        !self.mapping.is_empty()
    }
}
