//! Class renaming: per-package namespaces, inner-class prefix binding, and
//! the dangling-type pass.
//!
//! Runs in two phases. The reserve phase records every descriptor that must
//! survive (kept and apply-mapped program classes, classpath and library
//! classes, missing types) in the global used set. The rename phase then
//! walks the remaining program classes and draws fresh binary names from the
//! namespace of their package, or, for inner classes whose structure is
//! preserved, from a namespace bound to the outer class's final binary name
//! plus the attribute separator.

use std::collections::{BTreeMap, HashMap, HashSet};

use shrike_core::descriptor::{
    binary_name_from_descriptor, package_from_binary_name, PACKAGE_SEPARATOR,
};
use shrike_core::TypeId;
use shrike_model::{referenced_types, ProgramModel};

use crate::error::MinifyError;
use crate::name_source::NameCounters;
use crate::options::MinifyOptions;
use crate::strategy::{ClassNamingStrategy, InternalNamingState};

/// Output of the class phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassRenaming {
    /// Final descriptor per type. Reserved types map to their reserved
    /// descriptor, so the table is total over everything that was pinned or
    /// renamed.
    pub classes: HashMap<TypeId, String>,
    /// Source package to final package, for every namespace that emitted a
    /// different prefix. Informational; descriptors are the source of truth.
    pub packages: BTreeMap<String, String>,
}

/// One naming scope: a package prefix or an outer-class prefix.
struct Namespace {
    /// The emitted package (or outer binary name) this namespace writes into.
    package_name: String,
    /// Descriptor prefix candidates are appended to, e.g. `"Lcom/x/"` or
    /// `"Lcom/x/A$"`.
    prefix: String,
    counters: NameCounters,
}

impl Namespace {
    fn new(package_name: &str) -> Self {
        let prefix = if package_name.is_empty() {
            "L".to_string()
        } else {
            format!("L{package_name}{PACKAGE_SEPARATOR}")
        };
        Self {
            package_name: package_name.to_string(),
            prefix,
            counters: NameCounters::new(),
        }
    }

    fn with_separator(outer_binary_name: &str, separator: &str) -> Self {
        Self {
            package_name: outer_binary_name.to_string(),
            prefix: format!("L{outer_binary_name}{separator}"),
            counters: NameCounters::new(),
        }
    }

    fn next_type_name(
        &mut self,
        ty: TypeId,
        strategy: &dyn ClassNamingStrategy,
        is_used: &dyn Fn(&str) -> bool,
    ) -> String {
        let prefix = self.prefix.clone();
        strategy.next_type(ty, &prefix, self, is_used)
    }
}

impl InternalNamingState for Namespace {
    fn dictionary_index(&self) -> usize {
        self.counters.dictionary_index()
    }

    fn increment_dictionary_index(&mut self) -> usize {
        self.counters.increment_dictionary_index()
    }

    fn increment_name_index(&mut self) -> usize {
        self.counters.increment_name_index()
    }
}

pub(crate) struct ClassNameMinifier<'a> {
    model: &'a ProgramModel,
    strategy: &'a dyn ClassNamingStrategy,
    options: &'a MinifyOptions,
    renaming: HashMap<TypeId, String>,
    /// Namespaces keyed by their source prefix: `""` for the top level, a
    /// package binary name, or an outer class's source binary name.
    states: HashMap<String, Namespace>,
    /// Case-folded per policy; candidates are rejected against this set.
    used_type_names: HashSet<String>,
    /// Exact descriptors already handed out, for conflict detection.
    assigned_descriptors: HashSet<String>,
}

impl<'a> ClassNameMinifier<'a> {
    pub fn new(
        model: &'a ProgramModel,
        strategy: &'a dyn ClassNamingStrategy,
        options: &'a MinifyOptions,
    ) -> Self {
        let mut states = HashMap::new();
        states.insert(String::new(), Namespace::new(""));
        Self {
            model,
            strategy,
            options,
            renaming: HashMap::new(),
            states,
            used_type_names: HashSet::new(),
            assigned_descriptors: HashSet::new(),
        }
    }

    pub fn compute_renaming(mut self) -> Result<ClassRenaming, MinifyError> {
        tracing::debug!("reserving class names");
        for class in self.model.program_classes() {
            if let Some(descriptor) = self.strategy.reserved_descriptor(class.id) {
                self.register_class_as_used(class.id, descriptor)?;
            }
        }
        let fixed: Vec<TypeId> = self
            .model
            .classes()
            .filter(|class| !class.is_program())
            .map(|class| class.id)
            .collect();
        for ty in fixed {
            self.register_class_as_used(ty, self.model.descriptor(ty).to_string())?;
        }
        let missing: Vec<TypeId> = self.model.missing_types().collect();
        for ty in missing {
            self.register_class_as_used(ty, self.model.descriptor(ty).to_string())?;
        }

        tracing::debug!("renaming classes");
        let program: Vec<TypeId> = self.model.program_classes().map(|class| class.id).collect();
        for ty in program {
            if !self.renaming.contains_key(&ty) {
                self.compute_name(ty)?;
            }
        }

        tracing::debug!("renaming dangling types");
        for class in self.model.program_classes() {
            for ty in referenced_types(class) {
                if self.model.was_pruned(ty) && !self.renaming.contains_key(&ty) {
                    self.rename_dangling_type(ty)?;
                }
            }
        }

        let mut packages = BTreeMap::new();
        for (source, namespace) in &self.states {
            if *source != namespace.package_name {
                packages.insert(source.clone(), namespace.package_name.clone());
            }
        }

        Ok(ClassRenaming {
            classes: self.renaming,
            packages,
        })
    }

    fn fold(&self, descriptor: &str) -> String {
        if self.options.mixed_case_class_names {
            descriptor.to_string()
        } else {
            descriptor.to_lowercase()
        }
    }

    fn set_used(&mut self, descriptor: &str) {
        let folded = self.fold(descriptor);
        self.used_type_names.insert(folded);
        self.assigned_descriptors.insert(descriptor.to_string());
    }

    /// Pins `ty` to `descriptor` and, when inner-class structure is kept,
    /// force-reserves the original descriptor of an outer class that would
    /// otherwise be renamed away from under its kept inner class.
    fn register_class_as_used(
        &mut self,
        ty: TypeId,
        descriptor: String,
    ) -> Result<(), MinifyError> {
        if let Some(existing) = self.renaming.get(&ty) {
            if *existing == descriptor {
                return Ok(());
            }
            return Err(MinifyError::InvariantViolation {
                member: self.model.descriptor(ty).to_string(),
                name: descriptor,
            });
        }
        if self.assigned_descriptors.contains(&descriptor) {
            return Err(MinifyError::InvariantViolation {
                member: self.model.descriptor(ty).to_string(),
                name: descriptor,
            });
        }
        self.renaming.insert(ty, descriptor.clone());
        self.set_used(&descriptor);

        if self.options.keep_inner_class_structure {
            if let Some(outer) = self.outer_class_of(ty) {
                if !self.renaming.contains_key(&outer)
                    && self.strategy.reserved_descriptor(outer).is_none()
                {
                    // The outer class was not and will not be kept; pin it in
                    // place so the inner class keeps a stable prefix.
                    let original = self.model.descriptor(outer).to_string();
                    self.register_class_as_used(outer, original)?;
                }
            }
        }
        Ok(())
    }

    fn outer_class_of(&self, ty: TypeId) -> Option<TypeId> {
        self.model
            .definition(ty)?
            .inner_class
            .as_ref()
            .map(|attribute| attribute.outer)
    }

    fn compute_name(&mut self, ty: TypeId) -> Result<String, MinifyError> {
        let mut state_key = None;
        if self.options.keep_inner_class_structure {
            let attribute = self
                .model
                .definition(ty)
                .and_then(|def| def.inner_class.as_ref());
            if let Some(attribute) = attribute {
                let outer = attribute.outer;
                let separator = attribute.separator.to_string();
                state_key = Some(self.namespace_for_outer_class(outer, &separator)?);
            }
        }
        let state_key = match state_key {
            Some(key) => key,
            None => self.namespace_for_package(ty),
        };

        let candidate = {
            let namespace = self
                .states
                .get_mut(&state_key)
                .expect("namespace was just ensured");
            let used = &self.used_type_names;
            let mixed_case = self.options.mixed_case_class_names;
            namespace.next_type_name(ty, self.strategy, &|candidate| {
                if mixed_case {
                    used.contains(candidate)
                } else {
                    used.contains(&candidate.to_lowercase())
                }
            })
        };
        self.set_used(&candidate);
        self.renaming.insert(ty, candidate.clone());
        Ok(candidate)
    }

    /// Namespace for a top-level (or structure-discarded) class, keyed by its
    /// source package. Repackaging binds the namespace to the target package
    /// instead while keeping the source key for the package-renaming table.
    fn namespace_for_package(&mut self, ty: TypeId) -> String {
        let descriptor = self.model.descriptor(ty);
        let source_package = binary_name_from_descriptor(descriptor)
            .map(package_from_binary_name)
            .unwrap_or("")
            .to_string();
        if !self.states.contains_key(&source_package) {
            let target = match &self.options.repackage_classes {
                Some(target) => target.as_str(),
                None => source_package.as_str(),
            };
            self.states
                .insert(source_package.clone(), Namespace::new(target));
        }
        source_package
    }

    /// Namespace bound to the outer class's final binary name. Renames the
    /// outer class first if it has no name yet; an outer class absent from
    /// the renaming set was force-reserved during the reserve phase.
    fn namespace_for_outer_class(
        &mut self,
        outer: TypeId,
        separator: &str,
    ) -> Result<String, MinifyError> {
        let source_key = binary_name_from_descriptor(self.model.descriptor(outer))
            .unwrap_or("")
            .to_string();
        if !self.states.contains_key(&source_key) {
            let renamed = match self.renaming.get(&outer) {
                Some(renamed) => renamed.clone(),
                None => self.compute_name(outer)?,
            };
            let binary = binary_name_from_descriptor(&renamed)
                .unwrap_or(&renamed)
                .to_string();
            self.states
                .insert(source_key.clone(), Namespace::with_separator(&binary, separator));
        }
        Ok(source_key)
    }

    /// A type defined in the program source that survives only in protos and
    /// field types. It can be renamed to anything unique; the top-level
    /// namespace hands out the name so proto hashes stay stable.
    fn rename_dangling_type(&mut self, ty: TypeId) -> Result<(), MinifyError> {
        if let Some(descriptor) = self.strategy.reserved_descriptor(ty) {
            return self.register_class_as_used(ty, descriptor);
        }
        let candidate = {
            let namespace = self
                .states
                .get_mut("")
                .expect("top-level namespace always exists");
            let used = &self.used_type_names;
            let mixed_case = self.options.mixed_case_class_names;
            namespace.next_type_name(ty, self.strategy, &|candidate| {
                if mixed_case {
                    used.contains(candidate)
                } else {
                    used.contains(&candidate.to_lowercase())
                }
            })
        };
        self.set_used(&candidate);
        self.renaming.insert(ty, candidate);
        Ok(())
    }
}
