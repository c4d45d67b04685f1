//! Field renaming with per-holder scoping.
//!
//! Field scopes are much simpler than method scopes: a field reference
//! resolves to its declaring class, so collisions only matter within one
//! hierarchy chain. Every class carries a reserved-name state inherited from
//! its superclass; assigned names are reserved downward so subclasses avoid
//! them, while unrelated siblings are free to reuse. Counters are kept per
//! field descriptor type, following the dispatch rules, and copied from the
//! parent so a subclass pool starts where its superclass left off.

use std::collections::HashMap;

use shrike_core::{Name, TypeId};
use shrike_model::{ClassDef, FieldDef, FieldRef, ProgramModel};

use crate::error::MinifyError;
use crate::name_source::NameCounters;
use crate::options::MinifyOptions;
use crate::strategy::MemberNamingStrategy;

/// Output of the field phase: members whose final name differs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldRenaming {
    pub renaming: HashMap<FieldRef, Name>,
}

#[derive(Debug, Default)]
struct ReservedFieldNames {
    parent: Option<usize>,
    names: std::collections::HashSet<Name>,
}

/// Per-class counters, keyed by field type.
#[derive(Debug, Clone, Default)]
struct FieldNamingState {
    counters: HashMap<TypeId, NameCounters>,
}

pub(crate) struct FieldNameMinifier<'a> {
    model: &'a ProgramModel,
    strategy: &'a dyn MemberNamingStrategy,
    options: &'a MinifyOptions,
    reserved: Vec<ReservedFieldNames>,
    reserved_by_type: HashMap<TypeId, usize>,
    states: HashMap<TypeId, FieldNamingState>,
    renaming: HashMap<FieldRef, Name>,
}

impl<'a> FieldNameMinifier<'a> {
    pub fn new(
        model: &'a ProgramModel,
        strategy: &'a dyn MemberNamingStrategy,
        options: &'a MinifyOptions,
    ) -> Self {
        Self {
            model,
            strategy,
            options,
            reserved: vec![ReservedFieldNames::default()],
            reserved_by_type: HashMap::new(),
            states: HashMap::new(),
            renaming: HashMap::new(),
        }
    }

    pub fn compute_renaming(mut self) -> Result<FieldRenaming, MinifyError> {
        tracing::debug!("reserving field names");
        self.reserve_field_names();
        tracing::debug!("renaming fields");
        self.rename_fields_in_classes();
        Ok(FieldRenaming {
            renaming: self.renaming,
        })
    }

    fn reserve_field_names(&mut self) {
        for ty in self.model.top_down_order() {
            let def = self.model.definition(ty).expect("top-down order is defined");
            let node = self.reserved_state_for(ty);
            for field in self.options.member_ordering.apply(&def.fields) {
                let reference = field.reference(ty);
                if let Some(reserved) = self.strategy.reserved_field_name(&reference, def) {
                    self.reserved[node].names.insert(reserved);
                }
            }
        }
    }

    fn reserved_state_for(&mut self, ty: TypeId) -> usize {
        if let Some(&node) = self.reserved_by_type.get(&ty) {
            return node;
        }
        let parent = self
            .model
            .definition(ty)
            .and_then(|def| def.super_type)
            .and_then(|superty| self.reserved_by_type.get(&superty).copied())
            .unwrap_or(0);
        let node = self.reserved.len();
        self.reserved.push(ReservedFieldNames {
            parent: Some(parent),
            names: Default::default(),
        });
        self.reserved_by_type.insert(ty, node);
        node
    }

    fn is_reserved(&self, node: usize, name: &Name) -> bool {
        let mut current = Some(node);
        while let Some(index) = current {
            let state = &self.reserved[index];
            if state.names.contains(name) {
                return true;
            }
            current = state.parent;
        }
        false
    }

    fn rename_fields_in_classes(&mut self) {
        for ty in self.model.top_down_order() {
            let def = self.model.definition(ty).expect("top-down order is defined");

            // Counters continue from the superclass pool.
            let state = def
                .super_type
                .and_then(|superty| self.states.get(&superty))
                .cloned()
                .unwrap_or_default();
            self.states.insert(ty, state);

            if !def.is_program() || !self.strategy.allow_member_renaming(def) {
                continue;
            }
            let node = self.reserved_state_for(ty);
            for field in self.options.member_ordering.apply(&def.fields) {
                self.assign_name_to_field(def, field, node);
            }
        }
    }

    fn assign_name_to_field(&mut self, holder: &ClassDef, field: &FieldDef, node: usize) {
        let reference = field.reference(holder.id);
        let name = match self.strategy.reserved_field_name(&reference, holder) {
            Some(reserved) => reserved,
            None => self.create_new_name(&reference, node),
        };
        if name != reference.name {
            self.renaming.insert(reference, name.clone());
        }
        // Reserve the assignment downward so subclass fields avoid it.
        self.reserved[node].names.insert(name);
    }

    fn create_new_name(&mut self, field: &FieldRef, node: usize) -> Name {
        let mut counters = self
            .states
            .get(&field.holder)
            .and_then(|state| state.counters.get(&field.ty).copied())
            .unwrap_or_default();
        let name = loop {
            let candidate = self.strategy.next_field(field, &mut counters);
            if self.is_reserved(node, &candidate)
                && !self.strategy.break_on_not_available(field, &candidate)
            {
                continue;
            }
            break candidate;
        };
        self.states
            .get_mut(&field.holder)
            .expect("state created during traversal")
            .counters
            .insert(field.ty, counters);
        name
    }
}
