//! Method renaming over the subtype tree.
//!
//! Naming scopes are modeled with two parallel trees. The reservation tree
//! records names that may not be handed out (library members, keep rules,
//! apply-mapping); reservations made on program classes are attached to the
//! class's frontier so they block the name upward without polluting the
//! subtree's own pool. The naming tree records every committed assignment so
//! subtypes inherit the names of the methods they override.
//!
//! Assignment runs in four phases: reserve names hierarchy-wide, reserve and
//! then assign interface methods across the interface lattice (see
//! [`crate::interface_minifier`]), and finally assign class methods top-down.
//! A last pass rewrites non-rebound references, in parallel, to the name of
//! the definition they resolve to.

use std::collections::HashMap;

use rayon::prelude::*;

use shrike_core::{descriptor, Name, TypeId};
use shrike_model::{
    resolve_method, ClassDef, ClassKind, MethodDef, MethodRef, ProgramModel, Resolution,
    SubtypingInfo,
};

use crate::error::MinifyError;
use crate::interface_minifier::InterfaceMethodNameMinifier;
use crate::naming_state::{NamingId, NamingStates};
use crate::options::MinifyOptions;
use crate::reservation_state::{ReservationId, ReservationStates};
use crate::signature::SignaturePolicy;
use crate::strategy::MemberNamingStrategy;

/// Output of the method phases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodRenaming {
    /// Members whose final name differs from the original.
    pub renaming: HashMap<MethodRef, Name>,
    /// Members that may not be minified but whose name coincides with a
    /// reserved assignment; recorded so the writer can tell them apart.
    pub kept: HashMap<MethodRef, Name>,
    /// Non-rebound references whose failure targets disagreed on a rename.
    /// No entry is produced for them; the writer preserves the original name.
    pub unresolved: Vec<UnresolvedReference>,
}

/// A reference that could not be consistently rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    pub reference: MethodRef,
    pub targets: Vec<MethodRef>,
}

enum NonReboundOutcome {
    Renamed(MethodRef, Name),
    Disagreement(UnresolvedReference),
}

/// Mutable minification state shared between the class-side and
/// interface-side passes.
pub(crate) struct MinifierState {
    pub reservations: ReservationStates,
    pub naming: NamingStates,
    /// Per type, the frontier its reservations coalesce at.
    pub frontiers: HashMap<TypeId, TypeId>,
    pub renaming: HashMap<MethodRef, Name>,
    pub kept: HashMap<MethodRef, Name>,
}

impl MinifierState {
    fn new() -> Self {
        let reservations = ReservationStates::new();
        let naming = NamingStates::new(reservations.root());
        Self {
            reservations,
            naming,
            frontiers: HashMap::new(),
            renaming: HashMap::new(),
            kept: HashMap::new(),
        }
    }
}

pub(crate) struct MethodNameMinifier<'a> {
    model: &'a ProgramModel,
    strategy: &'a dyn MemberNamingStrategy,
    options: &'a MinifyOptions,
    policy: SignaturePolicy,
    state: MinifierState,
}

impl<'a> MethodNameMinifier<'a> {
    pub fn new(
        model: &'a ProgramModel,
        strategy: &'a dyn MemberNamingStrategy,
        options: &'a MinifyOptions,
    ) -> Self {
        Self {
            model,
            strategy,
            options,
            policy: options.signature_policy(),
            state: MinifierState::new(),
        }
    }

    pub fn compute_renaming(
        mut self,
        subtyping: &SubtypingInfo,
    ) -> Result<MethodRenaming, MinifyError> {
        tracing::debug!("phase 1: reserving method names");
        self.reserve_names_in_classes();

        tracing::debug!("phases 2-3: interface methods");
        InterfaceMethodNameMinifier::new(
            self.model,
            self.strategy,
            self.options,
            self.policy,
            subtyping,
            &mut self.state,
        )
        .assign_names_to_interface_methods()?;

        tracing::debug!("phase 4: class methods");
        self.assign_names_to_class_methods()?;
        self.rename_methods_in_unrelated_classpath_classes();

        tracing::debug!("phase 5: non-rebound references");
        let unresolved = self.rename_non_rebound_references();

        Ok(MethodRenaming {
            renaming: self.state.renaming,
            kept: self.state.kept,
            unresolved,
        })
    }

    /// Phase 1. Walks the hierarchy top-down so supertype reservations exist
    /// before subtypes inherit them, records the frontier of every class, and
    /// stores reserved names at the frontier's state.
    fn reserve_names_in_classes(&mut self) {
        // The Object state must exist even when the type itself is missing.
        let object = self.model.object_type();
        let root = self.state.reservations.root();
        self.allocate_reservation_state_and_reserve(object, object, root);

        for ty in self.model.top_down_order() {
            let def = self.model.definition(ty).expect("top-down order is defined");
            let frontier = def
                .super_type
                .and_then(|superty| self.state.frontiers.get(&superty).copied())
                .unwrap_or(ty);
            if frontier != ty || def.is_program() {
                self.state.frontiers.insert(ty, frontier);
            }
            let parent = def
                .super_type
                .and_then(|superty| self.state.reservations.for_type(superty))
                .unwrap_or(root);
            self.allocate_reservation_state_and_reserve(ty, frontier, parent);
        }
    }

    fn allocate_reservation_state_and_reserve(
        &mut self,
        ty: TypeId,
        frontier: TypeId,
        parent: ReservationId,
    ) {
        let id = self
            .state
            .reservations
            .get_or_create_child(frontier, parent);
        let Some(def) = self.model.definition(ty) else {
            return;
        };
        for method in self.options.member_ordering.apply(&def.methods) {
            let reference = method.reference(ty);
            if let Some(reserved) = self.strategy.reserved_method_name(&reference, def) {
                let signature = self.policy.signature_of(&reference);
                self.state.reservations.reserve(id, reserved, &signature);
            }
        }
    }

    /// The reservation state governing `ty`, tolerating gaps left by a
    /// library class extending a program class: lookups fall back through the
    /// frontier map, and types without definitions resolve to Object's state.
    pub(crate) fn reservation_state_in_hierarchy(
        model: &ProgramModel,
        state: &MinifierState,
        ty: TypeId,
    ) -> ReservationId {
        if let Some(id) = state.reservations.for_type(ty) {
            return id;
        }
        if model.definition(ty).is_none() {
            return state
                .reservations
                .for_type(model.object_type())
                .unwrap_or_else(|| state.reservations.root());
        }
        let frontier = state.frontiers.get(&ty).copied().unwrap_or(ty);
        state
            .reservations
            .for_type(frontier)
            .unwrap_or_else(|| state.reservations.root())
    }

    /// Phase 4. Top-down over non-interface classes; every class gets a
    /// naming state chained under its superclass's, bound to the frontier's
    /// reservation state.
    fn assign_names_to_class_methods(&mut self) -> Result<(), MinifyError> {
        for ty in self.model.top_down_order() {
            let def = self.model.definition(ty).expect("top-down order is defined");
            if def.is_interface() {
                continue;
            }
            let naming_id = self.get_or_allocate_naming_state(ty);
            if !self.strategy.allow_member_renaming(def) {
                continue;
            }
            for method in self.options.member_ordering.apply(&def.methods) {
                self.assign_name_to_method(def, method, naming_id)?;
            }
        }
        Ok(())
    }

    fn get_or_allocate_naming_state(&mut self, ty: TypeId) -> NamingId {
        if let Some(id) = self.state.naming.for_type(ty) {
            return id;
        }
        let object = self.model.object_type();
        let parent = if ty == object {
            self.state.naming.root()
        } else {
            match self.model.definition(ty) {
                None => self.get_or_allocate_naming_state(object),
                Some(def) => self.get_or_allocate_naming_state(def.super_type.unwrap_or(object)),
            }
        };
        let reservation = Self::reservation_state_in_hierarchy(self.model, &self.state, ty);
        let id = self.state.naming.create_child(parent, reservation);
        self.state.naming.bind(ty, id);
        id
    }

    fn assign_name_to_method(
        &mut self,
        holder: &ClassDef,
        method: &MethodDef,
        naming_id: NamingId,
    ) -> Result<(), MinifyError> {
        if method.is_initializer() {
            return Ok(());
        }
        let reference = method.reference(holder.id);
        let signature = self.policy.signature_of(&reference);
        let state = &mut self.state;

        // The strategy may have an explicit name for this member, which wins
        // unless it is the identity; identity reservations still have to look
        // at earlier renamings tracked by the state.
        let reserved = self.strategy.reserved_method_name(&reference, holder);
        let new_name = match reserved {
            Some(name) if name != reference.name => {
                if state
                    .naming
                    .is_available(naming_id, &state.reservations, &name, &signature)
                {
                    name
                } else if let Some(assigned) = state.naming.assigned_name(naming_id, &signature) {
                    assigned
                } else {
                    return Err(MinifyError::InvariantViolation {
                        member: format!(
                            "{}.{}",
                            self.model.descriptor(holder.id),
                            reference.name
                        ),
                        name: name.to_string(),
                    });
                }
            }
            _ => state.naming.new_or_reserved_name_for(
                naming_id,
                &state.reservations,
                self.strategy,
                &reference,
                &signature,
                Some(holder),
            ),
        };

        if new_name != reference.name {
            state.renaming.insert(reference.clone(), new_name.clone());
        } else if !self.strategy.is_minification_allowed(&reference) {
            state.kept.insert(reference.clone(), new_name.clone());
        }
        state.naming.add_renaming(naming_id, new_name, signature);
        Ok(())
    }

    /// Classpath classes unrelated to the program hierarchy still honor
    /// apply-mapping renames so references into them stay consistent.
    fn rename_methods_in_unrelated_classpath_classes(&mut self) {
        if !self.strategy.has_apply_mapping() {
            return;
        }
        for class in self.model.classes() {
            if class.kind != ClassKind::Classpath {
                continue;
            }
            for method in &class.methods {
                let reference = method.reference(class.id);
                if let Some(reserved) = self.strategy.reserved_method_name(&reference, class) {
                    if reserved != reference.name {
                        self.state.renaming.insert(reference, reserved);
                    }
                }
            }
        }
    }

    /// References whose holder does not itself declare the method resolve by
    /// up-lookup; rewrite them to the resolved definition's new name. Each
    /// reference is independent, so the pass fans out over a thread pool;
    /// results are keyed by distinct references and merged afterwards.
    fn rename_non_rebound_references(&mut self) -> Vec<UnresolvedReference> {
        let model = self.model;
        let renaming = &self.state.renaming;
        let outcomes: Vec<NonReboundOutcome> = model
            .method_references()
            .par_iter()
            .filter_map(|reference| Self::rename_non_rebound_reference(model, renaming, reference))
            .collect();

        let mut unresolved = Vec::new();
        let mut renamed = Vec::new();
        for outcome in outcomes {
            match outcome {
                NonReboundOutcome::Renamed(reference, name) => renamed.push((reference, name)),
                NonReboundOutcome::Disagreement(failure) => unresolved.push(failure),
            }
        }
        self.state.renaming.extend(renamed);
        unresolved.sort_by(|a, b| {
            (model.descriptor(a.reference.holder), &a.reference.name)
                .cmp(&(model.descriptor(b.reference.holder), &b.reference.name))
        });
        unresolved
    }

    fn rename_non_rebound_reference(
        model: &ProgramModel,
        renaming: &HashMap<MethodRef, Name>,
        reference: &MethodRef,
    ) -> Option<NonReboundOutcome> {
        if descriptor::is_array_descriptor(model.descriptor(reference.holder)) {
            return None;
        }
        model.definition(reference.holder)?;

        match resolve_method(model, reference) {
            Resolution::Single(resolved) => {
                if resolved == *reference {
                    return None;
                }
                renaming
                    .get(&resolved)
                    .map(|name| NonReboundOutcome::Renamed(reference.clone(), name.clone()))
            }
            Resolution::Failed(targets) => {
                // A failed resolution must be renamed consistently with the
                // targets that caused the failure, or not at all.
                let first = renaming.get(targets.first()?);
                if targets.iter().all(|target| renaming.get(target) == first) {
                    first.map(|name| NonReboundOutcome::Renamed(reference.clone(), name.clone()))
                } else {
                    tracing::debug!(
                        holder = model.descriptor(reference.holder),
                        method = %reference.name,
                        "unresolved reference targets disagree on rename; keeping original",
                    );
                    Some(NonReboundOutcome::Disagreement(UnresolvedReference {
                        reference: reference.clone(),
                        targets,
                    }))
                }
            }
            Resolution::NotFound => None,
        }
    }
}
