//! Interface method renaming across the interface lattice.
//!
//! Interfaces do not form a tree, so a name chosen for an interface method
//! must be free in every class and interface that could dispatch to it. The
//! lattice is partitioned into reachability groups (interfaces related
//! through subtyping, including through a shared implementing class), and
//! assignment proceeds group by group, signature by signature, in a
//! deterministic order.
//!
//! Candidates are generated from the naming state of the group's root
//! interface rather than any class state: a candidate rejected here must not
//! consume a class counter, because it is still free for class methods later.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use shrike_core::{Name, TypeId};
use shrike_model::{MethodRef, ProgramModel, SubtypingInfo};

use crate::error::MinifyError;
use crate::method_minifier::{MethodNameMinifier, MinifierState};
use crate::naming_state::NamingId;
use crate::options::MinifyOptions;
use crate::reservation_state::ReservationId;
use crate::signature::{MethodSignature, SignaturePolicy};
use crate::strategy::MemberNamingStrategy;

pub(crate) struct InterfaceMethodNameMinifier<'a, 'b> {
    model: &'a ProgramModel,
    strategy: &'a dyn MemberNamingStrategy,
    options: &'a MinifyOptions,
    policy: SignaturePolicy,
    subtyping: &'a SubtypingInfo,
    state: &'b mut MinifierState,
}

impl<'a, 'b> InterfaceMethodNameMinifier<'a, 'b> {
    pub fn new(
        model: &'a ProgramModel,
        strategy: &'a dyn MemberNamingStrategy,
        options: &'a MinifyOptions,
        policy: SignaturePolicy,
        subtyping: &'a SubtypingInfo,
        state: &'b mut MinifierState,
    ) -> Self {
        Self {
            model,
            strategy,
            options,
            policy,
            subtyping,
            state,
        }
    }

    pub fn assign_names_to_interface_methods(mut self) -> Result<(), MinifyError> {
        let groups = self.compute_reachability_groups();
        self.reserve_names_in_interfaces(&groups);
        for group in &groups {
            self.assign_names_in_group(group)?;
        }
        Ok(())
    }

    /// Union-find over interfaces: two interfaces land in the same group when
    /// any type transitively implements both.
    fn compute_reachability_groups(&self) -> Vec<Vec<TypeId>> {
        let mut dsu = UnionFind::default();
        for class in self.model.classes() {
            let Some(interfaces) = self.subtyping.transitive_interfaces(class.id) else {
                continue;
            };
            let mut iter = interfaces.iter().copied();
            if let Some(first) = iter.next() {
                dsu.insert(first);
                for iface in iter {
                    dsu.union(first, iface);
                }
            }
        }

        let mut by_root: BTreeMap<TypeId, Vec<TypeId>> = BTreeMap::new();
        for iface in dsu.members() {
            by_root.entry(dsu.find(iface)).or_default().push(iface);
        }
        by_root
            .into_values()
            .map(|mut group| {
                group.sort();
                group
            })
            .collect()
    }

    /// Phase 2: propagate every reserved interface-method name to each
    /// reachable interface in its group, so no related interface hands the
    /// name to a different signature.
    fn reserve_names_in_interfaces(&mut self, groups: &[Vec<TypeId>]) {
        for group in groups {
            for &iface in group {
                let Some(def) = self.model.definition(iface) else {
                    continue;
                };
                for method in self.options.member_ordering.apply(&def.methods) {
                    let reference = method.reference(iface);
                    let Some(reserved) = self.strategy.reserved_method_name(&reference, def)
                    else {
                        continue;
                    };
                    let signature = self.policy.signature_of(&reference);
                    for &target in group {
                        if let Some(id) = self.interface_reservation_state(target) {
                            self.state
                                .reservations
                                .reserve(id, reserved.clone(), &signature);
                        }
                    }
                }
            }
        }
    }

    /// Phase 3 for one group: collect the signatures its interfaces declare
    /// and find one agreed name per signature.
    fn assign_names_in_group(&mut self, group: &[TypeId]) -> Result<(), MinifyError> {
        let mut signatures: BTreeMap<MethodSignature, Vec<(TypeId, MethodRef)>> = BTreeMap::new();
        for &iface in group {
            let Some(def) = self.model.definition(iface) else {
                continue;
            };
            for method in self.options.member_ordering.apply(&def.methods) {
                if method.is_initializer() {
                    continue;
                }
                let reference = method.reference(iface);
                let signature = self.policy.signature_of(&reference);
                signatures
                    .entry(signature)
                    .or_default()
                    .push((iface, reference));
            }
        }
        if signatures.is_empty() {
            return Ok(());
        }

        let Some(root) = group
            .iter()
            .copied()
            .find(|&iface| self.model.definition(iface).is_some())
        else {
            return Ok(());
        };
        let root_naming = self.get_or_create_interface_naming_state(root);

        for (signature, methods) in &signatures {
            self.assign_name_to_signature(group, root_naming, signature, methods)?;
        }
        Ok(())
    }

    fn assign_name_to_signature(
        &mut self,
        group: &[TypeId],
        root_naming: NamingId,
        signature: &MethodSignature,
        methods: &[(TypeId, MethodRef)],
    ) -> Result<(), MinifyError> {
        let mut reserved_names = BTreeSet::new();
        for (iface, reference) in methods {
            let def = self.model.definition(*iface).expect("declaring interface");
            if let Some(reserved) = self.strategy.reserved_method_name(reference, def) {
                reserved_names.insert(reserved);
            }
        }
        if reserved_names.len() > 1 {
            let (iface, _) = &methods[0];
            return Err(MinifyError::InvariantViolation {
                member: format!("{}.{}", self.model.descriptor(*iface), signature.name),
                name: reserved_names
                    .iter()
                    .map(Name::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }

        let impacted = self.impacted_states(group, methods);
        let name = match reserved_names.into_iter().next() {
            Some(name) => name,
            None => {
                // All impacted scopes are probed at once; a candidate rejected
                // by any of them is skipped for the whole group.
                let mut counters = self.state.naming.counters(root_naming, &signature.key);
                let naming = &self.state.naming;
                let reservations = &self.state.reservations;
                let name =
                    self.strategy
                        .next_method(&methods[0].1, &mut counters, &|candidate| {
                            naming.is_available(root_naming, reservations, candidate, signature)
                                && impacted.iter().all(|&id| {
                                    !reservations.is_reserved(id, candidate, &signature.key)
                                })
                        });
                self.state
                    .naming
                    .put_counters(root_naming, &signature.key, counters);
                name
            }
        };

        for (_, reference) in methods {
            if name != reference.name {
                self.state.renaming.insert(reference.clone(), name.clone());
            } else if !self.strategy.is_minification_allowed(reference) {
                self.state.kept.insert(reference.clone(), name.clone());
            }
        }
        self.state
            .naming
            .add_renaming(root_naming, name.clone(), signature.clone());
        for &id in &impacted {
            self.state.reservations.reserve(id, name.clone(), signature);
        }
        Ok(())
    }

    /// The union of scopes that would host this signature: every interface in
    /// the group, plus the frontier of every class implementing a declaring
    /// interface.
    fn impacted_states(
        &self,
        group: &[TypeId],
        methods: &[(TypeId, MethodRef)],
    ) -> Vec<ReservationId> {
        let mut set = HashSet::new();
        for &iface in group {
            if let Some(id) = self.interface_reservation_state(iface) {
                set.insert(id);
            }
        }
        for (iface, _) in methods {
            for &class in self.subtyping.implementing_classes(*iface) {
                set.insert(MethodNameMinifier::reservation_state_in_hierarchy(
                    self.model,
                    self.state,
                    class,
                ));
            }
        }
        set.into_iter().collect()
    }

    fn interface_reservation_state(&self, iface: TypeId) -> Option<ReservationId> {
        if self.model.definition(iface).is_none() {
            // Missing interfaces have no declarations to protect.
            return None;
        }
        Some(MethodNameMinifier::reservation_state_in_hierarchy(
            self.model,
            self.state,
            iface,
        ))
    }

    fn get_or_create_interface_naming_state(&mut self, iface: TypeId) -> NamingId {
        if let Some(id) = self.state.naming.for_type(iface) {
            return id;
        }
        let reservation =
            MethodNameMinifier::reservation_state_in_hierarchy(self.model, self.state, iface);
        let root = self.state.naming.root();
        let id = self.state.naming.create_child(root, reservation);
        self.state.naming.bind(iface, id);
        id
    }
}

/// Small deterministic union-find keyed by `TypeId`; roots are the smallest
/// member of their set.
#[derive(Default)]
struct UnionFind {
    parent: HashMap<TypeId, TypeId>,
}

impl UnionFind {
    fn insert(&mut self, ty: TypeId) {
        self.parent.entry(ty).or_insert(ty);
    }

    fn find(&self, ty: TypeId) -> TypeId {
        let mut current = ty;
        while let Some(&parent) = self.parent.get(&current) {
            if parent == current {
                return current;
            }
            current = parent;
        }
        ty
    }

    fn union(&mut self, a: TypeId, b: TypeId) {
        self.insert(a);
        self.insert(b);
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return;
        }
        let (small, large) = if root_a < root_b {
            (root_a, root_b)
        } else {
            (root_b, root_a)
        };
        self.parent.insert(large, small);
    }

    fn members(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.parent.keys().copied()
    }
}
