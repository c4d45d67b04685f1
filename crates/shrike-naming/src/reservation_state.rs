//! Hierarchical store of reserved (un-assignable) method names.
//!
//! Nodes form a tree parallel to the type hierarchy, rooted at a synthetic
//! node above `java.lang.Object`. Library and classpath classes get a node
//! each; a program subtree shares the node of its frontier class, which is
//! where all of its reservations coalesce. Nodes are append-only and stored
//! in an arena; parents are arena indices.

use std::collections::{BTreeSet, HashMap, HashSet};

use shrike_core::{Name, TypeId};

use crate::signature::{MethodSignature, SignatureKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ReservationId(u32);

impl ReservationId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Default)]
struct InternalReservationState {
    /// Which members reserved each name.
    by_name: HashMap<Name, HashSet<MethodSignature>>,
    /// Names reserved for a given member. Apply-mapping can register several
    /// per member; the set is ordered so iteration is deterministic.
    by_method: HashMap<MethodSignature, BTreeSet<Name>>,
}

#[derive(Debug)]
struct ReservationNode {
    parent: Option<ReservationId>,
    keys: HashMap<SignatureKey, InternalReservationState>,
}

#[derive(Debug)]
pub(crate) struct ReservationStates {
    nodes: Vec<ReservationNode>,
    by_type: HashMap<TypeId, ReservationId>,
    root: ReservationId,
}

impl ReservationStates {
    pub fn new() -> Self {
        Self {
            nodes: vec![ReservationNode {
                parent: None,
                keys: HashMap::new(),
            }],
            by_type: HashMap::new(),
            root: ReservationId(0),
        }
    }

    pub fn root(&self) -> ReservationId {
        self.root
    }

    pub fn for_type(&self, ty: TypeId) -> Option<ReservationId> {
        self.by_type.get(&ty).copied()
    }

    /// The state bound to `ty`, creating it as a child of `parent` on first
    /// request. Frontier types are bound once and shared by their subtree.
    pub fn get_or_create_child(&mut self, ty: TypeId, parent: ReservationId) -> ReservationId {
        if let Some(id) = self.by_type.get(&ty) {
            return *id;
        }
        let id = ReservationId(self.nodes.len() as u32);
        self.nodes.push(ReservationNode {
            parent: Some(parent),
            keys: HashMap::new(),
        });
        self.by_type.insert(ty, id);
        id
    }

    pub fn reserve(&mut self, id: ReservationId, name: Name, signature: &MethodSignature) {
        let internal = self.nodes[id.index()]
            .keys
            .entry(signature.key.clone())
            .or_default();
        internal
            .by_name
            .entry(name.clone())
            .or_default()
            .insert(signature.clone());
        internal
            .by_method
            .entry(signature.clone())
            .or_default()
            .insert(name);
    }

    /// Whether `name` is reserved for any member of `key`'s pool, anywhere on
    /// the parent chain.
    pub fn is_reserved(&self, id: ReservationId, name: &Name, key: &SignatureKey) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = &self.nodes[node_id.index()];
            if let Some(internal) = node.keys.get(key) {
                if internal.by_name.contains_key(name) {
                    return true;
                }
            }
            current = node.parent;
        }
        false
    }

    /// All names reserved for `signature` along the parent chain.
    pub fn reserved_names_for(
        &self,
        id: ReservationId,
        signature: &MethodSignature,
    ) -> BTreeSet<Name> {
        let mut out = BTreeSet::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = &self.nodes[node_id.index()];
            if let Some(internal) = node.keys.get(&signature.key) {
                if let Some(names) = internal.by_method.get(signature) {
                    out.extend(names.iter().cloned());
                }
            }
            current = node.parent;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shrike_core::TypeId;

    fn signature(name: &str) -> MethodSignature {
        MethodSignature {
            name: Name::from(name),
            key: SignatureKey::Params(Box::new([])),
        }
    }

    #[test]
    fn reservations_are_visible_through_the_parent_chain() {
        let mut states = ReservationStates::new();
        let parent = states.get_or_create_child(TypeId::new(1), states.root());
        let child = states.get_or_create_child(TypeId::new(2), parent);

        let sig = signature("f");
        states.reserve(parent, Name::from("x"), &sig);

        assert!(states.is_reserved(child, &Name::from("x"), &sig.key));
        assert!(!states.is_reserved(child, &Name::from("y"), &sig.key));
        assert_eq!(
            states.reserved_names_for(child, &sig),
            BTreeSet::from([Name::from("x")])
        );
    }

    #[test]
    fn sibling_reservations_do_not_leak() {
        let mut states = ReservationStates::new();
        let left = states.get_or_create_child(TypeId::new(1), states.root());
        let right = states.get_or_create_child(TypeId::new(2), states.root());

        let sig = signature("f");
        states.reserve(left, Name::from("x"), &sig);
        assert!(!states.is_reserved(right, &Name::from("x"), &sig.key));
    }

    #[test]
    fn binding_is_idempotent() {
        let mut states = ReservationStates::new();
        let a = states.get_or_create_child(TypeId::new(1), states.root());
        let b = states.get_or_create_child(TypeId::new(1), states.root());
        assert_eq!(a, b);
    }
}
