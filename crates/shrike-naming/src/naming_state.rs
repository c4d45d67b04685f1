//! Hierarchical store of names already committed during assignment.
//!
//! The tree parallels the reservation tree but gets one node per class from
//! the frontier down, so a subtype inherits every name its supertypes were
//! assigned. Each node holds, per signature key, the assigned-name map, the
//! reverse `used_by` map, and the dictionary/counter position for fresh
//! names. Child counters start where the parent's left off.

use std::collections::{HashMap, HashSet};

use shrike_core::{Name, TypeId};
use shrike_model::{ClassDef, MethodRef};

use crate::name_source::NameCounters;
use crate::reservation_state::{ReservationId, ReservationStates};
use crate::signature::{MethodSignature, SignatureKey};
use crate::strategy::MemberNamingStrategy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NamingId(u32);

impl NamingId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
struct InternalNamingNode {
    assigned: HashMap<MethodSignature, Name>,
    used_by: HashMap<Name, HashSet<MethodSignature>>,
    counters: NameCounters,
}

#[derive(Debug)]
struct NamingNode {
    parent: Option<NamingId>,
    reservation: ReservationId,
    keys: HashMap<SignatureKey, InternalNamingNode>,
}

#[derive(Debug)]
pub(crate) struct NamingStates {
    nodes: Vec<NamingNode>,
    by_type: HashMap<TypeId, NamingId>,
    root: NamingId,
}

impl NamingStates {
    pub fn new(root_reservation: ReservationId) -> Self {
        Self {
            nodes: vec![NamingNode {
                parent: None,
                reservation: root_reservation,
                keys: HashMap::new(),
            }],
            by_type: HashMap::new(),
            root: NamingId(0),
        }
    }

    pub fn root(&self) -> NamingId {
        self.root
    }

    pub fn for_type(&self, ty: TypeId) -> Option<NamingId> {
        self.by_type.get(&ty).copied()
    }

    pub fn bind(&mut self, ty: TypeId, id: NamingId) {
        self.by_type.insert(ty, id);
    }

    pub fn create_child(&mut self, parent: NamingId, reservation: ReservationId) -> NamingId {
        let id = NamingId(self.nodes.len() as u32);
        self.nodes.push(NamingNode {
            parent: Some(parent),
            reservation,
            keys: HashMap::new(),
        });
        id
    }

    fn reservation_of(&self, id: NamingId) -> ReservationId {
        self.nodes[id.index()].reservation
    }

    /// The name already assigned to this logical method, if any state on the
    /// parent chain recorded one.
    pub fn assigned_name(&self, id: NamingId, signature: &MethodSignature) -> Option<Name> {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = &self.nodes[node_id.index()];
            if let Some(internal) = node.keys.get(&signature.key) {
                if let Some(name) = internal.assigned.get(signature) {
                    return Some(name.clone());
                }
            }
            current = node.parent;
        }
        None
    }

    /// The nearest `used_by` entry for `name` on the parent chain.
    fn used_by(
        &self,
        id: NamingId,
        name: &Name,
        key: &SignatureKey,
    ) -> Option<&HashSet<MethodSignature>> {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = &self.nodes[node_id.index()];
            if let Some(users) = node.keys.get(key).and_then(|s| s.used_by.get(name)) {
                return Some(users);
            }
            current = node.parent;
        }
        None
    }

    /// Whether `candidate` may name the method with `signature` in this
    /// scope. A candidate is unavailable when a different method of the same
    /// signature key already uses it, or when it is reserved for another
    /// member of the pool.
    pub fn is_available(
        &self,
        id: NamingId,
        reservations: &ReservationStates,
        candidate: &Name,
        signature: &MethodSignature,
    ) -> bool {
        let used_by_other = match self.used_by(id, candidate, &signature.key) {
            Some(users) if users.contains(signature) => return true,
            Some(_) => true,
            None => false,
        };
        let reservation = self.reservation_of(id);
        let reserved = reservations.is_reserved(reservation, candidate, &signature.key);
        if !reserved && !used_by_other {
            return true;
        }
        let reserved_for_method = reservations
            .reserved_names_for(reservation, signature)
            .contains(candidate);
        reserved_for_method && !used_by_other
    }

    /// Commits `name` for `signature` in this state.
    pub fn add_renaming(&mut self, id: NamingId, name: Name, signature: MethodSignature) {
        self.ensure_internal(id, &signature.key);
        let internal = self.nodes[id.index()]
            .keys
            .get_mut(&signature.key)
            .expect("internal state just created");
        internal.assigned.insert(signature.clone(), name.clone());
        internal.used_by.entry(name).or_default().insert(signature);
    }

    /// Copy of the counters for `(id, key)`, creating the internal state
    /// chain on demand.
    pub fn counters(&mut self, id: NamingId, key: &SignatureKey) -> NameCounters {
        self.ensure_internal(id, key);
        self.nodes[id.index()].keys[key].counters
    }

    pub fn put_counters(&mut self, id: NamingId, key: &SignatureKey, counters: NameCounters) {
        self.ensure_internal(id, key);
        self.nodes[id.index()]
            .keys
            .get_mut(key)
            .expect("internal state just created")
            .counters = counters;
    }

    fn ensure_internal(&mut self, id: NamingId, key: &SignatureKey) {
        if self.nodes[id.index()].keys.contains_key(key) {
            return;
        }
        let parent = self.nodes[id.index()].parent;
        let counters = match parent {
            Some(parent) => {
                self.ensure_internal(parent, key);
                self.nodes[parent.index()].keys[key].counters
            }
            None => NameCounters::new(),
        };
        self.nodes[id.index()].keys.insert(
            key.clone(),
            InternalNamingNode {
                assigned: HashMap::new(),
                used_by: HashMap::new(),
                counters,
            },
        );
    }

    /// The assignment rule for one method in one scope: an earlier
    /// assignment for the same logical method wins, then a unique reservation
    /// that is still free, then (for multi-reservation apply-mappings) a
    /// reservation also pinned in one of the holder's interfaces, then a
    /// fresh name.
    pub fn new_or_reserved_name_for(
        &mut self,
        id: NamingId,
        reservations: &ReservationStates,
        strategy: &dyn MemberNamingStrategy,
        method: &MethodRef,
        signature: &MethodSignature,
        holder: Option<&ClassDef>,
    ) -> Name {
        if let Some(assigned) = self.assigned_name(id, signature) {
            return assigned;
        }

        let reserved = reservations.reserved_names_for(self.reservation_of(id), signature);
        if reserved.len() == 1 {
            let candidate = reserved.iter().next().expect("len checked");
            if self.is_available(id, reservations, candidate, signature) {
                return candidate.clone();
            }
        } else if reserved.len() > 1 {
            if let Some(holder) = holder {
                for candidate in &reserved {
                    if self.is_available(id, reservations, candidate, signature)
                        && reserved_in_implemented_interface(
                            reservations,
                            holder,
                            candidate,
                            signature,
                        )
                    {
                        return candidate.clone();
                    }
                }
            }
        }

        self.next_name(id, reservations, strategy, method, signature)
    }

    fn next_name(
        &mut self,
        id: NamingId,
        reservations: &ReservationStates,
        strategy: &dyn MemberNamingStrategy,
        method: &MethodRef,
        signature: &MethodSignature,
    ) -> Name {
        let mut counters = self.counters(id, &signature.key);
        let name = {
            let this: &NamingStates = self;
            strategy.next_method(method, &mut counters, &|candidate| {
                this.is_available(id, reservations, candidate, signature)
            })
        };
        self.put_counters(id, &signature.key, counters);
        name
    }
}

/// Cross-hierarchy agreement for apply-mappings that registered several
/// reservations: the candidate must also be pinned for this signature in at
/// least one interface the holder implements directly.
fn reserved_in_implemented_interface(
    reservations: &ReservationStates,
    holder: &ClassDef,
    candidate: &Name,
    signature: &MethodSignature,
) -> bool {
    holder.interfaces.iter().any(|&iface| {
        reservations.for_type(iface).is_some_and(|id| {
            reservations
                .reserved_names_for(id, signature)
                .contains(candidate)
        })
    })
}
