use std::collections::{BTreeSet, HashMap, HashSet};

use shrike_core::TypeId;

use crate::model::ProgramModel;

impl ProgramModel {
    /// Defined classes ordered so that every supertype and superinterface
    /// precedes its subtypes. Ties keep insertion order, so the result is
    /// deterministic for a given builder sequence.
    pub fn top_down_order(&self) -> Vec<TypeId> {
        let mut order = Vec::new();
        let mut visited = HashSet::new();
        for class in self.classes() {
            self.visit_top_down(class.id, &mut visited, &mut order);
        }
        order
    }

    fn visit_top_down(&self, ty: TypeId, visited: &mut HashSet<TypeId>, order: &mut Vec<TypeId>) {
        if !visited.insert(ty) {
            return;
        }
        let Some(def) = self.definition(ty) else {
            return;
        };
        if let Some(superty) = def.super_type {
            self.visit_top_down(superty, visited, order);
        }
        for &iface in &def.interfaces {
            self.visit_top_down(iface, visited, order);
        }
        order.push(ty);
    }

    /// The supertype chain starting at `ty` (exclusive), following defined
    /// classes and ending at the first type without a definition.
    pub fn super_chain(&self, ty: TypeId) -> Vec<TypeId> {
        let mut chain = Vec::new();
        let mut current = self.definition(ty).and_then(|def| def.super_type);
        while let Some(superty) = current {
            chain.push(superty);
            current = self.definition(superty).and_then(|def| def.super_type);
        }
        chain
    }
}

/// Precomputed interface-lattice queries.
///
/// Interfaces do not form a tree, so the method minifier needs to know, for
/// every type, the full set of interfaces it transitively implements, and for
/// every interface, the non-interface classes that dispatch through it.
#[derive(Debug)]
pub struct SubtypingInfo {
    transitive_interfaces: HashMap<TypeId, BTreeSet<TypeId>>,
    implementers: HashMap<TypeId, Vec<TypeId>>,
}

impl SubtypingInfo {
    pub fn compute(model: &ProgramModel) -> Self {
        let mut transitive: HashMap<TypeId, BTreeSet<TypeId>> = HashMap::new();

        // Top-down order guarantees supertypes are finished first.
        for ty in model.top_down_order() {
            let def = match model.definition(ty) {
                Some(def) => def,
                None => continue,
            };
            let mut set = BTreeSet::new();
            if let Some(superty) = def.super_type {
                if let Some(inherited) = transitive.get(&superty) {
                    set.extend(inherited.iter().copied());
                }
            }
            for &iface in &def.interfaces {
                set.insert(iface);
                if let Some(inherited) = transitive.get(&iface) {
                    set.extend(inherited.iter().copied());
                }
            }
            if def.is_interface() {
                set.insert(ty);
            }
            transitive.insert(ty, set);
        }

        let mut implementers: HashMap<TypeId, Vec<TypeId>> = HashMap::new();
        for class in model.classes() {
            if class.is_interface() {
                continue;
            }
            if let Some(ifaces) = transitive.get(&class.id) {
                for &iface in ifaces {
                    implementers.entry(iface).or_default().push(class.id);
                }
            }
        }

        Self {
            transitive_interfaces: transitive,
            implementers,
        }
    }

    /// Every interface `ty` transitively implements (for interfaces, the set
    /// includes `ty` itself).
    pub fn transitive_interfaces(&self, ty: TypeId) -> Option<&BTreeSet<TypeId>> {
        self.transitive_interfaces.get(&ty)
    }

    /// Non-interface classes dispatching through `iface`, in model order.
    pub fn implementing_classes(&self, iface: TypeId) -> &[TypeId] {
        self.implementers.get(&iface).map_or(&[], Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProgramModelBuilder;

    #[test]
    fn top_down_puts_supertypes_first() {
        let mut b = ProgramModelBuilder::new();
        let sub = b.class("La/Sub;").super_type("La/Base;").build();
        let base = b.class("La/Base;").build();
        let model = b.build().unwrap();

        let order = model.top_down_order();
        let pos = |t| order.iter().position(|&x| x == t).unwrap();
        assert!(pos(base) < pos(sub));
    }

    #[test]
    fn transitive_interfaces_cross_super_edges() {
        let mut b = ProgramModelBuilder::new();
        let i = b.class("La/I;").interface().build();
        let j = b.class("La/J;").interface().implements("La/I;").build();
        let base = b.class("La/Base;").implements("La/J;").build();
        let sub = b.class("La/Sub;").super_type("La/Base;").build();
        let model = b.build().unwrap();
        let info = SubtypingInfo::compute(&model);

        let subs = info.transitive_interfaces(sub).unwrap();
        assert!(subs.contains(&i) && subs.contains(&j));

        assert_eq!(info.implementing_classes(i), &[base, sub]);
    }
}
