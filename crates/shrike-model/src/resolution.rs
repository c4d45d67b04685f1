use shrike_core::TypeId;

use crate::model::{MethodRef, ProgramModel};

/// Outcome of resolving a method reference against the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Resolution found exactly one definition; the ref points at its
    /// declaration site.
    Single(MethodRef),
    /// Resolution failed, but these definitions gave rise to the failure
    /// (e.g. several maximally-specific interface methods).
    Failed(Vec<MethodRef>),
    /// No definition anywhere in the hierarchy.
    NotFound,
}

/// JVM-style method resolution: the holder and its superclass chain first,
/// then the maximally-specific superinterface methods.
pub fn resolve_method(model: &ProgramModel, reference: &MethodRef) -> Resolution {
    let mut current = Some(reference.holder);
    while let Some(ty) = current {
        let Some(def) = model.definition(ty) else {
            break;
        };
        if let Some(found) = declared_in(model, ty, reference) {
            return Resolution::Single(found);
        }
        current = def.super_type;
    }

    let mut interface_targets = Vec::new();
    let mut seen = std::collections::HashSet::new();
    let mut worklist = vec![reference.holder];
    while let Some(ty) = worklist.pop() {
        if !seen.insert(ty) {
            continue;
        }
        let Some(def) = model.definition(ty) else {
            continue;
        };
        if def.is_interface() {
            if let Some(found) = declared_in(model, ty, reference) {
                interface_targets.push(found);
                continue;
            }
        }
        if let Some(superty) = def.super_type {
            worklist.push(superty);
        }
        worklist.extend(def.interfaces.iter().copied());
    }
    interface_targets.sort_by(|a, b| model.descriptor(a.holder).cmp(&model.descriptor(b.holder)));

    match interface_targets.len() {
        0 => Resolution::NotFound,
        1 => Resolution::Single(interface_targets.pop().expect("len checked")),
        _ => Resolution::Failed(interface_targets),
    }
}

fn declared_in(model: &ProgramModel, ty: TypeId, reference: &MethodRef) -> Option<MethodRef> {
    let def = model.definition(ty)?;
    def.methods
        .iter()
        .find(|m| m.name == reference.name && m.proto == reference.proto)
        .map(|m| m.reference(ty))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProgramModelBuilder;

    #[test]
    fn resolves_through_superclass_chain() {
        let mut b = ProgramModelBuilder::new();
        let base = b.class("La/Base;").method("f", &[], "V").build();
        b.class("La/Sub;").super_type("La/Base;").build();
        let reference = b.reference_method("La/Sub;", "f", &[], "V");
        let model = b.build().unwrap();

        match resolve_method(&model, &reference) {
            Resolution::Single(found) => assert_eq!(found.holder, base),
            other => panic!("expected single resolution, got {other:?}"),
        }
    }

    #[test]
    fn ambiguous_interface_defaults_fail_with_targets() {
        let mut b = ProgramModelBuilder::new();
        let i = b.class("La/I;").interface().method("f", &[], "V").build();
        let j = b.class("La/J;").interface().method("f", &[], "V").build();
        b.class("La/C;").implements("La/I;").implements("La/J;").build();
        let reference = b.reference_method("La/C;", "f", &[], "V");
        let model = b.build().unwrap();

        match resolve_method(&model, &reference) {
            Resolution::Failed(targets) => {
                let holders: Vec<_> = targets.iter().map(|t| t.holder).collect();
                assert_eq!(holders, vec![i, j]);
            }
            other => panic!("expected failed resolution, got {other:?}"),
        }
    }

    #[test]
    fn unknown_method_is_not_found() {
        let mut b = ProgramModelBuilder::new();
        b.class("La/A;").build();
        let reference = b.reference_method("La/A;", "nope", &[], "V");
        let model = b.build().unwrap();
        assert_eq!(resolve_method(&model, &reference), Resolution::NotFound);
    }
}
