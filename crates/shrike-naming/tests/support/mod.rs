//! Shared helpers for the minification tests.
#![allow(dead_code)]

use shrike_core::TypeId;
use shrike_model::{MethodRef, ProgramModel};
use shrike_naming::{
    minify, ApplyMapping, KeepRules, Minifier, MinificationStrategy, MinifyOptions, Renaming,
};

pub fn minify_default(model: &ProgramModel) -> Renaming {
    minify(
        model,
        MinifyOptions::default(),
        KeepRules::default(),
        ApplyMapping::default(),
    )
    .expect("minification should succeed")
}

pub fn minify_with(
    model: &ProgramModel,
    options: MinifyOptions,
    keep: KeepRules,
    mapping: ApplyMapping,
) -> Renaming {
    minify(model, options, keep, mapping).expect("minification should succeed")
}

pub fn minify_with_class_dictionary(model: &ProgramModel, dictionary: &[&str]) -> Renaming {
    let strategy =
        MinificationStrategy::new(model, KeepRules::default(), ApplyMapping::default())
            .expect("valid configuration")
            .with_class_dictionary(dictionary.iter().map(|s| s.to_string()).collect());
    Minifier::new(model, MinifyOptions::default())
        .run(&strategy, &strategy)
        .expect("minification should succeed")
}

/// The final name of a method: the renaming entry, or the original when the
/// method was left alone.
pub fn final_method_name(renaming: &Renaming, reference: &MethodRef) -> String {
    renaming
        .methods
        .renaming
        .get(reference)
        .map(|name| name.as_str())
        .unwrap_or(reference.name.as_str())
        .to_string()
}

pub fn class_descriptor<'r>(renaming: &'r Renaming, ty: TypeId) -> &'r str {
    renaming
        .classes
        .classes
        .get(&ty)
        .map(String::as_str)
        .unwrap_or_else(|| panic!("no class renaming entry for {ty:?}"))
}

/// Turns one run's output into the apply-mapping for the next.
pub fn mapping_from(renaming: &Renaming) -> ApplyMapping {
    let mut mapping = ApplyMapping::default();
    for (&ty, descriptor) in &renaming.classes.classes {
        mapping.rename_type(ty, descriptor.clone());
    }
    for (reference, name) in &renaming.methods.renaming {
        mapping.rename_method(reference.clone(), name.clone());
    }
    for (reference, name) in &renaming.fields.renaming {
        mapping.rename_field(reference.clone(), name.clone());
    }
    mapping
}
