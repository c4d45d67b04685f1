mod support;

use shrike_model::ProgramModelBuilder;
use shrike_naming::{ApplyMapping, KeepRules, MinifyOptions};
use support::{minify_default, minify_with};

#[test]
fn subclass_fields_avoid_superclass_names() {
    let mut b = ProgramModelBuilder::new();
    let base = b.class("La/Base;").field("x", "I").build();
    let sub = b.class("La/Sub;").super_type("La/Base;").field("y", "I").build();
    let model = b.build().unwrap();

    let renaming = minify_default(&model);
    let base_x = model.definition(base).unwrap().fields[0].reference(base);
    let sub_y = model.definition(sub).unwrap().fields[0].reference(sub);
    assert_eq!(renaming.fields.renaming.get(&base_x).unwrap(), "a");
    assert_eq!(renaming.fields.renaming.get(&sub_y).unwrap(), "b");
}

#[test]
fn sibling_classes_reuse_field_names() {
    let mut b = ProgramModelBuilder::new();
    b.class("La/Base;").field("x", "I").build();
    let left = b.class("La/Left;").super_type("La/Base;").field("y", "I").build();
    let right = b.class("La/Right;").super_type("La/Base;").field("z", "I").build();
    let model = b.build().unwrap();

    let renaming = minify_default(&model);
    let left_y = model.definition(left).unwrap().fields[0].reference(left);
    let right_z = model.definition(right).unwrap().fields[0].reference(right);
    assert_eq!(renaming.fields.renaming.get(&left_y).unwrap(), "b");
    assert_eq!(renaming.fields.renaming.get(&right_z).unwrap(), "b");
}

#[test]
fn kept_field_names_are_skipped() {
    let mut b = ProgramModelBuilder::new();
    let base = b.class("La/Base;").field("a", "I").build();
    let sub = b.class("La/Sub;").super_type("La/Base;").field("y", "I").build();
    let model = b.build().unwrap();

    let kept = model.definition(base).unwrap().fields[0].reference(base);
    let mut keep = KeepRules::default();
    keep.keep_field(kept.clone());

    let renaming = minify_with(
        &model,
        MinifyOptions::default(),
        keep,
        ApplyMapping::default(),
    );
    assert!(renaming.fields.renaming.get(&kept).is_none());
    let sub_y = model.definition(sub).unwrap().fields[0].reference(sub);
    assert_eq!(renaming.fields.renaming.get(&sub_y).unwrap(), "b");
}

#[test]
fn library_fields_are_untouched() {
    let mut b = ProgramModelBuilder::new();
    let lib = b.class("Ljava/awt/Point;").library().field("x", "I").build();
    b.class("La/A;").field("x", "I").build();
    let model = b.build().unwrap();

    let renaming = minify_default(&model);
    let lib_x = model.definition(lib).unwrap().fields[0].reference(lib);
    assert!(renaming.fields.renaming.get(&lib_x).is_none());
}

#[test]
fn apply_mapping_pins_field_names() {
    let mut b = ProgramModelBuilder::new();
    let base = b.class("La/Base;").field("value", "I").build();
    let model = b.build().unwrap();

    let value = model.definition(base).unwrap().fields[0].reference(base);
    let mut mapping = ApplyMapping::default();
    mapping.rename_field(value.clone(), "z");

    let renaming = minify_with(&model, MinifyOptions::default(), KeepRules::default(), mapping);
    assert_eq!(renaming.fields.renaming.get(&value).unwrap(), "z");
}

#[test]
fn fields_of_different_types_still_get_distinct_names() {
    let mut b = ProgramModelBuilder::new();
    let a = b
        .class("La/A;")
        .field("count", "I")
        .field("label", "Ljava/lang/String;")
        .build();
    let model = b.build().unwrap();

    let renaming = minify_default(&model);
    let def = model.definition(a).unwrap();
    let count = renaming.fields.renaming.get(&def.fields[0].reference(a)).unwrap();
    let label = renaming.fields.renaming.get(&def.fields[1].reference(a)).unwrap();
    assert_ne!(count, label, "same-holder fields share a name");
}
