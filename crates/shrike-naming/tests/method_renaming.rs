mod support;

use std::collections::HashSet;

use shrike_model::ProgramModelBuilder;
use shrike_naming::{ApplyMapping, KeepRules, MinifyOptions};
use support::{final_method_name, minify_default, minify_with};

#[test]
fn zero_param_methods_share_one_pool_across_the_hierarchy() {
    let mut b = ProgramModelBuilder::new();
    let a = b
        .class("La/A;")
        .method("f", &[], "V")
        .method("g", &["I"], "V")
        .build();
    let bb = b
        .class("La/B;")
        .super_type("La/A;")
        .method("h", &[], "V")
        .method("i", &["I"], "V")
        .build();
    let model = b.build().unwrap();

    let renaming = minify_default(&model);
    let a_def = model.definition(a).unwrap();
    let b_def = model.definition(bb).unwrap();

    let a_f = final_method_name(&renaming, &a_def.methods[0].reference(a));
    let a_g = final_method_name(&renaming, &a_def.methods[1].reference(a));
    let b_h = final_method_name(&renaming, &b_def.methods[0].reference(bb));
    let b_i = final_method_name(&renaming, &b_def.methods[1].reference(bb));

    // Distinct signature keys restart the pool.
    assert_eq!(a_f, "a");
    assert_eq!(a_g, "a");

    // Same key across the subtype chain must not collide.
    let zero_param: HashSet<_> = [a_f, b_h.clone()].into_iter().collect();
    assert_eq!(zero_param.len(), 2, "A.f and B.h collide");
    assert_eq!(b_h, "b");
    assert_eq!(b_i, "b");
}

#[test]
fn unrelated_classes_reuse_names() {
    let mut b = ProgramModelBuilder::new();
    let x = b.class("La/X;").method("f", &[], "V").build();
    let y = b.class("La/Y;").method("g", &[], "V").build();
    let model = b.build().unwrap();

    let renaming = minify_default(&model);
    let x_f = final_method_name(&renaming, &model.definition(x).unwrap().methods[0].reference(x));
    let y_g = final_method_name(&renaming, &model.definition(y).unwrap().methods[0].reference(y));
    assert_eq!(x_f, "a");
    assert_eq!(y_g, "a");
}

#[test]
fn initializers_are_never_renamed() {
    let mut b = ProgramModelBuilder::new();
    let a = b
        .class("La/A;")
        .method("<init>", &[], "V")
        .method("<clinit>", &[], "V")
        .method("f", &[], "V")
        .build();
    let model = b.build().unwrap();

    let renaming = minify_default(&model);
    let def = model.definition(a).unwrap();
    assert_eq!(final_method_name(&renaming, &def.methods[0].reference(a)), "<init>");
    assert_eq!(final_method_name(&renaming, &def.methods[1].reference(a)), "<clinit>");
    assert_eq!(final_method_name(&renaming, &def.methods[2].reference(a)), "a");
}

#[test]
fn apply_mapping_name_propagates_to_overrides() {
    let mut b = ProgramModelBuilder::new();
    let a = b.class("La/A;").method("m", &[], "V").build();
    let bb = b
        .class("La/B;")
        .super_type("La/A;")
        .method("m", &[], "V")
        .build();
    let model = b.build().unwrap();

    let a_m = model.definition(a).unwrap().methods[0].reference(a);
    let mut mapping = ApplyMapping::default();
    mapping.rename_method(a_m.clone(), "x");

    let renaming = minify_with(&model, MinifyOptions::default(), KeepRules::default(), mapping);
    assert_eq!(final_method_name(&renaming, &a_m), "x");
    let b_m = model.definition(bb).unwrap().methods[0].reference(bb);
    assert_eq!(final_method_name(&renaming, &b_m), "x");
}

#[test]
fn reserved_name_blocks_other_methods_of_the_same_signature() {
    let mut b = ProgramModelBuilder::new();
    let a = b.class("La/A;").method("p", &[], "V").build();
    let bb = b
        .class("La/B;")
        .super_type("La/A;")
        .method("p", &[], "V")
        .method("q", &[], "V")
        .build();
    let model = b.build().unwrap();

    let a_p = model.definition(a).unwrap().methods[0].reference(a);
    let mut mapping = ApplyMapping::default();
    mapping.rename_method(a_p.clone(), "x");

    let renaming = minify_with(&model, MinifyOptions::default(), KeepRules::default(), mapping);
    let b_def = model.definition(bb).unwrap();
    let b_p = final_method_name(&renaming, &b_def.methods[0].reference(bb));
    let b_q = final_method_name(&renaming, &b_def.methods[1].reference(bb));
    assert_eq!(b_p, "x");
    assert_ne!(b_q, "x");
    assert_eq!(b_q, "a");
}

#[test]
fn kept_methods_keep_their_names_and_block_the_pool() {
    let mut b = ProgramModelBuilder::new();
    let a = b
        .class("La/A;")
        .method("a", &[], "V")
        .method("other", &[], "V")
        .build();
    let model = b.build().unwrap();

    let def = model.definition(a).unwrap();
    let kept_ref = def.methods[0].reference(a);
    let mut keep = KeepRules::default();
    keep.keep_method(kept_ref.clone());

    let renaming = minify_with(
        &model,
        MinifyOptions::default(),
        keep,
        ApplyMapping::default(),
    );
    // The kept method holds on to `a`, so it lands in the kept table and the
    // free method is pushed to the next candidate.
    assert_eq!(final_method_name(&renaming, &kept_ref), "a");
    assert_eq!(renaming.methods.kept.get(&kept_ref).map(|n| n.as_str()), Some("a"));
    assert_eq!(final_method_name(&renaming, &def.methods[1].reference(a)), "b");
}

#[test]
fn library_holders_opt_out_of_member_renaming() {
    let mut b = ProgramModelBuilder::new();
    let lib = b.class("Ljava/util/List;").library().method("size", &[], "I").build();
    let a = b
        .class("La/A;")
        .super_type("Ljava/util/List;")
        .method("size", &[], "I")
        .method("f", &[], "I")
        .build();
    let model = b.build().unwrap();

    let renaming = minify_default(&model);
    let lib_size = model.definition(lib).unwrap().methods[0].reference(lib);
    assert_eq!(final_method_name(&renaming, &lib_size), "size");

    // The override keeps the library name; the unrelated method may not take it.
    let a_def = model.definition(a).unwrap();
    assert_eq!(final_method_name(&renaming, &a_def.methods[0].reference(a)), "size");
    let a_f = final_method_name(&renaming, &a_def.methods[1].reference(a));
    assert_ne!(a_f, "size");
}

#[test]
fn aggressive_overloading_splits_pools_by_return_type() {
    let mut b = ProgramModelBuilder::new();
    let a = b
        .class("La/A;")
        .method("f", &[], "V")
        .method("g", &[], "I")
        .build();
    let model = b.build().unwrap();

    let renaming = minify_default(&model);
    let def = model.definition(a).unwrap();
    // Same params, same pool: distinct names.
    assert_eq!(final_method_name(&renaming, &def.methods[0].reference(a)), "a");
    assert_eq!(final_method_name(&renaming, &def.methods[1].reference(a)), "b");

    let options = MinifyOptions {
        overload_aggressively: true,
        ..MinifyOptions::default()
    };
    let renaming = minify_with(&model, options, KeepRules::default(), ApplyMapping::default());
    // Full-proto keys: both pools restart at `a`.
    assert_eq!(final_method_name(&renaming, &def.methods[0].reference(a)), "a");
    assert_eq!(final_method_name(&renaming, &def.methods[1].reference(a)), "a");
}

#[test]
fn non_rebound_references_follow_the_resolved_definition() {
    let mut b = ProgramModelBuilder::new();
    let a = b.class("La/A;").method("m", &[], "V").build();
    b.class("La/B;").super_type("La/A;").build();
    let through_b = b.reference_method("La/B;", "m", &[], "V");
    let model = b.build().unwrap();

    let renaming = minify_default(&model);
    let a_m = model.definition(a).unwrap().methods[0].reference(a);
    let new_name = renaming.methods.renaming.get(&a_m).expect("A.m renamed");
    assert_eq!(renaming.methods.renaming.get(&through_b), Some(new_name));
}

#[test]
fn library_gap_in_the_middle_of_a_program_hierarchy() {
    let mut b = ProgramModelBuilder::new();
    let a = b.class("La/A;").method("f", &[], "V").build();
    let lib = b
        .class("Llib/Mid;")
        .super_type("La/A;")
        .library()
        .method("keepMe", &[], "V")
        .build();
    let c = b
        .class("La/C;")
        .super_type("Llib/Mid;")
        .method("g", &[], "V")
        .build();
    let model = b.build().unwrap();

    let renaming = minify_default(&model);
    let lib_m = model.definition(lib).unwrap().methods[0].reference(lib);
    assert_eq!(final_method_name(&renaming, &lib_m), "keepMe");

    // The program class below the gap still resolves a scope through the
    // frontier and avoids both the library name and its ancestor's name.
    let a_f = final_method_name(&renaming, &model.definition(a).unwrap().methods[0].reference(a));
    let c_g = final_method_name(&renaming, &model.definition(c).unwrap().methods[0].reference(c));
    assert_ne!(c_g, a_f);
    assert_ne!(c_g, "keepMe");
    assert_ne!(a_f, "keepMe");
}

#[test]
fn unresolved_reference_with_agreeing_targets_is_rewritten() {
    let mut b = ProgramModelBuilder::new();
    let i = b.class("La/I;").interface().method("f", &[], "V").build();
    let j = b.class("La/J;").interface().method("f", &[], "V").build();
    b.class("La/C;")
        .implements("La/I;")
        .implements("La/J;")
        .build();
    let through_c = b.reference_method("La/C;", "f", &[], "V");
    let model = b.build().unwrap();

    let renaming = minify_default(&model);
    // Resolution of C.f fails with both interface methods as targets, but
    // the lattice pass gave them one name, so the reference follows it.
    let i_f = model.definition(i).unwrap().methods[0].reference(i);
    let j_f = model.definition(j).unwrap().methods[0].reference(j);
    let name = renaming.methods.renaming.get(&i_f).expect("I.f renamed");
    assert_eq!(renaming.methods.renaming.get(&j_f), Some(name));
    assert_eq!(renaming.methods.renaming.get(&through_c), Some(name));
    assert!(renaming.methods.unresolved.is_empty());
}

#[test]
fn classpath_members_are_renamed_only_under_apply_mapping() {
    let mut b = ProgramModelBuilder::new();
    let cp = b.class("Lcp/Util;").classpath().method("helper", &[], "V").build();
    b.class("La/A;").build();
    let model = b.build().unwrap();

    let helper = model.definition(cp).unwrap().methods[0].reference(cp);

    let renaming = minify_default(&model);
    assert_eq!(final_method_name(&renaming, &helper), "helper");

    let mut mapping = ApplyMapping::default();
    mapping.rename_method(helper.clone(), "h");
    let renaming = minify_with(&model, MinifyOptions::default(), KeepRules::default(), mapping);
    assert_eq!(final_method_name(&renaming, &helper), "h");
}
