use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use shrike_model::{ProgramModel, ProgramModelBuilder};
use shrike_naming::{identifier, minify, ApplyMapping, KeepRules, MinifyOptions};

const CLASS_COUNT: usize = 500;
const METHODS_PER_CLASS: usize = 20;

fn configure_rayon() {
    // Criterion uses Rayon internally for statistics. On constrained CI hosts
    // the default-sized pool can fail to spawn, which panics during analysis.
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        if std::env::var_os("RAYON_NUM_THREADS").is_none() {
            std::env::set_var("RAYON_NUM_THREADS", "1");
        }
    });
}

/// A deterministic synthetic hierarchy: chains of subclasses with a shared
/// interface every few classes, methods split between two signature keys.
fn synthetic_model(classes: usize, methods: usize) -> ProgramModel {
    let mut b = ProgramModelBuilder::new();
    b.class("Lapp/I;").interface().method("run", &[], "V").build();
    for class_index in 0..classes {
        let descriptor = format!("Lapp/p{}/C{class_index};", class_index % 16);
        let mut class = b.class(&descriptor);
        if class_index % 4 != 0 {
            let parent = format!("Lapp/p{}/C{};", (class_index - 1) % 16, class_index - 1);
            class = class.super_type(&parent);
        }
        if class_index % 5 == 0 {
            class = class.implements("Lapp/I;").method("run", &[], "V");
        }
        for method_index in 0..methods {
            let name = format!("m{method_index}");
            if method_index % 2 == 0 {
                class = class.method(&name, &[], "V");
            } else {
                class = class.method(&name, &["I"], "V");
            }
        }
        class.build();
    }
    b.build().expect("synthetic model is well-formed")
}

fn bench_identifier(c: &mut Criterion) {
    configure_rayon();
    c.bench_function("identifier_encoding", |bencher| {
        bencher.iter(|| {
            let mut total = 0usize;
            for index in 1..10_000usize {
                total += identifier(black_box(index)).len();
            }
            total
        })
    });
}

fn bench_minify(c: &mut Criterion) {
    configure_rayon();
    let mut group = c.benchmark_group("minify");
    for &classes in &[50usize, CLASS_COUNT] {
        let model = synthetic_model(classes, METHODS_PER_CLASS);
        group.bench_with_input(
            BenchmarkId::from_parameter(classes),
            &model,
            |bencher, model| {
                bencher.iter(|| {
                    minify(
                        black_box(model),
                        MinifyOptions::default(),
                        KeepRules::default(),
                        ApplyMapping::default(),
                    )
                    .expect("minification succeeds")
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_identifier, bench_minify);
criterion_main!(benches);
