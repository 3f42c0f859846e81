//! Benchmarks for field composition.

use criterion::{criterion_group, criterion_main, Criterion};
use meshfield::mesh::{BvTree, BvTreeOptions};
use meshfield::prelude::*;
use nalgebra::{Point3, Vector3};

fn create_grid_mesh(n: usize, x_offset: f64) -> Geometry {
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    let mut faces = Vec::with_capacity(n * n * 2);

    for j in 0..=n {
        for i in 0..=n {
            vertices.push(Point3::new(i as f64 + x_offset, j as f64, 0.0));
        }
    }

    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + (n + 1);
            let v11 = v01 + 1;

            faces.push([v00, v10, v11]);
            faces.push([v00, v11, v01]);
        }
    }

    build_from_triangles(&vertices, &faces).unwrap()
}

fn ramp(geo: &Geometry, slope: f64) -> ScalarField {
    ScalarField::from_values(geo, (0..geo.num_vertices()).map(|i| i as f64 * slope))
}

fn bench_bv_tree(c: &mut Criterion) {
    let geo = create_grid_mesh(100, 0.0);

    c.bench_function("bvtree_build_100x100", |b| {
        b.iter(|| BvTree::build(&geo, &BvTreeOptions::default()))
    });

    c.bench_function("bvtree_build_100x100_sequential", |b| {
        b.iter(|| BvTree::build(&geo, &BvTreeOptions::default().sequential()))
    });
}

fn bench_overlap(c: &mut Criterion) {
    let geo = create_grid_mesh(100, 0.0);
    let fields: Vec<ScalarField> = (1..=4).map(|k| ramp(&geo, k as f64)).collect();

    for method in OverlapMethod::ALL {
        c.bench_function(&format!("overlap_4_fields_{:?}", method), |b| {
            b.iter_batched(
                || fields.clone(),
                |mut fields| {
                    let mut overlap = OverlapScalarFields::new();
                    overlap.set_method(method);
                    overlap.add_fields(fields.iter_mut().map(|f| (&geo, f)));
                    overlap.execute();
                    overlap.take_results()
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }
}

fn bench_switch(c: &mut Criterion) {
    let target = create_grid_mesh(100, 0.0);
    let source = create_grid_mesh(100, 0.25);
    let field = ramp(&source, 1.0);

    c.bench_function("switch_mapping_100x100", |b| {
        b.iter(|| {
            let mut switch = SwitchScalarField::new();
            switch.set_target(&target);
            switch.add_field(&field, &source);
            switch.switch().unwrap();
            switch.take_result()
        })
    });
}

fn bench_scale(c: &mut Criterion) {
    let geo = create_grid_mesh(100, 0.0);
    let options = ScaleOptions::default()
        .with_scaling(Vector3::new(2.0, 0.5, 1.0))
        .with_mean_point(true);

    c.bench_function("scale_100x100", |b| {
        b.iter(|| {
            let mut scale = ScaleGeometry::with_options(options.clone());
            scale.execute(&geo);
            scale.displacement_magnitudes()
        })
    });
}

criterion_group!(benches, bench_bv_tree, bench_overlap, bench_switch, bench_scale);
criterion_main!(benches);
