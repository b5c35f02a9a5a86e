use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rigid2d::{BodyDesc, BroadPhaseMethod, Material, PhysicsWorld, SimulationConfig, Vec2};

// --- Helper for building a pile of mixed bodies above a floor ---
fn build_pile(method: BroadPhaseMethod, count: usize) -> PhysicsWorld {
    let config = SimulationConfig::default().with_broad_phase(method);
    let mut world = PhysicsWorld::new(config).unwrap();
    let material = Arc::new(Material::new(0.3, 0.5, 0.3));

    world
        .add_box(&BodyDesc::new(Vec2::new(0.0, -2.5)), material.clone(), Vec2::new(5.0, 0.2))
        .unwrap();

    let columns = 20;
    for i in 0..count {
        let x = -1.9 + (i % columns) as f64 * 0.2;
        let y = -2.2 + (i / columns) as f64 * 0.2;
        let desc = BodyDesc::new(Vec2::new(x, y)).with_density(1.0);
        if i % 2 == 0 {
            world.add_circle(&desc, material.clone(), 0.08).unwrap();
        } else {
            world.add_box(&desc, material.clone(), Vec2::new(0.15, 0.15)).unwrap();
        }
    }
    world
}

// Compares the three broad phases on the same falling pile
fn bench_falling_pile(c: &mut Criterion) {
    let mut group = c.benchmark_group("falling_pile");

    for method in [
        BroadPhaseMethod::BruteForce,
        BroadPhaseMethod::Quadtree,
        BroadPhaseMethod::SpatialHashGrid,
    ] {
        for count in [50, 200] {
            let id = BenchmarkId::new(format!("{method:?}"), count);
            group.bench_with_input(id, &count, |b, &n| {
                b.iter(|| {
                    let mut world = build_pile(method, n);
                    for _ in 0..30 {
                        world.step();
                    }
                    black_box(world.bodies().len())
                });
            });
        }
    }
    group.finish();
}

// Chain of circles linked by springs hanging from a pinned anchor
fn bench_spring_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("spring_chain");

    for num_links in [10, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(num_links), &num_links, |b, &n| {
            b.iter(|| {
                let mut world = PhysicsWorld::default();
                let material = Arc::new(Material::default());
                let link = 2.5 / n as f64;
                let anchor = world
                    .add_circle(&BodyDesc::new(Vec2::new(-1.25, 2.0)), material.clone(), 0.01)
                    .unwrap();
                let mut last = anchor;
                for i in 1..=n {
                    let desc = BodyDesc::new(Vec2::new(-1.25 + i as f64 * link, 2.0)).with_mass(0.1, 0.001);
                    let current = world.add_circle(&desc, material.clone(), 0.01).unwrap();
                    world
                        .add_spring_constraint(last, current, Vec2::ZERO, Vec2::ZERO, link, 500.0)
                        .unwrap();
                    last = current;
                }
                for _ in 0..60 {
                    world.step();
                }
                black_box(world.bodies().len())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_falling_pile, bench_spring_chain);
criterion_main!(benches);
