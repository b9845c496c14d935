// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Benchmarks for connectivity resolution and sweeps
//!
//! Ships are square grids of components welded to their four neighbours.
//! The resolver benchmark cuts a full column out of the grid so every
//! resolution has to flood the whole ship; the sweep benchmarks measure one
//! tick after a batch of components has been killed.

use composite_body::blueprint::{Blueprint, BlueprintBuilder, Shape, SlotId, SlotRole};
use composite_body::fission::{resolve, RootLossPolicy};
use composite_body::math::{Rotation, Transform2, Vec2};
use composite_body::{FissionConfig, World};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use std::sync::Arc;

fn grid(side: usize) -> Arc<Blueprint> {
    let mut builder = BlueprintBuilder::new(format!("grid-{}", side));
    for y in 0..side {
        for x in 0..side {
            let pose = Transform2::new(Vec2::new(x as f64, y as f64), Rotation::identity());
            builder.add_slot(Shape::square(1.0), pose, 1.0, SlotRole::Structural);
        }
    }
    for y in 0..side {
        for x in 0..side {
            let index = y * side + x;
            if x + 1 < side {
                builder.connect_indices(index, index + 1);
            }
            if y + 1 < side {
                builder.connect_indices(index, index + side);
            }
        }
    }
    // Grids are connected by construction
    Arc::new(builder.build().unwrap())
}

fn bench_resolver(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolver");

    for side in [8usize, 16, 32].iter() {
        let blueprint = grid(*side);
        // Everything in column 1 except the middle row is dead
        let cut = SlotId::new((side / 2 * side + 1) as u32);
        let dead = |slot: SlotId| slot.index() % side == 1 && slot != cut;

        group.bench_with_input(BenchmarkId::new("column_cut", side * side), side, |b, _| {
            b.iter(|| {
                black_box(resolve(
                    blueprint.connections(),
                    black_box(cut),
                    blueprint.root(),
                    |slot| !dead(slot),
                    RootLossPolicy::default(),
                ))
            });
        });
    }

    group.finish();
}

fn bench_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("sweep");
    let config = FissionConfig::default().without_fission_logging();

    for ships in [1usize, 16, 64].iter() {
        let blueprint = grid(12);

        group.bench_with_input(BenchmarkId::new("split_column", ships), ships, |b, &ships| {
            b.iter_batched(
                || {
                    let mut world: World = World::new(config);
                    for i in 0..ships {
                        let pose = Transform2::new(Vec2::new(i as f64 * 20.0, 0.0), Rotation::identity());
                        let id = world.spawn(Arc::clone(&blueprint), pose, None);
                        if let Some(entity) = world.entity_mut(id) {
                            for row in 0..12 {
                                let _ = entity.kill(SlotId::new((row * 12 + 6) as u32));
                            }
                        }
                    }
                    world
                },
                |mut world| black_box(world.tick()),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("step");
    let blueprint = grid(8);

    for ships in [16usize, 256].iter() {
        let mut world: World = World::new(FissionConfig::default().without_fission_logging());
        for i in 0..*ships {
            let pose = Transform2::new(Vec2::new(i as f64 * 10.0, 0.0), Rotation::identity());
            world.spawn(Arc::clone(&blueprint), pose, None);
        }

        group.bench_with_input(BenchmarkId::new("integrate", ships), ships, |b, _| {
            b.iter(|| black_box(world.step(black_box(1.0 / 60.0))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_resolver, bench_sweep, bench_step);
criterion_main!(benches);
