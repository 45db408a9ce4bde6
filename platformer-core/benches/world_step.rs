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
//! Benchmarks for a full simulation frame
//!
//! Measures:
//! - Frame time for growing numbers of walkers resting on a shared floor
//! - The effect of larger snapshot pools on steady-state frames

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use platformer_core::controller::ButtonStates;
use platformer_core::damage::DamageTable;
use platformer_core::physics::{BodyComponent, Fixture, FixtureRole};
use platformer_core::pool::PoolConfig;
use platformer_core::{Simulation, SimulationConfig};

fn setup_simulation(n_walkers: usize, config: SimulationConfig) -> Simulation {
    let mut sim = Simulation::new(config).unwrap();
    let width = n_walkers as f32 * 3.0 + 10.0;
    sim.world_mut()
        .spawn()
        .with(
            BodyComponent::fixed()
                .with_size(width, 10.0)
                .with_position(-5.0, -10.0)
                .with_fixture(Fixture::new(vec![FixtureRole::block()]).with_size(width, 10.0)),
        )
        .id();

    for i in 0..n_walkers {
        let damage = DamageTable::new().with_fixed("spike", 1);
        sim.world_mut()
            .spawn()
            .with(
                BodyComponent::dynamic()
                    .with_size(1.0, 2.0)
                    .with_position(i as f32 * 3.0, 0.0)
                    .with_gravity(-30.0)
                    .with_fixture(
                        Fixture::new(vec![FixtureRole::Feet])
                            .with_size(1.0, 0.5)
                            .with_offset(0.0, -0.75),
                    )
                    .with_fixture(
                        Fixture::new(vec![FixtureRole::Damageable(Box::new(damage))]).with_size(1.0, 2.0),
                    ),
            )
            .id();
    }
    sim
}

fn bench_walkers_on_floor(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_step");

    for n_walkers in [10, 100, 1000].iter() {
        let mut sim = setup_simulation(*n_walkers, SimulationConfig::default());
        let input = ButtonStates::new();
        group.throughput(Throughput::Elements(*n_walkers as u64));
        group.bench_with_input(BenchmarkId::new("walkers", n_walkers), n_walkers, |b, _| {
            b.iter(|| black_box(sim.step(&input, 1.0 / 60.0)));
        });
    }

    group.finish();
}

fn bench_pool_capacity(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_step_pools");

    for n_walkers in [100, 1000].iter() {
        let config = SimulationConfig::default().with_pool(PoolConfig::new(4096, 4));
        let mut sim = setup_simulation(*n_walkers, config);
        let input = ButtonStates::new();
        group.bench_with_input(BenchmarkId::new("large_capacity", n_walkers), n_walkers, |b, _| {
            b.iter(|| black_box(sim.step(&input, 1.0 / 60.0)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_walkers_on_floor, bench_pool_capacity);
criterion_main!(benches);
