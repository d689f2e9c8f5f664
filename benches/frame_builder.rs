//! Benchmarks for trajectory indexing and frame building.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use trajview::{ParticleId, ParticleRecord, SimTime, Trajectory, TrajectoryIndex};

/// Snapshot rows for `particles` particles over `steps` times, in file order.
fn records(particles: u64, steps: u64) -> Vec<ParticleRecord> {
    let mut records = Vec::with_capacity((particles * steps) as usize);
    for step in 0..steps {
        let t = step as f64 * 0.01;
        for id in 0..particles {
            let phase = id as f64 * 0.1 + t;
            records.push(ParticleRecord {
                id: ParticleId(id),
                t: SimTime::new(t).unwrap(),
                position: [phase.cos() * 5.0, phase.sin() * 5.0, t],
                velocity: [-phase.sin(), phase.cos(), 1.0],
            });
        }
    }
    records
}

fn bench_index_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_build");

    for particles in [110, 1_000, 10_000] {
        let records = records(particles, 100);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x100", particles)),
            &particles,
            |b, _| {
                b.iter(|| TrajectoryIndex::build(black_box(&records)).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_frame_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_build");

    for particles in [110, 1_000, 10_000] {
        let trajectory = Trajectory::from_records(records(particles, 100)).unwrap();

        for velocity in [false, true] {
            let builder = trajectory.frames().with_velocity(velocity);
            let label = if velocity { "pos_vel" } else { "pos" };

            group.bench_with_input(
                BenchmarkId::new(label, particles),
                &particles,
                |b, _| {
                    b.iter(|| builder.build(black_box(50)).unwrap());
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_index_build, bench_frame_build);
criterion_main!(benches);
