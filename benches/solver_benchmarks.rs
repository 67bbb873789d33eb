use criterion::{black_box, criterion_group, criterion_main, Criterion};
use relfind::instance::Bounds;
use relfind::models::rar_model;
use relfind::solver::{Command, Options, Solver};

/// The RAR scenarios with the bounds they are usually run at
fn scenarios() -> Vec<(&'static str, Command, Bounds)> {
    vec![
        (
            "enabled_without_rar_bit",
            Command::Find("enabledWithoutRarBit".into()),
            Bounds::new().bound("Processor", 1),
        ),
        (
            "rar_to_sleeping_processor",
            Command::Find("rarToSleepingProcessor".into()),
            Bounds::new().bound("Processor", 1).bound("RAR", 1),
        ),
        (
            "payload_beyond_table",
            Command::Find("payloadBeyondTable".into()),
            Bounds::new().bound("Processor", 1).bound("PayloadTableEntry", 1),
        ),
        (
            "ready_with_pending_action",
            Command::Find("readyWithPendingAction".into()),
            Bounds::new()
                .bound("Processor", 1)
                .bound("RAR", 0)
                .bound("PayloadTableEntry", 1),
        ),
        (
            "no_rar_targets_init",
            Command::Check("noRarTargetsInit".into()),
            Bounds::new().bound("Processor", 2).bound("RAR", 2),
        ),
    ]
}

fn solver_benchmarks(c: &mut Criterion) {
    let model = rar_model().expect("model loads");
    let mut group = c.benchmark_group("rar");

    for (name, command, bounds) in scenarios() {
        group.bench_function(name, |b| {
            let solver = Solver::new(Options::default());
            b.iter(|| solver.solve(black_box(&model), &command, &bounds));
        });
    }

    // Same exhaustive check, spread over worker threads
    group.bench_function("no_rar_targets_init_4_threads", |b| {
        let solver = Solver::new(Options {
            threads: 4,
            ..Options::default()
        });
        let bounds = Bounds::new().bound("Processor", 2).bound("RAR", 2);
        b.iter(|| solver.check(black_box(&model), "noRarTargetsInit", &bounds));
    });

    group.finish();
}

criterion_group!(benches, solver_benchmarks);
criterion_main!(benches);
