//! Benchmarks for the judge core.
//!
//! Run with: cargo bench
//!
//! The host-side benches (bootstrap rendering, record mapping) always run;
//! the grading benches require rustpython.wasm at assets/rustpython.wasm.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::time::Duration;
use tokio::runtime::Runtime;

use serde_json::json;
use wasm_python_judge_rs::judge::namespace::render_bootstrap;
use wasm_python_judge_rs::judge::report::parse_record;
use wasm_python_judge_rs::prelude::*;

/// Get the path to the interpreter, checking if it exists.
fn get_interpreter_path() -> Option<std::path::PathBuf> {
    let path = std::path::PathBuf::from("assets/rustpython.wasm");
    if path.exists() {
        Some(path)
    } else {
        None
    }
}

/// Benchmark bootstrap rendering for both profiles.
fn bench_bootstrap_rendering(c: &mut Criterion) {
    let mut group = c.benchmark_group("bootstrap");

    group.bench_function("render_minimal", |b| {
        b.iter(|| black_box(render_bootstrap(Profile::Minimal)));
    });

    group.bench_function("render_relaxed", |b| {
        b.iter(|| black_box(render_bootstrap(Profile::Relaxed)));
    });

    group.finish();
}

/// Benchmark result-record parsing and verdict mapping.
fn bench_report_mapping(c: &mut Criterion) {
    let mut group = c.benchmark_group("report");

    let stdout = format!(
        "__JUDGE_RESULT__ {}\n",
        r#"{"status":"ok","passCount":41,"total":42}"#
    );
    group.bench_function("parse_and_map_tally", |b| {
        b.iter(|| {
            let record = parse_record(black_box(&stdout)).unwrap();
            black_box(ExecutionResult::from_record(record, 17))
        });
    });

    let noisy = format!("{}{}", "warmup noise\n".repeat(50), stdout);
    group.bench_function("parse_noisy_stdout", |b| {
        b.iter(|| black_box(parse_record(black_box(&noisy)).unwrap()));
    });

    group.finish();
}

/// Benchmark request serialization for the guest stdin channel.
fn bench_request_encoding(c: &mut Criterion) {
    let request = ExecutionRequest {
        code: "def twoSum(nums, target):\n    return [0, 1]".to_string(),
        export_name: Some("twoSum".to_string()),
        tests: (0..64)
            .map(|i| TestCase {
                input: TestInput {
                    args: vec![json!([i, i + 1, i + 2]), json!(i * 2)],
                },
                output: json!([0, 1]),
            })
            .collect(),
    };

    c.bench_function("encode_request_64_tests", |b| {
        b.iter(|| black_box(request.to_json().unwrap()));
    });
}

/// Benchmark end-to-end grading (cached module, warm engine).
fn bench_grading(c: &mut Criterion) {
    let Some(interpreter_path) = get_interpreter_path() else {
        eprintln!("Skipping grading benchmark: rustpython.wasm not found");
        return;
    };

    let rt = Runtime::new().unwrap();
    let config = JudgeConfig::builder()
        .interpreter_path(&interpreter_path)
        .timeout(Duration::from_secs(30))
        .max_memory(64 * 1024 * 1024)
        .build();
    let judge = PythonJudge::new(config).unwrap();

    let request = ExecutionRequest {
        code: "def inc(x):\n    return x + 1".to_string(),
        export_name: Some("inc".to_string()),
        tests: vec![TestCase {
            input: TestInput { args: vec![json!(1)] },
            output: json!(2),
        }],
    };

    let mut group = c.benchmark_group("grading");
    group.sample_size(10);

    group.bench_function("single_test_accept", |b| {
        b.iter(|| {
            let result = rt.block_on(judge.grade(&request));
            black_box(result)
        });
    });

    group.finish();
}

/// Benchmark cold judge construction without the module cache.
fn bench_cold_start(c: &mut Criterion) {
    let Some(interpreter_path) = get_interpreter_path() else {
        eprintln!("Skipping cold_start benchmark: rustpython.wasm not found");
        return;
    };

    let mut group = c.benchmark_group("cold_start");
    group.sample_size(10);

    group.bench_function("judge_creation_no_cache", |b| {
        b.iter(|| {
            let config = JudgeConfig::builder()
                .interpreter_path(&interpreter_path)
                .build();
            let judge = PythonJudge::new_with_options(config, JudgeOptions::no_cache()).unwrap();
            black_box(judge)
        });
    });

    group.bench_function("judge_creation_with_cache", |b| {
        b.iter(|| {
            let config = JudgeConfig::builder()
                .interpreter_path(&interpreter_path)
                .build();
            let judge = PythonJudge::new(config).unwrap();
            assert!(judge.is_using_cached_module());
            black_box(judge)
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_bootstrap_rendering,
    bench_report_mapping,
    bench_request_encoding,
    bench_grading,
    bench_cold_start,
);

criterion_main!(benches);
