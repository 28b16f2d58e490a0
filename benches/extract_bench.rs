/// Benchmarks for the Locust Lens extraction pipeline.
///
/// Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use locust_lens::application::ExtractUsecase;
use locust_lens::domain::builder::ModelBuilder;
use locust_lens::domain::dialect::DialectConfig;
use locust_lens::infrastructure::{ScriptSource, TreeSitterPythonParser};
use locust_lens::ports::ScriptParser;

/// Synthetic locustfile with `classes` user classes of `tasks` tasks each.
fn synthetic_script(classes: usize, tasks: usize) -> String {
    let mut src = String::from("from locust import HttpUser, task, between\n\n");
    for c in 0..classes {
        src.push_str(&format!("class User{}(HttpUser):\n", c));
        src.push_str("    wait_time = between(1, 5)\n");
        src.push_str(&format!("    weight = {}\n\n", c + 1));
        for t in 0..tasks {
            src.push_str(&format!("    @task({})\n", t + 1));
            src.push_str(&format!("    def task_{}(self):\n", t));
            src.push_str("        if self.flag:\n");
            src.push_str(&format!("            self.client.get(\"/items/{}\")\n", t));
            src.push_str("        else:\n");
            src.push_str(&format!("            self.client.post(\"/orders/{}\", json={{}})\n\n", t));
        }
    }
    src
}

fn bench_parse_and_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_script");
    let dialect = DialectConfig::default();

    for &(classes, tasks) in &[(1, 5), (10, 10), (50, 20)] {
        let source = synthetic_script(classes, tasks);
        group.throughput(Throughput::Bytes(source.len() as u64));

        group.bench_with_input(
            BenchmarkId::new("parse", format!("{}x{}", classes, tasks)),
            &source,
            |b, src| b.iter(|| TreeSitterPythonParser.parse(black_box(src)).unwrap()),
        );

        let module = TreeSitterPythonParser.parse(&source).unwrap();
        group.bench_with_input(
            BenchmarkId::new("build", format!("{}x{}", classes, tasks)),
            &module,
            |b, module| b.iter(|| ModelBuilder::new(&dialect).build(black_box(module))),
        );
    }
    group.finish();
}

fn bench_extract_all(c: &mut Criterion) {
    let dialect = DialectConfig::default();
    let usecase = ExtractUsecase {
        parser: &TreeSitterPythonParser,
        dialect: &dialect,
    };
    let scripts: Vec<ScriptSource> = (0..64)
        .map(|i| ScriptSource::new(format!("locustfile_{}.py", i), synthetic_script(5, 10)))
        .collect();

    c.bench_function("extract_all_64_files", |b| {
        b.iter(|| usecase.extract_all(black_box(&scripts)))
    });
}

criterion_group!(benches, bench_parse_and_build, bench_extract_all);
criterion_main!(benches);
