use std::path::Path;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use mimalloc::MiMalloc;
use php_analyzer::{analyze_source, AnalyzerConfig, CheckRegistry};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const FUNCTIONS: &str = r#"
function handle_{n}(array $items, ?callable $log = null) {
    $total = 0;
    foreach ($items as $key => $item) {
        try {
            switch ($item['kind'] ?? null) {
                case 'a':
                    $total += $item['value'];
                case 'b':
                    $total++;
                    break;
                default:
                    continue 2;
            }
        } catch (\Throwable $e) {
            $log && $log($e->getMessage());
        } finally {
            unset($item);
        }
    }
    $fmt = fn ($v) => sprintf('%d', $v + $total);
    return match (true) {
        $total > 100 => $fmt($total),
        default => null,
    };
}
"#;

fn bench_analyze(c: &mut Criterion) {
    let source: String = std::iter::once("<?php\n".to_string())
        .chain((0..100).map(|n| FUNCTIONS.replace("{n}", &n.to_string())))
        .collect();
    let config = AnalyzerConfig::default();
    let registry = CheckRegistry::builtin();

    let mut group = c.benchmark_group("analyze");
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("pipeline", |b| {
        b.iter(|| analyze_source(Path::new("bench.php"), &source, &config, registry))
    });
    group.bench_function("semantic", |b| {
        let parsed = php_parser::parse(&source);
        b.iter(|| {
            let symbols = php_semantic::resolve(&parsed.program);
            let cfgs = php_semantic::build_all(&parsed.program);
            (symbols, cfgs)
        })
    });
    group.finish();
}

criterion_group!(benches, bench_analyze);
criterion_main!(benches);
