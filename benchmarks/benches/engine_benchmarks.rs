//! Benchmarks comparing the two lumen execution engines.
//!
//! Measures:
//! - Front-end throughput (lex + parse + desugar)
//! - Tree-walk interpreter vs bytecode VM on the same programs

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use lumen_lang::desugar;
use lumen_lang::lexer::lex;
use lumen_lang::parser;
use lumen_lang::runner::{Engine, Runner, RunnerConfig};
use lumen_lang::source::SourceText;

/// Tight counting loop.
const COUNT: &str = "
var i = 0;
var total = 0;
while i < 1000 {
    total += i;
    i += 1;
}
";

/// Iterative factorial, exercising big-integer arithmetic.
const FACT: &str = "
function fact(n) {
    var p = 1;
    var i = 2;
    while i <= n {
        p = p * i;
        i += 1;
    }
    return p;
}
fact(40);
";

/// Recursive fibonacci, exercising the call machinery.
const FIB: &str = "
function fib(n) {
    if n < 2 { return n; }
    return fib(n - 1) + fib(n - 2);
}
fib(15);
";

/// String building through the operator table.
const STRINGS: &str = "
var line = '';
var i = 0;
while i < 100 {
    line = line + 'ab' * 2;
    i += 1;
}
";

const PROGRAMS: &[(&str, &str)] = &[
    ("count", COUNT),
    ("fact", FACT),
    ("fib", FIB),
    ("strings", STRINGS),
];

fn bench_frontend(c: &mut Criterion) {
    let mut group = c.benchmark_group("frontend");

    for (name, program) in PROGRAMS {
        group.bench_with_input(BenchmarkId::new("pipeline", name), program, |b, program| {
            b.iter(|| {
                let source = SourceText::new(black_box(program));
                let tokens = lex(&source).unwrap();
                desugar::desugar(parser::parse(tokens).unwrap())
            })
        });
    }

    group.finish();
}

fn bench_engines(c: &mut Criterion) {
    let mut group = c.benchmark_group("engines");

    for engine in [Engine::TreeWalk, Engine::Bytecode] {
        let runner = Runner::with_config(RunnerConfig { engine });
        for (name, program) in PROGRAMS {
            let source = SourceText::new(program);
            group.bench_with_input(
                BenchmarkId::new(format!("{engine:?}"), name),
                &source,
                |b, source| {
                    b.iter(|| {
                        let mut out = Vec::new();
                        runner.run(black_box(source), &mut out).unwrap();
                        out
                    })
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_frontend, bench_engines);
criterion_main!(benches);
