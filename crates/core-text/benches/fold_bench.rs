use core_text::{FoldOptions, fold};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn sample_line() -> String {
    let mut s = String::new();
    for i in 0..40 {
        if i % 5 == 0 {
            s.push_str("\u{1b}[31m");
        }
        s.push_str("word");
        s.push_str(if i % 3 == 0 { "全角 " } else { " " });
        if i % 5 == 4 {
            s.push_str("\u{1b}[m");
        }
    }
    s
}

fn fold_rows(text: &str, width: usize, opts: FoldOptions) -> usize {
    let mut rows = 0;
    let mut rest = text.to_string();
    loop {
        let f = fold(&rest, width, opts);
        rows += 1;
        if f.remainder.is_empty() {
            return rows;
        }
        rest = f.remainder;
    }
}

fn bench_fold(c: &mut Criterion) {
    let line = sample_line();
    c.bench_function("fold_greedy_width_40", |b| {
        b.iter(|| fold_rows(black_box(&line), 40, FoldOptions::default()))
    });
    c.bench_function("fold_onword_width_40", |b| {
        b.iter(|| fold_rows(black_box(&line), 40, FoldOptions::new(true, true)))
    });
}

criterion_group!(benches, bench_fold);
criterion_main!(benches);
