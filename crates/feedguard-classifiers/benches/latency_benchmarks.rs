//! Latency benchmarks for the rules-only classifier
//!
//! The rules engine runs on every moderation request, including alongside
//! successful model calls, so it has to stay well under a millisecond.
//!
//! Run with: cargo bench -p feedguard-classifiers

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use feedguard_classifiers::{PatternLibrary, RulesClassifier};

/// Benchmark full rule evaluation over representative posts
fn benchmark_rules_classifier(c: &mut Criterion) {
    let classifier = RulesClassifier::new().expect("Failed to create rules classifier");
    let no_links: Vec<String> = Vec::new();
    let risky_links = vec!["https://bit.ly/abcd1234".to_string()];

    let test_cases = vec![
        ("short_clean", "Hello, how are you today?", &no_links),
        ("mild_profanity", "This game is freakin' hard as hell but I love it.", &no_links),
        ("targeted_bullying", "@john you're such a loser, everyone hates you. Quit already.", &no_links),
        ("hate_placeholder", "We shouldn't hire them, those <slur> don't belong here.", &no_links),
        ("risky_link", "Check this out", &risky_links),
        ("long_clean", "The quick brown fox jumps over the lazy dog. This is a longer post about weekend hiking plans, trail conditions, and which snacks to bring along for the kids.", &no_links),
    ];

    let mut group = c.benchmark_group("Rules_Classifier");
    group.significance_level(0.05);
    group.sample_size(100);

    for (name, text, links) in test_cases {
        group.bench_with_input(BenchmarkId::new("evaluate", name), &text, |b, text| {
            b.iter(|| classifier.evaluate(black_box(text), black_box(links)))
        });
    }

    group.finish();
}

/// Benchmark the link risk heuristic on its own
fn benchmark_link_risk(c: &mut Criterion) {
    let library = PatternLibrary::new().expect("Failed to create pattern library");

    let urls = vec![
        ("shortener", "https://bit.ly/xyz"),
        ("adult_tld", "https://example.xxx/page"),
        ("numeric_host", "http://10.0.0.1/login"),
        ("benign", "https://www.example.com/articles/2024/rust"),
    ];

    let mut group = c.benchmark_group("Link_Risk");

    for (name, url) in urls {
        group.bench_with_input(BenchmarkId::new("link_risk", name), &url, |b, url| {
            b.iter(|| library.link_risk(black_box(url)))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_rules_classifier, benchmark_link_risk);
criterion_main!(benches);
