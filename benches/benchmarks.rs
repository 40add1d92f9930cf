use criterion::{criterion_group, criterion_main, Criterion};
use unicol::{
    collate, AlphabeticIndex, CollationOptions, Collator, CollatorRegistry, RuleBasedCollator,
};

const WORDS: [&str; 24] = [
    "deluge", "Deluge", "d\u{E9}luge", "d\u{E9}lug\u{E9}", "co-op", "coop", "cote", "c\u{F4}te",
    "\u{E4}rger", "Arger", "zebra", "\u{3B1}\u{3BB}\u{3C6}\u{3B1}", "\u{43C}\u{438}\u{440}",
    "\u{5E9}\u{5DC}\u{5D5}\u{5DD}", "\u{627}\u{644}\u{639}\u{631}\u{628}\u{64A}\u{629}",
    "\u{D55C}\u{AD6D}", "\u{3072}\u{3089}\u{304C}\u{306A}", "\u{30AB}\u{30BF}\u{30AB}\u{30CA}",
    "\u{4E2D}\u{6587}", "file10", "file2", "123", "$5", "\u{2026}",
];

fn root_sort(c: &mut Criterion) {
    let collator = RuleBasedCollator::root();
    c.bench_function("root, mixed scripts", |b| {
        b.iter(|| {
            let mut words = WORDS.to_vec();
            words.sort_by(|a, b| collator.compare(a, b));
            words
        })
    });
}

fn options_sort(c: &mut Criterion) {
    let options = CollationOptions::default();
    c.bench_function("collate, default options", |b| {
        b.iter(|| {
            let mut words = WORDS.to_vec();
            words.sort_by(|a, b| collate(a, b, &options));
            words
        })
    });
}

fn sort_keys(c: &mut Criterion) {
    let collator = CollatorRegistry::default()
        .collator_for("sv-u-ks-level4-ka-shifted")
        .unwrap();
    c.bench_function("sv, sort keys", |b| {
        b.iter(|| WORDS.iter().map(|w| collator.sort_key(w)).collect::<Vec<_>>())
    });
}

fn rule_compilation(c: &mut Criterion) {
    c.bench_function("compile cs rules", |b| {
        b.iter(|| {
            RuleBasedCollator::new(
                "&c<\u{10D}<<<\u{10C}&h<ch<<<cH<<<Ch<<<CH&r<\u{159}<<<\u{158}&s<\u{161}<<<\u{160}&z<\u{17E}<<<\u{17D}",
            )
            .unwrap()
        })
    });
}

fn index_buckets(c: &mut Criterion) {
    let registry = CollatorRegistry::default();
    c.bench_function("de, index buckets", |b| {
        b.iter(|| {
            let mut index: AlphabeticIndex<usize> = AlphabeticIndex::new("de", &registry).unwrap();
            for (i, word) in WORDS.iter().enumerate() {
                index.add_record(word, i);
            }
            index.bucket_count().unwrap()
        })
    });
}

criterion_group!(
    benches,
    root_sort,
    options_sort,
    sort_keys,
    rule_compilation,
    index_buckets
);
criterion_main!(benches);
