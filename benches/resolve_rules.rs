use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use card_ledger::cli::StampMode;
use card_ledger::coerce::coerce_table;
use card_ledger::inventory::Table;
use card_ledger::resolve::resolve;
use card_ledger::rules::{Rule, parse_rules};
use card_ledger::schema::Schema;

const NAMES: &[&str] = &[
    "Pikachu",
    "Charizard",
    "Bulbasaur",
    "Mewtwo",
    "Eevee",
    "Snorlax",
    "Gengar",
    "Lucario",
];

fn synthetic_inventory(rows: usize) -> Table {
    let columns = ["id", "name", "subtypes", "hp", "types"]
        .map(String::from)
        .to_vec();
    let records = (0..rows).map(|i| {
        let name = NAMES[i % NAMES.len()];
        let subtypes = match i % 4 {
            0 => "['Basic']",
            1 => "['Stage 1']",
            2 => "['Basic', 'EX']",
            _ => "['Stage 2']",
        };
        vec![
            format!("set{}-{i}", i % 50),
            format!("{name} {}", i % 7),
            subtypes.to_string(),
            ((i % 20 + 3) * 10).to_string(),
            "['Colorless']".to_string(),
        ]
    });
    let mut table = Table::from_raw_rows(columns, records);
    coerce_table(&mut table, &Schema::card_defaults());
    table
}

fn synthetic_rules() -> Vec<Rule> {
    let yaml = NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let strategy = ["first", "last", "all"][i % 3];
            format!(
                "- name: {name}\n  owned: {}\n  searchStrategy: {strategy}\n  fields:\n    subtypes: basic\n",
                i + 1
            )
        })
        .collect::<String>();
    parse_rules(&yaml).expect("rules")
}

fn bench_resolve(c: &mut Criterion) {
    let inventory = synthetic_inventory(20_000);
    let rules = synthetic_rules();

    let mut group = c.benchmark_group("resolve_20k");
    group.bench_function("shared", |b| {
        b.iter(|| {
            resolve(black_box(&inventory), black_box(&rules), StampMode::Shared).expect("resolve")
        })
    });
    group.bench_function("per_rule", |b| {
        b.iter(|| {
            resolve(black_box(&inventory), black_box(&rules), StampMode::PerRule).expect("resolve")
        })
    });
    group.finish();
}

criterion_group!(benches, bench_resolve);
criterion_main!(benches);
