//! Rule resolution: matching, stamping and result assembly.
//!
//! For every rule, in document order, the matcher narrows the coerced
//! inventory by name substring and the rule's field filters, slices the
//! candidates with the rule's [`SearchStrategy`](crate::rules::SearchStrategy)
//! and stamps the selected rows with the rule's `owned` quantity. The
//! assembler then concatenates the per-rule selections and drops structural
//! duplicates, keeping the first occurrence.
//!
//! Stamps are kept in a per-row arena alongside the inventory rather than
//! written into the cells, so field filters always see the inventory as it
//! was loaded. In [`StampMode::Shared`] a later rule overwrites the arena
//! slot of a row an earlier rule already selected.

use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use log::{debug, info, warn};

use crate::{
    cli::{OutputFormat, ResolveArgs, StampMode},
    coerce,
    data::Value,
    inventory::{self, NAME_COLUMN, Record, Table},
    io_utils, output,
    rules::{self, Rule},
    schema::Schema,
    table,
};

pub const OWNED_COLUMN: &str = "owned";

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub table: Table,
    pub matched_rules: usize,
    pub unmatched_rules: usize,
    pub duplicates_removed: usize,
}

pub fn execute(args: &ResolveArgs) -> Result<()> {
    info!("Parsing dictionary {:?}", args.schema);
    let schema = Schema::load(&args.schema)
        .with_context(|| format!("Loading schema from {:?}", args.schema))?;

    info!("Parsing rules {:?}", args.rules);
    let rules = rules::load_rules(&args.rules)
        .with_context(|| format!("Loading rules from {:?}", args.rules))?;
    debug!("Validated {} rule(s)", rules.len());

    let delimiter = io_utils::resolve_input_delimiter(&args.inventory, args.delimiter);
    info!(
        "Processing inventory {:?} with delimiter '{}'",
        args.inventory,
        crate::printable_delimiter(delimiter)
    );
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let mut inventory = inventory::read_table(&args.inventory, delimiter, encoding)
        .with_context(|| format!("Reading inventory {:?}", args.inventory))?;
    let report = coerce::coerce_table(&mut inventory, &schema);
    info!(
        "Coerced {} cell(s) across {} record(s); {} left unparsed",
        report.converted,
        inventory.len(),
        report.warnings
    );

    info!("Applying {} ownership rule(s)", rules.len());
    let resolution = resolve(&inventory, &rules, args.stamp_mode)?;
    if resolution.table.is_empty() {
        info!("No filtered inventory to save");
        return Ok(());
    }

    if args.table {
        table::print_table(&resolution.table.columns, &resolution.table.display_rows());
        info!("Displayed {} record(s)", resolution.table.len());
        return Ok(());
    }

    let format = output::resolve_format(&args.output, args.format);
    match format {
        OutputFormat::Csv => {
            let output_delimiter =
                io_utils::resolve_output_delimiter(&args.output, args.output_delimiter, delimiter);
            output::write_csv(&resolution.table, &args.output, output_delimiter)?
        }
        OutputFormat::Json => output::write_json(&resolution.table, &args.output)?,
    }
    info!(
        "Filtered inventory with {} record(s) saved to {:?}",
        resolution.table.len(),
        args.output
    );
    Ok(())
}

/// Evaluates `rules` against a coerced inventory.
///
/// Fails only when the inventory has no `name` column; rules that match
/// nothing are logged and skipped.
pub fn resolve(inventory: &Table, rules: &[Rule], mode: StampMode) -> Result<Resolution> {
    let name_idx = inventory
        .column_index(NAME_COLUMN)
        .ok_or_else(|| anyhow!("Inventory has no '{NAME_COLUMN}' column to match rules against"))?;
    let normalized = normalized_names(inventory, name_idx);

    let mut stamps: Vec<Option<u64>> = vec![None; inventory.len()];
    let mut selections: Vec<(usize, u64)> = Vec::new();
    let mut matched_rules = 0usize;
    let mut unmatched_rules = 0usize;

    for rule in rules {
        let candidates = candidates_for(inventory, &normalized, rule);
        if candidates.is_empty() {
            warn!("No matches found for rule {rule}");
            unmatched_rules += 1;
            continue;
        }
        let selected = rule.search_strategy.select(&candidates);
        debug!(
            "Rule {rule} matched {} candidate(s), selected {}",
            candidates.len(),
            selected.len()
        );
        for &row in selected {
            stamps[row] = Some(rule.owned);
            selections.push((row, rule.owned));
        }
        matched_rules += 1;
    }

    let mut result = Table::new(inventory.columns.clone());
    let owned_idx = result.ensure_column(OWNED_COLUMN);
    let stamped = selections.into_iter().map(|(row, owned)| {
        let owned = match mode {
            StampMode::Shared => stamps[row].unwrap_or(owned),
            StampMode::PerRule => owned,
        };
        stamp(&inventory.records[row], owned_idx, owned)
    });
    let (records, duplicates_removed) =
        deduplicate(stamped.collect::<Result<Vec<_>>>()?, name_idx, owned_idx);
    result.records = records;

    if result.is_empty() {
        info!("No rule matched any inventory record; nothing to persist");
    } else if duplicates_removed > 0 {
        debug!("Dropped {duplicates_removed} duplicate record(s)");
    }

    Ok(Resolution {
        table: result,
        matched_rules,
        unmatched_rules,
        duplicates_removed,
    })
}

/// Lower-cased name per row, computed once per run. Rows whose name is not
/// text never match.
fn normalized_names(inventory: &Table, name_idx: usize) -> Vec<Option<String>> {
    inventory
        .column_values(name_idx)
        .map(|value| match value {
            Value::String(name) => Some(name.to_lowercase()),
            _ => None,
        })
        .collect()
}

fn candidates_for(inventory: &Table, normalized: &[Option<String>], rule: &Rule) -> Vec<usize> {
    let needle = rule.name_needle();
    let mut rows = normalized
        .iter()
        .enumerate()
        .filter(|(_, name)| name.as_deref().is_some_and(|name| name.contains(&needle)))
        .map(|(row, _)| row)
        .collect::<Vec<_>>();

    for filter in &rule.fields {
        let Some(col) = inventory.column_index(&filter.field) else {
            debug!(
                "Skipping filter on unknown field '{}' for rule {rule}",
                filter.field
            );
            continue;
        };
        rows.retain(|&row| filter.matches(inventory.records[row].get(col)));
    }
    rows
}

fn stamp(record: &Record, owned_idx: usize, owned: u64) -> Result<Record> {
    let owned = i64::try_from(owned).context("Owned quantity exceeds the supported range")?;
    let mut stamped = record.clone();
    stamped.set(owned_idx, Value::Integer(owned));
    Ok(stamped)
}

/// Drops records structurally equal to an earlier one, keeping order.
/// Records are bucketed by name and owned text before the full comparison.
fn deduplicate(records: Vec<Record>, name_idx: usize, owned_idx: usize) -> (Vec<Record>, usize) {
    let mut buckets: HashMap<(String, String), Vec<usize>> = HashMap::new();
    let mut unique: Vec<Record> = Vec::with_capacity(records.len());
    let mut removed = 0usize;
    for record in records {
        let key = (
            record.get(name_idx).as_display(),
            record.get(owned_idx).as_display(),
        );
        let bucket = buckets.entry(key).or_default();
        if bucket.iter().any(|&idx| unique[idx] == record) {
            removed += 1;
            continue;
        }
        bucket.push(unique.len());
        unique.push(record);
    }
    (unique, removed)
}
