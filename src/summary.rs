//! Field listing and distinct-value reports over the schema and inventory.

use anyhow::{Context, Result, bail};
use itertools::Itertools;
use log::info;

use crate::{
    cli::{FieldsArgs, ValuesArgs},
    coerce,
    data::Value,
    inventory::{self, Table},
    io_utils,
    schema::Schema,
    table,
};

pub fn execute_fields(args: &FieldsArgs) -> Result<()> {
    let schema = Schema::load(&args.schema)
        .with_context(|| format!("Loading schema from {:?}", args.schema))?;
    if schema.is_empty() {
        info!("Schema {:?} does not declare any fields", args.schema);
        return Ok(());
    }

    let rows = schema
        .fields
        .iter()
        .enumerate()
        .map(|(idx, field)| {
            vec![
                (idx + 1).to_string(),
                field.name.clone(),
                field.declaration.clone(),
                field.logical_type.to_string(),
            ]
        })
        .collect::<Vec<_>>();
    let headers = ["#", "name", "declaration", "type"].map(String::from);
    table::print_table(&headers, &rows);
    info!("Listed {} field(s) from {:?}", rows.len(), args.schema);
    Ok(())
}

pub fn execute_values(args: &ValuesArgs) -> Result<()> {
    let schema = Schema::load(&args.schema)
        .with_context(|| format!("Loading schema from {:?}", args.schema))?;
    if schema.field(&args.field).is_none() {
        bail!(
            "Invalid field name '{}'. Valid fields: {}",
            args.field,
            schema.field_names().join(", ")
        );
    }

    let delimiter = io_utils::resolve_input_delimiter(&args.inventory, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let mut inventory = inventory::read_table(&args.inventory, delimiter, encoding)
        .with_context(|| format!("Reading inventory {:?}", args.inventory))?;
    coerce::coerce_table(&mut inventory, &schema);

    let counts = distinct_values(&inventory, &args.field)?;
    if counts.is_empty() {
        info!("No values found for field '{}'", args.field);
        return Ok(());
    }
    let shown = if args.limit > 0 {
        args.limit.min(counts.len())
    } else {
        counts.len()
    };
    let rows = counts
        .iter()
        .take(shown)
        .map(|(value, count)| vec![value.as_display(), count.to_string()])
        .collect::<Vec<_>>();
    table::print_table(&[args.field.clone(), "count".to_string()], &rows);
    info!(
        "Displayed {shown} of {} distinct value(s) for field '{}'",
        counts.len(),
        args.field
    );
    Ok(())
}

/// Distinct non-missing values of `field` in ascending order, with counts.
pub fn distinct_values(inventory: &Table, field: &str) -> Result<Vec<(Value, usize)>> {
    let Some(idx) = inventory.column_index(field) else {
        bail!("Field '{field}' does not exist in the inventory");
    };
    let counts = inventory
        .column_values(idx)
        .filter(|value| !value.is_missing())
        .cloned()
        .sorted_by(Value::total_cmp)
        .dedup_with_count()
        .map(|(count, value)| (value, count))
        .collect();
    Ok(counts)
}
