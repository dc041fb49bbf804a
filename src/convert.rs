use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::ConvertArgs,
    coerce::{self, NumberStyle},
    inventory, io_utils, output,
    schema::Schema,
};

pub fn execute(args: &ConvertArgs) -> Result<()> {
    let schema = match &args.schema {
        Some(path) => {
            Schema::load(path).with_context(|| format!("Loading schema from {path:?}"))?
        }
        None => {
            info!("No schema given; using the built-in card field layout");
            Schema::card_defaults()
        }
    };
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let mut table = inventory::read_table(&args.input, delimiter, encoding)
        .with_context(|| format!("Reading inventory {:?}", args.input))?;
    let report = coerce::coerce_table_with(&mut table, &schema, NumberStyle::Exact);

    let destination = args.output.as_deref().unwrap_or(Path::new("-"));
    output::write_json(&table, destination)?;
    info!(
        "Converted {} record(s) to JSON at {} ({} cell(s) typed, {} left unparsed)",
        table.len(),
        if io_utils::is_dash(destination) {
            "stdout".to_string()
        } else {
            format!("{destination:?}")
        },
        report.converted,
        report.warnings
    );
    Ok(())
}
