use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Resolve card ownership rules against a typed inventory",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply ownership rules to the inventory and write the matched records
    Resolve(ResolveArgs),
    /// Convert an inventory CSV into a JSON array with structured fields decoded
    Convert(ConvertArgs),
    /// List the fields declared in a schema dictionary
    Fields(FieldsArgs),
    /// List the distinct values of one inventory field
    Values(ValuesArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    Csv,
    Json,
}

/// How `owned` stamps interact when several rules select the same record.
///
/// `shared` is the default: a record selected by several rules is written
/// once, with the last rule's quantity. `per-rule` reproduces the legacy
/// report, which writes one row per selecting rule.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum StampMode {
    /// Stamps land on the shared inventory row; the last matching rule wins
    #[default]
    Shared,
    /// Every rule stamps its own copy of the rows it selected
    PerRule,
}

#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Schema dictionary describing each inventory field's type
    #[arg(short = 's', long = "schema", default_value = "dictionary.yaml")]
    pub schema: PathBuf,
    /// Inventory CSV file ('-' reads stdin)
    #[arg(short = 'i', long = "inventory", default_value = "inventory.csv")]
    pub inventory: PathBuf,
    /// Ownership rules YAML file
    #[arg(short = 'r', long = "rules", default_value = "rules.yaml")]
    pub rules: PathBuf,
    /// Destination for the filtered inventory ('-' writes stdout)
    #[arg(short = 'o', long = "output", default_value = "filtered_inventory.csv")]
    pub output: PathBuf,
    /// Output format (inferred from the output extension when omitted)
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
    /// How stamps from overlapping rules are combined
    #[arg(long = "stamp-mode", value_enum, default_value_t = StampMode::Shared)]
    pub stamp_mode: StampMode,
    /// CSV delimiter character for the inventory (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Delimiter to use for CSV output (defaults to the input delimiter)
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Character encoding of the inventory file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Render the result as an elastic table on stdout instead of writing a file
    #[arg(long = "table")]
    pub table: bool,
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Inventory CSV file to convert ('-' reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Destination JSON file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Schema dictionary; the built-in card layout is used when omitted
    #[arg(short = 's', long = "schema")]
    pub schema: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct FieldsArgs {
    /// Schema dictionary to list
    #[arg(short = 's', long = "schema", default_value = "dictionary.yaml")]
    pub schema: PathBuf,
}

#[derive(Debug, Args)]
pub struct ValuesArgs {
    /// Field whose distinct values are listed
    #[arg(short = 'f', long = "field")]
    pub field: String,
    /// Schema dictionary declaring the valid fields
    #[arg(short = 's', long = "schema", default_value = "dictionary.yaml")]
    pub schema: PathBuf,
    /// Inventory CSV file ('-' reads stdin)
    #[arg(short = 'i', long = "inventory", default_value = "inventory.csv")]
    pub inventory: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the inventory file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Maximum distinct values to display (0 = all)
    #[arg(long, default_value_t = 0)]
    pub limit: usize,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn resolve_defaults_match_conventional_file_names() {
        let cli = Cli::parse_from(["card-ledger", "resolve"]);
        let Commands::Resolve(args) = cli.command else {
            panic!("expected resolve command");
        };
        assert_eq!(args.schema, PathBuf::from("dictionary.yaml"));
        assert_eq!(args.inventory, PathBuf::from("inventory.csv"));
        assert_eq!(args.rules, PathBuf::from("rules.yaml"));
        assert_eq!(args.output, PathBuf::from("filtered_inventory.csv"));
        assert_eq!(args.stamp_mode, StampMode::Shared);
        assert!(args.format.is_none());
    }

    #[test]
    fn parse_delimiter_accepts_named_tokens() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter("pipe"), Ok(b'|'));
        assert_eq!(parse_delimiter(":"), Ok(b':'));
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("é").is_err());
    }
}
