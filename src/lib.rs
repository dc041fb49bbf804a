pub mod cli;
pub mod coerce;
pub mod convert;
pub mod data;
pub mod inventory;
pub mod io_utils;
pub mod literal;
pub mod output;
pub mod resolve;
pub mod rules;
pub mod schema;
pub mod summary;
pub mod table;
pub mod yaml_provider;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("card_ledger", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Resolve(args) => resolve::execute(&args),
        Commands::Convert(args) => convert::execute(&args),
        Commands::Fields(args) => summary::execute_fields(&args),
        Commands::Values(args) => summary::execute_values(&args),
    }
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}
