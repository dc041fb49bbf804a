use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};

pub use serde_yaml::Value as YamlValue;

pub trait YamlProvider: Send + Sync {
    fn parse_str(&self, input: &str) -> Result<YamlValue>;
}

struct SerdeYamlProvider;

impl YamlProvider for SerdeYamlProvider {
    fn parse_str(&self, input: &str) -> Result<YamlValue> {
        Ok(serde_yaml::from_str(input)?)
    }
}

static YAML_PROVIDER: OnceLock<Box<dyn YamlProvider>> = OnceLock::new();

pub fn provider() -> &'static dyn YamlProvider {
    YAML_PROVIDER
        .get_or_init(|| Box::new(SerdeYamlProvider))
        .as_ref()
}

/// Reads and decodes a YAML document (schema dictionary or rule list).
pub fn load_document(path: &Path) -> Result<YamlValue> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("Opening YAML file {path:?}"))?;
    provider()
        .parse_str(&raw)
        .with_context(|| format!("Parsing YAML file {path:?}"))
}

/// Short human description of a node, used in validation messages.
pub fn describe(value: &YamlValue) -> &'static str {
    match value {
        YamlValue::Null => "null",
        YamlValue::Bool(_) => "a boolean",
        YamlValue::Number(_) => "a number",
        YamlValue::String(_) => "a string",
        YamlValue::Sequence(_) => "a sequence",
        YamlValue::Mapping(_) => "a mapping",
        YamlValue::Tagged(_) => "a tagged value",
    }
}

/// Scalar rendering for error messages: `-1`, `'often'`, `a sequence`.
pub fn render_scalar(value: &YamlValue) -> String {
    match value {
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Number(n) => n.to_string(),
        YamlValue::String(s) => format!("'{s}'"),
        other => describe(other).to_string(),
    }
}
