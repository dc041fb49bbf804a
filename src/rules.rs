//! Ownership rules: parsing, validation and per-field predicates.
//!
//! A rules document is a YAML sequence such as
//!
//! ```yaml
//! - name: pikachu
//!   owned: 2
//!   searchStrategy: first
//! - name: charizard
//!   owned: 1
//!   searchStrategy: all
//!   fields:
//!     subtypes: EX
//! ```
//!
//! The whole list is validated before any matching happens; the first
//! malformed rule aborts the run with a [`RuleError`].

use std::{fmt, path::Path, str::FromStr};

use anyhow::{Context, Result};
use itertools::Itertools;
use thiserror::Error;

use crate::{
    data::Value,
    yaml_provider::{self, YamlValue},
};

pub const REQUIRED_KEYS: [&str; 3] = ["name", "owned", "searchStrategy"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchStrategy {
    First,
    Last,
    All,
}

impl SearchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchStrategy::First => "first",
            SearchStrategy::Last => "last",
            SearchStrategy::All => "all",
        }
    }

    /// Slices an ordered candidate set according to the strategy.
    pub fn select<T>(self, candidates: &[T]) -> &[T] {
        match self {
            SearchStrategy::First => &candidates[..candidates.len().min(1)],
            SearchStrategy::Last => &candidates[candidates.len().saturating_sub(1)..],
            SearchStrategy::All => candidates,
        }
    }
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SearchStrategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "first" => Ok(SearchStrategy::First),
            "last" => Ok(SearchStrategy::Last),
            "all" => Ok(SearchStrategy::All),
            other => Err(format!("'{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterCondition {
    /// Case-insensitive substring match on the cell's textual form.
    Contains { text: String, needle: String },
    /// Typed equality. A missing cell never matches, not even a `null`
    /// rule value.
    Equals(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub condition: FilterCondition,
}

impl FieldFilter {
    pub fn new(field: impl Into<String>, expected: Value) -> Self {
        let condition = match expected {
            Value::String(text) => FilterCondition::Contains {
                needle: text.to_lowercase(),
                text,
            },
            other => FilterCondition::Equals(other),
        };
        Self {
            field: field.into(),
            condition,
        }
    }

    pub fn matches(&self, cell: &Value) -> bool {
        match &self.condition {
            FilterCondition::Contains { needle, .. } => cell
                .textual_form()
                .is_some_and(|text| text.to_lowercase().contains(needle.as_str())),
            FilterCondition::Equals(expected) => !cell.is_missing() && cell == expected,
        }
    }
}

impl fmt::Display for FieldFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.condition {
            FilterCondition::Contains { text, .. } => write!(f, "{} ~ '{text}'", self.field),
            FilterCondition::Equals(value) => write!(f, "{} = {}", self.field, value.to_literal()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub name: String,
    pub owned: u64,
    pub search_strategy: SearchStrategy,
    pub fields: Vec<FieldFilter>,
}

impl Rule {
    pub fn new(name: impl Into<String>, owned: u64, search_strategy: SearchStrategy) -> Self {
        Self {
            name: name.into(),
            owned,
            search_strategy,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>, expected: Value) -> Self {
        self.fields.push(FieldFilter::new(field, expected));
        self
    }

    pub fn name_needle(&self) -> String {
        self.name.to_lowercase()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "name '{}' (owned {}, {})",
            self.name, self.owned, self.search_strategy
        )?;
        if !self.fields.is_empty() {
            write!(f, " where {}", self.fields.iter().join(" and "))?;
        }
        Ok(())
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuleError {
    #[error("rules document must be a sequence of rules, found {0}")]
    NotASequence(&'static str),
    #[error("rule #{index} must be a mapping, found {found}")]
    NotAMapping { index: usize, found: &'static str },
    #[error("rule #{index} is missing required key(s): {}", .missing.join(", "))]
    MissingKeys {
        index: usize,
        missing: Vec<&'static str>,
    },
    #[error("rule #{index}: 'name' must be a string, found {found}")]
    InvalidName { index: usize, found: String },
    #[error("rule #{index} ('{name}'): 'owned' must be a non-negative integer, found {found}")]
    InvalidOwned {
        index: usize,
        name: String,
        found: String,
    },
    #[error(
        "rule #{index} ('{name}'): 'searchStrategy' must be one of first, last, all; found {found}"
    )]
    InvalidStrategy {
        index: usize,
        name: String,
        found: String,
    },
    #[error("rule #{index} ('{name}'): 'fields' must be a mapping, found {found}")]
    InvalidFields {
        index: usize,
        name: String,
        found: &'static str,
    },
    #[error("rule #{index} ('{name}'): field filter '{field}' is invalid: {reason}")]
    InvalidFieldFilter {
        index: usize,
        name: String,
        field: String,
        reason: String,
    },
}

/// Validates a decoded rules document, returning rules in document order.
pub fn validate_rules(document: &YamlValue) -> Result<Vec<Rule>, RuleError> {
    let entries = document
        .as_sequence()
        .ok_or_else(|| RuleError::NotASequence(yaml_provider::describe(document)))?;
    entries
        .iter()
        .enumerate()
        .map(|(offset, entry)| validate_rule(offset + 1, entry))
        .collect()
}

fn validate_rule(index: usize, entry: &YamlValue) -> Result<Rule, RuleError> {
    let mapping = entry.as_mapping().ok_or_else(|| RuleError::NotAMapping {
        index,
        found: yaml_provider::describe(entry),
    })?;

    let missing = REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|key| !mapping.contains_key(*key))
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(RuleError::MissingKeys { index, missing });
    }

    let name = mapping
        .get("name")
        .and_then(YamlValue::as_str)
        .ok_or_else(|| RuleError::InvalidName {
            index,
            found: mapping
                .get("name")
                .map(yaml_provider::render_scalar)
                .unwrap_or_default(),
        })?
        .to_string();

    let owned_node = &mapping["owned"];
    let owned = owned_node
        .as_u64()
        .filter(|owned| i64::try_from(*owned).is_ok())
        .ok_or_else(|| RuleError::InvalidOwned {
            index,
            name: name.clone(),
            found: yaml_provider::render_scalar(owned_node),
        })?;

    let strategy_node = &mapping["searchStrategy"];
    let search_strategy = strategy_node
        .as_str()
        .ok_or_else(|| yaml_provider::render_scalar(strategy_node))
        .and_then(SearchStrategy::from_str)
        .map_err(|found| RuleError::InvalidStrategy {
            index,
            name: name.clone(),
            found,
        })?;

    let mut rule = Rule::new(name, owned, search_strategy);
    if let Some(fields_node) = mapping.get("fields") {
        let fields = fields_node
            .as_mapping()
            .ok_or_else(|| RuleError::InvalidFields {
                index,
                name: rule.name.clone(),
                found: yaml_provider::describe(fields_node),
            })?;
        for (key, expected) in fields {
            let field_error = |field: String, reason: String| RuleError::InvalidFieldFilter {
                index,
                name: rule.name.clone(),
                field,
                reason,
            };
            let field = key.as_str().ok_or_else(|| {
                field_error(
                    yaml_provider::render_scalar(key),
                    "field names must be strings".to_string(),
                )
            })?;
            let expected = Value::from_yaml(expected)
                .map_err(|err| field_error(field.to_string(), err.to_string()))?;
            rule.fields.push(FieldFilter::new(field, expected));
        }
    }
    Ok(rule)
}

pub fn parse_rules(text: &str) -> Result<Vec<Rule>> {
    let document = yaml_provider::provider().parse_str(text)?;
    Ok(validate_rules(&document)?)
}

pub fn load_rules(path: &Path) -> Result<Vec<Rule>> {
    let document = yaml_provider::load_document(path)?;
    validate_rules(&document).with_context(|| format!("Validating rules in {path:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(text: &str) -> Result<Vec<Rule>, RuleError> {
        let document: YamlValue = serde_yaml::from_str(text).expect("yaml");
        validate_rules(&document)
    }

    #[test]
    fn parses_rules_in_document_order() {
        let rules = validate(
            "- name: Pikachu\n  owned: 2\n  searchStrategy: first\n\
             - name: charizard\n  owned: 0\n  searchStrategy: all\n  fields:\n    subtypes: EX\n    hp: 120\n",
        )
        .unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0], Rule::new("Pikachu", 2, SearchStrategy::First));
        assert_eq!(
            rules[1],
            Rule::new("charizard", 0, SearchStrategy::All)
                .with_field("subtypes", Value::String("EX".into()))
                .with_field("hp", Value::Integer(120))
        );
        assert_eq!(rules[0].name_needle(), "pikachu");
    }

    #[test]
    fn reports_every_missing_key() {
        let err = validate("- name: Mew\n").unwrap_err();
        assert_eq!(
            err,
            RuleError::MissingKeys {
                index: 1,
                missing: vec!["owned", "searchStrategy"],
            }
        );
        assert_eq!(
            err.to_string(),
            "rule #1 is missing required key(s): owned, searchStrategy"
        );
    }

    #[test]
    fn rejects_invalid_owned_values() {
        for owned in ["-1", "1.5", "true", "'2'", "~"] {
            let text = format!("- name: Mew\n  owned: {owned}\n  searchStrategy: all\n");
            let err = validate(&text).unwrap_err();
            assert!(
                matches!(err, RuleError::InvalidOwned { index: 1, .. }),
                "owned {owned} gave {err:?}"
            );
        }
    }

    #[test]
    fn rejects_unknown_strategy() {
        let err = validate("- name: Mew\n  owned: 1\n  searchStrategy: First\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "rule #1 ('Mew'): 'searchStrategy' must be one of first, last, all; found 'First'"
        );
    }

    #[test]
    fn rejects_non_mapping_fields() {
        let err =
            validate("- name: Mew\n  owned: 1\n  searchStrategy: all\n  fields: [hp]\n").unwrap_err();
        assert!(matches!(
            err,
            RuleError::InvalidFields {
                found: "a sequence",
                ..
            }
        ));
    }

    #[test]
    fn first_invalid_rule_aborts_the_list() {
        let err = validate(
            "- name: Mew\n  owned: 1\n  searchStrategy: all\n\
             - name: Mewtwo\n  owned: 1\n  searchStrategy: sometimes\n\
             - owned: 1\n",
        )
        .unwrap_err();
        assert!(matches!(err, RuleError::InvalidStrategy { index: 2, .. }));
    }

    #[test]
    fn rejects_documents_that_are_not_rule_lists() {
        assert_eq!(
            validate("name: Mew\n").unwrap_err(),
            RuleError::NotASequence("a mapping")
        );
        assert_eq!(
            validate("- Mew\n").unwrap_err(),
            RuleError::NotAMapping {
                index: 1,
                found: "a string",
            }
        );
        assert!(validate("[]").unwrap().is_empty());
    }

    #[test]
    fn strategy_selects_expected_slice() {
        let candidates = ["r1", "r2", "r3"];
        assert_eq!(SearchStrategy::First.select(&candidates), &["r1"]);
        assert_eq!(SearchStrategy::Last.select(&candidates), &["r3"]);
        assert_eq!(SearchStrategy::All.select(&candidates), &candidates);
        let empty: [&str; 0] = [];
        assert!(SearchStrategy::Last.select(&empty).is_empty());
    }

    #[test]
    fn textual_filters_match_rendered_cells() {
        let filter = FieldFilter::new("subtypes", Value::String("ex".into()));
        assert!(filter.matches(&Value::List(vec![
            Value::String("Basic".into()),
            Value::String("EX".into()),
        ])));
        assert!(filter.matches(&Value::String("Flex".into())));
        assert!(!filter.matches(&Value::Missing));

        let typed = FieldFilter::new("hp", Value::Integer(60));
        assert!(typed.matches(&Value::Number(60.0)));
        assert!(!typed.matches(&Value::String("60".into())));
    }

    #[test]
    fn null_rule_value_never_matches_missing_cells() {
        let rules =
            validate("- name: pika\n  owned: 1\n  searchStrategy: all\n  fields:\n    hp: ~\n")
                .unwrap();
        let filter = &rules[0].fields[0];
        assert_eq!(filter.condition, FilterCondition::Equals(Value::Missing));
        assert!(!filter.matches(&Value::Missing));
        assert!(!filter.matches(&Value::Number(190.0)));
    }

    #[test]
    fn display_describes_rule() {
        let rule = Rule::new("charizard", 1, SearchStrategy::All)
            .with_field("subtypes", Value::String("EX".into()))
            .with_field("hp", Value::Integer(120));
        assert_eq!(
            rule.to_string(),
            "name 'charizard' (owned 1, all) where subtypes ~ 'EX' and hp = 120"
        );
    }
}
