//! Repair run configuration (spec §6), built fluently like the rest of
//! this crate's operators and deserializable from TOML for file-based
//! setups.

use std::collections::HashMap;
use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::{RepairError, Result};
use crate::operators::{OpKind, ALL_KINDS};
use crate::stmt::DEFAULT_EXCLUDES;

#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
#[builder(build_fn(validate = "Self::validate", error = "RepairError"))]
pub struct Config {
    pub source: PathBuf,

    #[builder(default = "50")]
    pub population_size: usize,

    #[builder(default = "10")]
    pub max_generations: usize,

    #[builder(default = "0.06")]
    pub mutation_rate: f64,

    #[builder(default = "1.0")]
    pub w_pos: f64,

    #[builder(default = "10.0")]
    pub w_neg: f64,

    #[builder(default = "4")]
    pub workers: usize,

    #[builder(default = "false")]
    pub is_system_test: bool,

    #[builder(default = "false")]
    pub line_mode: bool,

    #[builder(default = "default_excludes()")]
    pub excludes: Vec<String>,

    #[builder(default = "3")]
    pub k_depth: usize,

    #[builder(default = "1800")]
    pub timeout_per_candidate_s: u64,

    #[builder(default = "0")]
    pub seed: u64,

    #[builder(default = "false")]
    pub raise_on_failure: bool,

    #[builder(default = "true")]
    pub rename_single_variable: bool,

    /// Per-operator-kind sampling weight, keyed by [`OpKind::name`] (a
    /// string so the map survives a TOML/JSON round trip). A kind absent
    /// from the map is weighted `1.0`. See [`Config::operator_kind_weights`].
    #[builder(default = "HashMap::new()")]
    pub operator_weights: HashMap<String, f64>,
}

fn default_excludes() -> Vec<String> {
    DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect()
}

impl ConfigBuilder {
    fn validate(&self) -> std::result::Result<(), RepairError> {
        if self.source.is_none() {
            return Err(RepairError::ConfigurationInvalid("source path is required".into()));
        }
        if let Some(size) = self.population_size {
            if size == 0 {
                return Err(RepairError::ConfigurationInvalid("population_size must be positive".into()));
            }
        }
        if let Some(rate) = self.mutation_rate {
            if !(0.0..=1.0).contains(&rate) {
                return Err(RepairError::ConfigurationInvalid("mutation_rate must be in [0, 1]".into()));
            }
        }
        if let Some(workers) = self.workers {
            if workers == 0 {
                return Err(RepairError::ConfigurationInvalid("workers must be positive".into()));
            }
        }
        Ok(())
    }
}

impl From<derive_builder::UninitializedFieldError> for RepairError {
    fn from(e: derive_builder::UninitializedFieldError) -> Self {
        RepairError::ConfigurationInvalid(e.to_string())
    }
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Config> {
        toml::from_str(text).map_err(|e| RepairError::ConfigurationInvalid(e.to_string()))
    }

    /// Parses a JSON-encoded configuration, for callers embedding this
    /// crate in a JSON-first toolchain rather than a TOML-first one.
    pub fn from_json(text: &str) -> Result<Config> {
        serde_json::from_str(text).map_err(|e| RepairError::ConfigurationInvalid(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| RepairError::ConfigurationInvalid(e.to_string()))
    }

    /// Resolves the string-keyed `operator_weights` map into `OpKind`s,
    /// silently skipping any name that doesn't match a known operator.
    pub fn operator_kind_weights(&self) -> HashMap<OpKind, f64> {
        self.operator_weights
            .iter()
            .filter_map(|(name, weight)| OpKind::from_name(name).map(|kind| (kind, *weight)))
            .collect()
    }

    /// The operator universe this config selects: every kind, minus
    /// `Rename` when `rename_single_variable` is turned off.
    pub fn operator_kinds(&self) -> Vec<OpKind> {
        ALL_KINDS.iter().copied().filter(|kind| self.rename_single_variable || *kind != OpKind::Rename).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_rejects_missing_source() {
        let result = ConfigBuilder::default().population_size(10).build();
        assert!(result.is_err());
    }

    #[test]
    fn builder_rejects_out_of_range_mutation_rate() {
        let result = ConfigBuilder::default().source(PathBuf::from("x.mini")).mutation_rate(1.5).build();
        assert!(result.is_err());
    }

    #[test]
    fn from_toml_fills_in_defaults() {
        let config = Config::from_toml(r#"source = "program.mini""#).unwrap();
        assert_eq!(config.population_size, 50);
        assert_eq!(config.w_neg, 10.0);
    }

    #[test]
    fn json_round_trips_through_to_json_and_from_json() {
        let config = ConfigBuilder::default().source(PathBuf::from("program.mini")).build().unwrap();
        let json = config.to_json().unwrap();
        let reloaded = Config::from_json(&json).unwrap();
        assert_eq!(reloaded.source, config.source);
        assert_eq!(reloaded.population_size, config.population_size);
    }

    #[test]
    fn operator_kinds_drops_rename_when_disabled() {
        let config = ConfigBuilder::default()
            .source(PathBuf::from("program.mini"))
            .rename_single_variable(false)
            .build()
            .unwrap();
        assert!(!config.operator_kinds().contains(&OpKind::Rename));

        let with_rename =
            ConfigBuilder::default().source(PathBuf::from("program.mini")).build().unwrap();
        assert!(with_rename.operator_kinds().contains(&OpKind::Rename));
    }

    #[test]
    fn operator_kind_weights_resolves_known_names_and_skips_unknown_ones() {
        let mut weights = HashMap::new();
        weights.insert("Delete".to_string(), 2.0);
        weights.insert("not-a-real-kind".to_string(), 5.0);
        let config = ConfigBuilder::default()
            .source(PathBuf::from("program.mini"))
            .operator_weights(weights)
            .build()
            .unwrap();
        let resolved = config.operator_kind_weights();
        assert_eq!(resolved.get(&OpKind::Delete), Some(&2.0));
        assert_eq!(resolved.len(), 1);
    }
}
