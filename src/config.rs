//! Configured GST slabs, category defaults and limits.
//!
//! Loaded from a JSON file given with `--config`; any field left out falls
//! back to the built-in values.

use crate::core::{SlabTable, TaxEngine, TaxSlab, MAX_PARTICIPANTS};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Settings {
    /// Allowed GST rates, in display order
    #[serde(default = "default_slabs")]
    pub slabs: Vec<TaxSlab>,

    /// Category name -> suggested GST rate
    #[serde(default = "default_category_defaults")]
    #[schemars(with = "BTreeMap<String, f64>")]
    pub category_defaults: BTreeMap<String, Decimal>,

    /// Largest group a bill can be split between
    #[serde(default = "default_max_participants")]
    pub max_participants: u32,

    /// Parser confidence below which a field is flagged
    #[serde(default = "default_low_confidence_threshold")]
    pub low_confidence_threshold: f64,
}

fn default_slabs() -> Vec<TaxSlab> {
    [dec!(0), dec!(5), dec!(18), dec!(40)]
        .into_iter()
        .map(TaxSlab::new)
        .collect()
}

fn default_category_defaults() -> BTreeMap<String, Decimal> {
    [
        ("Food Delivery", dec!(18)),
        ("Groceries", dec!(5)),
        ("Shopping", dec!(5)),
        ("Transport", dec!(18)),
        ("Entertainment", dec!(18)),
        ("Bills & Utilities", dec!(18)),
        ("Others", dec!(18)),
    ]
    .into_iter()
    .map(|(name, rate)| (name.to_string(), rate))
    .collect()
}

fn default_max_participants() -> u32 {
    MAX_PARTICIPANTS
}

fn default_low_confidence_threshold() -> f64 {
    0.6
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            slabs: default_slabs(),
            category_defaults: default_category_defaults(),
            max_participants: default_max_participants(),
            low_confidence_threshold: default_low_confidence_threshold(),
        }
    }
}

impl Settings {
    /// Load from `path`, or the built-in settings when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Settings> {
        let settings = match path {
            Some(path) => {
                let file = File::open(path)
                    .map_err(|e| anyhow::anyhow!("failed to open config {}: {}", path.display(), e))?;
                let settings: Settings = serde_json::from_reader(BufReader::new(file))?;
                log::info!("Loaded config from {}", path.display());
                settings
            }
            None => Settings::default(),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json(json: &str) -> anyhow::Result<Settings> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.slabs.is_empty() {
            anyhow::bail!("config must define at least one GST slab");
        }
        let mut seen = HashSet::new();
        for slab in &self.slabs {
            if slab.rate < Decimal::ZERO || slab.rate > dec!(100) {
                anyhow::bail!("slab rate {} must be between 0 and 100", slab.rate);
            }
            if !seen.insert(slab.rate.normalize()) {
                anyhow::bail!("slab rate {} is listed more than once", slab.rate);
            }
        }
        for (category, rate) in &self.category_defaults {
            if !seen.contains(&rate.normalize()) {
                anyhow::bail!(
                    "default rate {} for category '{}' is not a configured slab",
                    rate,
                    category
                );
            }
        }
        if self.max_participants == 0 {
            anyhow::bail!("max_participants must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.low_confidence_threshold) {
            anyhow::bail!("low_confidence_threshold must be between 0 and 1");
        }
        Ok(())
    }

    pub fn slab_table(&self) -> SlabTable {
        SlabTable::new(self.slabs.clone()).with_category_defaults(self.category_defaults.clone())
    }

    pub fn engine(&self) -> TaxEngine {
        TaxEngine::new(self.slab_table())
    }
}
