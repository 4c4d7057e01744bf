//! Configuration file support.
//!
//! Read from `~/.config/portage/config.toml` (or the path in the
//! `PORTAGE_CONFIG` environment variable). Carries CLI defaults and
//! cost-table overrides applied before the graph is built.

use std::path::PathBuf;

use portage::FormatGraph;
use serde::Deserialize;

/// Main configuration structure.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default CLI options.
    pub defaults: Defaults,
    /// Cost-table overrides.
    pub costs: Costs,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// Format cache file to use when `--cache` is not given.
    pub cache: Option<PathBuf>,
    /// Accept any terminal handler by default.
    pub simple: bool,
    /// Penalize every category shift instead of the best applicable one.
    pub strict_categories: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Costs {
    pub change: Vec<ChangeOverride>,
    pub adaptive: Vec<AdaptiveOverride>,
}

/// ```toml
/// [[costs.change]]
/// from = "image"
/// to = "audio"
/// handler = "ffmpeg"   # optional
/// cost = 100.0
/// ```
#[derive(Debug, Deserialize)]
pub struct ChangeOverride {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub handler: Option<String>,
    pub cost: f64,
}

/// ```toml
/// [[costs.adaptive]]
/// categories = ["text", "image", "audio"]
/// cost = 15.0
/// ```
#[derive(Debug, Deserialize)]
pub struct AdaptiveOverride {
    pub categories: Vec<String>,
    pub cost: f64,
}

impl Config {
    /// Load from `PORTAGE_CONFIG` or the default location.
    pub fn load() -> Self {
        let path = std::env::var_os("PORTAGE_CONFIG")
            .map(PathBuf::from)
            .or_else(Self::default_path);
        Self::load_from_path(path)
    }

    /// Load from a specific path, falling back to defaults on any error.
    pub fn load_from_path(path: Option<PathBuf>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// The default config file path.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("portage").join("config.toml"))
    }

    /// Apply cost overrides to a graph. Callers rebuild afterwards.
    pub fn apply_costs(&self, graph: &mut FormatGraph) {
        for entry in &self.costs.change {
            graph.add_category_change_cost(
                &entry.from,
                &entry.to,
                entry.handler.as_deref(),
                entry.cost,
            );
        }
        for entry in &self.costs.adaptive {
            let categories: Vec<&str> = entry.categories.iter().map(String::as_str).collect();
            graph.add_category_adaptive_cost(&categories, entry.cost);
        }
    }
}
