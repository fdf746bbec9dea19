//! Engine configuration (tolerances and protocol switches).
//!
//! Defaults reproduce the reference protocol: relation atoms are named
//! `topology`, propagation only materializes shapes, and the full check runs
//! on total assignments.

use serde::Deserialize;

/// What `propagate` does beyond materializing shapes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropagateCheck {
    /// Evaluate terms and relations only; never report conflicts.
    #[default]
    Simple,
    /// Run the full two-phase check on every propagation.
    Partial,
}

/// Tolerances for relation classification.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct TopologyCfg {
    /// Relative area below which a boolean result counts as empty.
    pub area_eps: f64,
}

impl Default for TopologyCfg {
    fn default() -> Self {
        Self { area_eps: 1e-9 }
    }
}

/// Engine configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct EngineCfg {
    /// Predicate names of symbolic atoms registered as relation atoms `name(label, x, y)`.
    pub relation_names: Vec<String>,
    pub propagate_check: PropagateCheck,
    pub topology: TopologyCfg,
}

impl Default for EngineCfg {
    fn default() -> Self {
        Self {
            relation_names: vec!["topology".to_string()],
            propagate_check: PropagateCheck::Simple,
            topology: TopologyCfg::default(),
        }
    }
}

impl EngineCfg {
    #[inline]
    pub fn is_relation_name(&self, name: &str) -> bool {
        self.relation_names.iter().any(|n| n == name)
    }
}
