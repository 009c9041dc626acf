//! Selector configuration: which cuts (in which order) and which
//! categorization schemes a job uses.
//!
//! Names are resolved once, when the [`Selector`] is built. Anything that
//! does not resolve is a construction error, so a typo in a cut name fails
//! the job at startup instead of silently producing an empty cutflow.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use ns_core::{Error, EventRecord, Result};
use serde::{Deserialize, Serialize};

use crate::category::SchemeRegistry;
use crate::cut::CutRegistry;
use crate::expr::CompiledExpr;
use crate::selector::Selector;

/// Name of the built-in aggregate: AND of every atomic cut.
pub const ALL_CUTS: &str = "allCuts";

/// A scheme defined by descending thresholds on an expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThresholdScheme {
    /// Expression giving the value to split on (e.g. `"metref_final"`).
    pub variable: String,
    /// Strictly decreasing thresholds; `n` thresholds give `n + 1` categories.
    pub thresholds: Vec<f64>,
}

/// Cut list and scheme sizes for one selector.
///
/// ```yaml
/// cut_names: [photonPt, diphotonMass, highMass, allCuts]
/// scheme_sizes: { inclusive: 1, splitETMiss: 2 }
/// cut_expressions: { highMass: "m_yy > 120" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelectorConfig {
    /// Cut names in cutflow order.
    pub cut_names: Vec<String>,

    /// Scheme name → declared category count.
    #[serde(default)]
    pub scheme_sizes: BTreeMap<String, usize>,

    /// Cuts defined by an expression over event fields.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub cut_expressions: BTreeMap<String, String>,

    /// Aggregate cuts over a subset of atomic cuts listed earlier.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub aggregates: BTreeMap<String, Vec<String>>,

    /// Schemes defined by thresholds on an expression.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scheme_thresholds: BTreeMap<String, ThresholdScheme>,
}

impl SelectorConfig {
    /// Read a config file: `.json` is parsed as JSON, anything else as YAML.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("").to_ascii_lowercase();
        let cfg = if ext == "json" {
            serde_json::from_slice(&bytes)?
        } else {
            serde_yaml_ng::from_slice(&bytes)?
        };
        Ok(cfg)
    }

    /// Parse a YAML (or JSON) document.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(text)?)
    }

    /// Build a selector, resolving names against `catalog` where the
    /// config itself does not define them.
    pub fn build<E>(&self, catalog: &Catalog<E>) -> Result<Selector<E>>
    where
        E: EventRecord + 'static,
    {
        Ok(Selector::new(self.build_cuts(catalog)?, self.build_schemes(catalog)?))
    }

    fn build_cuts<E>(&self, catalog: &Catalog<E>) -> Result<CutRegistry<E>>
    where
        E: EventRecord + 'static,
    {
        if self.cut_names.is_empty() {
            return Err(Error::Validation("config declares no cuts".into()));
        }
        let mut cuts = CutRegistry::new();
        for name in &self.cut_names {
            if let Some(text) = self.cut_expressions.get(name) {
                let expr = CompiledExpr::compile(text)
                    .map_err(|e| Error::Expression(format!("cut '{name}': {e}")))?;
                cuts.add_atomic(name, move |ev: &E| expr.passes(ev))?;
            } else if let Some(members) = self.aggregates.get(name) {
                let members: Vec<&str> = members.iter().map(String::as_str).collect();
                cuts.add_aggregate(name, &members)?;
            } else if let Some(predicate) = catalog.cut(name) {
                cuts.add_atomic(name, predicate)?;
            } else if name == ALL_CUTS {
                cuts.add_all_cuts(name)?;
            } else {
                return Err(Error::Validation(format!("cut '{name}' is not defined")));
            }
        }
        let listed: BTreeSet<&String> = self.cut_names.iter().collect();
        for extra in self.cut_expressions.keys().chain(self.aggregates.keys()) {
            if !listed.contains(extra) {
                return Err(Error::Validation(format!(
                    "cut '{extra}' is defined but missing from cut_names"
                )));
            }
        }
        log::debug!("Selector config: cuts = {:?}", self.cut_names);
        Ok(cuts)
    }

    fn build_schemes<E>(&self, catalog: &Catalog<E>) -> Result<SchemeRegistry<E>>
    where
        E: EventRecord + 'static,
    {
        let mut schemes = SchemeRegistry::new();
        for (name, &size) in &self.scheme_sizes {
            let declared = if let Some(def) = self.scheme_thresholds.get(name) {
                let expr = CompiledExpr::compile(&def.variable)
                    .map_err(|e| Error::Expression(format!("scheme '{name}': {e}")))?;
                let id =
                    schemes.add_thresholds(name, &def.thresholds, move |ev: &E| expr.eval(ev))?;
                schemes.get(id).n_categories()
            } else if let Some((n, classifier)) = catalog.scheme(name) {
                schemes.add(name, n, classifier)?;
                n
            } else {
                return Err(Error::Validation(format!("category scheme '{name}' is not defined")));
            };
            if declared != size {
                return Err(Error::Validation(format!(
                    "category scheme '{name}' has {declared} categories but the config declares {size}"
                )));
            }
        }
        for extra in self.scheme_thresholds.keys() {
            if !self.scheme_sizes.contains_key(extra) {
                return Err(Error::Validation(format!(
                    "category scheme '{extra}' is defined but missing from scheme_sizes"
                )));
            }
        }
        Ok(schemes)
    }
}

/// Cuts and schemes an analysis provides in code, looked up by name when a
/// config is built.
pub struct Catalog<E> {
    cuts: Vec<(&'static str, fn(&E) -> bool)>,
    schemes: Vec<(&'static str, usize, fn(&E) -> Option<usize>)>,
}

impl<E> Catalog<E> {
    /// An empty catalog (only config-defined cuts and schemes resolve).
    pub fn new() -> Self {
        Self { cuts: Vec::new(), schemes: Vec::new() }
    }

    /// Add a named cut.
    pub fn with_cut(mut self, name: &'static str, predicate: fn(&E) -> bool) -> Self {
        self.cuts.push((name, predicate));
        self
    }

    /// Add a named scheme with its category count.
    pub fn with_scheme(
        mut self,
        name: &'static str,
        n_categories: usize,
        classifier: fn(&E) -> Option<usize>,
    ) -> Self {
        self.schemes.push((name, n_categories, classifier));
        self
    }

    /// Look up a cut predicate.
    pub fn cut(&self, name: &str) -> Option<fn(&E) -> bool> {
        self.cuts.iter().find(|(n, _)| *n == name).map(|&(_, f)| f)
    }

    /// Look up a scheme's size and classifier.
    pub fn scheme(&self, name: &str) -> Option<(usize, fn(&E) -> Option<usize>)> {
        self.schemes.iter().find(|(n, _, _)| *n == name).map(|&(_, n, f)| (n, f))
    }

    /// Names of the catalog cuts, in the order they were added.
    pub fn cut_names(&self) -> Vec<&'static str> {
        self.cuts.iter().map(|(n, _)| *n).collect()
    }

    /// Names of the catalog schemes, in the order they were added.
    pub fn scheme_names(&self) -> Vec<&'static str> {
        self.schemes.iter().map(|(n, _, _)| *n).collect()
    }
}

impl<E> Default for Catalog<E> {
    fn default() -> Self {
        Self::new()
    }
}
