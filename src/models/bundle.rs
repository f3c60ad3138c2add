//! Bundle configuration
//!
//! Bundles are declared once per build and never change during it. Each
//! consuming file is mapped to exactly one bundle by [`BundleConfig::bundle_for_path`].

use crate::error::{AutoImportError, Result};
use glob::{MatchOptions, Pattern};
use indexmap::IndexMap;
use petgraph::graph::DiGraph;
use serde::{Deserialize, Serialize};

/// `*` stays inside one path segment; `**` crosses segments
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Bundle declaration as written in configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleSpec {
    pub name: String,
    /// Ordered glob patterns over namespaced module paths
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Output file the eager payload is appended to
    pub entrypoint: String,
    /// Bundle this one always loads after; shared dependencies are carried there
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    /// Catches every path no other bundle claims
    #[serde(default)]
    pub default: bool,
}

impl BundleSpec {
    pub fn new(name: impl Into<String>, patterns: &[&str], entrypoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            entrypoint: entrypoint.into(),
            base: None,
            default: false,
        }
    }

    pub fn as_default(mut self) -> Self {
        self.default = true;
        self
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }
}

/// The two bundles every classic app has: the app itself and its test suite
pub fn default_bundle_specs() -> Vec<BundleSpec> {
    vec![
        BundleSpec::new("app", &["**"], "assets/vendor.js").as_default(),
        BundleSpec::new(
            "tests",
            &["*/tests/**", "*/test-support/**"],
            "assets/test-support.js",
        ),
    ]
}

/// Pattern specificity: (literal path segments, literal characters)
pub type Specificity = (usize, usize);

/// Compute how specific a glob pattern is; `**` is the least specific
pub fn pattern_specificity(pattern: &str) -> Specificity {
    let segments = pattern
        .split('/')
        .filter(|segment| !segment.is_empty() && !segment.contains(['*', '?', '[']))
        .count();

    let mut literal_chars = 0;
    let mut in_class = false;
    for c in pattern.chars() {
        match c {
            '[' => in_class = true,
            ']' if in_class => in_class = false,
            '*' | '?' => {}
            _ if in_class => {}
            _ => literal_chars += 1,
        }
    }

    (segments, literal_chars)
}

/// A validated bundle
#[derive(Debug, Clone)]
pub struct Bundle {
    pub name: String,
    pub entrypoint: String,
    pub base: Option<String>,
    pub is_default: bool,
    /// Declaration index
    pub order: usize,
    patterns: Vec<(Pattern, Specificity)>,
}

impl Bundle {
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|(p, _)| p.as_str())
    }

    /// Best specificity among this bundle's patterns that match `path`
    fn best_match(&self, path: &str) -> Option<Specificity> {
        self.patterns
            .iter()
            .filter(|(pattern, _)| pattern.matches_with(path, MATCH_OPTIONS))
            .map(|(_, specificity)| *specificity)
            .max()
    }
}

/// The fixed set of bundles for a build
#[derive(Debug, Clone)]
pub struct BundleConfig {
    bundles: IndexMap<String, Bundle>,
    default_index: usize,
}

impl BundleConfig {
    /// Validate bundle declarations
    ///
    /// Fails with a configuration error on duplicate names, bad globs, a
    /// missing or ambiguous default bundle, unknown bases or base cycles.
    pub fn from_specs(specs: &[BundleSpec]) -> Result<Self> {
        if specs.is_empty() {
            return Err(AutoImportError::config_error("at least one bundle must be declared"));
        }

        let mut bundles = IndexMap::new();
        for (order, spec) in specs.iter().enumerate() {
            if spec.name.trim().is_empty() {
                return Err(AutoImportError::config_error("bundle names must not be empty"));
            }
            if spec.entrypoint.trim().is_empty() {
                return Err(AutoImportError::config_error(format!(
                    "bundle '{}' has no entrypoint",
                    spec.name
                )));
            }

            let mut patterns = Vec::with_capacity(spec.patterns.len());
            for raw in &spec.patterns {
                let pattern = Pattern::new(raw).map_err(|e| {
                    AutoImportError::config_error(format!(
                        "bundle '{}' has invalid pattern '{}': {}",
                        spec.name, raw, e
                    ))
                })?;
                patterns.push((pattern, pattern_specificity(raw)));
            }

            let bundle = Bundle {
                name: spec.name.clone(),
                entrypoint: spec.entrypoint.clone(),
                base: spec.base.clone(),
                is_default: spec.default,
                order,
                patterns,
            };
            if bundles.insert(spec.name.clone(), bundle).is_some() {
                return Err(AutoImportError::config_error(format!(
                    "bundle '{}' is declared more than once",
                    spec.name
                )));
            }
        }

        let default_index = Self::find_default(&bundles)?;
        if let Some(bundle) = bundles.get_index_mut(default_index).map(|(_, b)| b) {
            bundle.is_default = true;
        }

        Self::validate_bases(&bundles)?;

        Ok(Self {
            bundles,
            default_index,
        })
    }

    fn find_default(bundles: &IndexMap<String, Bundle>) -> Result<usize> {
        let flagged: Vec<usize> = bundles
            .values()
            .filter(|b| b.is_default)
            .map(|b| b.order)
            .collect();

        match flagged.as_slice() {
            [index] => Ok(*index),
            [] => bundles
                .values()
                .find(|b| b.patterns().any(|p| p == "**"))
                .map(|b| b.order)
                .ok_or_else(|| {
                    AutoImportError::config_error(
                        "no default bundle: flag one bundle with `default = true` or give it a `**` pattern",
                    )
                }),
            _ => Err(AutoImportError::config_error(format!(
                "only one bundle may be the default, found {}",
                flagged.len()
            ))),
        }
    }

    fn validate_bases(bundles: &IndexMap<String, Bundle>) -> Result<()> {
        let mut graph = DiGraph::<usize, ()>::new();
        let nodes: Vec<_> = (0..bundles.len()).map(|i| graph.add_node(i)).collect();

        for bundle in bundles.values() {
            let Some(base) = &bundle.base else { continue };
            let Some(base_index) = bundles.get_index_of(base) else {
                return Err(AutoImportError::config_error(format!(
                    "bundle '{}' names unknown base bundle '{}'",
                    bundle.name, base
                )));
            };
            graph.add_edge(nodes[bundle.order], nodes[base_index], ());
        }

        if petgraph::algo::is_cyclic_directed(&graph) {
            return Err(AutoImportError::config_error(
                "bundle base chain contains a cycle",
            ));
        }
        Ok(())
    }

    /// Map a consuming module path to its bundle
    ///
    /// The most specific matching pattern wins; equal specificity falls back
    /// to declaration order. Paths nothing matches go to the default bundle.
    pub fn bundle_for_path(&self, path: &str) -> &Bundle {
        let mut best: Option<(Specificity, &Bundle)> = None;
        for bundle in self.bundles.values() {
            if let Some(specificity) = bundle.best_match(path) {
                match best {
                    Some((current, _)) if current >= specificity => {}
                    _ => best = Some((specificity, bundle)),
                }
            }
        }

        best.map(|(_, bundle)| bundle).unwrap_or_else(|| self.default_bundle())
    }

    pub fn default_bundle(&self) -> &Bundle {
        &self.bundles[self.default_index]
    }

    pub fn get(&self, name: &str) -> Option<&Bundle> {
        self.bundles.get(name)
    }

    pub fn by_order(&self, order: usize) -> Option<&Bundle> {
        self.bundles.get_index(order).map(|(_, b)| b)
    }

    /// Bundles in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Bundle> {
        self.bundles.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bundles.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    /// Declaration indices along the base chain of `order`, starting with its direct base
    pub fn base_chain(&self, order: usize) -> Vec<usize> {
        let mut chain = Vec::new();
        let mut current = self.by_order(order).and_then(|b| b.base.as_deref());
        while let Some(name) = current {
            let Some(index) = self.bundles.get_index_of(name) else { break };
            chain.push(index);
            current = self.bundles[index].base.as_deref();
        }
        chain
    }
}
