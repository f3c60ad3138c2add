//! Bundle splitting
//!
//! Decides, for every external specifier a package imports, which bundles
//! carry it and in which mode. The split is a pure function of the import
//! records and the bundle configuration.

use crate::models::assignment::{
    Assignment, AssignmentKey, Carriage, Placement, SkipReason, SkippedSpecifier, SplitResult,
    UnresolvedImport,
};
use crate::models::bundle::BundleConfig;
use crate::models::import::{ImportRecord, ImportStyle};
use crate::models::package::{DependencyLookup, Package};
use crate::utils::specifier::split_package_specifier;
use glob::Pattern;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

/// How one bundle uses one specifier
#[derive(Debug, Default)]
struct BundleUsage {
    eager: bool,
    consumers: BTreeSet<String>,
}

impl BundleUsage {
    fn mode(&self) -> ImportStyle {
        if self.eager {
            ImportStyle::Eager
        } else {
            ImportStyle::Lazy
        }
    }
}

/// All references to one specifier from one package
struct Group {
    package: Arc<Package>,
    /// Keyed by bundle declaration order
    usage: BTreeMap<usize, BundleUsage>,
    first_reference: (String, usize),
}

pub struct Splitter<'a> {
    bundles: &'a BundleConfig,
    exclude: Vec<Pattern>,
}

impl<'a> Splitter<'a> {
    /// `exclude` applies to every package, on top of each package's own excludes
    pub fn new(bundles: &'a BundleConfig, exclude: Vec<Pattern>) -> Self {
        Self { bundles, exclude }
    }

    pub fn split(&self, records: &[ImportRecord]) -> SplitResult {
        let mut result = SplitResult::default();

        for (key, group) in self.group(records) {
            if self.is_excluded(&group.package, &key.specifier) {
                debug!(specifier = %key.specifier, package = %key.package, "excluded");
                result.skipped.push(SkippedSpecifier {
                    specifier: key.specifier.clone(),
                    package: key.package.name.clone(),
                    reason: SkipReason::Excluded,
                });
                continue;
            }

            let target = group.package.apply_alias(&key.specifier);
            let (name, subpath) = split_package_specifier(&target);

            let reason = match group.package.context().dependency(&name) {
                DependencyLookup::Found(dep) if dep.host_managed => {
                    debug!(specifier = %key.specifier, package = %key.package, "left to the host");
                    result.skipped.push(SkippedSpecifier {
                        specifier: key.specifier.clone(),
                        package: key.package.name.clone(),
                        reason: SkipReason::HostManaged,
                    });
                    continue;
                }
                DependencyLookup::Found(dep) => {
                    let placements = self.place(&group.usage);
                    let (file, line) = &group.first_reference;
                    let assignment = Assignment {
                        key: key.clone(),
                        target,
                        dependency: dep.clone(),
                        subpath,
                        placements,
                        origin: format!("{}:{}", file, line),
                        package: group.package.clone(),
                    };
                    result.assignments.insert(key, assignment);
                    continue;
                }
                DependencyLookup::NotInstalled => format!(
                    "'{}' is a dependency of '{}' but is not installed",
                    name, key.package.name
                ),
                DependencyLookup::Undeclared => format!(
                    "'{}' is not listed in the dependencies of '{}'",
                    name, key.package.name
                ),
            };

            let (file, line) = &group.first_reference;
            result.unresolved.push(UnresolvedImport {
                specifier: key.specifier.clone(),
                consuming_file: format!("{}:{}", file, line),
                package: key.package.name.clone(),
                bundles: self.bundle_names(group.usage.keys().copied()),
                reason,
            });
        }

        result
    }

    fn group(&self, records: &[ImportRecord]) -> BTreeMap<AssignmentKey, Group> {
        let mut groups: BTreeMap<AssignmentKey, Group> = BTreeMap::new();

        for record in records {
            let key = AssignmentKey {
                specifier: record.specifier.clone(),
                package: record.package.id().clone(),
            };
            let reference = (record.consuming_file.clone(), record.line);
            let group = groups.entry(key).or_insert_with(|| Group {
                package: record.package.clone(),
                usage: BTreeMap::new(),
                first_reference: reference.clone(),
            });
            if reference < group.first_reference {
                group.first_reference = reference;
            }

            let bundle = self.bundles.bundle_for_path(&record.consuming_file);
            let usage = group.usage.entry(bundle.order).or_default();
            usage.eager |= record.style == ImportStyle::Eager;
            usage.consumers.insert(record.consuming_file.clone());
        }

        groups
    }

    fn is_excluded(&self, package: &Package, specifier: &str) -> bool {
        if package.is_excluded(specifier) {
            return true;
        }
        let (name, _) = split_package_specifier(specifier);
        self.exclude
            .iter()
            .any(|pattern| pattern.matches(specifier) || pattern.matches(&name))
    }

    /// Placements for one group, in bundle declaration order
    ///
    /// Each referencing bundle carries its own copy unless an ancestor on its
    /// base chain also references the specifier; then the furthest such
    /// ancestor carries it for both.
    fn place(&self, usage: &BTreeMap<usize, BundleUsage>) -> Vec<Placement> {
        let carrier_of: BTreeMap<usize, Option<usize>> = usage
            .keys()
            .map(|&order| {
                let carrier = self
                    .bundles
                    .base_chain(order)
                    .into_iter()
                    .filter(|ancestor| usage.contains_key(ancestor))
                    .last();
                (order, carrier)
            })
            .collect();

        let mut eager_for: BTreeSet<usize> = BTreeSet::new();
        for (&order, carrier) in &carrier_of {
            if usage[&order].eager {
                eager_for.insert(carrier.unwrap_or(order));
            }
        }

        usage
            .iter()
            .map(|(&order, bundle_usage)| {
                let carriage = match carrier_of[&order] {
                    Some(carrier) => Carriage::Shared {
                        carrier: self.bundle_name(carrier),
                    },
                    None if eager_for.contains(&order) => Carriage::Carried(ImportStyle::Eager),
                    None => Carriage::Carried(bundle_usage.mode()),
                };
                Placement {
                    bundle: self.bundle_name(order),
                    carriage,
                    consumers: bundle_usage.consumers.iter().cloned().collect(),
                }
            })
            .collect()
    }

    fn bundle_name(&self, order: usize) -> String {
        self.bundles
            .by_order(order)
            .map(|b| b.name.clone())
            .unwrap_or_default()
    }

    fn bundle_names(&self, orders: impl Iterator<Item = usize>) -> Vec<String> {
        orders.map(|order| self.bundle_name(order)).collect()
    }
}
