//! Reconciler.
//!
//! Computes the change-set between the declared jobs file and the live
//! state reported by the API. Fetching the live state is the caller's
//! problem; this module operates on two already-materialized collections
//! and performs no I/O.

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::equivalence::is_equivalent;
use crate::model::{DesiredJobSpec, LiveJobRecord};

/// The outcome of one reconciliation pass: three disjoint sets of job
/// names. A job in `modify` must be deleted and recreated, since the
/// platform does not support in-place updates.
///
/// Built fresh per [`calculate_changes`] call and consumed once by
/// [`apply`](crate::apply).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangeSet {
    /// Desired but not live.
    pub add: BTreeSet<String>,
    /// Live but not desired.
    pub delete: BTreeSet<String>,
    /// Live and desired, but no longer equivalent.
    pub modify: BTreeSet<String>,
}

impl ChangeSet {
    /// Returns `true` if converging requires no action at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.delete.is_empty() && self.modify.is_empty()
    }

    /// Names that must be gone before any creation starts:
    /// `delete ∪ modify`.
    #[must_use]
    pub fn doomed(&self) -> BTreeSet<String> {
        self.delete.union(&self.modify).cloned().collect()
    }

    /// Returns `true` if the named job needs to be (re)created.
    #[must_use]
    pub fn needs_creation(&self, name: &str) -> bool {
        self.add.contains(name) || self.modify.contains(name)
    }
}

/// Computes the add/delete/modify sets between `desired` and `live`.
///
/// When `filter` is given, only names it accepts participate at all:
/// filtered-out live jobs are neither deleted nor considered for
/// modification. Duplicate names within `desired` resolve last-write-wins.
/// Unknown keys in a definition are reported as warnings, one per
/// occurrence, and never alter the result.
pub fn calculate_changes(
    desired: &[DesiredJobSpec],
    live: &[LiveJobRecord],
    filter: Option<&dyn Fn(&str) -> bool>,
) -> ChangeSet {
    for spec in desired {
        for key in spec.unknown_keys.keys() {
            warn!(job = %spec.name, key = %key, "unknown key in job definition");
        }
    }

    let accepts = |name: &str| filter.is_none_or(|f| f(name));

    let wanted: BTreeMap<&str, &DesiredJobSpec> = desired
        .iter()
        .filter(|spec| accepts(&spec.name))
        .map(|spec| (spec.name.as_str(), spec))
        .collect();

    let current: BTreeMap<&str, &LiveJobRecord> = live
        .iter()
        .filter(|record| accepts(&record.name))
        .map(|record| (record.name.as_str(), record))
        .collect();

    let delete = current
        .keys()
        .filter(|name| !wanted.contains_key(*name))
        .map(|name| (*name).to_string())
        .collect();

    let add = wanted
        .keys()
        .filter(|name| !current.contains_key(*name))
        .map(|name| (*name).to_string())
        .collect();

    let modify = wanted
        .iter()
        .filter(|(name, spec)| {
            current
                .get(*name)
                .is_some_and(|record| !is_equivalent(spec, record))
        })
        .map(|(name, _)| (*name).to_string())
        .collect();

    ChangeSet {
        add,
        delete,
        modify,
    }
}
