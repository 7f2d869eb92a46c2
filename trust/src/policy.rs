//! How `blue_score` and `dag_depth` are filled in for new records.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetricsPolicy {
    /// Every new record carries zero metrics. Certificates still aggregate
    /// the fields, so they read zero.
    #[default]
    Inert,
    /// `dag_depth` is the longest parent path to a genesis and `blue_score`
    /// the number of distinct ancestors.
    ParentDepth,
}
