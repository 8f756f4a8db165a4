use std::fmt;

use pds_types::EntryHash;
use serde::{Deserialize, Serialize};

/// What a pull has to do to incorporate the advertised heads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MergePlan {
    /// Every candidate is the local head or one of its ancestors.
    UpToDate,
    /// A single head descends from the local head (or there is no local
    /// head yet): adopt it without writing anything.
    FastForward { to: EntryHash },
    /// Two or more heads are mutually unordered: join them in one merge
    /// entry. Parents are sorted ascending by hash.
    Merge { parents: Vec<EntryHash> },
}

impl MergePlan {
    pub fn is_up_to_date(&self) -> bool {
        matches!(self, MergePlan::UpToDate)
    }

    pub fn is_merge(&self) -> bool {
        matches!(self, MergePlan::Merge { .. })
    }
}

impl fmt::Display for MergePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergePlan::UpToDate => write!(f, "up to date"),
            MergePlan::FastForward { to } => write!(f, "fast-forward to {}", to.short_hex()),
            MergePlan::Merge { parents } => write!(f, "merge of {} heads", parents.len()),
        }
    }
}
