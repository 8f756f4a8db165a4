use serde::{Deserialize, Serialize};

/// How a pull changed the local head.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStatus {
    /// Nothing new was found.
    #[default]
    UpToDate,
    /// The local head moved forward onto a descendant.
    FastForward,
    /// A merge entry joining divergent heads was created.
    Merged,
}

impl std::fmt::Display for MergeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergeStatus::UpToDate => write!(f, "up-to-date"),
            MergeStatus::FastForward => write!(f, "fast-forward"),
            MergeStatus::Merged => write!(f, "merged"),
        }
    }
}
