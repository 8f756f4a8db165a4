//! Link expressions and the collections built from them.
//!
//! A [`LinkExpression`] is an immutable fact. Its identity is structural:
//! two expressions are the same link iff every field is equal. Expressions
//! are totally ordered so that sets of them serialize deterministically.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The subject-predicate-object triple carried by a link.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triple {
    pub source: String,
    pub target: String,
    pub predicate: Option<String>,
}

impl Triple {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        predicate: Option<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            predicate,
        }
    }
}

/// Author signature over a link expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExpressionProof {
    pub signature: String,
    pub key: String,
}

/// An authored, timestamped, signed link.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkExpression {
    pub data: Triple,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub proof: ExpressionProof,
}

impl LinkExpression {
    /// Create a link expression authored now.
    pub fn new(data: Triple, author: impl Into<String>, proof: ExpressionProof) -> Self {
        Self::with_timestamp(data, author, Utc::now(), proof)
    }

    /// Create a link expression with an explicit timestamp.
    pub fn with_timestamp(
        data: Triple,
        author: impl Into<String>,
        timestamp: DateTime<Utc>,
        proof: ExpressionProof,
    ) -> Self {
        Self {
            data,
            author: author.into(),
            timestamp,
            proof,
        }
    }
}

/// A batch of link additions and removals.
///
/// This is both the payload of a commit and the delta returned by `pull`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerspectiveDiff {
    pub additions: Vec<LinkExpression>,
    pub removals: Vec<LinkExpression>,
}

impl PerspectiveDiff {
    pub fn new(additions: Vec<LinkExpression>, removals: Vec<LinkExpression>) -> Self {
        Self {
            additions,
            removals,
        }
    }

    /// Returns `true` if the diff neither adds nor removes anything.
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }

    /// Total number of additions plus removals.
    pub fn len(&self) -> usize {
        self.additions.len() + self.removals.len()
    }
}

/// A materialized link set, as produced by rendering a revision.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Perspective {
    pub links: Vec<LinkExpression>,
}

impl Perspective {
    pub fn new(links: Vec<LinkExpression>) -> Self {
        Self { links }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn contains(&self, link: &LinkExpression) -> bool {
        self.links.contains(link)
    }
}
