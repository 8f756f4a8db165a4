use chrono::{TimeZone, Utc};
use pds_store::{DiffEntry, EntryStore};
use pds_types::{EntryHash, ExpressionProof, LinkExpression, TemporalAnchor, Triple};

pub(crate) fn link(source: &str) -> LinkExpression {
    LinkExpression::with_timestamp(
        Triple::new(source, "target", None),
        "did:key:test",
        Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        ExpressionProof {
            signature: "sig".into(),
            key: "key".into(),
        },
    )
}

pub(crate) fn links(sources: &[&str]) -> Vec<LinkExpression> {
    sources.iter().map(|s| link(s)).collect()
}

/// A parentless entry carrying the given diff.
pub(crate) fn diff(additions: &[&str], removals: &[&str]) -> DiffEntry {
    DiffEntry::new(links(additions), links(removals), vec![], TemporalAnchor::zero())
}

/// Store an entry directly, bypassing the engine and compaction.
pub(crate) fn put(
    store: &dyn EntryStore,
    tick: u64,
    additions: &[&str],
    removals: &[&str],
    parents: Vec<EntryHash>,
) -> EntryHash {
    let entry = DiffEntry::new(
        links(additions),
        links(removals),
        parents,
        TemporalAnchor::new(tick, 0, 0),
    );
    store.put_entry(&entry).unwrap()
}
