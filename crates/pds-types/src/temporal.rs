use std::fmt;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Hybrid Logical Clock timestamp for causal ordering of diff entries.
///
/// Combines a physical wall-clock component with a logical counter and a
/// node identifier, so peers can order entries causally without
/// synchronized clocks.
///
/// Ordering: `physical_ms` → `logical` → `node_id` (total order).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemporalAnchor {
    /// Wall-clock milliseconds since UNIX epoch.
    pub physical_ms: u64,
    /// Logical counter for events at the same physical time.
    pub logical: u32,
    /// Node identifier to break ties between peers.
    pub node_id: u16,
}

impl TemporalAnchor {
    pub fn new(physical_ms: u64, logical: u32, node_id: u16) -> Self {
        Self {
            physical_ms,
            logical,
            node_id,
        }
    }

    /// The zero anchor.
    pub const fn zero() -> Self {
        Self {
            physical_ms: 0,
            logical: 0,
            node_id: 0,
        }
    }

    pub fn is_after(&self, other: &Self) -> bool {
        self > other
    }

    pub fn is_before(&self, other: &Self) -> bool {
        self < other
    }
}

impl PartialOrd for TemporalAnchor {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TemporalAnchor {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.physical_ms
            .cmp(&other.physical_ms)
            .then(self.logical.cmp(&other.logical))
            .then(self.node_id.cmp(&other.node_id))
    }
}

impl fmt::Debug for TemporalAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TemporalAnchor({}ms.{}.n{})",
            self.physical_ms, self.logical, self.node_id
        )
    }
}

impl fmt::Display for TemporalAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.n{}", self.physical_ms, self.logical, self.node_id)
    }
}

struct HlcState {
    physical_ms: u64,
    logical: u32,
}

/// Hybrid Logical Clock producing monotonically increasing [`TemporalAnchor`]s.
///
/// - **Local event**: `physical = max(wall_clock, state.physical)`.
///   If physical advanced, `logical = 0`; otherwise `logical += 1`.
/// - **Observe**: `physical = max(wall_clock, state.physical, observed.physical)`,
///   with logical adjusted to be strictly greater than both counters when the
///   physical component ties.
pub struct HybridLogicalClock {
    node_id: u16,
    state: Mutex<HlcState>,
}

impl HybridLogicalClock {
    pub fn new(node_id: u16) -> Self {
        Self {
            node_id,
            state: Mutex::new(HlcState {
                physical_ms: 0,
                logical: 0,
            }),
        }
    }

    /// Timestamp for a local event, strictly greater than any previous one.
    pub fn now(&self) -> TemporalAnchor {
        let wall = Self::wall_clock_ms();
        // The state is two integers; a poisoned lock still holds a usable value.
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        let new_physical = wall.max(state.physical_ms);
        let new_logical = if new_physical > state.physical_ms {
            0
        } else {
            state.logical + 1
        };

        state.physical_ms = new_physical;
        state.logical = new_logical;

        TemporalAnchor::new(new_physical, new_logical, self.node_id)
    }

    /// Fold in a timestamp observed on a remote entry, returning a timestamp
    /// strictly greater than both the local state and `observed`.
    pub fn observe(&self, observed: &TemporalAnchor) -> TemporalAnchor {
        let wall = Self::wall_clock_ms();
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        let new_physical = wall.max(state.physical_ms).max(observed.physical_ms);

        let new_logical = if new_physical > state.physical_ms
            && new_physical > observed.physical_ms
        {
            0
        } else if new_physical == state.physical_ms && new_physical == observed.physical_ms {
            state.logical.max(observed.logical) + 1
        } else if new_physical == state.physical_ms {
            state.logical + 1
        } else {
            observed.logical + 1
        };

        state.physical_ms = new_physical;
        state.logical = new_logical;

        TemporalAnchor::new(new_physical, new_logical, self.node_id)
    }

    pub fn node_id(&self) -> u16 {
        self.node_id
    }

    fn wall_clock_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

impl fmt::Debug for HybridLogicalClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HybridLogicalClock")
            .field("node_id", &self.node_id)
            .finish()
    }
}
