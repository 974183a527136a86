//! Per-node Q-table: the learning state of one router.
//!
//! A `QTable` maps a (destination, neighbor) pair to the owner's estimate of
//! the remaining delivery time when forwarding through that neighbor.  The
//! key is stored in one of two shapes, fixed per run by the update rule:
//!
//! ```text
//! Local   (destination, neighbor)        owner implicit
//! Triplet (from, destination, neighbor)  owner spelled out
//! ```
//!
//! Both shapes answer the same queries; the triplet form keeps exported
//! entries self-describing when tables of several nodes are read side by
//! side, which the `OnDeparture` rule does through a `NeighborView`.

use std::collections::BTreeMap;
use std::fmt;

use qr_core::{NodeId, UpdateRule};

use crate::learning::QUpdate;
use crate::{NetError, NetResult};

#[cfg(feature = "fx-hash")]
type KeyMap = rustc_hash::FxHashMap<QKey, f64>;
#[cfg(not(feature = "fx-hash"))]
type KeyMap = std::collections::HashMap<QKey, f64>;

// ── Keys ──────────────────────────────────────────────────────────────────────

/// Which key shape a table uses.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KeyShape {
    Local,
    Triplet,
}

impl From<UpdateRule> for KeyShape {
    fn from(rule: UpdateRule) -> Self {
        match rule {
            UpdateRule::OnArrival   => KeyShape::Local,
            UpdateRule::OnDeparture => KeyShape::Triplet,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QKey {
    Local {
        destination: NodeId,
        via:         NodeId,
    },
    Triplet {
        from:        NodeId,
        destination: NodeId,
        via:         NodeId,
    },
}

impl QKey {
    #[inline]
    pub fn destination(&self) -> NodeId {
        match *self {
            QKey::Local { destination, .. } | QKey::Triplet { destination, .. } => destination,
        }
    }

    #[inline]
    pub fn via(&self) -> NodeId {
        match *self {
            QKey::Local { via, .. } | QKey::Triplet { via, .. } => via,
        }
    }
}

// ── QTable ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct QTable {
    owner:   NodeId,
    shape:   KeyShape,
    default: f64,
    values:  KeyMap,
}

impl QTable {
    /// An empty table for `owner`.  Misses read as `default`.
    pub fn new(owner: NodeId, shape: KeyShape, default: f64) -> Self {
        Self {
            owner,
            shape,
            default,
            values: KeyMap::default(),
        }
    }

    #[inline]
    pub fn owner(&self) -> NodeId {
        self.owner
    }

    #[inline]
    pub fn shape(&self) -> KeyShape {
        self.shape
    }

    /// The value returned for pairs with no entry.
    #[inline]
    pub fn default_value(&self) -> f64 {
        self.default
    }

    /// Build the key for `(destination, via)` in this table's shape.
    #[inline]
    pub fn key(&self, destination: NodeId, via: NodeId) -> QKey {
        match self.shape {
            KeyShape::Local => QKey::Local { destination, via },
            KeyShape::Triplet => QKey::Triplet { from: self.owner, destination, via },
        }
    }

    /// Estimated time to `destination` when forwarding via `via`.
    #[inline]
    pub fn get(&self, destination: NodeId, via: NodeId) -> f64 {
        self.values
            .get(&self.key(destination, via))
            .copied()
            .unwrap_or(self.default)
    }

    /// Store an estimate.  Rejects keys naming the owner as neighbor and
    /// non-finite values.
    pub fn set(&mut self, destination: NodeId, via: NodeId, value: f64) -> NetResult<()> {
        if via == self.owner {
            return Err(NetError::SelfNeighborKey { owner: self.owner, destination });
        }
        if !value.is_finite() {
            return Err(qr_core::CoreError::Invariant(format!(
                "non-finite Q-value {value} for node {} (destination {destination}, via {via})",
                self.owner
            ))
            .into());
        }
        let key = self.key(destination, via);
        self.values.insert(key, value);
        Ok(())
    }

    /// The best estimate this table holds for `destination`, or the default
    /// when it holds none.  A node is zero ticks away from itself.
    pub fn min_over_neighbors(&self, destination: NodeId) -> f64 {
        if destination == self.owner {
            return 0.0;
        }
        self.values
            .iter()
            .filter(|(k, _)| k.destination() == destination)
            .map(|(_, &v)| v)
            .reduce(f64::min)
            .unwrap_or(self.default)
    }

    /// Write an update computed by one of the learning rules.
    pub fn apply(&mut self, update: &QUpdate) -> NetResult<()> {
        debug_assert_eq!(update.owner, self.owner);
        self.set(update.destination, update.via, update.new)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All entries in key order.
    pub fn entries(&self) -> Vec<(QKey, f64)> {
        let sorted: BTreeMap<QKey, f64> = self.values.iter().map(|(k, v)| (*k, *v)).collect();
        sorted.into_iter().collect()
    }
}

impl fmt::Display for QTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.values.is_empty() {
            return write!(f, "QTable: (empty)");
        }
        writeln!(f, " QTable:")?;
        match self.shape {
            KeyShape::Local => writeln!(f, " destination | neighbor | value")?,
            KeyShape::Triplet => writeln!(f, " from_id | destination | to_id | value")?,
        }
        write!(f, "{}", "-".repeat(36))?;
        for (key, value) in self.entries() {
            match key {
                QKey::Local { destination, via } => {
                    write!(f, "\n {:>11} | {:>8} | {:6.2}", destination.0, via.0, value)?
                }
                QKey::Triplet { from, destination, via } => write!(
                    f,
                    "\n {:>7} | {:>11} | {:>5} | {:6.2}",
                    from.0, destination.0, via.0, value
                )?,
            }
        }
        Ok(())
    }
}
