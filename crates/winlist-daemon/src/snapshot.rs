//! Snapshot construction
//!
//! Joins the window manager's id queries with the metadata map into the
//! three display tiers: the focused window, windows sharing its class,
//! and the rest of the focused desktop. Ids are consumed tier by tier so
//! no window ever renders twice, and ids whose metadata vanished between
//! the two queries (window closed mid-cycle) are silently dropped.

use std::collections::{HashMap, HashSet};

use crate::wm::{InfoQuery, NodeQuery, WindowInfo, WindowRecord};

/// One render cycle's view of the desktop, partitioned into tiers.
/// Tiers are pairwise disjoint in window id.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub focused: Option<WindowRecord>,
    pub same_class: Vec<WindowRecord>,
    pub rest: Vec<WindowRecord>,
}

/// Builds snapshots from a pair of query drivers
#[derive(Debug)]
pub struct SnapshotBuilder<N, I> {
    nodes: N,
    info: I,
}

impl<N: NodeQuery, I: InfoQuery> SnapshotBuilder<N, I> {
    pub fn new(nodes: N, info: I) -> Self {
        Self { nodes, info }
    }

    /// The focused window, or `None` when nothing is focused or its
    /// metadata is already gone
    pub async fn focused(&self) -> Option<WindowRecord> {
        let ids = self.nodes.focused().await;
        let map = self.info.window_info().await;
        join_records(ids, &map, &HashSet::new()).pop()
    }

    /// Windows sharing the focused window's class. The focused id itself
    /// must be in `excluding`; it is same-class with itself and would
    /// otherwise render twice.
    pub async fn same_class(&self, excluding: &HashSet<u32>) -> Vec<WindowRecord> {
        let ids = self.nodes.same_class().await;
        let map = self.info.window_info().await;
        join_records(ids, &map, excluding)
    }

    /// Remaining windows on the focused desktop, sorted by class name
    /// (byte-wise on the already-lower-cased class, stable, so equal
    /// classes keep the window manager's ordering)
    pub async fn rest(&self, excluding: &HashSet<u32>) -> Vec<WindowRecord> {
        let ids = self.nodes.local_windows().await;
        let map = self.info.window_info().await;
        let mut records = join_records(ids, &map, excluding);
        records.sort_by(|a, b| a.class.cmp(&b.class));
        records
    }

    /// Build all three tiers, accumulating the exclusion set so an id is
    /// consumed by the first tier that claims it
    pub async fn snapshot(&self) -> Snapshot {
        let focused = self.focused().await;

        let mut placed: HashSet<u32> = HashSet::new();
        if let Some(record) = &focused {
            placed.insert(record.id);
        }

        let same_class = self.same_class(&placed).await;
        placed.extend(same_class.iter().map(|r| r.id));

        let rest = self.rest(&placed).await;

        Snapshot {
            focused,
            same_class,
            rest,
        }
    }
}

/// Join ids against the metadata map, in id order, skipping excluded ids
/// and ids with no metadata
fn join_records(
    ids: Vec<u32>,
    map: &HashMap<u32, WindowInfo>,
    excluding: &HashSet<u32>,
) -> Vec<WindowRecord> {
    ids.into_iter()
        .filter(|id| !excluding.contains(id))
        .filter_map(|id| {
            map.get(&id)
                .map(|info| WindowRecord::from_info(id, info.clone()))
        })
        .collect()
}
