//! Cluster extraction
//!
//! Turns touch relations between items into connected components. Edges are
//! never materialised as a full adjacency matrix: each item's neighbour list
//! comes from an R-tree envelope query filtered by the exact touch
//! predicate, discovered in parallel with Rayon, then a sequential BFS merge
//! walk forms the components.

use rayon::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use super::item::ItemHandle;
use super::list::ItemStore;
use super::touch::{item_touches_point, touches};
use super::types::{ItemKind, NetCode};
use rstar::AABB;

/// Items per batch between cancellation checks during edge discovery
pub(crate) const DISCOVERY_BATCH: usize = 4096;

/// One connected component: a maximal set of items transitively touching on
/// shared copper layers
#[derive(Clone, Debug, Serialize)]
pub struct Cluster {
    /// Member handles in ascending (kind-major, slot-minor) order
    pub members: Vec<ItemHandle>,
    /// The pad whose net the cluster resolves to, if any pad is present
    pub origin_pad: Option<ItemHandle>,
    /// Resolved net: the origin pad's declared net, or no-net for a
    /// padless cluster
    pub origin_net: NetCode,
    /// True iff two member pads declare different non-empty nets (a short)
    pub conflict: bool,
}

impl Cluster {
    pub fn contains(&self, handle: ItemHandle) -> bool {
        self.members.binary_search(&handle).is_ok()
    }
}

/// Rebuild telemetry, traced at debug level after each pass
#[derive(Clone, Copy, Debug, Default)]
pub struct RebuildStats {
    pub items: usize,
    pub edges: usize,
    pub clusters: usize,
    pub elapsed: Duration,
}

pub(crate) type NeighborMap = HashMap<ItemHandle, Vec<ItemHandle>>;

/// Neighbour list for one item: envelope candidates on a shared layer,
/// narrowed by the exact touch predicate. Sorted for deterministic walks.
pub(crate) fn discover_neighbors(store: &ItemStore, handle: ItemHandle) -> Vec<ItemHandle> {
    let Some(item) = store.get(handle) else {
        return Vec::new();
    };
    if !item.is_valid() {
        return Vec::new();
    }
    let (min, max) = item.bounds();
    let envelope = AABB::from_corners(min, max);
    let mut neighbors: Vec<ItemHandle> = store
        .candidates(&envelope, item.layers())
        .into_iter()
        .filter(|&other| {
            other != handle && store.get(other).is_some_and(|o| touches(item, o))
        })
        .collect();
    neighbors.sort_unstable();
    neighbors.dedup();
    neighbors
}

/// Parallel neighbour discovery over a handle set, checking the caller's
/// cancellation hook between fixed-size batches. Returns `None` when
/// cancelled; nothing has been published at that point.
pub(crate) fn discover_all(
    store: &ItemStore,
    handles: &[ItemHandle],
    cancelled: impl Fn() -> bool,
) -> Option<NeighborMap> {
    let mut map = NeighborMap::with_capacity(handles.len());
    for batch in handles.chunks(DISCOVERY_BATCH) {
        if cancelled() {
            return None;
        }
        let discovered: Vec<(ItemHandle, Vec<ItemHandle>)> = batch
            .par_iter()
            .map(|&h| (h, discover_neighbors(store, h)))
            .collect();
        map.extend(discovered);
    }
    Some(map)
}

/// Flood-fill the neighbour map into connected components. Handles are
/// visited in ascending order, so component order and membership are
/// deterministic for a given board state.
pub(crate) fn flood_components(
    handles: &[ItemHandle],
    neighbors: &NeighborMap,
) -> Vec<Vec<ItemHandle>> {
    let mut components = Vec::new();
    let mut visited: HashSet<ItemHandle> = HashSet::with_capacity(handles.len());
    for &start in handles {
        if !visited.insert(start) {
            continue;
        }
        let mut members = vec![start];
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            if let Some(adjacent) = neighbors.get(&current) {
                for &next in adjacent {
                    if visited.insert(next) {
                        members.push(next);
                        queue.push_back(next);
                    }
                }
            }
        }
        members.sort_unstable();
        components.push(members);
    }
    components
}

/// Resolve one component to a cluster: origin pad, origin net, conflict.
///
/// Members walk in ascending handle order (pads first, by kind ordering).
/// The origin pad is the lowest-ordered pad with a declared net, falling
/// back to the lowest-ordered pad of any net; a no-net pad never overrides
/// an established origin and never raises a conflict.
pub(crate) fn resolve_cluster(members: Vec<ItemHandle>, store: &ItemStore) -> Cluster {
    let mut origin_pad = None;
    let mut origin_net = NetCode::NONE;
    let mut conflict = false;
    for &handle in &members {
        if handle.kind != ItemKind::Pad {
            break; // members are sorted kind-major; no pads past this point
        }
        let net = store.get(handle).map(|item| item.net()).unwrap_or(NetCode::NONE);
        if !net.is_set() {
            if origin_pad.is_none() {
                origin_pad = Some(handle);
            }
            continue;
        }
        if origin_net.is_set() {
            if net != origin_net {
                conflict = true;
            }
        } else {
            origin_pad = Some(handle);
            origin_net = net;
        }
    }
    Cluster { members, origin_pad, origin_net, conflict }
}

/// Per-anchor count of distinct neighbouring items touching that anchor.
/// Pads, vias and track endpoints count by exact anchor coincidence; a
/// zone neighbour counts when its filled region contains the anchor point.
/// Other anchors of the same item never count.
pub(crate) fn anchor_neighbor_counts(
    store: &ItemStore,
    handle: ItemHandle,
    neighbors: &[ItemHandle],
) -> Vec<u32> {
    let Some(item) = store.get(handle) else {
        return Vec::new();
    };
    (0..item.anchor_count())
        .map(|i| {
            let Some(position) = item.anchor(i) else {
                return 0;
            };
            neighbors
                .iter()
                .filter(|&&n| store.get(n).is_some_and(|o| item_touches_point(o, position)))
                .count() as u32
        })
        .collect()
}
