//! Connectivity graph orchestrator
//!
//! Owns the per-kind item lists, drives full and incremental rebuilds, and
//! answers net / dangling / conflict queries against the last published
//! generation. Mutation and rebuilding take `&mut self` (single writer);
//! queries take `&self`, so concurrent reads of a fixed generation are safe
//! by construction.

use indexmap::IndexSet;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::debug;

use super::cluster::{
    anchor_neighbor_counts, discover_all, discover_neighbors, flood_components, resolve_cluster,
    Cluster, NeighborMap, RebuildStats,
};
use super::item::{ConnectivityItem, ItemHandle};
use super::list::ItemStore;
use super::types::{BoardItem, ItemKind, NetCode};

/// Version counter identifying the connectivity state a query result was
/// computed against. Bumped only when a rebuild publishes.
pub type Generation = u64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConnectivityError {
    #[error("rebuild cancelled; previous generation left in place")]
    Cancelled,
    #[error("stale or unknown item handle {0:?}")]
    StaleHandle(ItemHandle),
    #[error("item kind cannot change in place: {handle:?} is {was:?}, update is {now:?}")]
    KindMismatch {
        handle: ItemHandle,
        was: ItemKind,
        now: ItemKind,
    },
}

/// Shared cancellation flag checked between rebuild batches
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphState {
    Clean,
    Dirty,
    Rebuilding,
}

/// Top-level connectivity engine
pub struct ConnectivityGraph {
    store: ItemStore,
    state: GraphState,
    generation: Generation,
    clusters: Vec<Cluster>,
    cluster_of: HashMap<ItemHandle, usize>,
    /// Handles touched since the last published generation
    pending: IndexSet<ItemHandle>,
}

impl ConnectivityGraph {
    pub fn new() -> Self {
        Self {
            store: ItemStore::new(),
            state: GraphState::Clean,
            generation: 0,
            clusters: Vec::new(),
            cluster_of: HashMap::new(),
            pending: IndexSet::new(),
        }
    }

    /// Wrap and insert a board item. The returned handle stays valid until
    /// the item is removed and the next rebuild compacts it away.
    pub fn add_item(&mut self, board: &BoardItem) -> ItemHandle {
        let handle = self.store.add(ConnectivityItem::from_board_item(board));
        self.pending.insert(handle);
        self.state = GraphState::Dirty;
        handle
    }

    /// Mark an item deleted. O(1); physical removal happens during the next
    /// rebuild's compaction pass.
    pub fn remove_item(&mut self, handle: ItemHandle) -> Result<(), ConnectivityError> {
        if !self.store.invalidate(handle) {
            return Err(ConnectivityError::StaleHandle(handle));
        }
        self.pending.insert(handle);
        self.state = GraphState::Dirty;
        Ok(())
    }

    /// Replace an item's geometry/net in place, keeping its handle
    pub fn update_item(
        &mut self,
        handle: ItemHandle,
        board: &BoardItem,
    ) -> Result<(), ConnectivityError> {
        if board.kind() != handle.kind {
            return Err(ConnectivityError::KindMismatch {
                handle,
                was: handle.kind,
                now: board.kind(),
            });
        }
        if !self.store.replace(handle, ConnectivityItem::from_board_item(board)) {
            return Err(ConnectivityError::StaleHandle(handle));
        }
        self.pending.insert(handle);
        self.state = GraphState::Dirty;
        Ok(())
    }

    /// Full recompute: compact all lists, re-discover every edge, re-form
    /// every cluster. Produces results identical to a from-scratch build
    /// regardless of prior state.
    pub fn rebuild(&mut self) -> Generation {
        match self.run_full(None) {
            Ok(generation) => generation,
            // unreachable without a cancel flag; keep the old generation
            Err(_) => self.generation,
        }
    }

    /// Full recompute with a cancellation flag checked between discovery
    /// batches. On cancellation nothing is published: queries keep
    /// answering for the previous generation and the graph stays dirty.
    pub fn rebuild_with_cancel(
        &mut self,
        cancel: &CancelFlag,
    ) -> Result<Generation, ConnectivityError> {
        self.run_full(Some(cancel))
    }

    fn run_full(&mut self, cancel: Option<&CancelFlag>) -> Result<Generation, ConnectivityError> {
        let start = Instant::now();
        self.state = GraphState::Rebuilding;
        self.store.compact();

        let handles = self.store.valid_handles();
        let is_cancelled = || cancel.is_some_and(|c| c.is_cancelled());
        let Some(mut neighbors) = discover_all(&self.store, &handles, is_cancelled) else {
            self.state = GraphState::Dirty;
            return Err(ConnectivityError::Cancelled);
        };

        let clusters: Vec<Cluster> = flood_components(&handles, &neighbors)
            .into_iter()
            .map(|members| resolve_cluster(members, &self.store))
            .collect();

        let edges = neighbors.values().map(Vec::len).sum::<usize>() / 2;
        for &handle in &handles {
            let adjacent = neighbors.remove(&handle).unwrap_or_default();
            let counts = anchor_neighbor_counts(&self.store, handle, &adjacent);
            if let Some(item) = self.store.get_mut(handle) {
                item.set_connectivity(adjacent, counts);
            }
        }

        let stats = RebuildStats {
            items: handles.len(),
            edges,
            clusters: clusters.len(),
            elapsed: start.elapsed(),
        };
        Ok(self.publish(clusters, stats, "full"))
    }

    /// Recompute only the clusters reachable from the changed handles (and
    /// anything accumulated since the last publish), carrying every other
    /// cluster over. Observationally equivalent to `rebuild()`.
    pub fn rebuild_incremental(&mut self, changed: &[ItemHandle]) -> Generation {
        if self.generation == 0 {
            // nothing published yet to patch against
            return self.rebuild();
        }
        let start = Instant::now();
        self.state = GraphState::Rebuilding;

        let mut seed: HashSet<ItemHandle> = self.pending.iter().copied().collect();
        seed.extend(changed.iter().copied());
        seed.extend(self.store.compact());

        // Dissolve every published cluster the seed touches; its surviving
        // members go back into the recompute pool.
        let mut kept: Vec<Cluster> = Vec::new();
        let mut pool: IndexSet<ItemHandle> = IndexSet::new();
        for cluster in std::mem::take(&mut self.clusters) {
            if cluster.members.iter().any(|m| seed.contains(m)) {
                for &member in &cluster.members {
                    if self.store.get(member).is_some_and(|i| i.is_valid()) {
                        pool.insert(member);
                    }
                }
            } else {
                kept.push(cluster);
            }
        }
        for &handle in &seed {
            if self.store.get(handle).is_some_and(|i| i.is_valid()) {
                pool.insert(handle);
            }
        }

        // Discover pool edges; a new edge into a kept cluster absorbs that
        // cluster into the pool, until the neighbourhood is closed.
        let mut neighbors = NeighborMap::new();
        let mut worklist: Vec<ItemHandle> = pool.iter().copied().collect();
        while !worklist.is_empty() {
            let discovered: Vec<(ItemHandle, Vec<ItemHandle>)> = worklist
                .par_iter()
                .map(|&h| (h, discover_neighbors(&self.store, h)))
                .collect();
            worklist.clear();
            let mut escaped: Vec<ItemHandle> = Vec::new();
            for (handle, adjacent) in discovered {
                escaped.extend(adjacent.iter().copied().filter(|n| !pool.contains(n)));
                neighbors.insert(handle, adjacent);
            }
            for neighbor in escaped {
                if pool.contains(&neighbor) {
                    continue;
                }
                if let Some(idx) = kept.iter().position(|c| c.contains(neighbor)) {
                    for &member in &kept.swap_remove(idx).members {
                        if self.store.get(member).is_some_and(|i| i.is_valid())
                            && pool.insert(member)
                        {
                            worklist.push(member);
                        }
                    }
                } else if pool.insert(neighbor) {
                    worklist.push(neighbor);
                }
            }
        }

        let mut pool_handles: Vec<ItemHandle> = pool.into_iter().collect();
        pool_handles.sort_unstable();
        let edges = neighbors.values().map(Vec::len).sum::<usize>() / 2;

        let mut clusters = kept;
        for members in flood_components(&pool_handles, &neighbors) {
            clusters.push(resolve_cluster(members, &self.store));
        }
        clusters.sort_by_key(|c| c.members.first().copied());

        for &handle in &pool_handles {
            let adjacent = neighbors.remove(&handle).unwrap_or_default();
            let counts = anchor_neighbor_counts(&self.store, handle, &adjacent);
            if let Some(item) = self.store.get_mut(handle) {
                item.set_connectivity(adjacent, counts);
            }
        }

        let stats = RebuildStats {
            items: pool_handles.len(),
            edges,
            clusters: clusters.len(),
            elapsed: start.elapsed(),
        };
        self.publish(clusters, stats, "incremental")
    }

    fn publish(&mut self, clusters: Vec<Cluster>, stats: RebuildStats, pass: &str) -> Generation {
        self.cluster_of = clusters
            .iter()
            .enumerate()
            .flat_map(|(idx, c)| c.members.iter().map(move |&m| (m, idx)))
            .collect();
        self.clusters = clusters;
        self.pending.clear();
        self.generation += 1;
        self.state = GraphState::Clean;
        debug!(
            pass,
            generation = self.generation,
            items = stats.items,
            edges = stats.edges,
            clusters = stats.clusters,
            elapsed_us = stats.elapsed.as_micros() as u64,
            "connectivity rebuild published"
        );
        self.generation
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn state(&self) -> GraphState {
        self.state
    }

    pub fn item(&self, handle: ItemHandle) -> Option<&ConnectivityItem> {
        self.store.get(handle)
    }

    /// Resolved net of the cluster this item belongs to, or the no-net
    /// sentinel for stale handles and unclustered items
    pub fn net_of(&self, handle: ItemHandle) -> NetCode {
        self.cluster_of
            .get(&handle)
            .map(|&idx| self.clusters[idx].origin_net)
            .unwrap_or(NetCode::NONE)
    }

    /// The cluster containing this item, as of the published generation
    pub fn cluster_of(&self, handle: ItemHandle) -> Option<&Cluster> {
        self.cluster_of.get(&handle).map(|&idx| &self.clusters[idx])
    }

    /// Items this one physically touches, as of the published generation
    pub fn connected_items(&self, handle: ItemHandle) -> &[ItemHandle] {
        self.store.get(handle).map(|item| item.connected()).unwrap_or(&[])
    }

    /// Count of distinct other items touching the given anchor
    pub fn connected_count(&self, handle: ItemHandle, anchor: u32) -> u32 {
        self.store
            .get(handle)
            .map(|item| item.anchor_neighbor_count(anchor))
            .unwrap_or(0)
    }

    /// Whether the anchor has fewer touching neighbours than its kind
    /// requires (vias need two, everything else one). `None` for a stale
    /// handle or out-of-range anchor.
    pub fn is_dangling(&self, handle: ItemHandle, anchor: u32) -> Option<bool> {
        let item = self.store.get(handle)?;
        if anchor >= item.anchor_count() {
            return None;
        }
        if handle.kind == ItemKind::ZoneIsland && anchor == 0 {
            // an island connects as a region, not at a vertex: the
            // representative anchor answers for the whole fill. Other
            // vertices report their local neighbour count.
            return Some(item.connected().is_empty());
        }
        Some(item.anchor_neighbor_count(anchor) < handle.kind.min_anchor_neighbors())
    }

    /// All clusters of the published generation, ordered by lowest member
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Clusters whose member pads declare conflicting nets (shorts), for
    /// the DRC layer to turn into violations
    pub fn conflicts(&self) -> Vec<&Cluster> {
        self.clusters.iter().filter(|c| c.conflict).collect()
    }
}

impl Default for ConnectivityGraph {
    fn default() -> Self {
        Self::new()
    }
}
