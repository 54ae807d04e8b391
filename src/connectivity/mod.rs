//! Board connectivity extraction and clustering
//!
//! Wraps copper-bearing board items (pads, tracks, vias, zone-fill islands)
//! into connectivity items with anchors, spatially indexes them per kind,
//! derives touch edges on shared copper layers, flood-fills the edges into
//! clusters, resolves each cluster's origin net, flags shorts, and
//! classifies anchors as dangling or connected.
//!
//! # Submodules
//! - `types` - Board units, layer sets, net codes, the `BoardItem` input model
//! - `item` - Connectivity item wrapper and generational handles
//! - `list` - Per-kind arenas with R-tree spatial indexing
//! - `touch` - Exact touch predicates (coincidence and shape overlap)
//! - `cluster` - Connected-component extraction and net resolution
//! - `graph` - The orchestrating `ConnectivityGraph` and its queries

mod cluster;
mod graph;
mod item;
mod list;
mod touch;
mod types;

pub use types::{
    Anchor, BoardItem, ItemKind, LayerId, LayerSet, NetCode, PadShape, Point,
    COPPER_LAYER_COUNT,
};

pub use item::{ConnectivityItem, ItemHandle, ItemShape};

pub use list::{IndexedItem, ItemList, ItemStore};

pub use touch::{item_touches_point, point_in_polygon, touches};

pub use cluster::{Cluster, RebuildStats};

pub use graph::{
    CancelFlag, ConnectivityError, ConnectivityGraph, Generation, GraphState,
};
