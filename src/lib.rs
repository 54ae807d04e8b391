//! PCB connectivity extraction and clustering engine
//!
//! An in-memory, handle-based service: the board/editor layer feeds copper
//! items in, DRC reads short-circuit conflicts out, the ratsnest renderer
//! reads dangling anchors, and net-aware edit tools query resolved nets.
//! No file format or wire protocol is owned here.

pub mod connectivity;

pub use connectivity::{
    BoardItem, CancelFlag, Cluster, ConnectivityError, ConnectivityGraph, ConnectivityItem,
    Generation, GraphState, ItemHandle, ItemKind, LayerId, LayerSet, NetCode, PadShape, Point,
};
