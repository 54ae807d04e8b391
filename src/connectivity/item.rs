//! Connectivity item wrapper
//!
//! Wraps one board item into its connectivity representation: kind-tagged
//! geometry, derived anchors, copper layer span, declared net, validity, and
//! the connected-item handle list filled in by each rebuild.

use serde::Serialize;
use tracing::warn;

use super::types::{
    Anchor, BoardItem, ItemKind, LayerId, LayerSet, NetCode, PadShape, Point,
};

/// Stable handle to a connectivity item. Kind selects the owning list;
/// `slot` addresses the arena slot; `gen` is the slot's generation tag, so
/// handles left over from a purged item are rejected cheaply.
///
/// Ordering is kind-major, slot-minor: a total, insertion-stable order used
/// as the deterministic member walk during cluster resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ItemHandle {
    pub kind: ItemKind,
    pub slot: u32,
    pub gen: u32,
}

/// Kind-tagged item geometry. Closed enum: touch tests and anchor derivation
/// dispatch through exhaustive matches, so a new item kind is a
/// compile-time-enforced change everywhere it matters.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemShape {
    Pad { position: Point, shape: PadShape },
    Track { start: Point, end: Point, width: i32 },
    Via { position: Point, diameter: i32 },
    ZoneIsland { outline: Vec<Point> },
}

/// Geometric wrapper around one board item
#[derive(Debug, Clone)]
pub struct ConnectivityItem {
    shape: ItemShape,
    layers: LayerSet,
    net: NetCode,
    valid: bool,
    /// Handles of items this one touches, rebuilt on every clustering pass
    connected: Vec<ItemHandle>,
    /// Per-anchor count of distinct other items touching that anchor,
    /// rebuilt alongside `connected`
    anchor_neighbors: Vec<u32>,
}

impl ConnectivityItem {
    /// Wrap a board item. Malformed geometry (zero-length track, degenerate
    /// outline, non-positive size, empty pad layer mask) produces an item
    /// that is permanently invalid: it keeps its storage slot but is
    /// excluded from indexing and clustering, with a diagnostic emitted.
    pub fn from_board_item(item: &BoardItem) -> Self {
        let (shape, layers) = match item {
            BoardItem::Pad { position, shape, layers, .. } => {
                // Through-hole pads span the full copper range; SMD pads
                // collapse to the first layer in their mask.
                let resolved = if layers.is_through() {
                    LayerSet::all_copper()
                } else {
                    layers.first().map(LayerSet::single).unwrap_or_default()
                };
                (ItemShape::Pad { position: *position, shape: *shape }, resolved)
            }
            BoardItem::Track { start, end, width, layer, .. } => (
                ItemShape::Track { start: *start, end: *end, width: *width },
                LayerSet::single(*layer),
            ),
            BoardItem::Via { position, diameter, span, .. } => (
                ItemShape::Via { position: *position, diameter: *diameter },
                LayerSet::span(span.0, span.1),
            ),
            BoardItem::ZoneIsland { outline, layer, .. } => (
                ItemShape::ZoneIsland { outline: outline.clone() },
                LayerSet::single(*layer),
            ),
        };

        let mut wrapped = Self {
            shape,
            layers,
            net: item.net(),
            valid: true,
            connected: Vec::new(),
            anchor_neighbors: Vec::new(),
        };

        if let Some(defect) = wrapped.geometry_defect() {
            warn!(kind = ?item.kind(), defect, "excluding malformed item from connectivity");
            wrapped.valid = false;
        }
        wrapped
    }

    /// Screen for geometry that cannot participate in touch tests
    fn geometry_defect(&self) -> Option<&'static str> {
        // catches empty pad masks and layer references outside the stack
        if self.layers.is_empty() {
            return Some("no copper layer in range");
        }
        match &self.shape {
            ItemShape::Pad { shape, .. } => match shape {
                PadShape::Circle { diameter } if *diameter <= 0 => Some("zero-size pad"),
                PadShape::Rect { width, height } if *width <= 0 || *height <= 0 => {
                    Some("zero-size pad")
                }
                _ => None,
            },
            ItemShape::Track { start, end, width } => {
                if start == end {
                    Some("zero-length track")
                } else if *width <= 0 {
                    Some("zero-width track")
                } else {
                    None
                }
            }
            ItemShape::Via { diameter, .. } => {
                if *diameter <= 0 {
                    Some("zero-size via")
                } else {
                    None
                }
            }
            ItemShape::ZoneIsland { outline } => {
                if outline.len() < 3 {
                    Some("degenerate zone outline")
                } else {
                    None
                }
            }
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self.shape {
            ItemShape::Pad { .. } => ItemKind::Pad,
            ItemShape::Track { .. } => ItemKind::Track,
            ItemShape::Via { .. } => ItemKind::Via,
            ItemShape::ZoneIsland { .. } => ItemKind::ZoneIsland,
        }
    }

    pub fn shape(&self) -> &ItemShape {
        &self.shape
    }

    pub fn layers(&self) -> LayerSet {
        self.layers
    }

    pub fn set_layers(&mut self, layers: LayerSet) {
        self.layers = layers;
    }

    pub fn set_layer(&mut self, layer: LayerId) {
        self.layers = LayerSet::single(layer);
    }

    /// Declared net, or the no-net sentinel for an invalid item
    pub fn net(&self) -> NetCode {
        if self.valid {
            self.net
        } else {
            NetCode::NONE
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Exclude this item from all future clustering. The storage slot
    /// survives until the next compaction pass.
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    /// Number of connection points: 0 if invalid, else fixed per kind
    pub fn anchor_count(&self) -> u32 {
        if !self.valid {
            return 0;
        }
        match &self.shape {
            ItemShape::Pad { .. } | ItemShape::Via { .. } => 1,
            ItemShape::Track { .. } => 2,
            ItemShape::ZoneIsland { outline } => outline.len() as u32,
        }
    }

    /// Anchor position by ordinal, `None` out of range or invalid
    pub fn anchor(&self, index: u32) -> Option<Point> {
        if !self.valid {
            return None;
        }
        match &self.shape {
            ItemShape::Pad { position, .. } | ItemShape::Via { position, .. } => {
                (index == 0).then_some(*position)
            }
            ItemShape::Track { start, end, .. } => match index {
                0 => Some(*start),
                1 => Some(*end),
                _ => None,
            },
            ItemShape::ZoneIsland { outline } => outline.get(index as usize).copied(),
        }
    }

    /// Iterate this item's anchors with their owning handle attached
    pub fn anchors(&self, handle: ItemHandle) -> impl Iterator<Item = Anchor> + '_ {
        (0..self.anchor_count()).filter_map(move |i| {
            self.anchor(i).map(|position| Anchor { position, item: handle, index: i })
        })
    }

    pub fn connected(&self) -> &[ItemHandle] {
        &self.connected
    }

    pub(crate) fn set_connectivity(&mut self, connected: Vec<ItemHandle>, anchor_neighbors: Vec<u32>) {
        self.connected = connected;
        self.anchor_neighbors = anchor_neighbors;
    }

    /// Count of distinct other items touching the given anchor
    pub fn anchor_neighbor_count(&self, index: u32) -> u32 {
        self.anchor_neighbors.get(index as usize).copied().unwrap_or(0)
    }

    /// Drop handles that no longer resolve to a valid item, using the
    /// caller's liveness check. Run during compaction.
    pub fn remove_invalid_refs(&mut self, is_alive: impl Fn(ItemHandle) -> bool) {
        self.connected.retain(|&h| is_alive(h));
    }

    /// Conservative bounding box in board units, inflated by one unit so
    /// exact-coincidence candidates always intersect envelopes
    pub fn bounds(&self) -> ([i32; 2], [i32; 2]) {
        let (min, max) = match &self.shape {
            ItemShape::Pad { position, shape } => {
                let (hw, hh) = match shape {
                    PadShape::Circle { diameter } => (diameter / 2, diameter / 2),
                    PadShape::Rect { width, height } => (width / 2, height / 2),
                };
                (
                    [position.x.saturating_sub(hw), position.y.saturating_sub(hh)],
                    [position.x.saturating_add(hw), position.y.saturating_add(hh)],
                )
            }
            ItemShape::Track { start, end, width } => {
                let hw = width / 2;
                (
                    [
                        start.x.min(end.x).saturating_sub(hw),
                        start.y.min(end.y).saturating_sub(hw),
                    ],
                    [
                        start.x.max(end.x).saturating_add(hw),
                        start.y.max(end.y).saturating_add(hw),
                    ],
                )
            }
            ItemShape::Via { position, diameter } => {
                let r = diameter / 2;
                (
                    [position.x.saturating_sub(r), position.y.saturating_sub(r)],
                    [position.x.saturating_add(r), position.y.saturating_add(r)],
                )
            }
            ItemShape::ZoneIsland { outline } => {
                let mut min = [i32::MAX, i32::MAX];
                let mut max = [i32::MIN, i32::MIN];
                for p in outline {
                    min[0] = min[0].min(p.x);
                    min[1] = min[1].min(p.y);
                    max[0] = max[0].max(p.x);
                    max[1] = max[1].max(p.y);
                }
                (min, max)
            }
        };
        (
            [min[0].saturating_sub(1), min[1].saturating_sub(1)],
            [max[0].saturating_add(1), max[1].saturating_add(1)],
        )
    }
}
