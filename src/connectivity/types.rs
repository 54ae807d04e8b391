//! Core types for board connectivity data
//!
//! This module contains the fundamental types used throughout the engine:
//! board-unit points, copper layer sets, net codes, pad shapes, and the
//! `BoardItem` input model consumed from the board/editor layer.

use serde::Serialize;

/// Number of copper layers in the stack. Layer 0 is the front (top) copper,
/// layer `COPPER_LAYER_COUNT - 1` is the back (bottom) copper.
pub const COPPER_LAYER_COUNT: u8 = 32;

/// A 2D point in integer board units (nanometres)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A single copper layer identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LayerId(pub u8);

impl LayerId {
    /// Front (top) copper
    pub const FRONT: LayerId = LayerId(0);
    /// Back (bottom) copper
    pub const BACK: LayerId = LayerId(COPPER_LAYER_COUNT - 1);
}

/// A set of copper layers, stored as a bit mask over the copper stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct LayerSet(u32);

impl LayerSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    /// All copper layers (through-hole span)
    pub const fn all_copper() -> Self {
        Self(u32::MAX)
    }

    /// A layer reference outside the copper stack yields the empty set, so
    /// the item carrying it gets rejected at wrap time
    pub fn single(layer: LayerId) -> Self {
        if layer.0 >= COPPER_LAYER_COUNT {
            return Self::empty();
        }
        Self(1u32 << layer.0)
    }

    /// Inclusive span between two layers, in either order. Endpoints
    /// outside the copper stack yield the empty set.
    pub fn span(a: LayerId, b: LayerId) -> Self {
        let (lo, hi) = if a.0 <= b.0 { (a.0, b.0) } else { (b.0, a.0) };
        if hi >= COPPER_LAYER_COUNT {
            return Self::empty();
        }
        let width = hi - lo + 1;
        let mask = if width >= 32 { u32::MAX } else { ((1u32 << width) - 1) << lo };
        Self(mask)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, layer: LayerId) -> bool {
        layer.0 < COPPER_LAYER_COUNT && self.0 & (1u32 << layer.0) != 0
    }

    pub fn intersects(self, other: LayerSet) -> bool {
        self.0 & other.0 != 0
    }

    /// Lowest-numbered layer in the set, if any
    pub fn first(self) -> Option<LayerId> {
        if self.0 == 0 {
            None
        } else {
            Some(LayerId(self.0.trailing_zeros() as u8))
        }
    }

    /// True if the set spans both outer copper layers (a through item)
    pub fn is_through(self) -> bool {
        self.contains(LayerId::FRONT) && self.contains(LayerId::BACK)
    }
}

/// Declared electrical net of a board item. `NetCode::NONE` is the
/// "no net" sentinel for unassigned or unrouted copper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NetCode(pub i32);

impl NetCode {
    pub const NONE: NetCode = NetCode(0);

    pub fn is_set(self) -> bool {
        self != NetCode::NONE
    }
}

/// Pad shape primitive, centred on the pad position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PadShape {
    Circle { diameter: i32 },
    Rect { width: i32, height: i32 },
}

/// A copper-bearing board item as supplied by the board/editor layer.
///
/// This is the input side of the engine: each variant carries the geometry
/// and declared net the connectivity wrapper needs. Positions are in integer
/// board units; pad/track/via sizes are full widths/diameters.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardItem {
    Pad {
        position: Point,
        shape: PadShape,
        /// Copper layer membership. A mask spanning both outer layers is
        /// treated as a through-hole pad (full copper range); otherwise the
        /// first layer found in the mask is used (surface-mount).
        layers: LayerSet,
        net: NetCode,
    },
    Track {
        start: Point,
        end: Point,
        width: i32,
        layer: LayerId,
        net: NetCode,
    },
    Via {
        position: Point,
        diameter: i32,
        /// Copper span the via connects, inclusive at both ends
        span: (LayerId, LayerId),
        net: NetCode,
    },
    /// One disjoint filled island of a copper-pour zone, as produced by the
    /// external fill engine. The outline is an ordered polygon in board
    /// units; vertex 0 is the island's representative ratsnest anchor.
    ZoneIsland {
        outline: Vec<Point>,
        layer: LayerId,
        net: NetCode,
    },
}

impl BoardItem {
    pub fn kind(&self) -> ItemKind {
        match self {
            BoardItem::Pad { .. } => ItemKind::Pad,
            BoardItem::Track { .. } => ItemKind::Track,
            BoardItem::Via { .. } => ItemKind::Via,
            BoardItem::ZoneIsland { .. } => ItemKind::ZoneIsland,
        }
    }

    pub fn net(&self) -> NetCode {
        match self {
            BoardItem::Pad { net, .. }
            | BoardItem::Track { net, .. }
            | BoardItem::Via { net, .. }
            | BoardItem::ZoneIsland { net, .. } => *net,
        }
    }
}

/// Connectivity item kind tag. Ordering is kind-major and drives the
/// deterministic member walk during cluster net resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ItemKind {
    Pad,
    Track,
    Via,
    ZoneIsland,
}

impl ItemKind {
    pub const ALL: [ItemKind; 4] = [
        ItemKind::Pad,
        ItemKind::Track,
        ItemKind::Via,
        ItemKind::ZoneIsland,
    ];

    /// Minimum count of touching neighbours for an anchor of this kind to
    /// be considered connected. A via touching only one side is a stub.
    pub fn min_anchor_neighbors(self) -> u32 {
        match self {
            ItemKind::Via => 2,
            ItemKind::Pad | ItemKind::Track | ItemKind::ZoneIsland => 1,
        }
    }
}

/// An anchor: one connection point owned by exactly one item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Anchor {
    pub position: Point,
    pub item: super::ItemHandle,
    pub index: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_span() {
        let span = LayerSet::span(LayerId(2), LayerId(5));
        assert!(!span.contains(LayerId(1)));
        assert!(span.contains(LayerId(2)));
        assert!(span.contains(LayerId(5)));
        assert!(!span.contains(LayerId(6)));
        assert_eq!(span.first(), Some(LayerId(2)));

        // reversed endpoints normalise
        assert_eq!(span, LayerSet::span(LayerId(5), LayerId(2)));
    }

    #[test]
    fn test_layer_set_through() {
        assert!(LayerSet::all_copper().is_through());
        assert!(LayerSet::span(LayerId::FRONT, LayerId::BACK).is_through());
        assert!(!LayerSet::single(LayerId::FRONT).is_through());
        assert!(LayerSet::single(LayerId::FRONT).intersects(LayerSet::all_copper()));
        assert!(!LayerSet::single(LayerId::FRONT).intersects(LayerSet::single(LayerId::BACK)));
    }

    #[test]
    fn test_out_of_range_layer_yields_empty_set() {
        assert!(LayerSet::single(LayerId(COPPER_LAYER_COUNT)).is_empty());
        assert!(LayerSet::span(LayerId(0), LayerId(40)).is_empty());
        assert!(LayerSet::span(LayerId(200), LayerId(200)).is_empty());
        assert!(!LayerSet::single(LayerId::BACK).is_empty());
    }

    #[test]
    fn test_net_code_sentinel() {
        assert!(!NetCode::NONE.is_set());
        assert!(NetCode(3).is_set());
    }
}
