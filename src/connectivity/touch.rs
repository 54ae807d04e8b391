//! Touch predicates
//!
//! The exact rules for "item A touches item B". One tolerance policy
//! applies everywhere: endpoint and anchor checks use exact integer
//! coincidence, shape tests use exact overlap in i64 arithmetic (doubled
//! coordinates, so half-widths never round). The same predicate runs during
//! index candidate filtering and during clustering.
//!
//! Matrix:
//! - track x track: shared endpoint
//! - track x pad/via: endpoint on the anchor or inside the shape
//! - pad/via x pad/via: full shape overlap
//! - zone island x other: the other item's anchors on an outline vertex or
//!   inside the filled outline
//! - zone island x zone island: either outline's vertex on or inside the other

use super::item::{ConnectivityItem, ItemShape};
use super::types::{PadShape, Point};

/// Two items are adjacent iff both are valid, they share at least one
/// copper layer, and their connection geometry coincides or overlaps
pub fn touches(a: &ConnectivityItem, b: &ConnectivityItem) -> bool {
    if !a.is_valid() || !b.is_valid() || !a.layers().intersects(b.layers()) {
        return false;
    }
    shapes_touch(a.shape(), b.shape())
}

fn shapes_touch(a: &ItemShape, b: &ItemShape) -> bool {
    use ItemShape::*;
    match (a, b) {
        (Track { start: s1, end: e1, .. }, Track { start: s2, end: e2, .. }) => {
            s1 == s2 || s1 == e2 || e1 == s2 || e1 == e2
        }
        (Track { start, end, .. }, Pad { position, shape }) => {
            start == position
                || end == position
                || point_in_pad(*start, *position, *shape)
                || point_in_pad(*end, *position, *shape)
        }
        (Track { start, end, .. }, Via { position, diameter }) => {
            start == position
                || end == position
                || point_in_circle(*start, *position, *diameter)
                || point_in_circle(*end, *position, *diameter)
        }
        (Pad { position: pa, shape: sa }, Pad { position: pb, shape: sb }) => {
            pads_overlap(*pa, *sa, *pb, *sb)
        }
        (Pad { position: pa, shape: sa }, Via { position: pb, diameter }) => {
            pads_overlap(*pa, *sa, *pb, PadShape::Circle { diameter: *diameter })
        }
        (Via { position: pa, diameter: da }, Via { position: pb, diameter: db }) => {
            pads_overlap(
                *pa,
                PadShape::Circle { diameter: *da },
                *pb,
                PadShape::Circle { diameter: *db },
            )
        }
        (ZoneIsland { outline }, Pad { position, .. })
        | (ZoneIsland { outline }, Via { position, .. }) => point_in_polygon(*position, outline),
        (ZoneIsland { outline }, Track { start, end, .. }) => {
            point_in_polygon(*start, outline) || point_in_polygon(*end, outline)
        }
        (ZoneIsland { outline: oa }, ZoneIsland { outline: ob }) => {
            oa.iter().any(|p| point_in_polygon(*p, ob))
                || ob.iter().any(|p| point_in_polygon(*p, oa))
        }
        // remaining combinations are mirrors of the ones above
        _ => shapes_touch(b, a),
    }
}

/// True if the item's connection geometry touches the point. Used for
/// per-anchor neighbour counting (dangling classification): pads, vias and
/// track endpoints count only by exact anchor coincidence, zone islands by
/// the filled-region test since an island connects anywhere in its fill.
/// Copper overhanging a nearby point does not connect that point; shape
/// containment applies to cluster formation only.
pub fn item_touches_point(item: &ConnectivityItem, p: Point) -> bool {
    if !item.is_valid() {
        return false;
    }
    match item.shape() {
        ItemShape::Pad { position, .. } | ItemShape::Via { position, .. } => *position == p,
        ItemShape::Track { start, end, .. } => *start == p || *end == p,
        ItemShape::ZoneIsland { outline } => point_in_polygon(p, outline),
    }
}

pub fn point_in_pad(p: Point, center: Point, shape: PadShape) -> bool {
    match shape {
        PadShape::Circle { diameter } => point_in_circle(p, center, diameter),
        PadShape::Rect { width, height } => {
            let dx = 2 * (p.x as i64 - center.x as i64);
            let dy = 2 * (p.y as i64 - center.y as i64);
            dx.abs() <= width as i64 && dy.abs() <= height as i64
        }
    }
}

/// Point within (or on) a circle of the given diameter, doubled coordinates
pub fn point_in_circle(p: Point, center: Point, diameter: i32) -> bool {
    let dx = 2 * (p.x as i64 - center.x as i64);
    let dy = 2 * (p.y as i64 - center.y as i64);
    let d = diameter as i64;
    dx * dx + dy * dy <= d * d
}

/// Full shape overlap between two pad-like shapes (touching counts)
pub fn pads_overlap(ca: Point, sa: PadShape, cb: Point, sb: PadShape) -> bool {
    let dx = 2 * (cb.x as i64 - ca.x as i64);
    let dy = 2 * (cb.y as i64 - ca.y as i64);
    match (sa, sb) {
        (PadShape::Circle { diameter: da }, PadShape::Circle { diameter: db }) => {
            let reach = da as i64 + db as i64;
            dx * dx + dy * dy <= reach * reach
        }
        (PadShape::Circle { diameter }, PadShape::Rect { width, height })
        | (PadShape::Rect { width, height }, PadShape::Circle { diameter }) => {
            // nearest point on the rectangle to the circle centre
            let nx = dx.clamp(-(width as i64), width as i64);
            let ny = dy.clamp(-(height as i64), height as i64);
            let rx = dx - nx;
            let ry = dy - ny;
            let d = diameter as i64;
            rx * rx + ry * ry <= d * d
        }
        (PadShape::Rect { width: wa, height: ha }, PadShape::Rect { width: wb, height: hb }) => {
            dx.abs() <= wa as i64 + wb as i64 && dy.abs() <= ha as i64 + hb as i64
        }
    }
}

/// Exact point-on-segment test (collinear and inside the bounding box)
fn point_on_segment(p: Point, a: Point, b: Point) -> bool {
    let cross = (b.x as i64 - a.x as i64) * (p.y as i64 - a.y as i64)
        - (b.y as i64 - a.y as i64) * (p.x as i64 - a.x as i64);
    if cross != 0 {
        return false;
    }
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Even-odd point-in-polygon with inclusive boundary: a point on an outline
/// vertex or edge counts as inside (touching the filled region)
pub fn point_in_polygon(p: Point, outline: &[Point]) -> bool {
    if outline.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = outline.len() - 1;
    for i in 0..outline.len() {
        let a = outline[i];
        let b = outline[j];
        if point_on_segment(p, a, b) {
            return true;
        }
        let (ax, ay) = (a.x as i64, a.y as i64);
        let (bx, by) = (b.x as i64, b.y as i64);
        let (px, py) = (p.x as i64, p.y as i64);
        if (ay > py) != (by > py) {
            // sign of (edge_x_at_py - px) without division
            let t = (bx - ax) * (py - ay) - (px - ax) * (by - ay);
            let crossing = if by > ay { t > 0 } else { t < 0 };
            if crossing {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
