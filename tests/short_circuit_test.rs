// Conflict detection: clusters mixing distinct declared nets are shorts;
// identical declared nets with disjoint geometry stay separate clusters.

use pcb_connectivity::{
    BoardItem, ConnectivityGraph, LayerId, LayerSet, NetCode, PadShape, Point,
};

#[cfg(test)]
mod tests {
    use super::*;

    fn pad(x: i32, y: i32, net: i32) -> BoardItem {
        BoardItem::Pad {
            position: Point::new(x, y),
            shape: PadShape::Circle { diameter: 600 },
            layers: LayerSet::single(LayerId::FRONT),
            net: NetCode(net),
        }
    }

    fn track(start: Point, end: Point) -> BoardItem {
        BoardItem::Track { start, end, width: 250, layer: LayerId::FRONT, net: NetCode::NONE }
    }

    #[test]
    fn test_track_joining_two_nets_is_a_conflict() {
        let mut graph = ConnectivityGraph::new();
        let gnd = graph.add_item(&pad(0, 0, 1));
        graph.add_item(&pad(10_000, 0, 2));
        graph.add_item(&track(Point::new(0, 0), Point::new(10_000, 0)));
        graph.rebuild();

        assert_eq!(graph.clusters().len(), 1);
        let conflicts = graph.conflicts();
        assert_eq!(conflicts.len(), 1);
        assert!(conflicts[0].conflict);
        assert_eq!(conflicts[0].members.len(), 3);

        // origin resolves to the lowest-handled pad with a declared net
        assert_eq!(conflicts[0].origin_pad, Some(gnd));
        assert_eq!(conflicts[0].origin_net, NetCode(1));
    }

    #[test]
    fn test_no_net_pad_never_conflicts() {
        let mut graph = ConnectivityGraph::new();
        graph.add_item(&pad(0, 0, 1));
        graph.add_item(&pad(10_000, 0, 0)); // no net
        graph.add_item(&track(Point::new(0, 0), Point::new(10_000, 0)));
        graph.rebuild();

        assert_eq!(graph.clusters().len(), 1);
        assert!(graph.conflicts().is_empty());
        assert_eq!(graph.clusters()[0].origin_net, NetCode(1));
    }

    #[test]
    fn test_same_net_disjoint_geometry_stays_split() {
        let mut graph = ConnectivityGraph::new();
        let x = graph.add_item(&pad(0, 0, 7));
        let y = graph.add_item(&pad(1_000_000, 1_000_000, 7));
        graph.rebuild();

        // identical declared nets do not merge clusters without copper
        assert_eq!(graph.clusters().len(), 2);
        assert!(graph.conflicts().is_empty());
        assert_eq!(graph.net_of(x), NetCode(7));
        assert_eq!(graph.net_of(y), NetCode(7));
        assert!(!graph.cluster_of(x).unwrap().contains(y));
    }

    #[test]
    fn test_overlapping_pads_short_directly() {
        let mut graph = ConnectivityGraph::new();
        graph.add_item(&pad(0, 0, 1));
        graph.add_item(&pad(500, 0, 2)); // rims overlap (600 diameter)
        graph.rebuild();

        assert_eq!(graph.conflicts().len(), 1);
    }

    #[test]
    fn test_net_of_propagates_through_unnetted_copper() {
        let mut graph = ConnectivityGraph::new();
        graph.add_item(&pad(0, 0, 5));
        let t1 = graph.add_item(&track(Point::new(0, 0), Point::new(2_000, 0)));
        let t2 = graph.add_item(&track(Point::new(2_000, 0), Point::new(4_000, 0)));
        graph.rebuild();

        // edit tools re-derive nets from the cluster origin
        assert_eq!(graph.net_of(t1), NetCode(5));
        assert_eq!(graph.net_of(t2), NetCode(5));
    }
}
