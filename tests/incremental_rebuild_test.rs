// Incremental rebuilds must answer every query exactly as a full rebuild
// of the same board state would.

use pcb_connectivity::{
    BoardItem, ConnectivityGraph, ItemHandle, LayerId, LayerSet, NetCode, PadShape, Point,
};
use std::collections::HashSet;

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

fn island(origin: Point, size: i32, layer: LayerId) -> BoardItem {
    BoardItem::ZoneIsland {
        outline: vec![
            origin,
            Point::new(origin.x + size, origin.y),
            Point::new(origin.x + size, origin.y + size),
            Point::new(origin.x, origin.y + size),
        ],
        layer,
        net: NetCode::NONE,
    }
}

/// Everything a consumer can observe about the published generation
#[derive(Debug, PartialEq)]
struct Observation {
    clusters: Vec<Vec<ItemHandle>>,
    nets: Vec<(ItemHandle, NetCode)>,
    dangling: Vec<(ItemHandle, u32, Option<bool>)>,
    conflicts: usize,
}

fn observe(graph: &ConnectivityGraph, handles: &[ItemHandle]) -> Observation {
    let mut clusters: Vec<Vec<ItemHandle>> =
        graph.clusters().iter().map(|c| c.members.clone()).collect();
    clusters.sort();
    Observation {
        clusters,
        nets: handles.iter().map(|&h| (h, graph.net_of(h))).collect(),
        dangling: handles
            .iter()
            .flat_map(|&h| {
                let count = graph.item(h).map(|i| i.anchor_count()).unwrap_or(0).max(1);
                (0..count).map(move |a| (h, a, graph.is_dangling(h, a)))
            })
            .collect(),
        conflicts: graph.conflicts().len(),
    }
}

/// Incremental publish, observed, then verified against a full rebuild of
/// the identical state
fn assert_incremental_matches_full(
    graph: &mut ConnectivityGraph,
    changed: &[ItemHandle],
    handles: &[ItemHandle],
) {
    graph.rebuild_incremental(changed);
    let incremental = observe(graph, handles);
    graph.rebuild();
    let full = observe(graph, handles);
    assert_eq!(incremental, full);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_added_then_removed() {
        let mut graph = ConnectivityGraph::new();
        let a = graph.add_item(&pad(0, 0, 1));
        let b = graph.add_item(&pad(10_000, 0, 1));
        let c = graph.add_item(&pad(20_000, 0, 2));
        graph.rebuild();
        assert_eq!(graph.clusters().len(), 3);

        // joining two clusters incrementally
        let bridge = graph.add_item(&track(Point::new(0, 0), Point::new(10_000, 0)));
        assert_incremental_matches_full(&mut graph, &[bridge], &[a, b, c, bridge]);
        assert_eq!(graph.clusters().len(), 2);

        // splitting them again
        graph.remove_item(bridge).unwrap();
        assert_incremental_matches_full(&mut graph, &[bridge], &[a, b, c]);
        assert_eq!(graph.clusters().len(), 3);
    }

    #[test]
    fn test_geometry_update_moves_item_between_clusters() {
        let mut graph = ConnectivityGraph::new();
        let a = graph.add_item(&pad(0, 0, 1));
        let b = graph.add_item(&pad(10_000, 0, 2));
        let t = graph.add_item(&track(Point::new(0, 0), Point::new(2_000, 0)));
        graph.rebuild();
        assert_eq!(graph.net_of(t), NetCode(1));

        // re-route the stub over to the other pad
        graph
            .update_item(t, &track(Point::new(10_000, 0), Point::new(8_000, 0)))
            .unwrap();
        assert_incremental_matches_full(&mut graph, &[t], &[a, b, t]);
        assert_eq!(graph.net_of(t), NetCode(2));
    }

    #[test]
    fn test_edit_chain_stays_equivalent() {
        let mut graph = ConnectivityGraph::new();
        let mut handles: Vec<ItemHandle> = Vec::new();
        for i in 0..6 {
            handles.push(graph.add_item(&pad(i * 10_000, 0, i + 1)));
        }
        graph.rebuild();

        // chain the pads together one link at a time, each link incremental
        for i in 0..5 {
            let link = graph.add_item(&track(
                Point::new(i * 10_000, 0),
                Point::new((i + 1) * 10_000, 0),
            ));
            handles.push(link);
            let snapshot = handles.clone();
            assert_incremental_matches_full(&mut graph, &[link], &snapshot);
        }
        assert_eq!(graph.clusters().len(), 1);
        assert_eq!(graph.conflicts().len(), 1); // six declared nets shorted

        // tear one middle link out again
        let mid = handles[8];
        graph.remove_item(mid).unwrap();
        let snapshot: Vec<ItemHandle> = handles.iter().copied().filter(|&h| h != mid).collect();
        assert_incremental_matches_full(&mut graph, &[mid], &snapshot);
        assert_eq!(graph.clusters().len(), 2);
    }

    #[test]
    fn test_incremental_absorbs_zone_and_via_clusters() {
        let mut graph = ConnectivityGraph::new();
        // front-side pad with a stub, back-side island: two clusters
        let p = graph.add_item(&pad(0, 0, 1));
        let t = graph.add_item(&track(Point::new(0, 0), Point::new(5_000, 0)));
        let z = graph.add_item(&island(Point::new(4_000, -1_000), 4_000, LayerId::BACK));
        graph.rebuild();
        assert_eq!(graph.clusters().len(), 2);

        // a via at the stub end bridges the layers; both kept clusters
        // must be absorbed into the recomputed neighbourhood
        let v = graph.add_item(&BoardItem::Via {
            position: Point::new(5_000, 0),
            diameter: 600,
            span: (LayerId::FRONT, LayerId::BACK),
            net: NetCode::NONE,
        });
        assert_incremental_matches_full(&mut graph, &[v], &[p, t, z, v]);
        assert_eq!(graph.clusters().len(), 1);
        assert_eq!(graph.net_of(z), NetCode(1));

        // removing it splits the layers again
        graph.remove_item(v).unwrap();
        assert_incremental_matches_full(&mut graph, &[v], &[p, t, z]);
        assert_eq!(graph.clusters().len(), 2);
        assert_eq!(graph.net_of(z), NetCode::NONE);
    }

    #[test]
    fn test_update_to_malformed_geometry_goes_incremental() {
        let mut graph = ConnectivityGraph::new();
        let a = graph.add_item(&pad(0, 0, 1));
        let b = graph.add_item(&pad(10_000, 0, 2));
        let t = graph.add_item(&track(Point::new(0, 0), Point::new(10_000, 0)));
        graph.rebuild();
        assert_eq!(graph.conflicts().len(), 1);

        // collapsing the bridge to zero length invalidates it in place
        graph
            .update_item(t, &track(Point::new(0, 0), Point::new(0, 0)))
            .unwrap();
        assert_incremental_matches_full(&mut graph, &[t], &[a, b]);
        assert!(graph.conflicts().is_empty());
        assert_eq!(graph.clusters().len(), 2);
        assert!(graph.cluster_of(t).is_none());
    }

    #[test]
    fn test_incremental_uses_internally_pending_edits() {
        let mut graph = ConnectivityGraph::new();
        let a = graph.add_item(&pad(0, 0, 1));
        graph.rebuild();

        // mutations recorded since the last publish are picked up even when
        // the caller passes no changed handles
        let t = graph.add_item(&track(Point::new(0, 0), Point::new(3_000, 0)));
        graph.rebuild_incremental(&[]);
        assert!(graph.cluster_of(a).unwrap().contains(t));
    }

    #[test]
    fn test_partition_invariant_holds_after_edits() {
        let mut graph = ConnectivityGraph::new();
        let mut handles = Vec::new();
        for i in 0..4 {
            handles.push(graph.add_item(&pad(i * 10_000, 0, 1)));
            handles.push(graph.add_item(&track(
                Point::new(i * 10_000, 0),
                Point::new(i * 10_000 + 3_000, 0),
            )));
        }
        graph.rebuild();
        graph.remove_item(handles[3]).unwrap();
        graph.rebuild_incremental(&[]);

        let mut seen: HashSet<ItemHandle> = HashSet::new();
        let mut total = 0;
        for cluster in graph.clusters() {
            for &m in &cluster.members {
                assert!(seen.insert(m), "item appears in two clusters");
                total += 1;
            }
        }
        assert_eq!(total, 7, "every surviving valid item is clustered exactly once");
    }
}
