//! CLI tool for exercising the connectivity engine without an editor
//!
//! Builds a small demonstration board (two tracks bridged by a via, a short
//! between two declared nets, and a zone-fed pad), rebuilds the graph, and
//! prints clusters, conflicts, and dangling anchors.
//!
//! Usage:
//!   cargo run --release --bin connectivity_probe

use pcb_connectivity::{
    BoardItem, ConnectivityGraph, ItemHandle, LayerId, LayerSet, NetCode, PadShape, Point,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .init();

    let mut graph = ConnectivityGraph::new();
    let mut named: Vec<(&str, ItemHandle)> = Vec::new();

    // Two-layer route joined by a via
    named.push((
        "track F.Cu",
        graph.add_item(&BoardItem::Track {
            start: Point::new(0, 0),
            end: Point::new(50, 50),
            width: 250,
            layer: LayerId::FRONT,
            net: NetCode(1),
        }),
    ));
    named.push((
        "via",
        graph.add_item(&BoardItem::Via {
            position: Point::new(50, 50),
            diameter: 600,
            span: (LayerId::FRONT, LayerId::BACK),
            net: NetCode(1),
        }),
    ));
    named.push((
        "track B.Cu",
        graph.add_item(&BoardItem::Track {
            start: Point::new(50, 50),
            end: Point::new(100, 100),
            width: 250,
            layer: LayerId::BACK,
            net: NetCode(1),
        }),
    ));

    // Two pads on different declared nets, shorted by overlap
    named.push((
        "pad net 2",
        graph.add_item(&BoardItem::Pad {
            position: Point::new(5000, 0),
            shape: PadShape::Circle { diameter: 800 },
            layers: LayerSet::single(LayerId::FRONT),
            net: NetCode(2),
        }),
    ));
    named.push((
        "pad net 3",
        graph.add_item(&BoardItem::Pad {
            position: Point::new(5400, 0),
            shape: PadShape::Circle { diameter: 800 },
            layers: LayerSet::single(LayerId::FRONT),
            net: NetCode(3),
        }),
    ));

    // A pad sitting inside a filled zone island
    named.push((
        "zone island",
        graph.add_item(&BoardItem::ZoneIsland {
            outline: vec![
                Point::new(10_000, 0),
                Point::new(20_000, 0),
                Point::new(20_000, 10_000),
                Point::new(10_000, 10_000),
            ],
            layer: LayerId::BACK,
            net: NetCode(4),
        }),
    ));
    named.push((
        "pad in zone",
        graph.add_item(&BoardItem::Pad {
            position: Point::new(15_000, 5_000),
            shape: PadShape::Circle { diameter: 900 },
            layers: LayerSet::span(LayerId::FRONT, LayerId::BACK),
            net: NetCode(4),
        }),
    ));

    let generation = graph.rebuild();
    println!("generation {generation}: {} clusters", graph.clusters().len());

    for (idx, cluster) in graph.clusters().iter().enumerate() {
        println!(
            "  cluster {idx}: {} members, net {:?}, conflict={}",
            cluster.members.len(),
            cluster.origin_net,
            cluster.conflict
        );
    }

    for (label, handle) in &named {
        let dangling: Vec<u32> = (0..graph
            .item(*handle)
            .map(|i| i.anchor_count())
            .unwrap_or(0))
            .filter(|&a| graph.is_dangling(*handle, a).unwrap_or(false))
            .collect();
        println!(
            "  {label}: net {:?}, {} connected, dangling anchors {:?}",
            graph.net_of(*handle),
            graph.connected_items(*handle).len(),
            dangling
        );
    }

    let conflicts = graph.conflicts();
    println!("{} conflicting cluster(s)", conflicts.len());
}
