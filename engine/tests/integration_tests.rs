extern crate ocean_routing_engine;

use ocean_routing_engine::{
    algo::{contraction::*, dijkstra, hub_labels::*, Query, RoutingResult},
    datastr::{graph::*, node_order::NodeOrder},
    import,
    io::{Deconstruct, Reconstruct},
};

// The 5 node ring with one cheap and one pricey way around.
//
//        1       2
//    0 ----- 1 ----- 2
//    |               |
//    | 2             | 1
//    |       3       |
//    4 ------------- 3
//
const RING: [(NodeId, NodeId, Weight); 5] = [(0, 1, 1), (1, 2, 2), (2, 3, 1), (3, 4, 3), (4, 0, 2)];

// A 4x4 grid, node x + 4 * y, with deterministic but uneven weights.
fn grid_edges() -> Vec<(NodeId, NodeId, Weight)> {
    let mut edges = Vec::new();
    for y in 0..4u32 {
        for x in 0..4u32 {
            let node = x + 4 * y;
            if x + 1 < 4 {
                edges.push((node, node + 1, (3 * node + 7 * x) % 9 + 1));
            }
            if y + 1 < 4 {
                edges.push((node, node + 4, (5 * node + 2 * y) % 9 + 1));
            }
        }
    }
    edges
}

fn contracted(edges: &[(NodeId, NodeId, Weight)], n: usize, order: &NodeOrder) -> DynamicGraph {
    let mut graph = DynamicGraph::new(vec![0.0; n], vec![0.0; n], edges);
    ContractionHierarchyBuilder::new(&mut graph).run(order);
    graph
}

fn build_server(edges: &[(NodeId, NodeId, Weight)], n: usize, order: NodeOrder, hl_level: u32) -> (Server, dijkstra::Server) {
    let graph = contracted(edges, n, &order);
    let oracle = dijkstra::Server::new(&graph);
    let labels = HubLabelBuilder::new(&graph, &order, hl_level).compute();
    let server = Server::new(LabelStore::new(&graph, order, hl_level, &labels));
    (server, oracle)
}

/// The path must connect the endpoints through existing original edges and
/// sum up to the reported distance; an unreachable result must be empty.
fn assert_path_consistent(edges: &[(NodeId, NodeId, Weight)], result: &RoutingResult, from: NodeId, to: NodeId) {
    match result.distance {
        Some(distance) => {
            assert_eq!(result.path.first(), Some(&from));
            assert_eq!(result.path.last(), Some(&to));
            let mut total = 0;
            for pair in result.path.windows(2) {
                let weight = edges
                    .iter()
                    .filter(|&&(a, b, _)| (a, b) == (pair[0], pair[1]) || (b, a) == (pair[0], pair[1]))
                    .map(|&(_, _, weight)| weight)
                    .min()
                    .expect("path uses a nonexistent edge");
                total += weight;
            }
            assert_eq!(total, distance, "path weights do not sum up to the reported distance");
        }
        None => assert!(result.path.is_empty()),
    }
}

#[test]
fn contracting_the_ring_creates_the_expected_shortcut() {
    let order = NodeOrder::from_node_order(vec![2, 0, 1, 3, 4]);
    let graph = contracted(&RING, 5, &order);

    // contracting node 2 first must bridge 1 and 3
    let shortcut = graph
        .all_neighbors(1)
        .iter()
        .copied()
        .find(|&edge| graph.is_shortcut(edge) && graph.head(edge) == 3)
        .expect("no shortcut from 1 to 3 was created");
    assert_eq!(graph.weight(shortcut), 3);

    let (first, second) = graph.shortcut_parts(shortcut).unwrap();
    assert_eq!(graph.head(first), 2);
    assert_eq!(graph.head(second), 3);
    assert_eq!(graph.weight(first) + graph.weight(second), 3);
}

#[test]
fn ring_query_takes_the_cheap_side() {
    let order = NodeOrder::from_node_order(vec![2, 0, 1, 3, 4]);
    let (mut server, _) = build_server(&RING, 5, order, 0);

    let result = server.route(Query { from: 0, to: 2 }).unwrap();
    assert_eq!(result.distance, Some(3));
    assert_eq!(result.path, vec![0, 1, 2]);
}

#[test]
fn shortcut_weights_unpack_to_original_edges() {
    let edges = grid_edges();
    let graph = contracted(&edges, 16, &random_order(16, 7));

    for shortcut in graph.num_original_edges() as EdgeId..graph.num_edges() as EdgeId {
        let (first, second) = graph.shortcut_parts(shortcut).unwrap();
        assert_eq!(graph.weight(first) + graph.weight(second), graph.weight(shortcut));

        // fully unpacked, the shortcut must be a consistent chain of original edges
        let mut stack = vec![shortcut];
        let mut originals = Vec::new();
        while let Some(edge) = stack.pop() {
            if let Some((first, second)) = graph.shortcut_parts(edge) {
                stack.push(second);
                stack.push(first);
            } else {
                originals.push(edge);
            }
        }
        assert_eq!(graph.tail(originals[0]), graph.tail(shortcut));
        assert_eq!(graph.head(*originals.last().unwrap()), graph.head(shortcut));
        for pair in originals.windows(2) {
            assert_eq!(graph.head(pair[0]), graph.tail(pair[1]));
        }
        let total: Weight = originals.iter().map(|&edge| graph.weight(edge)).sum();
        assert_eq!(total, graph.weight(shortcut));
    }
}

#[test]
fn all_pairs_match_dijkstra_with_full_labels() {
    let edges = grid_edges();
    let (mut server, mut oracle) = build_server(&edges, 16, random_order(16, 7), 0);

    for from in 0..16 {
        for to in 0..16 {
            let result = server.route(Query { from, to }).unwrap();
            assert_eq!(result.distance, oracle.distance(from, to), "query {} -> {}", from, to);
            assert_path_consistent(&edges, &result, from, to);
        }
    }
}

#[test]
fn fallback_cases_match_dijkstra() {
    let edges = grid_edges();

    // a mid threshold mixes all four labeled/unlabeled endpoint cases,
    // the full threshold forces the temporary label path for every query
    for hl_level in [8, 16] {
        let (mut server, mut oracle) = build_server(&edges, 16, random_order(16, 13), hl_level);

        for from in 0..16 {
            for to in 0..16 {
                let result = server.route(Query { from, to }).unwrap();
                assert_eq!(
                    result.distance,
                    oracle.distance(from, to),
                    "query {} -> {} at level {}",
                    from,
                    to,
                    hl_level
                );
                assert_path_consistent(&edges, &result, from, to);
            }
        }
    }
}

#[test]
fn queries_are_symmetric() {
    let edges = grid_edges();
    let (mut server, _) = build_server(&edges, 16, random_order(16, 21), 5);

    for from in 0..16 {
        for to in from + 1..16 {
            let forward = server.route(Query { from, to }).unwrap();
            let backward = server.route(Query { from: to, to: from }).unwrap();
            assert_eq!(forward.distance, backward.distance, "asymmetry between {} and {}", from, to);
        }
    }
}

#[test]
fn unreachable_pairs_yield_empty_results() {
    let edges = [(0, 1, 1), (1, 2, 2), (3, 4, 1), (4, 5, 2)];
    let (mut server, _) = build_server(&edges, 6, random_order(6, 3), 0);

    let result = server.route(Query { from: 0, to: 4 }).unwrap();
    assert_eq!(result.distance, None);
    assert!(result.path.is_empty());

    let result = server.route(Query { from: 1, to: 0 }).unwrap();
    assert_eq!(result.distance, Some(1));
}

#[test]
fn interleaved_queries_leak_no_state() {
    let edges = grid_edges();
    let queries = [(0, 15), (12, 3), (5, 5), (9, 0), (15, 14), (2, 13)];

    let mut single_shot = Vec::new();
    for &(from, to) in &queries {
        let (mut fresh, _) = build_server(&edges, 16, random_order(16, 5), 6);
        single_shot.push(fresh.route(Query { from, to }).unwrap());
    }

    let (mut server, _) = build_server(&edges, 16, random_order(16, 5), 6);
    for (&(from, to), expected) in queries.iter().zip(&single_shot) {
        let result = server.route(Query { from, to }).unwrap();
        assert_eq!(result.distance, expected.distance);
        assert_eq!(result.path, expected.path);
    }
}

#[test]
fn big_mesh_queries_match_dijkstra() {
    // large enough that label construction runs in multiple batches and
    // later labels get assembled by merging earlier ones
    let size = 25u32;
    let n = (size * size) as usize;
    let mut edges = Vec::new();
    for y in 0..size {
        for x in 0..size {
            let node = x + size * y;
            if x + 1 < size {
                edges.push((node, node + 1, (7 * node + 3 * x) % 20 + 1));
            }
            if y + 1 < size {
                edges.push((node, node + size, (11 * node + 5 * y) % 20 + 1));
            }
        }
    }

    for hl_level in [0, 300] {
        let (mut server, mut oracle) = build_server(&edges, n, random_order(n, 1234), hl_level);

        // a deterministic spread of query pairs
        let mut state = 1u64;
        let mut draw = || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (state >> 33) as u32 % n as u32
        };
        for _ in 0..200 {
            let (from, to) = (draw(), draw());
            let result = server.route(Query { from, to }).unwrap();
            assert_eq!(
                result.distance,
                oracle.distance(from, to),
                "query {} -> {} at level {}",
                from,
                to,
                hl_level
            );
            assert_path_consistent(&edges, &result, from, to);
        }
    }
}

#[test]
fn label_store_survives_disk_round_trip() {
    let edges = grid_edges();
    let order = random_order(16, 7);
    let graph = contracted(&edges, 16, &order);
    let labels = HubLabelBuilder::new(&graph, &order, 4).compute();
    let store = LabelStore::new(&graph, order, 4, &labels);

    let dir = std::env::temp_dir().join(format!("hl_store_test_{}", std::process::id()));
    store.deconstruct_to(&dir).unwrap();
    let reloaded = LabelStore::reconstruct_from(&dir).unwrap();
    std::fs::remove_dir_all(&dir).unwrap();

    let mut server = Server::new(store);
    let mut reloaded_server = Server::new(reloaded);
    for from in 0..16 {
        for to in 0..16 {
            let expected = server.route(Query { from, to }).unwrap();
            let result = reloaded_server.route(Query { from, to }).unwrap();
            assert_eq!(result.distance, expected.distance);
            assert_eq!(result.path, expected.path);
        }
    }
}

#[test]
fn missing_store_reports_an_error() {
    let dir = std::env::temp_dir().join("hl_store_that_does_not_exist");
    assert!(LabelStore::reconstruct_from(&dir).is_err());
}

#[test]
fn exchange_format_round_trip_through_files() {
    let source = import::ImportedGraph {
        latitude: vec![54.5, 54.0, 53.75],
        longitude: vec![8.25, 8.5, 9.0],
        edges: vec![(0, 1, 1234), (1, 2, 999), (2, 0, 17)],
    };

    let file = std::env::temp_dir().join(format!("hl_graph_test_{}", std::process::id()));
    import::write_graph(&source, &file).unwrap();
    let reread = import::read_graph(&file).unwrap();
    std::fs::remove_file(&file).unwrap();

    assert_eq!(source, reread);
}
