// Random point-to-point queries against a label store, checked against the
// dijkstra oracle over the original edges.
//
// Args: <label store directory>

#[macro_use]
extern crate ocean_routing_engine;

use ocean_routing_engine::{
    algo::{dijkstra, hub_labels::*, Query},
    cli::CliErr,
    io::*,
    report::*,
};
use rand::prelude::*;
use std::{env, error::Error, path::Path};

const NUM_QUERIES: usize = 1000;

fn main() -> Result<(), Box<dyn Error>> {
    let _reporter = enable_reporting("hl_queries");

    let arg = env::args().nth(1).ok_or(CliErr("No label store directory arg given"))?;
    let path = Path::new(&arg);

    let store = report_time_with_key("loading label store", "load_running_time_ms", || {
        LabelStore::reconstruct_from(&path)
    })?;
    let n = store.num_nodes();
    report!("num_nodes", n);
    report!("hl_level", store.hl_level());

    let mut oracle = dijkstra::Server::from_store(&store);
    let mut server = Server::new(store);

    let mut rng = StdRng::seed_from_u64(42);
    let mut total_ms = 0.0;
    let mut num_unreachable = 0;

    {
        let mut queries_ctxt = push_collection_context("queries".to_string());
        for _ in 0..NUM_QUERIES {
            let _query_ctxt = queries_ctxt.push_collection_item();
            let from = rng.gen_range(0..n as u32);
            let to = rng.gen_range(0..n as u32);
            report!("from", from);
            report!("to", to);

            let result = match server.route(Query { from, to }) {
                Ok(result) => result,
                Err(err) => {
                    // a single bad query must not kill the run
                    eprintln!("query {} -> {} failed: {}", from, to, err);
                    report!("error", format!("{}", err));
                    continue;
                }
            };
            report!("distance", result.distance);
            report!("running_time_ms", result.time_ms);
            total_ms += result.time_ms;
            if result.distance.is_none() {
                num_unreachable += 1;
            }

            let reference = oracle.distance(from, to);
            assert_eq!(result.distance, reference, "hub label distance deviates from dijkstra");
        }
    }

    report!("num_queries", NUM_QUERIES);
    report!("num_unreachable", num_unreachable);
    report!("avg_query_time_ms", total_ms / NUM_QUERIES as f64);

    Ok(())
}
