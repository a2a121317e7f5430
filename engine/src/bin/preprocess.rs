// Full preprocessing toolchain: read an exchange format graph, contract it,
// build hub labels and write the label store directory.
//
// Args: <graph file> <output directory>
// Env: HL_LEVEL overrides the label level threshold (default 0, label everything),
//      CH_SEED overrides the elimination order shuffle seed.

#[macro_use]
extern crate ocean_routing_engine;

use ocean_routing_engine::{
    algo::{contraction::*, hub_labels::*},
    cli::CliErr,
    datastr::graph::Graph,
    import,
    io::*,
    report::*,
};
use std::{env, error::Error, path::Path};

fn main() -> Result<(), Box<dyn Error>> {
    let _reporter = enable_reporting("preprocess");

    let mut args = env::args().skip(1);
    let graph_arg = args.next().ok_or(CliErr("No graph file arg given"))?;
    let out_arg = args.next().ok_or(CliErr("No output directory arg given"))?;

    let hl_level: u32 = match env::var("HL_LEVEL") {
        Ok(val) => val.parse().map_err(|_| CliErr("invalid HL_LEVEL"))?,
        Err(_) => 0,
    };
    let seed: u64 = match env::var("CH_SEED") {
        Ok(val) => val.parse().map_err(|_| CliErr("invalid CH_SEED"))?,
        Err(_) => 42,
    };
    report!("hl_level", hl_level);
    report!("order_seed", seed);

    let imported = report_time_with_key("importing graph", "import_running_time_ms", || {
        import::read_graph(Path::new(&graph_arg))
    })?;
    let mut graph = imported.into_dynamic_graph();
    report!("num_nodes", graph.num_nodes());
    report!("num_original_edges", graph.num_original_edges());

    let order = random_order(graph.num_nodes(), seed);
    report_time_with_key("contracting graph", "contraction_running_time_ms", || {
        ContractionHierarchyBuilder::new(&mut graph).run(&order)
    });
    report!("num_edges_with_shortcuts", graph.num_edges());

    let labels = report_time_with_key("building hub labels", "hub_labels_running_time_ms", || {
        HubLabelBuilder::new(&graph, &order, hl_level).compute()
    });
    report!("num_label_entries", labels.iter().map(|label| label.len()).sum::<usize>());

    let store = LabelStore::new(&graph, order, hl_level, &labels);
    report_time_with_key("writing label store", "store_running_time_ms", || store.deconstruct_to(&out_arg))?;

    Ok(())
}
