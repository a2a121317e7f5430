//! Hub-label routing engine for large oceanic navigation meshes.
//!
//! The engine answers point-to-point shortest-path queries on a static,
//! weighted, undirected graph with low latency. Preprocessing builds a
//! contraction hierarchy over the mesh and derives hub labels from it;
//! queries intersect two sorted label sets and unpack shortcuts back into
//! concrete node paths.

pub mod algo;
pub mod cli;
pub mod datastr;
pub mod import;
pub mod io;
pub mod report;

pub mod in_range_option;

pub mod built_info {
    // The file has been placed there by the build script.
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}
