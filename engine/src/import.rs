//! The text exchange format for navigation meshes.
//!
//! ```text
//! <any header line(s), ignored>
//! <node count>
//! <edge count>
//! <node id> <lat> <lon>          node count times
//! <start id> <dest id> <weight>  edge count times
//! ```
//!
//! Header lines are skipped until the first line holding nothing but the
//! node count. External node ids need not be contiguous; the importer
//! assigns dense internal ids `0..n-1` in file order. Malformed input fails
//! fast with a line-numbered diagnostic, nothing is silently dropped.

use crate::datastr::graph::*;
use std::collections::HashMap;
use std::fs::File;
use std::io::{prelude::*, BufReader, BufWriter, Error, ErrorKind, Result};
use std::path::Path;

/// A parsed exchange-format graph over dense internal node ids.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedGraph {
    pub latitude: Vec<f32>,
    pub longitude: Vec<f32>,
    /// Undirected weighted edges, one entry per input row.
    pub edges: Vec<(NodeId, NodeId, Weight)>,
}

impl ImportedGraph {
    pub fn num_nodes(&self) -> usize {
        self.latitude.len()
    }

    pub fn into_dynamic_graph(self) -> DynamicGraph {
        DynamicGraph::new(self.latitude, self.longitude, &self.edges)
    }
}

fn malformed(line: usize, what: &str) -> Error {
    Error::new(ErrorKind::InvalidData, format!("line {}: {}", line, what))
}

fn field<T: std::str::FromStr>(fields: &mut std::str::SplitWhitespace, line: usize, what: &str) -> Result<T> {
    fields
        .next()
        .ok_or_else(|| malformed(line, what))?
        .parse()
        .map_err(|_| malformed(line, what))
}

pub fn read_graph<P: AsRef<Path>>(path: P) -> Result<ImportedGraph> {
    read_graph_from(BufReader::new(File::open(path)?))
}

pub fn read_graph_from<R: BufRead>(input: R) -> Result<ImportedGraph> {
    let mut lines = input.lines();
    let mut line_no = 0usize;

    // skip header lines until a line holding just the node count
    let node_count = loop {
        line_no += 1;
        match lines.next() {
            Some(line) => {
                if let Ok(count) = line?.trim().parse::<usize>() {
                    break count;
                }
            }
            None => return Err(malformed(line_no, "missing node count")),
        }
    };

    line_no += 1;
    let edge_count: usize = lines
        .next()
        .ok_or_else(|| malformed(line_no, "missing edge count"))??
        .trim()
        .parse()
        .map_err(|_| malformed(line_no, "invalid edge count"))?;

    let mut ids: HashMap<u64, NodeId> = HashMap::with_capacity(node_count);
    let mut latitude = Vec::with_capacity(node_count);
    let mut longitude = Vec::with_capacity(node_count);
    for _ in 0..node_count {
        line_no += 1;
        let line = lines.next().ok_or_else(|| malformed(line_no, "missing node row"))??;
        let mut fields = line.split_whitespace();
        let id: u64 = field(&mut fields, line_no, "invalid node id")?;
        let lat: f32 = field(&mut fields, line_no, "invalid latitude")?;
        let lon: f32 = field(&mut fields, line_no, "invalid longitude")?;
        if fields.next().is_some() {
            return Err(malformed(line_no, "too many fields in node row"));
        }
        if ids.insert(id, latitude.len() as NodeId).is_some() {
            return Err(malformed(line_no, "duplicate node id"));
        }
        latitude.push(lat);
        longitude.push(lon);
    }

    let mut edges = Vec::with_capacity(edge_count);
    for _ in 0..edge_count {
        line_no += 1;
        let line = lines.next().ok_or_else(|| malformed(line_no, "missing edge row"))??;
        let mut fields = line.split_whitespace();
        let from: u64 = field(&mut fields, line_no, "invalid edge start id")?;
        let to: u64 = field(&mut fields, line_no, "invalid edge dest id")?;
        let weight: Weight = field(&mut fields, line_no, "invalid edge weight")?;
        if fields.next().is_some() {
            return Err(malformed(line_no, "too many fields in edge row"));
        }
        let from = *ids.get(&from).ok_or_else(|| malformed(line_no, "edge references unknown node"))?;
        let to = *ids.get(&to).ok_or_else(|| malformed(line_no, "edge references unknown node"))?;
        if from == to {
            return Err(malformed(line_no, "self loop"));
        }
        edges.push((from, to, weight));
    }

    for line in lines {
        line_no += 1;
        if !line?.trim().is_empty() {
            return Err(malformed(line_no, "data beyond the declared counts"));
        }
    }

    Ok(ImportedGraph { latitude, longitude, edges })
}

pub fn write_graph<P: AsRef<Path>>(graph: &ImportedGraph, path: P) -> Result<()> {
    write_graph_to(graph, &mut BufWriter::new(File::create(path)?))
}

pub fn write_graph_to<W: Write>(graph: &ImportedGraph, output: &mut W) -> Result<()> {
    writeln!(output, "# ocean navigation mesh")?;
    writeln!(output, "{}", graph.num_nodes())?;
    writeln!(output, "{}", graph.edges.len())?;
    for (node, (lat, lon)) in graph.latitude.iter().zip(graph.longitude.iter()).enumerate() {
        writeln!(output, "{} {} {}", node, lat, lon)?;
    }
    for &(from, to, weight) in &graph.edges {
        writeln!(output, "{} {} {}", from, to, weight)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = "\
mesh built from coastlines v3
3
2
100 54.5 8.25
200 54.0 8.5
450 53.75 9.0
100 200 1234
200 450 999
";

    #[test]
    fn parses_and_remaps_ids() {
        let graph = read_graph_from(FIXTURE.as_bytes()).unwrap();
        assert_eq!(graph.num_nodes(), 3);
        assert_eq!(graph.latitude, vec![54.5, 54.0, 53.75]);
        assert_eq!(graph.edges, vec![(0, 1, 1234), (1, 2, 999)]);
    }

    #[test]
    fn rejects_unknown_edge_endpoint() {
        let broken = FIXTURE.replace("200 450 999", "200 451 999");
        let err = read_graph_from(broken.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
        assert!(err.to_string().contains("line 8"));
    }

    #[test]
    fn rejects_inconsistent_counts() {
        let truncated = "2\n2\n0 1.0 2.0\n1 1.0 2.5\n0 1 5\n";
        let err = read_graph_from(truncated.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn round_trip_is_exact() {
        let graph = read_graph_from(FIXTURE.as_bytes()).unwrap();
        let mut buffer = Vec::new();
        write_graph_to(&graph, &mut buffer).unwrap();
        let reread = read_graph_from(&buffer[..]).unwrap();
        assert_eq!(graph, reread);
    }
}
