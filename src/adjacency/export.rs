//! Semicolon-delimited adjacency export.
//!
//! One row per undirected edge: `From;To;Type;Through;Comment`.

use std::io::Write;

use super::AdjacencyGraph;
use crate::definitions::Definitions;
use crate::error::BorderError;

pub const HEADER: &str = "From;To;Type;Through;Comment";

/// Land border between two regions; no intermediate region.
const TYPE_LAND: &str = "land";
const THROUGH_NONE: &str = "-1";

/// Write every edge once, `From < To`. Names from `defs`, when given,
/// go in the comment column.
pub fn write_adjacency_csv<W: Write>(
    graph: &AdjacencyGraph,
    defs: Option<&Definitions>,
    mut out: W,
) -> Result<usize, BorderError> {
    writeln!(out, "{HEADER}")?;
    let mut rows = 0;
    for pair in graph.pairs() {
        let comment = match defs {
            Some(defs) => format!(
                "{} - {}",
                defs.name_of(pair.a()).unwrap_or_default(),
                defs.name_of(pair.b()).unwrap_or_default()
            ),
            None => String::new(),
        };
        // Separators inside names would shift columns.
        let comment = comment.replace(';', ",");
        writeln!(
            out,
            "{};{};{TYPE_LAND};{THROUGH_NONE};{comment}",
            pair.a(),
            pair.b()
        )?;
        rows += 1;
    }
    out.flush()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::RegionId;

    #[test]
    fn one_row_per_edge() {
        let mut graph = AdjacencyGraph::new();
        graph.insert_pair(RegionId(2), RegionId(1));
        graph.insert_pair(RegionId(1), RegionId(2));
        graph.insert_pair(RegionId(3), RegionId(2));

        let mut buf = Vec::new();
        let rows = write_adjacency_csv(&graph, None, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(rows, 2);
        assert_eq!(
            text,
            "From;To;Type;Through;Comment\n1;2;land;-1;\n2;3;land;-1;\n"
        );
    }

    #[test]
    fn names_go_in_comment() {
        let defs = Definitions::parse("1;1;1;200;North;x\n2;1;200;1;South;x\n").unwrap();
        let mut graph = AdjacencyGraph::new();
        graph.insert_pair(RegionId(1), RegionId(2));
        let mut buf = Vec::new();
        write_adjacency_csv(&graph, Some(&defs), &mut buf).unwrap();
        assert!(String::from_utf8(buf).unwrap().ends_with("1;2;land;-1;North - South\n"));
    }
}
