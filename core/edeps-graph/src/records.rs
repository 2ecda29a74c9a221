use std::collections::BTreeSet;

use edeps_protocol::{Deprel, EdgeKey, Features, Misc, NodeId, ParseError, Row, EMPTY_COLUMN};
use tracing::debug;

use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::node::{BasicRole, Node};

fn in_line<T>(row: &Row, result: std::result::Result<T, ParseError>) -> Result<T> {
    result.map_err(|source| GraphError::Parse {
        id: row.id.clone(),
        source,
    })
}

fn parse_head(row: &Row) -> Result<Option<(NodeId, Deprel)>> {
    if row.head == EMPTY_COLUMN {
        return Ok(None);
    }
    let parent = in_line(row, row.head.parse::<NodeId>())?;
    let label = in_line(row, row.deprel.parse::<Deprel>())?;
    Ok(Some((parent, label)))
}

fn node_from_row(row: &Row) -> Result<Node> {
    let id = in_line(row, row.id.parse::<NodeId>())?;
    let mut node = Node::new(id, row.form.clone());
    node.lemma = row.lemma.clone();
    node.upos = row.upos.clone();
    node.xpos = row.xpos.clone();
    node.feats = in_line(row, row.feats.parse::<Features>())?;
    node.misc = in_line(row, row.misc.parse::<Misc>())?;
    Ok(node)
}

impl Graph {
    /// Builds a sentence graph from its rows.
    ///
    /// Pass 1 registers every node, so pass 2 can attach basic parents and
    /// enhanced edges in line order even when they point forward. Any
    /// structural error discards the whole graph.
    pub fn from_records(rows: &[Row]) -> Result<Graph> {
        let mut graph = Graph::new();
        let mut links = Vec::with_capacity(rows.len());

        for row in rows {
            let node = node_from_row(row)?;
            links.push((node.id(), parse_head(row)?, row.deps_fragments()));
            graph.add_node(node)?;
        }

        for (id, head, deps) in links {
            graph.attach_basic_parent(id, head)?;
            graph.attach_enhanced_edges(id, deps.as_slice())?;
        }

        debug!(
            nodes = graph.len(),
            warnings = graph.warnings().len(),
            "built sentence graph"
        );
        Ok(graph)
    }

    /// Renders every node back to a row, in identifier order. Enhanced
    /// edges are listed by parent identifier, then label.
    pub fn to_records(&self) -> Vec<Row> {
        self.handles()
            .map(|handle| {
                let node = self.at(handle);
                let (head, deprel) = match node.basic_role() {
                    BasicRole::Attached { parent, label } => {
                        (self.at(*parent).id().to_string(), label.to_string())
                    }
                    BasicRole::Absent | BasicRole::Pending => {
                        (EMPTY_COLUMN.to_string(), EMPTY_COLUMN.to_string())
                    }
                };

                let deps: BTreeSet<EdgeKey> = self.enhanced_parents(handle).into_iter().collect();
                let deps = if deps.is_empty() {
                    EMPTY_COLUMN.to_string()
                } else {
                    deps.iter().map(EdgeKey::to_string).collect::<Vec<_>>().join("|")
                };

                Row {
                    id: node.id().to_string(),
                    form: node.form.clone(),
                    lemma: node.lemma.clone(),
                    upos: node.upos.clone(),
                    xpos: node.xpos.clone(),
                    feats: node.feats.to_string(),
                    head,
                    deprel,
                    deps,
                    misc: node.misc.to_string(),
                }
            })
            .collect()
    }
}
