use std::collections::BTreeMap;

use edeps_graph::{Edge, Graph, NodeHandle};
use edeps_protocol::{EdgeCategory, EdgeKey};
use tracing::debug;

use crate::rules::{explain, Candidate};
use crate::view::EnhancedView;

/// Categories for the edges of one node, keyed by parent and label.
pub type Annotations = BTreeMap<EdgeKey, EdgeCategory>;

/// Read-only pass over a built sentence graph.
pub struct Classifier<'g> {
    graph: &'g Graph,
    view: EnhancedView,
}

impl<'g> Classifier<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        Self {
            graph,
            view: EnhancedView::new(graph),
        }
    }

    /// Classifies every enhanced incoming edge of `child`, plus its basic
    /// edge when no enhanced edge reproduces it.
    pub fn classify_node(&self, child: NodeHandle) -> Annotations {
        let graph = self.graph;
        let mut annotations = Annotations::new();
        let Some(node) = graph.node(child) else {
            return annotations;
        };
        let basic = node.basic_parent().filter(|_| !node.is_empty_node());
        let mut accounted = false;

        for edge in node.incoming() {
            let Some(from) = graph.node(edge.node) else {
                continue;
            };
            let key = EdgeKey::new(from.id(), edge.label.clone());

            let categories = match basic {
                Some((parent, label)) if parent == edge.node && !edge.label.is_ref() => {
                    accounted = true;
                    if *label == edge.label {
                        EdgeCategory::BASIC
                    } else if label.same_base(&edge.label) {
                        EdgeCategory::CASED
                    } else {
                        EdgeCategory::RELABELED
                    }
                }
                _ => explain(
                    graph,
                    &self.view,
                    Candidate {
                        child,
                        parent: edge.node,
                        label: &edge.label,
                    },
                ),
            };
            *annotations.entry(key).or_insert_with(EdgeCategory::empty) |= categories;
        }

        if let (Some(key), false) = (basic.and(graph.basic_head(child)), accounted) {
            let from_empty = |e: &Edge| graph.node(e.node).map_or(false, |n| n.is_empty_node());
            let category = if node.incoming().any(from_empty) {
                EdgeCategory::ORPHAN
            } else if node.incoming().any(|e| e.label.is_ref()) {
                EdgeCategory::RELPRON
            } else {
                EdgeCategory::MISSING
            };
            *annotations.entry(key).or_insert_with(EdgeCategory::empty) |= category;
        }

        annotations
    }

    /// Annotations for every sentence node, in identifier order.
    pub fn classify_all(&self) -> Vec<(NodeHandle, Annotations)> {
        self.graph
            .handles()
            .map(|handle| (handle, self.classify_node(handle)))
            .filter(|(_, annotations)| !annotations.is_empty())
            .collect()
    }
}

/// Classifies every edge of the sentence and merges the letters into each
/// node's MISC annotations. Returns the number of annotated edges.
///
/// Existing entries are unioned with, so running twice changes nothing.
pub fn classify(graph: &mut Graph) -> usize {
    let results = Classifier::new(graph).classify_all();

    let mut edges = 0;
    for (handle, annotations) in results {
        let Some(node) = graph.node_mut(handle) else {
            continue;
        };
        edges += annotations.len();
        for (key, categories) in annotations {
            node.misc.annotate(key, categories);
        }
    }

    debug!(nodes = graph.len(), edges, "classified sentence");
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use edeps_parser::read_sentences;

    fn classified(text: &str) -> Graph {
        let rows = read_sentences(text).unwrap().remove(0).rows;
        let mut graph = Graph::from_records(&rows).unwrap();
        classify(&mut graph);
        graph
    }

    fn misc(graph: &Graph, id: &str) -> String {
        graph.get_node(&id.parse().unwrap()).unwrap().misc.to_string()
    }

    #[test]
    fn test_identical_edge_is_basic() {
        let graph = classified(
            "1\tShe\tshe\tPRON\t_\t_\t2\tnsubj\t2:nsubj\t_\n\
             2\tsleeps\tsleep\tVERB\t_\t_\t0\troot\t0:root\t_\n",
        );
        assert_eq!(misc(&graph, "1"), "Edep=B:2:nsubj");
        assert_eq!(misc(&graph, "2"), "Edep=B:0:root");
    }

    #[test]
    fn test_case_refined_edge_is_cased() {
        let graph = classified(
            "1\tin\tin\tADP\t_\t_\t2\tcase\t2:case\t_\n\
             2\thouse\thouse\tNOUN\t_\t_\t3\tobl\t3:obl:in\tSpaceAfter=No\n\
             3\tsleeps\tsleep\tVERB\t_\t_\t0\troot\t0:root\t_\n",
        );
        assert_eq!(misc(&graph, "2"), "SpaceAfter=No|Edep=C:3:obl:in");
    }

    #[test]
    fn test_other_base_is_relabeled() {
        let graph = classified(
            "1\thouse\thouse\tNOUN\t_\t_\t2\tobl\t2:nmod\t_\n\
             2\tsleeps\tsleep\tVERB\t_\t_\t0\troot\t0:root\t_\n",
        );
        assert_eq!(misc(&graph, "1"), "Edep=L:2:nmod");
    }

    const GAPPED: &str = "\
# text = Mary won gold and Peter silver
1\tMary\tMary\tPROPN\t_\t_\t2\tnsubj\t2:nsubj\t_
2\twon\twin\tVERB\t_\t_\t0\troot\t0:root\t_
2.1\twon\twin\tVERB\t_\t_\t_\t_\t2:conj\t_
3\tgold\tgold\tNOUN\t_\t_\t2\tobj\t2:obj\t_
4\tand\tand\tCCONJ\t_\t_\t5\tcc\t2.1:cc\t_
5\tPeter\tPeter\tPROPN\t_\t_\t2\tconj\t2.1:nsubj\t_
6\tsilver\tsilver\tNOUN\t_\t_\t5\torphan\t2.1:obj\t_
";

    #[test]
    fn test_gapping_and_orphaned_basic_edge() {
        let graph = classified(GAPPED);
        assert_eq!(misc(&graph, "6"), "Edep=G:2.1:obj|Edep=O:5:orphan");
        assert_eq!(misc(&graph, "5"), "Edep=O:2:conj|Edep=G:2.1:nsubj");
        // The empty node has no basic edge to fall back on.
        assert_eq!(misc(&graph, "2.1"), "Edep=E:2:conj");
    }

    #[test]
    fn test_gapped_conjunct_keeps_its_basic_edge() {
        let graph = classified(
            "1\tMary\tMary\tPROPN\t_\t_\t2\tnsubj\t2:nsubj\t_\n\
             2\tbought\tbuy\tVERB\t_\t_\t0\troot\t0:root\t_\n\
             2.1\tbought\tbuy\tVERB\t_\t_\t_\t_\t2:conj\t_\n\
             3\tapples\tapple\tNOUN\t_\t_\t2\tobj\t2:obj\t_\n\
             4\tJohn\tJohn\tPROPN\t_\t_\t2\tconj\t2:conj|2.1:nsubj\t_\n\
             5\tpears\tpear\tNOUN\t_\t_\t4\torphan\t2.1:obj\t_\n",
        );
        assert_eq!(misc(&graph, "4"), "Edep=B:2:conj|Edep=G:2.1:nsubj");
        assert_eq!(misc(&graph, "5"), "Edep=G:2.1:obj|Edep=O:4:orphan");
    }

    #[test]
    fn test_one_edge_can_carry_several_letters() {
        let graph = classified(
            "1\tbought\tbuy\tVERB\t_\t_\t0\troot\t0:root\t_\n\
             1.1\tbought\tbuy\tVERB\t_\t_\t_\t_\t1:conj\t_\n\
             2\tapples\tapple\tNOUN\t_\t_\t1\tobj\t1.1:obj\t_\n\
             3\tpears\tpear\tNOUN\t_\t_\t2\tconj\t2:conj|1.1:obj\t_\n",
        );
        assert_eq!(misc(&graph, "3"), "Edep=GP:1.1:obj|Edep=B:2:conj");
    }

    #[test]
    fn test_copular_relative_clause_without_cycle() {
        let graph = classified(
            "1\tman\tman\tNOUN\t_\t_\t0\troot\t0:root|2:nsubj|3:nsubj\t_\n\
             2\tis\tbe\tAUX\t_\t_\t0\tdep\t0:dep\t_\n\
             3\ttall\ttall\tADJ\t_\t_\t2\tacl\t2:acl\t_\n",
        );
        assert_eq!(misc(&graph, "1"), "Edep=B:0:root|Edep=R:2:nsubj|Edep=E:3:nsubj");
    }

    #[test]
    fn test_conjunct_shares_parent_as_coparent() {
        let graph = classified(
            "1\tMary\tMary\tPROPN\t_\t_\t4\tnsubj\t4:nsubj\t_\n\
             2\tand\tand\tCCONJ\t_\t_\t3\tcc\t3:cc\t_\n\
             3\tJohn\tJohn\tPROPN\t_\t_\t1\tconj\t1:conj|4:nsubj\t_\n\
             4\tsleep\tsleep\tVERB\t_\t_\t0\troot\t0:root\t_\n",
        );
        assert_eq!(misc(&graph, "3"), "Edep=B:1:conj|Edep=P:4:nsubj");
    }

    #[test]
    fn test_dependent_of_conjunct_is_codepend() {
        let graph = classified(
            "1\tJohn\tJohn\tPROPN\t_\t_\t4\tnsubj\t2:nsubj|4:nsubj\t_\n\
             2\tbought\tbuy\tVERB\t_\t_\t0\troot\t0:root\t_\n\
             3\tand\tand\tCCONJ\t_\t_\t4\tcc\t4:cc\t_\n\
             4\tate\teat\tVERB\t_\t_\t2\tconj\t2:conj\t_\n",
        );
        assert_eq!(misc(&graph, "1"), "Edep=S:2:nsubj|Edep=B:4:nsubj");
    }

    #[test]
    fn test_controlled_subject_is_xsubj() {
        let graph = classified(
            "1\tJohn\tJohn\tPROPN\t_\t_\t2\tnsubj\t2:nsubj|4:nsubj:xsubj\t_\n\
             2\twants\twant\tVERB\t_\t_\t0\troot\t0:root\t_\n\
             3\tto\tto\tPART\t_\t_\t4\tmark\t4:mark\t_\n\
             4\tsleep\tsleep\tVERB\t_\t_\t2\txcomp\t2:xcomp\t_\n",
        );
        assert_eq!(misc(&graph, "1"), "Edep=B:2:nsubj|Edep=X:4:nsubj:xsubj");
    }

    const RELATIVE: &str = "\
1\tthe\tthe\tDET\t_\t_\t2\tdet\t2:det\t_
2\tman\tman\tNOUN\t_\t_\t0\troot\t0:root|4:nsubj\t_
3\twho\twho\tPRON\t_\t_\t4\tnsubj\t2:ref\t_
4\tsaw\tsee\tVERB\t_\t_\t2\tacl:relcl\t2:acl:relcl\t_
5\tme\tI\tPRON\t_\t_\t4\tobj\t4:obj\t_
";

    #[test]
    fn test_relative_clause_edges() {
        let graph = classified(RELATIVE);
        assert_eq!(misc(&graph, "2"), "Edep=B:0:root|Edep=R:4:nsubj");
        assert_eq!(misc(&graph, "3"), "Edep=R:2:ref|Edep=W:4:nsubj");
        assert_eq!(misc(&graph, "4"), "Edep=B:2:acl:relcl");
    }

    #[test]
    fn test_dropped_basic_edge_is_missing() {
        let graph = classified(
            "1\tShe\tshe\tPRON\t_\t_\t2\tnsubj\t3:nsubj\t_\n\
             2\tsleeps\tsleep\tVERB\t_\t_\t0\troot\t0:root\t_\n\
             3\tdreams\tdream\tVERB\t_\t_\t2\tconj\t2:conj\t_\n",
        );
        assert_eq!(misc(&graph, "1"), "Edep=M:2:nsubj|Edep=E:3:nsubj");
    }

    #[test]
    fn test_spans_and_root_get_nothing() {
        let graph = classified(
            "1-2\tdel\t_\t_\t_\t_\t_\t_\t_\t_\n\
             1\tde\tde\tADP\t_\t_\t3\tcase\t3:case\t_\n\
             2\tel\tel\tDET\t_\t_\t3\tdet\t3:det\t_\n\
             3\tcampo\tcampo\tNOUN\t_\t_\t0\troot\t0:root\t_\n",
        );
        assert_eq!(misc(&graph, "1-2"), "_");
        assert!(graph.root().misc.is_empty());
    }

    #[test]
    fn test_classification_is_idempotent() {
        let mut graph = classified(GAPPED);
        let first = graph.to_records();
        assert_eq!(classify(&mut graph), 10);
        assert_eq!(graph.to_records(), first);

        // Annotations read back from MISC are merged, not duplicated.
        let mut again = Graph::from_records(&first).unwrap();
        classify(&mut again);
        assert_eq!(again.to_records(), first);
    }

    #[test]
    fn test_classify_node_is_read_only() {
        let rows = read_sentences(RELATIVE).unwrap().remove(0).rows;
        let graph = Graph::from_records(&rows).unwrap();
        let classifier = Classifier::new(&graph);
        let who = graph.handle(&"3".parse().unwrap()).unwrap();

        let annotations = classifier.classify_node(who);
        assert_eq!(annotations.len(), 2);
        assert!(graph.get_node(&"3".parse().unwrap()).unwrap().misc.is_empty());
    }
}
