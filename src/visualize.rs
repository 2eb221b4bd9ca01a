use std::collections::HashMap;
use std::fmt::{Result as FmtResult, Write as FmtWrite};

use nalgebra::Point2;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::prelude::EdgeRef;

use crate::{BondOrder, Element, Fragment, NodeId, Symbol, Wedge};

/// A fragment node as the receiving drawing sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub symbol: Symbol,
    pub charge: i32,
    pub position: Point2<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bond {
    pub order: BondOrder,
    pub wedge: Wedge,
    /// Closes a ring rather than following a parent-child link.
    pub ring_closure: bool,
}

pub type FragmentGraph = UnGraph<Atom, Bond>;

impl Fragment {
    /// Flatten the tree into an undirected graph: one edge per parent-child
    /// link plus one per ring closure. Node indices follow the pre-order walk.
    pub fn to_graph(&self) -> FragmentGraph {
        let mut graph = FragmentGraph::default();
        let mut indices: HashMap<NodeId, NodeIndex> = HashMap::new();

        for (parent, id) in self.walk() {
            let node = self.node(id);
            let index = graph.add_node(Atom {
                symbol: node.symbol,
                charge: node.charge,
                position: node.suggested_position,
            });
            indices.insert(id, index);

            if let Some(parent) = parent.and_then(|parent| indices.get(&parent)) {
                graph.add_edge(
                    *parent,
                    index,
                    Bond {
                        order: node.order_to_parent,
                        wedge: node.wedge_to_parent,
                        ring_closure: false,
                    },
                );
            }
        }

        for (_, id) in self.walk() {
            let Some(ring) = self.node(id).ring_bond else {
                continue;
            };
            if let (Some(from), Some(to)) = (indices.get(&id), indices.get(&ring.target)) {
                graph.add_edge(
                    *from,
                    *to,
                    Bond {
                        order: ring.order,
                        wedge: Wedge::None,
                        ring_closure: true,
                    },
                );
            }
        }
        graph
    }

    /// Graphviz source for the fragment, pinned to its suggested coordinates.
    pub fn to_dot(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = write_dot(&self.to_graph(), &mut out);
        out
    }
}

/// Write `graph` as a `neato` graph. Double and triple bonds are drawn as
/// parallel edges.
pub fn write_dot<W: FmtWrite>(graph: &FragmentGraph, out: &mut W) -> FmtResult {
    writeln!(out, "graph Fragment {{")?;
    writeln!(out, "    layout=neato;")?;
    writeln!(out, "    multiedge=true;")?;

    for index in graph.node_indices() {
        let atom = &graph[index];
        writeln!(
            out,
            "    {} [label=\"{}\", pos=\"{:.3},{:.3}!\", fontcolor=white, shape=circle, style=filled, fillcolor={}];",
            index.index(),
            atom_label(atom),
            atom.position.x,
            atom.position.y,
            symbol_color(atom.symbol),
        )?;
    }

    for edge in graph.edge_references() {
        let bond = edge.weight();
        for _ in 0..bond.order.order() {
            writeln!(
                out,
                "    {} -- {} [style={}, penwidth=2.0{}];",
                edge.source().index(),
                edge.target().index(),
                wedge_style(bond.wedge),
                if bond.ring_closure { ", color=purple" } else { "" },
            )?;
        }
    }

    writeln!(out, "}}")
}

fn atom_label(atom: &Atom) -> String {
    match atom.charge {
        0 => atom.symbol.to_string(),
        1 => format!("{}+", atom.symbol),
        -1 => format!("{}-", atom.symbol),
        charge => format!("{}{:+}", atom.symbol, charge),
    }
}

fn symbol_color(symbol: Symbol) -> &'static str {
    use Element::*;
    match symbol {
        Symbol::Atom(C) => "black",
        Symbol::Atom(H) => "gray",
        Symbol::Atom(O) => "red",
        Symbol::Atom(N) => "blue",
        Symbol::Atom(Cl) => "darkgreen",
        Symbol::Atom(Br) => "brown",
        Symbol::Atom(F) => "pink",
        Symbol::Atom(S) => "yellow",
        Symbol::Atom(P) => "orange",
        Symbol::Atom(I) => "purple",
        Symbol::Atom(B) => "salmon",
        Symbol::Placeholder => "white",
    }
}

fn wedge_style(wedge: Wedge) -> &'static str {
    match wedge {
        Wedge::None => "solid",
        Wedge::Wedge => "bold",
        Wedge::Dash => "dashed",
    }
}
