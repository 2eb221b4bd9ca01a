use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult, Write as FmtWrite};

use nalgebra::Point2;
use tracing::*;

use crate::{BondOrder, Element, Symbol, Wedge};

/// Index of a node inside a [`Fragment`]'s arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A deferred bond that closes a ring back to an earlier node of the same fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingBond {
    pub target: NodeId,
    pub order: BondOrder,
}

/// One atom (or placeholder) of a fragment tree.
///
/// Nodes are configured with the `with_*` builder methods before they are put
/// into a [`Fragment`]. Only `children` expresses ownership; `combining_child`,
/// `ring_bond` and the branch ends are plain indices into the same arena.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentNode {
    pub symbol: Symbol,
    pub charge: i32,
    pub order_to_parent: BondOrder,
    pub wedge_to_parent: Wedge,
    /// Resolved groups such as OH or CH3 that take no further expansion.
    pub terminal: bool,
    /// Stands for a grouped repetition of its children rather than one atom.
    pub pseudo: bool,
    /// `Some(n)` for a bare "repeat the adjacent unit n times" placeholder.
    pub repeat: Option<usize>,
    pub combine_linearly: bool,
    /// Marks the node whose subtree receives whatever is appended next.
    pub combiner: bool,
    pub combining_child: Option<NodeId>,
    pub ring_bond: Option<RingBond>,
    pub children: Vec<NodeId>,
    pub left_branch_end: Option<NodeId>,
    pub right_branch_end: Option<NodeId>,
    pub suggested_position: Point2<f64>,
    pub theta_offset: usize,
}

impl FragmentNode {
    pub fn new(symbol: impl Into<Symbol>) -> Self {
        let symbol = symbol.into();
        Self {
            symbol,
            charge: 0,
            order_to_parent: BondOrder::Single,
            wedge_to_parent: Wedge::None,
            terminal: false,
            pseudo: false,
            repeat: None,
            // Plain carbons extend chains; everything else branches.
            combine_linearly: symbol.is(Element::C),
            combiner: false,
            combining_child: None,
            ring_bond: None,
            children: Vec::new(),
            left_branch_end: None,
            right_branch_end: None,
            suggested_position: Point2::origin(),
            theta_offset: 0,
        }
    }

    pub fn placeholder() -> Self {
        Self::new(Symbol::Placeholder)
    }

    /// A bare repeat count, expanded once it is attached to a real node.
    pub fn repeat(count: usize) -> Self {
        Self {
            repeat: Some(count),
            ..Self::placeholder()
        }
    }

    pub fn with_charge(mut self, charge: i32) -> Self {
        self.charge = charge;
        self
    }

    pub fn with_order(mut self, order: BondOrder) -> Self {
        self.order_to_parent = order;
        self
    }

    pub fn with_wedge(mut self, wedge: Wedge) -> Self {
        self.wedge_to_parent = wedge;
        self
    }

    pub fn with_terminal(mut self, terminal: bool) -> Self {
        self.terminal = terminal;
        self
    }

    pub fn with_pseudo(mut self, pseudo: bool) -> Self {
        self.pseudo = pseudo;
        self
    }

    pub fn with_theta_offset(mut self, theta_offset: usize) -> Self {
        self.theta_offset = theta_offset;
        self
    }

    pub fn with_combine_linearly(mut self, combine_linearly: bool) -> Self {
        self.combine_linearly = combine_linearly;
        self
    }

    pub fn flag_for_combining(mut self) -> Self {
        self.combiner = true;
        self
    }

    pub fn is_repeat(&self) -> bool {
        self.repeat.is_some()
    }

    /// Neither a pseudo group nor a repeat count.
    pub fn is_real(&self) -> bool {
        !self.pseudo && !self.is_repeat()
    }

    pub fn label(&self) -> String {
        if self.pseudo {
            "?".to_string()
        } else if let Some(count) = self.repeat {
            format!("'{}'", count)
        } else {
            self.symbol.to_string()
        }
    }
}

/// A tree of [`FragmentNode`]s stored in a flat arena.
///
/// Nodes that get detached (flattened pseudo wrappers, stripped hydrogens,
/// consumed repeat counts) stay in the arena until the next [`compact`](Self::compact);
/// every traversal starts at the root, so they are never observed.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    nodes: Vec<FragmentNode>,
    root: NodeId,
}

impl Fragment {
    pub fn new(root: FragmentNode) -> Self {
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn atom(element: Element) -> Self {
        Self::new(FragmentNode::new(element))
    }

    pub fn repeat(count: usize) -> Self {
        Self::new(FragmentNode::repeat(count))
    }

    /// An empty pseudo group; its children are spliced into whatever it is attached to.
    pub fn pseudo() -> Self {
        Self::new(FragmentNode::placeholder().with_pseudo(true))
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub(crate) fn set_root(&mut self, root: NodeId) {
        self.root = root;
    }

    pub fn root_node(&self) -> &FragmentNode {
        self.node(self.root)
    }

    pub fn node(&self, id: NodeId) -> &FragmentNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut FragmentNode {
        &mut self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Store a node without connecting it to anything.
    pub(crate) fn add_node(&mut self, node: FragmentNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Append `node` as the last child of `parent` and return its id.
    ///
    /// This is raw tree construction; if the new child is flagged for
    /// combining, `parent` records it as its combining child.
    pub fn push_child(&mut self, parent: NodeId, node: FragmentNode) -> NodeId {
        let combiner = node.combiner;
        let id = self.add_node(node);
        self.nodes[parent.0].children.push(id);
        if combiner {
            self.nodes[parent.0].combining_child = Some(id);
        }
        id
    }

    /// Append a straight run of nodes below `parent`, each one the child of
    /// the previous, and return the last one.
    pub fn push_chain(&mut self, parent: NodeId, nodes: impl IntoIterator<Item = FragmentNode>) -> NodeId {
        nodes
            .into_iter()
            .fold(parent, |tail, node| self.push_child(tail, node))
    }

    pub fn set_ring_bond(&mut self, from: NodeId, target: NodeId, order: BondOrder) {
        self.nodes[from.0].ring_bond = Some(RingBond { target, order });
    }

    pub fn set_combining_child(&mut self, id: NodeId, child: NodeId) {
        self.nodes[id.0].combining_child = Some(child);
    }

    pub fn set_branch_ends(&mut self, left: NodeId, right: NodeId) {
        let root = self.root;
        self.nodes[root.0].left_branch_end = Some(left);
        self.nodes[root.0].right_branch_end = Some(right);
    }

    /// The node of `id`'s subtree that receives the next attachment.
    pub fn node_for_linear_combine(&self, id: NodeId) -> NodeId {
        self.nodes[id.0].combining_child.unwrap_or(id)
    }

    pub fn left_branch_end(&self) -> NodeId {
        self.root_node().left_branch_end.unwrap_or(self.root)
    }

    pub fn right_branch_end(&self) -> NodeId {
        self.root_node().right_branch_end.unwrap_or(self.root)
    }

    /// Whether this fragment is a linear run with two distinct ends.
    pub fn can_be_chain(&self) -> bool {
        self.left_branch_end() != self.right_branch_end()
    }

    /// Move every node of `other` into this arena, returning the new id of its root.
    /// The absorbed nodes are not connected to anything yet.
    pub(crate) fn absorb(&mut self, other: Fragment) -> NodeId {
        let offset = self.nodes.len();
        let shift = |id: NodeId| NodeId(id.0 + offset);
        self.nodes.extend(other.nodes.into_iter().map(|mut node| {
            node.children.iter_mut().for_each(|child| *child = shift(*child));
            node.combining_child = node.combining_child.map(shift);
            node.left_branch_end = node.left_branch_end.map(shift);
            node.right_branch_end = node.right_branch_end.map(shift);
            if let Some(ring) = node.ring_bond.as_mut() {
                ring.target = shift(ring.target);
            }
            node
        }));
        shift(other.root)
    }

    /// Every node of the subtree under `id`, `id` first.
    pub(crate) fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Append a detached copy of the subtree under `id` and return the copy's root.
    /// References between nodes of the subtree, ring closures included, point
    /// into the copy; references leaving it are kept as they are.
    pub(crate) fn copy_subtree(&mut self, id: NodeId) -> NodeId {
        let ids = self.subtree(id);
        let offset = self.nodes.len();
        let mapping: HashMap<NodeId, NodeId> = ids
            .iter()
            .enumerate()
            .map(|(i, old)| (*old, NodeId(offset + i)))
            .collect();
        let remap = |id: NodeId| mapping.get(&id).copied().unwrap_or(id);

        let copies: Vec<FragmentNode> = ids
            .iter()
            .map(|old| {
                let mut node = self.nodes[old.0].clone();
                node.children.iter_mut().for_each(|child| *child = remap(*child));
                node.combining_child = node.combining_child.map(remap);
                node.left_branch_end = node.left_branch_end.map(remap);
                node.right_branch_end = node.right_branch_end.map(remap);
                if let Some(ring) = node.ring_bond.as_mut() {
                    ring.target = remap(ring.target);
                }
                node
            })
            .collect();
        self.nodes.extend(copies);
        NodeId(offset)
    }

    /// Pre-order traversal yielding `(parent, node)` pairs, starting with `(None, root)`.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            fragment: self,
            stack: vec![(None, self.root)],
        }
    }

    /// Number of nodes reachable from the root.
    pub fn node_count(&self) -> usize {
        self.walk().count()
    }

    /// Remove every direct child that is an explicit hydrogen atom, anywhere in the tree.
    pub fn strip_implicit_hydrogens(&mut self) -> &mut Self {
        let reachable: Vec<NodeId> = self.walk().map(|(_, id)| id).collect();
        for id in reachable {
            let children = std::mem::take(&mut self.nodes[id.0].children);
            let kept: Vec<NodeId> = children
                .into_iter()
                .filter(|child| {
                    let node = &self.nodes[child.0];
                    !(node.is_real() && node.symbol.is(Element::H))
                })
                .collect();
            self.nodes[id.0].children = kept;
        }
        self.compact();
        self
    }

    /// Drop unreachable nodes from the arena and renumber the rest in pre-order.
    /// Auxiliary references into dropped nodes are cleared; a ring closure lost
    /// that way is reported.
    pub fn compact(&mut self) {
        let order: Vec<NodeId> = self.walk().map(|(_, id)| id).collect();
        if order.len() == self.nodes.len() && order.iter().enumerate().all(|(i, id)| id.0 == i) {
            return;
        }

        let mapping: HashMap<NodeId, NodeId> = order
            .iter()
            .enumerate()
            .map(|(new, old)| (*old, NodeId(new)))
            .collect();
        let remap = |id: Option<NodeId>| id.and_then(|id| mapping.get(&id).copied());

        let mut nodes = Vec::with_capacity(order.len());
        for old in &order {
            let mut node = self.nodes[old.0].clone();
            node.children = node.children.iter().map(|child| mapping[child]).collect();
            node.combining_child = remap(node.combining_child);
            node.left_branch_end = remap(node.left_branch_end);
            node.right_branch_end = remap(node.right_branch_end);
            node.ring_bond = node.ring_bond.and_then(|ring| {
                let target = remap(Some(ring.target));
                if target.is_none() {
                    warn!(
                        "Dropping ring closure from {} into detached node {}",
                        node.label(),
                        ring.target.index()
                    );
                }
                target.map(|target| RingBond { target, ..ring })
            });
            nodes.push(node);
        }
        self.nodes = nodes;
        self.root = NodeId(0);
    }

    /// Render the subtree under `id` the way `Display` renders the whole fragment.
    pub fn render(&self, id: NodeId) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_node(id, &mut out);
        out
    }

    fn write_node<W: FmtWrite>(&self, id: NodeId, f: &mut W) -> FmtResult {
        let node = self.node(id);
        write!(f, "{}{}", node.order_to_parent.marker(), node.label())?;
        match node.charge {
            0 => {}
            1 => write!(f, "+")?,
            -1 => write!(f, "-")?,
            charge => write!(f, "{:+}", charge)?,
        }
        if !node.children.is_empty() {
            write!(f, "(")?;
            for (i, child) in node.children.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                self.write_node(*child, f)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl Display for Fragment {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        self.write_node(self.root, f)
    }
}

/// Iterator returned by [`Fragment::walk`].
pub struct Walk<'a> {
    fragment: &'a Fragment,
    stack: Vec<(Option<NodeId>, NodeId)>,
}

impl Iterator for Walk<'_> {
    type Item = (Option<NodeId>, NodeId);

    fn next(&mut self) -> Option<Self::Item> {
        let (parent, id) = self.stack.pop()?;
        self.stack
            .extend(self.fragment.children(id).iter().rev().map(|child| (Some(id), *child)));
        Some((parent, id))
    }
}
