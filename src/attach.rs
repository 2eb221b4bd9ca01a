use tracing::*;

use crate::{AttachError, BondOrder, Fragment, FragmentNode, NodeId};

impl Fragment {
    /// Graft `incoming` onto this fragment.
    ///
    /// The graft lands on the current frontier (the root's combining child, if
    /// any) rather than on the root itself. Repeat counts expand the frontier,
    /// pseudo groups are spliced in child by child, and a repeat count that
    /// carries a single unit is read as an inverted label: the unit becomes the
    /// new root and this fragment hangs below it.
    ///
    /// On error this fragment is left as it was.
    pub fn attach(&mut self, incoming: Fragment) -> Result<(), AttachError> {
        let mut merged = self.clone();
        let incoming = merged.absorb(incoming);
        let root = merged.graft(merged.root(), incoming)?;
        merged.set_root(root);
        merged.compact();
        *self = merged;
        Ok(())
    }

    fn graft(&mut self, existing: NodeId, incoming: NodeId) -> Result<NodeId, AttachError> {
        let target = self.node_for_linear_combine(existing);

        if let Some(count) = self.node(incoming).repeat {
            let units = self.node(incoming).children.clone();
            if units.len() > 1 {
                let node = self.render(incoming);
                warn!("Refusing to attach {}: {} units under one repeat count", node, units.len());
                return Err(AttachError::AmbiguousRepeat { node, children: units.len() });
            }

            let existing = self.expand_repeat(existing, target, count);
            return match units.as_slice() {
                [unit] => {
                    debug!("Count {} precedes its unit {}; reversing roles", count, self.render(*unit));
                    self.node_mut(incoming).children.clear();
                    self.graft(*unit, existing)
                }
                _ => Ok(existing),
            };
        }

        if self.node(incoming).combiner {
            self.set_combining_child(existing, incoming);
        }

        if self.node(incoming).pseudo {
            let children = std::mem::take(&mut self.node_mut(incoming).children);
            trace!("Flattening {} grouped children into {}", children.len(), self.node(target).label());
            self.node_mut(target).children.extend(children);
            return Ok(existing);
        }

        self.node_mut(target).children.push(incoming);
        self.advance_frontier(existing, target, incoming);
        Ok(existing)
    }

    /// Apply a repeat count to `target` and return the (possibly new) root of
    /// `existing`'s subtree.
    fn expand_repeat(&mut self, existing: NodeId, target: NodeId, count: usize) -> NodeId {
        let symbol = self.node(target).symbol;
        if self.node(target).combine_linearly {
            let tail = self.push_chain(
                target,
                (1..count).map(|i| FragmentNode::new(symbol).with_theta_offset(i % 2)),
            );
            if tail != target {
                self.set_combining_child(existing, tail);
            }
            existing
        } else if self.node(target).children.is_empty() {
            self.node_mut(target).pseudo = true;
            for _ in 0..count {
                self.push_child(target, FragmentNode::new(symbol));
            }
            existing
        } else {
            self.replicate(existing, target, count)
        }
    }

    /// A count after a whole template (a ring, a branched group) repeats the
    /// template. At the root the copies are gathered under a pseudo node;
    /// further down they become siblings of `target`.
    fn replicate(&mut self, existing: NodeId, target: NodeId, count: usize) -> NodeId {
        trace!("Repeating {} {} times", self.render(target), count);
        let copies: Vec<NodeId> = (1..count).map(|_| self.copy_subtree(target)).collect();

        if target == existing && self.node(target).pseudo {
            for copy in copies {
                let children = std::mem::take(&mut self.node_mut(copy).children);
                self.node_mut(target).children.extend(children);
            }
            return target;
        }
        if target == existing {
            let mut group = FragmentNode::placeholder().with_pseudo(true);
            group.children = std::iter::once(target).chain(copies).collect();
            return self.add_node(group);
        }

        let parent = self
            .subtree(existing)
            .into_iter()
            .find(|id| self.children(*id).contains(&target));
        match parent {
            Some(parent) => {
                let siblings = &mut self.node_mut(parent).children;
                let slot = siblings.iter().position(|id| *id == target).map_or(siblings.len(), |i| i + 1);
                siblings.splice(slot..slot, copies);
            }
            None => warn!("Frontier {} is outside its fragment; count {} ignored", target.index(), count),
        }
        existing
    }

    /// A singly bonded chain unit appended to a chain node becomes the new
    /// frontier, so consecutive attachments grow one chain instead of a star.
    fn advance_frontier(&mut self, existing: NodeId, target: NodeId, incoming: NodeId) {
        let node = self.node(incoming);
        if node.combiner
            || !node.combine_linearly
            || node.order_to_parent != BondOrder::Single
            || !self.node(target).combine_linearly
        {
            return;
        }
        let tail = node
            .combining_child
            .or(node.right_branch_end)
            .unwrap_or(incoming);
        self.set_combining_child(existing, tail);
    }
}

#[cfg(test)]
mod tests {
    use crate::*;

    fn carbon() -> Fragment {
        Fragment::atom(Element::C)
    }

    #[test]
    fn test_attach_plain_child() {
        let mut oxygen = Fragment::atom(Element::O);
        oxygen.attach(carbon()).unwrap();
        assert_eq!(oxygen.to_string(), "-O(-C)");
    }

    #[test]
    fn test_sequential_attachments_grow_a_chain() {
        let mut chain = carbon();
        chain.attach(carbon()).unwrap();
        chain.attach(carbon()).unwrap();
        assert_eq!(chain.to_string(), "-C(-C(-C))");
        assert_eq!(chain.node_count(), 3);
    }

    #[test]
    fn test_non_chain_root_branches() {
        let mut sulfur = Fragment::atom(Element::S);
        sulfur.attach(carbon()).unwrap();
        sulfur.attach(Fragment::atom(Element::O)).unwrap();
        assert_eq!(sulfur.to_string(), "-S(-C,-O)");
    }

    #[test]
    fn test_combiner_receives_next_attachment() {
        let mut acid = carbon();
        let root = acid.root();
        acid.push_child(root, FragmentNode::new(Element::O).with_order(BondOrder::Double));
        acid.push_child(root, FragmentNode::new(Element::O).flag_for_combining());

        let mut ethyl = carbon();
        let ethyl_root = ethyl.root();
        ethyl.push_child(ethyl_root, FragmentNode::new(Element::C));

        acid.attach(ethyl).unwrap();
        assert_eq!(acid.to_string(), "-C(=O,-O(-C(-C)))");
    }

    #[test]
    fn test_incoming_combiner_becomes_frontier() {
        let mut nitrogen = Fragment::atom(Element::N);
        nitrogen
            .attach(Fragment::new(FragmentNode::new(Element::O).flag_for_combining()))
            .unwrap();
        nitrogen.attach(Fragment::atom(Element::S)).unwrap();
        assert_eq!(nitrogen.to_string(), "-N(-O(-S))");
    }

    #[test]
    fn test_repeat_extends_carbon_chain() {
        let mut chain = carbon();
        chain.attach(Fragment::repeat(4)).unwrap();
        assert_eq!(chain.to_string(), "-C(-C(-C(-C)))");

        let thetas: Vec<usize> = chain.walk().map(|(_, id)| chain.node(id).theta_offset).collect();
        assert_eq!(thetas, vec![0, 1, 0, 1]);

        chain.attach(Fragment::atom(Element::Cl)).unwrap();
        assert_eq!(chain.to_string(), "-C(-C(-C(-C(-Cl))))");
    }

    #[test]
    fn test_repeat_on_branching_node_groups() {
        let mut fluorine = Fragment::new(FragmentNode::new(Element::F).with_terminal(true));
        fluorine.attach(Fragment::repeat(3)).unwrap();
        assert!(fluorine.root_node().pseudo);
        assert_eq!(fluorine.to_string(), "-?(-F,-F,-F)");

        // A grouped node splices its children into the receiver.
        let mut methyl = carbon();
        methyl.attach(fluorine).unwrap();
        assert_eq!(methyl.to_string(), "-C(-F,-F,-F)");
    }

    #[test]
    fn test_pseudo_group_is_flattened() {
        let mut group = Fragment::pseudo();
        let root = group.root();
        for _ in 0..3 {
            group.push_child(root, FragmentNode::new(Element::C));
        }
        let mut nitrogen = Fragment::atom(Element::N);
        nitrogen.attach(group).unwrap();
        assert_eq!(nitrogen.to_string(), "-N(-C,-C,-C)");
        assert!(nitrogen.walk().all(|(_, id)| !nitrogen.node(id).pseudo));
    }

    #[test]
    fn test_inverted_repeat_reverses_roles() {
        let mut inverted = Fragment::repeat(2);
        let root = inverted.root();
        inverted.push_child(root, FragmentNode::new(Element::O));

        let mut chain = carbon();
        chain.attach(inverted).unwrap();
        assert_eq!(chain.root_node().symbol, Symbol::Atom(Element::O));
        assert_eq!(chain.to_string(), "-O(-C(-C))");
    }

    #[test]
    fn test_repeat_with_two_units_is_contradiction() {
        let mut ambiguous = Fragment::repeat(2);
        let root = ambiguous.root();
        ambiguous.push_child(root, FragmentNode::new(Element::O));
        ambiguous.push_child(root, FragmentNode::new(Element::N));

        let mut chain = carbon();
        let err = chain.attach(ambiguous).unwrap_err();
        assert_eq!(
            err,
            AttachError::AmbiguousRepeat { node: "-'2'(-O,-N)".to_string(), children: 2 }
        );
    }

    #[test]
    fn test_failed_attach_leaves_receiver_unchanged() {
        let mut ambiguous = Fragment::repeat(3);
        let root = ambiguous.root();
        ambiguous.push_child(root, FragmentNode::new(Element::O));
        ambiguous.push_child(root, FragmentNode::new(Element::N));

        let mut chain = carbon();
        let before = chain.clone();
        assert!(chain.attach(ambiguous).is_err());
        assert_eq!(chain, before);
        assert_eq!(chain.to_string(), "-C");
    }

    fn ring() -> Fragment {
        let mut ring = Fragment::new(FragmentNode::new(Element::C).with_combine_linearly(false));
        let ipso = ring.root();
        let tail = ring.push_chain(
            ipso,
            [
                FragmentNode::new(Element::C).with_order(BondOrder::Double),
                FragmentNode::new(Element::C),
            ],
        );
        ring.set_ring_bond(tail, ipso, BondOrder::Double);
        ring
    }

    fn ring_closures(fragment: &Fragment) -> Vec<(NodeId, NodeId)> {
        fragment
            .walk()
            .filter_map(|(_, id)| fragment.node(id).ring_bond.map(|ring| (id, ring.target)))
            .collect()
    }

    #[test]
    fn test_repeat_after_ring_repeats_the_ring() {
        let mut rings = ring();
        rings.attach(Fragment::repeat(3)).unwrap();
        assert!(rings.root_node().pseudo);
        assert_eq!(rings.to_string(), "-?(-C(=C(-C)),-C(=C(-C)),-C(=C(-C)))");
        let ipsos = rings.children(rings.root()).to_vec();
        let targets: Vec<NodeId> = ring_closures(&rings).into_iter().map(|(_, target)| target).collect();
        assert_eq!(targets, ipsos);

        let mut phosphine = Fragment::atom(Element::P);
        phosphine.attach(rings).unwrap();
        assert_eq!(phosphine.to_string(), "-P(-C(=C(-C)),-C(=C(-C)),-C(=C(-C)))");
        assert!(phosphine.walk().all(|(_, id)| !phosphine.node(id).pseudo));
        let targets: Vec<NodeId> = ring_closures(&phosphine).into_iter().map(|(_, target)| target).collect();
        assert_eq!(targets, phosphine.children(phosphine.root()).to_vec());
    }

    #[test]
    fn test_repeat_after_group_stays_flat() {
        let mut group = Fragment::pseudo();
        let root = group.root();
        let oxygen = group.push_child(root, FragmentNode::new(Element::O));
        group.push_child(oxygen, FragmentNode::new(Element::C));

        group.attach(Fragment::repeat(2)).unwrap();
        assert_eq!(group.to_string(), "-?(-O(-C),-O(-C))");

        let mut sulfur = Fragment::atom(Element::S);
        sulfur.attach(group).unwrap();
        assert_eq!(sulfur.to_string(), "-S(-O(-C),-O(-C))");
    }

    #[test]
    fn test_repeat_below_the_root_adds_siblings() {
        let mut sulfur = Fragment::atom(Element::S);
        let root = sulfur.root();
        let branch = sulfur.push_child(root, FragmentNode::new(Element::N).flag_for_combining());
        sulfur.push_child(branch, FragmentNode::new(Element::O));
        sulfur.push_child(root, FragmentNode::new(Element::F));

        sulfur.attach(Fragment::repeat(2)).unwrap();
        assert_eq!(sulfur.to_string(), "-S(-N(-O),-N(-O),-F)");
    }

    #[test]
    fn test_ring_bond_survives_attachment() {
        let mut ring = carbon();
        let ring_root = ring.root();
        let tail = ring.push_chain(ring_root, (0..5).map(|_| FragmentNode::new(Element::C)));
        ring.set_ring_bond(tail, ring_root, BondOrder::Single);

        let mut oxygen = Fragment::atom(Element::O);
        oxygen.attach(ring).unwrap();
        let (closing, bond) = oxygen
            .walk()
            .find_map(|(_, id)| oxygen.node(id).ring_bond.map(|bond| (id, bond)))
            .unwrap();
        assert_ne!(closing, bond.target);
        assert_eq!(oxygen.children(oxygen.root()), &[bond.target]);
    }
}
