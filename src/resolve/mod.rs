//! Turning one shorthand token into a fragment.
//!
//! Resolution tries, in order: an aliphatic `CH2CH2...` run, the functional
//! group table, a parenthesized group with a count, a lone element symbol,
//! the OCR confusion rewrites, and a bare repeat count. Anything left is split
//! greedily into the longest recognizable prefix and a recursively resolved
//! suffix, and the two halves are attached.

mod groups;
mod normalize;
mod patterns;

use lazy_static::lazy_static;
use tracing::*;

use crate::{Element, Fragment, FragmentNode, ResolveError, ResolverConfig};
use patterns::{aliphatic_run, group_repeat, positive_integer};

/// Element symbols that are accepted as a complete token.
pub const ACCEPTED_ELEMENTS: [Element; 10] = [
    Element::C,
    Element::N,
    Element::O,
    Element::H,
    Element::S,
    Element::P,
    Element::B,
    Element::Br,
    Element::Cl,
    Element::F,
];

/// Outcome of resolving a token that did not hit a contradiction.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(Fragment),
    /// No rule recognizes the token. The caller decides what to do with it.
    NoMatch,
}

impl Resolution {
    pub fn fragment(&self) -> Option<&Fragment> {
        match self {
            Resolution::Resolved(fragment) => Some(fragment),
            Resolution::NoMatch => None,
        }
    }

    pub fn into_fragment(self) -> Option<Fragment> {
        match self {
            Resolution::Resolved(fragment) => Some(fragment),
            Resolution::NoMatch => None,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    pub fn map(self, f: impl FnOnce(Fragment) -> Fragment) -> Self {
        match self {
            Resolution::Resolved(fragment) => Resolution::Resolved(f(fragment)),
            Resolution::NoMatch => Resolution::NoMatch,
        }
    }
}

impl From<Option<Fragment>> for Resolution {
    fn from(fragment: Option<Fragment>) -> Self {
        match fragment {
            Some(fragment) => Resolution::Resolved(fragment),
            None => Resolution::NoMatch,
        }
    }
}

/// Resolves tokens under a fixed [`ResolverConfig`].
///
/// A resolver holds no state between tokens, so one instance can be shared
/// freely across threads.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    config: ResolverConfig,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve `token` with every rule, including the greedy split.
    pub fn resolve(&self, token: &str) -> Result<Resolution, ResolveError> {
        self.resolve_with(token, false)
    }

    /// Resolve `token`; with `token_only` set, the token must be recognized as
    /// a whole and is never split.
    pub fn resolve_with(&self, token: &str, token_only: bool) -> Result<Resolution, ResolveError> {
        let mut session = Session::new(self.config, token);
        match session.resolve(token, token_only) {
            Ok(fragment) => {
                let resolution = Resolution::from(fragment);
                match resolution.fragment() {
                    Some(fragment) => debug!("Resolved {} as {}", token, fragment),
                    None => debug!("No rule matches {}", token),
                }
                Ok(resolution)
            }
            Err(Abort::StepLimit) => {
                warn!(
                    "Gave up on {} after {} resolution steps",
                    token, self.config.max_steps
                );
                Ok(Resolution::NoMatch)
            }
            Err(Abort::Fatal(err)) => {
                warn!("{}", err);
                Err(err)
            }
        }
    }

    /// Resolve `token` and prepare the result for merging into a drawing:
    /// explicit hydrogens are dropped and schematic coordinates are laid out,
    /// as configured.
    pub fn interpret(&self, token: &str) -> Result<Resolution, ResolveError> {
        Ok(self.resolve(token)?.map(|mut fragment| {
            if self.config.strip_hydrogens {
                fragment.strip_implicit_hydrogens();
            }
            if self.config.generate_coordinates {
                fragment.generate_coordinates();
            }
            fragment
        }))
    }
}

lazy_static! {
    static ref DEFAULT_RESOLVER: Resolver = Resolver::default();
}

/// Resolve `token` with the default configuration.
pub fn resolve(token: &str) -> Result<Resolution, ResolveError> {
    DEFAULT_RESOLVER.resolve(token)
}

/// Resolve, strip and lay out `token` with the default configuration.
pub fn interpret(token: &str) -> Result<Resolution, ResolveError> {
    DEFAULT_RESOLVER.interpret(token)
}

pub(crate) enum Abort {
    StepLimit,
    Fatal(ResolveError),
}

pub(crate) type Step = Result<Option<Fragment>, Abort>;

/// State of one top-level resolution: the step budget is shared by every
/// recursive call made on behalf of `token`.
pub(crate) struct Session {
    config: ResolverConfig,
    steps: usize,
    token: String,
}

impl Session {
    fn new(config: ResolverConfig, token: &str) -> Self {
        Self {
            config,
            steps: 0,
            token: token.to_string(),
        }
    }

    fn resolve(&mut self, token: &str, token_only: bool) -> Step {
        self.steps += 1;
        if self.steps > self.config.max_steps {
            return Err(Abort::StepLimit);
        }

        if let Some(units) = aliphatic_run(token) {
            trace!("{} is an aliphatic run of {}", token, units);
            return Ok(Some(aliphatic_chain(units)));
        }

        if let Some(rule) = groups::lookup(token) {
            trace!("{} matches the {} group", token, rule.name);
            return (rule.build)(self);
        }

        if let Some(group) = group_repeat(token) {
            if group.nitrogen {
                let rewritten = format!("N({}){}", group.inner, group.digits);
                trace!("Reading {} as {}", token, rewritten);
                return self.resolve(&rewritten, false);
            }
            if let Some(pseudo) = self.expand_group(group.inner, group.count())? {
                return Ok(Some(pseudo));
            }
        }

        if let Some(element) = accepted_element(token) {
            let node = FragmentNode::new(element).with_terminal(element.is_halogen());
            return Ok(Some(Fragment::new(node)));
        }

        if let Some((name, rewritten)) = normalize::rewrite(token) {
            if rewritten == token {
                warn!("Rewrite {} leaves {} unchanged", name, token);
                return Ok(None);
            }
            trace!("Rewrote {} to {} ({})", token, rewritten, name);
            // A candidate prefix stays unsplit through its rewrites.
            return self.resolve(&rewritten, token_only);
        }

        if let Some(count) = positive_integer(token) {
            if count <= self.config.max_repeat {
                return Ok(Some(Fragment::repeat(count)));
            }
            debug!("Repeat count {} is out of range", count);
        }

        if token_only {
            return Ok(None);
        }
        self.split(token)
    }

    /// `n` independent copies of `inner` under a pseudo node. Every copy has
    /// to resolve to a real node, otherwise the whole group is rejected.
    fn expand_group(&mut self, inner: &str, count: Option<usize>) -> Step {
        let Some(count) = count.filter(|count| (1..=self.config.max_group_repeat).contains(count)) else {
            debug!("Group ({}) has no usable count", inner);
            return Ok(None);
        };

        let mut group = Fragment::pseudo();
        for _ in 0..count {
            match self.resolve(inner, false)? {
                Some(unit) if unit.root_node().is_real() => self.join(&mut group, unit)?,
                _ => {
                    debug!("Group ({}) does not resolve to a real unit", inner);
                    return Ok(None);
                }
            }
        }
        Ok(Some(group))
    }

    /// Longest recognizable prefix first; a prefix whose remainder does not
    /// resolve gives way to the next shorter one.
    fn split(&mut self, token: &str) -> Step {
        let cuts: Vec<usize> = token.char_indices().skip(1).map(|(i, _)| i).collect();
        for cut in cuts.into_iter().rev() {
            let (prefix, suffix) = token.split_at(cut);
            let Some(mut parent) = self.resolve(prefix, true)? else {
                continue;
            };
            if let Some(child) = self.resolve(suffix, false)? {
                debug!("Split {} into {} + {}", token, prefix, suffix);
                self.join(&mut parent, child)?;
                return Ok(Some(parent));
            }
        }
        Ok(None)
    }

    /// Resolve `token` on the full path, as table entries that are defined
    /// in terms of other entries do.
    pub(crate) fn delegate(&mut self, token: &str) -> Step {
        self.resolve(token, false)
    }

    /// Resolve both tokens and attach the second to the first.
    pub(crate) fn combine(&mut self, parent: &str, child: &str) -> Step {
        let (Some(mut parent), Some(child)) = (self.delegate(parent)?, self.delegate(child)?) else {
            return Ok(None);
        };
        self.join(&mut parent, child)?;
        Ok(Some(parent))
    }

    pub(crate) fn join(&mut self, parent: &mut Fragment, child: Fragment) -> Result<(), Abort> {
        parent.attach(child).map_err(|source| {
            Abort::Fatal(ResolveError::StructuralContradiction {
                token: self.token.clone(),
                source,
            })
        })
    }
}

fn accepted_element(token: &str) -> Option<Element> {
    let upper = token.to_uppercase();
    ACCEPTED_ELEMENTS
        .iter()
        .copied()
        .find(|element| element.symbol() == token || element.symbol() == upper)
}

/// A straight carbon chain whose two ends are recorded on the root.
fn aliphatic_chain(units: usize) -> Fragment {
    let mut chain = Fragment::atom(Element::C);
    let root = chain.root();
    let tail = chain.push_chain(
        root,
        (1..units).map(|i| FragmentNode::new(Element::C).with_theta_offset(i % 2)),
    );
    chain.set_branch_ends(root, tail);
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BondOrder, Symbol};

    fn fragment(token: &str) -> Fragment {
        resolve(token).unwrap().into_fragment().unwrap()
    }

    fn rendered(token: &str) -> String {
        fragment(token).to_string()
    }

    #[test]
    fn test_single_elements() {
        for element in ACCEPTED_ELEMENTS {
            let fragment = fragment(element.symbol());
            assert_eq!(fragment.node_count(), 1);
            assert_eq!(fragment.root_node().symbol, Symbol::Atom(element));
            let terminal = matches!(element, Element::F | Element::Br | Element::Cl);
            assert_eq!(fragment.root_node().terminal, terminal, "{}", element);
        }
        assert_eq!(rendered("n"), "-N");
    }

    #[test]
    fn test_carboxyl_spellings_agree() {
        let acid = fragment("CO2H");
        assert_eq!(acid.to_string(), "-C(=O,-O)");
        for token in ["COOH", "HOOC", "C02H"] {
            assert_eq!(fragment(token), acid, "{}", token);
        }

        let root = acid.root();
        let combining = acid.node_for_linear_combine(root);
        assert!(acid.node(combining).combiner);
        assert_eq!(acid.node(combining).order_to_parent, BondOrder::Single);
    }

    #[test]
    fn test_nitro_spellings_agree() {
        assert_eq!(rendered("NO2"), "-N+(=O,-O-)");
        assert_eq!(fragment("NO2"), fragment("O2N"));
    }

    #[test]
    fn test_group_repeat_flattens_on_attach() {
        let group = fragment("(CH2)3");
        assert!(group.root_node().pseudo);
        assert_eq!(group.to_string(), "-?(-C,-C,-C)");

        let mut amine = fragment("N");
        amine.attach(group).unwrap();
        assert_eq!(amine.to_string(), "-N(-C,-C,-C)");
    }

    #[test]
    fn test_group_repeat_bounds() {
        assert_eq!(resolve("(CH2)12").unwrap(), Resolution::NoMatch);

        let resolver = Resolver::new(ResolverConfig::default().with_max_group_repeat(12));
        let group = resolver.resolve("(CH2)12").unwrap().into_fragment().unwrap();
        assert_eq!(group.children(group.root()).len(), 12);
    }

    #[test]
    fn test_group_needs_real_units() {
        assert_eq!(resolve("(Zq)2").unwrap(), Resolution::NoMatch);
        assert_eq!(resolve("(3)2").unwrap(), Resolution::NoMatch);
    }

    #[test]
    fn test_group_before_nitrogen() {
        assert_eq!(rendered("(CH3)2N"), "-N(-C,-C)");
    }

    #[test]
    fn test_table_entry_beats_split() {
        assert_eq!(rendered("OCH3"), "-O(-C)");
        assert_eq!(rendered("MeO"), "-O(-C)");
    }

    #[test]
    fn test_split_matches_independent_halves() {
        let mut expected = fragment("SO2");
        expected.attach(fragment("Ph")).unwrap();
        assert_eq!(fragment("SO2Ph"), expected);
    }

    #[test]
    fn test_ester_either_way_round() {
        assert_eq!(rendered("EtO2C"), "-C(=O,-O(-C(-C)))");
        assert_eq!(fragment("CO2Et"), fragment("EtO2C"));
    }

    #[test]
    fn test_unknown_token() {
        assert_eq!(resolve("Zq9!").unwrap(), Resolution::NoMatch);
        assert!(!resolve("").unwrap().is_match());
    }

    #[test]
    fn test_repeat_counts() {
        assert_eq!(rendered("3"), "-'3'");
        assert_eq!(rendered("CF3"), "-C(-F,-F,-F)");
        assert_eq!(rendered("C4H9"), "-C(-C(-C(-C)))");
        assert_eq!(fragment("nBu"), fragment("C4H9"));
        assert_eq!(resolve("100").unwrap(), Resolution::NoMatch);
    }

    #[test]
    fn test_count_before_unit_is_inverted() {
        let inverted = fragment("C2O");
        assert_eq!(inverted.root_node().symbol, Symbol::Atom(Element::O));
        assert_eq!(inverted.to_string(), "-O(-C(-C))");
    }

    #[test]
    fn test_contradiction_is_reported() {
        let err = resolve("C2(CH3)2").unwrap_err();
        assert_eq!(err.token(), "C2(CH3)2");
        let ResolveError::StructuralContradiction { source, .. } = err;
        assert_eq!(
            source,
            crate::AttachError::AmbiguousRepeat { node: "-'2'(-C,-C)".to_string(), children: 2 }
        );
    }

    #[test]
    fn test_ocr_rewrites() {
        assert_eq!(rendered("HO"), "-O");
        assert_eq!(rendered("Ct"), "-Cl");
        assert!(fragment("Ct").root_node().terminal);
        assert_eq!(rendered("0"), "-O");
        assert_eq!(rendered("Bt1"), rendered("Bn"));
    }

    #[test]
    fn test_step_budget() {
        let resolver = Resolver::new(ResolverConfig::default().with_max_steps(3));
        assert_eq!(resolver.resolve("SO2Ph").unwrap(), Resolution::NoMatch);
        assert!(resolver.resolve("SO2").unwrap().is_match());
    }

    #[test]
    fn test_token_only_never_splits() {
        let resolver = Resolver::default();
        assert!(resolver.resolve_with("SO2", true).unwrap().is_match());
        assert_eq!(resolver.resolve_with("SO2Ph", true).unwrap(), Resolution::NoMatch);
    }

    #[test]
    fn test_phenyl_ring_closes_on_root() {
        let phenyl = fragment("Ph");
        assert_eq!(phenyl.to_string(), "-C(=C(-C(=C(-C(=C)))))");
        let ring = phenyl
            .walk()
            .find_map(|(_, id)| phenyl.node(id).ring_bond)
            .unwrap();
        assert_eq!(ring.target, phenyl.root());
        assert!(!phenyl.root_node().combine_linearly);
    }

    #[test]
    fn test_triphenyl_keeps_every_ring() {
        let phenyl = rendered("Ph");
        let phosphine = fragment("PPh3");
        assert_eq!(phosphine.to_string(), format!("-P({},{},{})", phenyl, phenyl, phenyl));

        let ipsos = phosphine.children(phosphine.root()).to_vec();
        let targets: Vec<_> = phosphine
            .walk()
            .filter_map(|(_, id)| phosphine.node(id).ring_bond.map(|ring| ring.target))
            .collect();
        assert_eq!(targets, ipsos);
        assert!(phosphine.walk().all(|(_, id)| phosphine.node(id).is_real()));

        let rings = fragment("Ph3");
        assert!(rings.root_node().pseudo);
        assert_eq!(rings.children(rings.root()).len(), 3);
        assert!(rings
            .walk()
            .filter_map(|(_, id)| rings.node(id).ring_bond)
            .all(|ring| ring.target != rings.root()));
    }

    #[test]
    fn test_templates() {
        assert_eq!(rendered("N3"), "-N-(-N+(#N))");
        assert_eq!(rendered("Boc"), "-C(=O,-O(-C(-C,-C,-C)))");
        assert_eq!(
            rendered("Boc2N"),
            "-N(-C(=O,-O(-C(-C,-C,-C))),-C(=O,-O(-C(-C,-C,-C))))"
        );
        assert_eq!(rendered("[p-tol]"), "-C(=C(-C(=C(-C(=C),-C))))");
        assert_eq!(rendered("Ts"), "-S(=O,=O,-C(=C(-C(=C(-C(=C),-C)))))");
        assert_eq!(rendered("PMBN"), "-N(-C(-C(=C(-C(=C(-C(=C),-O(-C)))))))");
        assert_eq!(rendered("SOCH3"), "-S+(-O-,-C)");
        assert_eq!(rendered("CH3CONH"), "-N(-C(=O,-C))");
    }

    #[test]
    fn test_resolution_accessors() {
        let resolution = resolve("OH").unwrap();
        assert!(resolution.fragment().unwrap().root_node().terminal);
        assert_eq!(resolution.fragment().unwrap().root_node().symbol.element(), Some(Element::O));
        assert_eq!(Resolution::NoMatch.fragment(), None);
    }

    #[test]
    fn test_aliphatic_run_is_a_chain() {
        let chain = fragment("CH2CH2CH2");
        assert_eq!(chain.to_string(), "-C(-C(-C))");
        assert!(chain.can_be_chain());
    }

    #[test]
    fn test_cysteine_ester_keeps_frontier_on_carbonyl() {
        let mut ester = fragment("CO2Cys");
        assert_eq!(ester.to_string(), "-C(=O,-O(-N(-C(-C(-S),-C(=O)))))");
        ester.attach(fragment("Me")).unwrap();
        assert_eq!(ester.to_string(), "-C(=O,-O(-N(-C(-C(-S),-C(=O,-C)))))");
    }

    #[test]
    fn test_interpret_strips_and_lays_out() {
        assert_eq!(rendered("Sh"), "-S(-H)");

        let interpreted = interpret("Sh").unwrap().into_fragment().unwrap();
        assert_eq!(interpreted.to_string(), "-S");

        let ethyl = interpret("Et").unwrap().into_fragment().unwrap();
        let child = ethyl.children(ethyl.root())[0];
        let position = ethyl.node(child).suggested_position;
        assert!((position.x - 0.5).abs() < 1e-9);
        assert!((position.y + 3f64.sqrt() / 2.0).abs() < 1e-9);

        let raw = Resolver::new(ResolverConfig::default().with_strip_hydrogens(false));
        assert_eq!(raw.interpret("Sh").unwrap().into_fragment().unwrap().to_string(), "-S(-H)");
    }
}
