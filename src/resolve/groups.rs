//! The literal functional-group table.
//!
//! Each rule pairs a token pattern with a builder producing a fresh fragment.
//! Rules are tried in order and the first one whose pattern matches decides
//! the token; builders may delegate to other tokens through the [`Session`].

use lazy_static::lazy_static;

use super::patterns::{dashed_nitrogen, dashed_oxygen};
use super::{Session, Step};
use crate::{BondOrder, Element::*, Fragment, FragmentNode, Wedge};

pub(crate) enum Pattern {
    /// Literals compared without regard to case.
    AnyCase(&'static [&'static str]),
    /// Literals whose case distinguishes them from element symbols.
    Exact(&'static [&'static str]),
    Shape(fn(&str) -> bool),
}

impl Pattern {
    fn matches(&self, token: &str) -> bool {
        match self {
            Pattern::AnyCase(literals) => literals.iter().any(|l| l.eq_ignore_ascii_case(token)),
            Pattern::Exact(literals) => literals.contains(&token),
            Pattern::Shape(recognize) => recognize(token),
        }
    }
}

pub(crate) struct Rule {
    pub name: &'static str,
    pub pattern: Pattern,
    pub build: fn(&mut Session) -> Step,
}

use Pattern::*;

lazy_static! {
    static ref GROUPS: Vec<Rule> = vec![
        Rule { name: "amide", pattern: AnyCase(&["NHCO"]), build: amide },
        Rule { name: "acetamide", pattern: AnyCase(&["CH3CONH"]), build: acetamide },
        Rule {
            name: "carboxyl",
            pattern: AnyCase(&[
                "CO2H", "CO2", "COOH", "HOOC", "HO2C", "OOC", "COO",
                "C02H", "C02", "C00H", "H00C", "H02C", "O00", "C00",
            ]),
            build: carboxyl,
        },
        Rule { name: "nitrile", pattern: AnyCase(&["CN", "NC"]), build: nitrile },
        Rule { name: "sulfonate", pattern: AnyCase(&["SO3", "O3S"]), build: sulfonate },
        Rule { name: "nitro", pattern: AnyCase(&["NO2", "O2N"]), build: nitro },
        Rule { name: "methyl", pattern: AnyCase(&["CH3"]), build: methyl },
        Rule { name: "methyl", pattern: Exact(&["Me", "Mc", "MC"]), build: methyl },
        Rule { name: "ethyl", pattern: Exact(&["Et"]), build: ethyl },
        Rule { name: "propyl", pattern: Exact(&["Pr"]), build: propyl },
        Rule { name: "iodine", pattern: Exact(&["t"]), build: iodine },
        Rule { name: "methylamino", pattern: Exact(&["NCH3", "NcH3", "NHcH3", "NHCH3"]), build: methylamino },
        Rule { name: "sulfonyl", pattern: AnyCase(&["SO2", "S02", "O2S", "02S"]), build: sulfonyl },
        Rule { name: "mesyl", pattern: AnyCase(&["Ms", "M8"]), build: mesyl },
        Rule { name: "boc", pattern: AnyCase(&["Boc"]), build: boc },
        Rule { name: "diboc-amine", pattern: AnyCase(&["Boc2N"]), build: diboc_amine },
        Rule { name: "azide", pattern: AnyCase(&["N3"]), build: azide },
        Rule { name: "carbonyl", pattern: AnyCase(&["CO"]), build: carbonyl },
        Rule { name: "hydroxyl", pattern: AnyCase(&["OH"]), build: hydroxyl },
        Rule { name: "oxymethylene", pattern: AnyCase(&["CH2O"]), build: oxymethylene },
        Rule { name: "acetyl", pattern: AnyCase(&["Ac"]), build: acetyl },
        Rule { name: "acetoxy", pattern: AnyCase(&["AcO"]), build: |s| s.combine("O", "Ac") },
        Rule { name: "ethyl ester", pattern: AnyCase(&["EtO2C"]), build: |s| s.combine("CO2", "Et") },
        Rule { name: "benzyl", pattern: AnyCase(&["Bn", "Bt1"]), build: |s| s.combine("C", "Ph") },
        Rule { name: "cbz", pattern: AnyCase(&["CBZ", "C6Z"]), build: cbz },
        Rule { name: "tert-butyl", pattern: Exact(&["t-Bu", "tBu", "t-Bo", "tBo"]), build: tert_butyl },
        Rule { name: "n-butyl", pattern: Exact(&["n-Bu", "nBu", "n-Bo", "nBo"]), build: |s| s.delegate("C4H9") },
        Rule { name: "cysteine ester", pattern: AnyCase(&["CO2Cys", "CO2Cy8"]), build: cysteine_ester },
        Rule { name: "cysteine", pattern: AnyCase(&["Cys"]), build: cysteine },
        Rule { name: "phenyl", pattern: Shape(|t| t.eq_ignore_ascii_case("Ph") || t == "Pb" || t == "pb"), build: phenyl },
        Rule { name: "p-tolyl", pattern: Exact(&["[p-tol]"]), build: p_tolyl },
        Rule { name: "tosyl", pattern: Exact(&["Ts"]), build: |s| s.delegate("SO2[p-tol]") },
        Rule { name: "p-methoxybenzylamine", pattern: AnyCase(&["PMBN"]), build: p_methoxybenzylamine },
        Rule { name: "methoxy", pattern: AnyCase(&["CH3O", "H3CO"]), build: |s| s.delegate("OCH3") },
        Rule { name: "methoxy", pattern: AnyCase(&["OCH3"]), build: |s| s.combine("O", "C") },
        Rule { name: "ethylamino", pattern: AnyCase(&["EtHN"]), build: |s| s.delegate("NHEt") },
        Rule { name: "formyl", pattern: AnyCase(&["OHC"]), build: |s| s.delegate("COH") },
        Rule { name: "hashed oxygen", pattern: Shape(dashed_oxygen), build: |s| s.delegate("O") },
        Rule { name: "hashed nitrogen", pattern: Shape(dashed_nitrogen), build: |s| s.delegate("N") },
        Rule { name: "sulfonium", pattern: AnyCase(&["S+"]), build: |_| charged(S) },
        Rule { name: "ammonium", pattern: AnyCase(&["N+", "+N"]), build: |_| charged(N) },
        Rule { name: "benzyloxy", pattern: AnyCase(&["BnO"]), build: |s| s.delegate("OBn") },
        Rule { name: "methoxy", pattern: AnyCase(&["MeO", "McO"]), build: |s| s.delegate("OMe") },
        Rule { name: "benzylamino", pattern: Exact(&["BnN", "Bt1N"]), build: |s| s.delegate("NBn") },
        Rule { name: "methylamino", pattern: Exact(&["MeN", "McN"]), build: |s| s.delegate("NMe") },
        Rule { name: "methylthio", pattern: Exact(&["MeS", "McS"]), build: |s| s.delegate("SMe") },
        Rule { name: "ethoxy", pattern: AnyCase(&["EtO"]), build: |s| s.delegate("OEt") },
        Rule { name: "trifluoromethoxy", pattern: AnyCase(&["F3CO"]), build: |s| s.delegate("OCF3") },
        Rule { name: "ethyl ester", pattern: AnyCase(&["EtOOC"]), build: |s| s.delegate("COOEt") },
        Rule { name: "methylthio", pattern: AnyCase(&["H3CS"]), build: |s| s.delegate("SCH3") },
        Rule { name: "phosphino", pattern: AnyCase(&["PH3C"]), build: |s| s.delegate("CPH3") },
        Rule { name: "hydroxymethyl", pattern: AnyCase(&["HOH2C"]), build: |s| s.delegate("CH2OH") },
        Rule { name: "methylsulfinyl", pattern: AnyCase(&["SOCH3"]), build: methylsulfinyl },
    ];
}

/// The first table rule whose pattern matches `token`.
pub(crate) fn lookup(token: &str) -> Option<&'static Rule> {
    GROUPS.iter().find(|rule| rule.pattern.matches(token))
}

fn double(node: FragmentNode) -> FragmentNode {
    node.with_order(BondOrder::Double)
}

fn amide(_: &mut Session) -> Step {
    let mut amide = Fragment::atom(N);
    let root = amide.root();
    let carbon = amide.push_child(root, FragmentNode::new(C).with_theta_offset(1));
    amide.push_child(carbon, double(FragmentNode::new(O)));
    amide.set_branch_ends(root, carbon);
    Ok(Some(amide))
}

fn acetamide(s: &mut Session) -> Step {
    let Some(acetyl) = s.combine("CO", "C")? else {
        return Ok(None);
    };
    let mut amine = Fragment::atom(N);
    s.join(&mut amine, acetyl)?;
    Ok(Some(amine))
}

fn carboxyl(_: &mut Session) -> Step {
    let mut acid = Fragment::atom(C);
    let root = acid.root();
    acid.push_child(root, double(FragmentNode::new(O)));
    acid.push_child(root, FragmentNode::new(O).flag_for_combining());
    Ok(Some(acid))
}

fn nitrile(_: &mut Session) -> Step {
    let mut nitrile = Fragment::atom(C);
    let root = nitrile.root();
    nitrile.push_child(root, FragmentNode::new(N).with_order(BondOrder::Triple));
    Ok(Some(nitrile))
}

fn sulfonate(_: &mut Session) -> Step {
    let mut sulfonate = Fragment::atom(S);
    let root = sulfonate.root();
    sulfonate.push_child(root, double(FragmentNode::new(O)));
    sulfonate.push_child(root, double(FragmentNode::new(O)));
    sulfonate.push_child(root, FragmentNode::new(O).flag_for_combining());
    Ok(Some(sulfonate))
}

fn nitro(_: &mut Session) -> Step {
    let mut nitro = Fragment::new(FragmentNode::new(N).with_charge(1));
    let root = nitro.root();
    nitro.push_child(root, double(FragmentNode::new(O)));
    nitro.push_child(root, FragmentNode::new(O).with_charge(-1));
    Ok(Some(nitro))
}

fn methyl_node() -> FragmentNode {
    FragmentNode::new(C).with_combine_linearly(false).with_terminal(true)
}

fn methyl(_: &mut Session) -> Step {
    Ok(Some(Fragment::new(methyl_node())))
}

fn ethyl(_: &mut Session) -> Step {
    let mut ethyl = Fragment::atom(C);
    let root = ethyl.root();
    ethyl.push_child(root, FragmentNode::new(C));
    Ok(Some(ethyl))
}

fn propyl(_: &mut Session) -> Step {
    let mut propyl = Fragment::atom(C);
    let root = propyl.root();
    propyl.push_chain(root, [FragmentNode::new(C), FragmentNode::new(C)]);
    Ok(Some(propyl))
}

fn iodine(_: &mut Session) -> Step {
    Ok(Some(Fragment::atom(I)))
}

fn methylamino(_: &mut Session) -> Step {
    let mut amine = Fragment::atom(N);
    let root = amine.root();
    amine.push_child(root, FragmentNode::new(C));
    Ok(Some(amine))
}

fn sulfonyl(_: &mut Session) -> Step {
    let mut sulfonyl = Fragment::atom(S);
    let root = sulfonyl.root();
    sulfonyl.push_child(root, double(FragmentNode::new(O)));
    sulfonyl.push_child(root, double(FragmentNode::new(O)));
    Ok(Some(sulfonyl))
}

fn mesyl(_: &mut Session) -> Step {
    let mut mesyl = Fragment::atom(S);
    let root = mesyl.root();
    mesyl.push_child(root, double(FragmentNode::new(O)));
    mesyl.push_child(root, double(FragmentNode::new(O)));
    mesyl.push_child(root, FragmentNode::new(C));
    Ok(Some(mesyl))
}

fn boc(_: &mut Session) -> Step {
    let mut boc = Fragment::atom(C);
    let root = boc.root();
    boc.push_child(root, double(FragmentNode::new(O)));
    let oxygen = boc.push_child(root, FragmentNode::new(O));
    let quaternary = boc.push_child(oxygen, FragmentNode::new(C));
    for _ in 0..3 {
        boc.push_child(quaternary, FragmentNode::new(C));
    }
    Ok(Some(boc))
}

fn diboc_amine(s: &mut Session) -> Step {
    let mut amine = Fragment::atom(N);
    for _ in 0..2 {
        let Some(boc) = s.delegate("Boc")? else {
            return Ok(None);
        };
        s.join(&mut amine, boc)?;
    }
    Ok(Some(amine))
}

fn azide(_: &mut Session) -> Step {
    let mut azide = Fragment::new(FragmentNode::new(N).with_charge(-1));
    let root = azide.root();
    let middle = azide.push_child(root, FragmentNode::new(N).with_charge(1));
    azide.push_child(middle, FragmentNode::new(N).with_order(BondOrder::Triple));
    Ok(Some(azide))
}

fn carbonyl(_: &mut Session) -> Step {
    let mut carbonyl = Fragment::atom(C);
    let root = carbonyl.root();
    carbonyl.push_child(root, double(FragmentNode::new(O)));
    Ok(Some(carbonyl))
}

fn hydroxyl(_: &mut Session) -> Step {
    Ok(Some(Fragment::new(FragmentNode::new(O).with_terminal(true))))
}

fn oxymethylene(_: &mut Session) -> Step {
    let mut group = Fragment::atom(C);
    let root = group.root();
    group.push_child(root, FragmentNode::new(O));
    Ok(Some(group))
}

fn acetyl(_: &mut Session) -> Step {
    let mut acetyl = Fragment::atom(C);
    let root = acetyl.root();
    acetyl.push_child(root, FragmentNode::new(C));
    acetyl.push_child(root, double(FragmentNode::new(O)));
    Ok(Some(acetyl))
}

fn cbz(s: &mut Session) -> Step {
    let (Some(mut carbon), Some(benzyl)) = (s.delegate("C")?, s.delegate("Bn")?) else {
        return Ok(None);
    };
    let root = carbon.root();
    carbon.push_child(root, double(FragmentNode::new(O)));
    let mut oxygen = Fragment::atom(O);
    s.join(&mut oxygen, benzyl)?;
    s.join(&mut carbon, oxygen)?;
    Ok(Some(carbon))
}

fn tert_butyl(_: &mut Session) -> Step {
    let mut butyl = Fragment::atom(C);
    let root = butyl.root();
    for _ in 0..3 {
        butyl.push_child(root, FragmentNode::new(C));
    }
    Ok(Some(butyl))
}

/// The ester oxygen of the carboxyl takes the cysteine, and the cysteine's
/// own carbonyl stays the attachment point.
fn cysteine_ester(s: &mut Session) -> Step {
    let (Some(mut ester), Some(cysteine)) = (s.delegate("CO2")?, s.delegate("Cys")?) else {
        return Ok(None);
    };
    s.join(&mut ester, cysteine)?;

    let root = ester.root();
    let oxygen = ester.node_for_linear_combine(root);
    if let Some(&residue) = ester.children(oxygen).last() {
        let carbonyl = ester.node_for_linear_combine(residue);
        ester.set_combining_child(root, carbonyl);
    }
    Ok(Some(ester))
}

fn cysteine(_: &mut Session) -> Step {
    let mut cysteine = Fragment::atom(N);
    let root = cysteine.root();
    let alpha = cysteine.push_child(root, FragmentNode::new(C).flag_for_combining());
    let beta = cysteine.push_child(
        alpha,
        FragmentNode::new(C).with_theta_offset(1).with_wedge(Wedge::Wedge),
    );
    cysteine.push_child(beta, FragmentNode::new(S));
    let carbonyl = cysteine.push_child(alpha, FragmentNode::new(C));
    cysteine.push_child(carbonyl, double(FragmentNode::new(O)));
    cysteine.set_combining_child(root, carbonyl);
    Ok(Some(cysteine))
}

fn ring_root() -> FragmentNode {
    FragmentNode::new(C).with_theta_offset(1).with_combine_linearly(false)
}

/// Kekulé benzene written as a five-carbon chain below `ipso` that closes back
/// onto it. Returns the ortho, meta and para carbons of the first half.
fn push_benzene(fragment: &mut Fragment, ipso: crate::NodeId) -> [crate::NodeId; 3] {
    let ortho = fragment.push_child(ipso, double(FragmentNode::new(C)));
    let meta = fragment.push_child(ortho, FragmentNode::new(C));
    let para = fragment.push_child(meta, double(FragmentNode::new(C)));
    let meta2 = fragment.push_child(para, FragmentNode::new(C));
    let ortho2 = fragment.push_child(meta2, double(FragmentNode::new(C)));
    fragment.set_ring_bond(ortho2, ipso, BondOrder::Single);
    [ortho, meta, para]
}

fn phenyl(_: &mut Session) -> Step {
    let mut phenyl = Fragment::new(ring_root());
    let root = phenyl.root();
    push_benzene(&mut phenyl, root);
    Ok(Some(phenyl))
}

fn p_tolyl(_: &mut Session) -> Step {
    let mut tolyl = Fragment::new(ring_root());
    let root = tolyl.root();
    let [_, _, para] = push_benzene(&mut tolyl, root);
    tolyl.push_child(para, FragmentNode::new(C));
    Ok(Some(tolyl))
}

fn p_methoxybenzylamine(_: &mut Session) -> Step {
    let mut amine = Fragment::new(FragmentNode::new(N).with_theta_offset(1));
    let root = amine.root();
    let methylene = amine.push_child(root, FragmentNode::new(C));
    let ipso = amine.push_child(methylene, ring_root());
    let [_, _, para] = push_benzene(&mut amine, ipso);
    let oxygen = amine.push_child(para, FragmentNode::new(O));
    amine.push_child(oxygen, FragmentNode::new(C));
    Ok(Some(amine))
}

fn charged(element: crate::Element) -> Step {
    Ok(Some(Fragment::new(FragmentNode::new(element).with_charge(1))))
}

fn methylsulfinyl(_: &mut Session) -> Step {
    let mut sulfinyl = Fragment::new(FragmentNode::new(S).with_charge(1));
    let root = sulfinyl.root();
    sulfinyl.push_child(root, FragmentNode::new(O).with_charge(-1));
    sulfinyl.push_child(root, methyl_node());
    Ok(Some(sulfinyl))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(token: &str) -> &'static str {
        lookup(token).map(|rule| rule.name).unwrap_or("none")
    }

    #[test]
    fn test_case_sensitivity() {
        assert_eq!(rule("co2h"), "carboxyl");
        assert_eq!(rule("Me"), "methyl");
        assert_eq!(rule("ME"), "none");
        assert_eq!(rule("PH"), "phenyl");
        assert_eq!(rule("Pb"), "phenyl");
        assert_eq!(rule("PB"), "none");
        assert_eq!(rule("tbu"), "none");
        assert_eq!(rule("tBu"), "tert-butyl");
    }

    #[test]
    fn test_shapes() {
        assert_eq!(rule("IIO"), "hashed oxygen");
        assert_eq!(rule("Nll"), "hashed nitrogen");
        assert_eq!(rule("+N"), "ammonium");
    }

    #[test]
    fn test_unknown_token() {
        assert!(lookup("Zq9!").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn test_benzene_ring_closes_on_ipso() {
        let mut fragment = Fragment::new(ring_root());
        let root = fragment.root();
        push_benzene(&mut fragment, root);
        assert_eq!(fragment.node_count(), 6);
        let doubles = fragment
            .walk()
            .filter(|(_, id)| fragment.node(*id).order_to_parent == BondOrder::Double && *id != root)
            .count();
        assert_eq!(doubles, 3);
        let closures: Vec<_> = fragment.walk().filter_map(|(_, id)| fragment.node(id).ring_bond).collect();
        assert_eq!(closures.len(), 1);
        assert_eq!(closures[0].target, root);
    }
}
