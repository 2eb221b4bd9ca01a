use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use tracing::level_filters::LevelFilter;

mod config;
pub use config::*;

mod error;
pub use error::*;

mod fragment;
pub use fragment::*;

mod attach;

mod layout;
pub use layout::*;

mod resolve;
pub use resolve::*;

mod visualize;
pub use visualize::*;

/// The atoms a shorthand label can expand into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Element {
    B,
    C,
    N,
    O,
    F,
    P,
    S,
    Cl,
    Br,
    I,
    H,
}

impl Element {
    pub fn symbol(&self) -> &'static str {
        match self {
            Element::B => "B",
            Element::C => "C",
            Element::N => "N",
            Element::O => "O",
            Element::F => "F",
            Element::P => "P",
            Element::S => "S",
            Element::Cl => "Cl",
            Element::Br => "Br",
            Element::I => "I",
            Element::H => "H",
        }
    }

    pub fn is_halogen(&self) -> bool {
        matches!(self, Element::F | Element::Cl | Element::Br | Element::I)
    }
}

impl FromStr for Element {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "B" => Element::B,
            "C" => Element::C,
            "N" => Element::N,
            "O" => Element::O,
            "F" => Element::F,
            "P" => Element::P,
            "S" => Element::S,
            "Cl" => Element::Cl,
            "Br" => Element::Br,
            "I" => Element::I,
            "H" => Element::H,
            _ => return Err(format!("Unknown element symbol: {}", s)),
        })
    }
}

impl Display for Element {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{}", self.symbol())
    }
}

/// Bond order between a node and its parent (or a ring-closure partner).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondOrder {
    #[default]
    Single,
    Double,
    Triple,
}

impl BondOrder {
    pub fn order(&self) -> u8 {
        match self {
            BondOrder::Single => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
        }
    }

    /// The SMILES-style bond character, also used when rendering fragments.
    pub fn marker(&self) -> char {
        match self {
            BondOrder::Single => '-',
            BondOrder::Double => '=',
            BondOrder::Triple => '#',
        }
    }
}

/// Stereo marker of a bond, seen from the parent end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Wedge {
    #[default]
    None,
    /// Toward the viewer.
    Wedge,
    /// Away from the viewer.
    Dash,
}

/// What a fragment node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Atom(Element),
    /// An undetermined node: pseudo groups and bare repeat counts.
    Placeholder,
}

impl Symbol {
    pub fn element(&self) -> Option<Element> {
        match self {
            Symbol::Atom(element) => Some(*element),
            Symbol::Placeholder => None,
        }
    }

    pub fn is(&self, element: Element) -> bool {
        *self == Symbol::Atom(element)
    }
}

impl From<Element> for Symbol {
    fn from(element: Element) -> Self {
        Symbol::Atom(element)
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Symbol::Atom(element) => write!(f, "{}", element),
            Symbol::Placeholder => write!(f, "?"),
        }
    }
}

/// Install a `tracing` subscriber printing events at `level` and above.
///
/// Unknown levels fall back to `info`. Calling this more than once is harmless.
pub fn init_logging(level: &str) {
    let filter = LevelFilter::from_str(level).unwrap_or(LevelFilter::INFO);
    let _ = tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_target(false)
        .try_init();
}
