//! OCR confusion rewrites, tried in order after the table lookups miss.

use super::patterns::strip_hydrogen_counts;

pub(crate) struct Rewrite {
    pub name: &'static str,
    pub applies: fn(&str) -> bool,
    pub apply: fn(&str) -> String,
}

pub(crate) static REWRITES: &[Rewrite] = &[
    Rewrite {
        name: "Ct -> Cl",
        applies: |token| token.contains("Ct"),
        apply: |token| token.replace("Ct", "Cl").replace("CT", "Cl"),
    },
    Rewrite {
        name: "Htt -> H11",
        applies: |token| token.contains("Htt"),
        apply: |token| token.replace("Htt", "H11"),
    },
    Rewrite {
        name: "Ht -> H1",
        applies: |token| token.contains("Ht"),
        apply: |token| token.replace("Ht", "H1"),
    },
    // Hydrogen counts are implicit in the fragment tree.
    Rewrite {
        name: "drop H",
        applies: |token| token.contains('H'),
        apply: strip_hydrogen_counts,
    },
    Rewrite {
        name: "I -> l",
        applies: |token| token.contains('I'),
        apply: |token| token.replace('I', "l"),
    },
    Rewrite {
        name: "t1 -> n",
        applies: |token| token.contains("t1"),
        apply: |token| token.replace("t1", "n"),
    },
    Rewrite {
        name: "1 -> l",
        applies: |token| token.contains('1'),
        apply: |token| token.replace('1', "l"),
    },
    Rewrite {
        name: "c -> C",
        applies: |token| token.contains('c'),
        apply: |token| token.replace('c', "C"),
    },
    Rewrite {
        name: "0 -> O",
        applies: |token| token == "0",
        apply: |_| "O".to_string(),
    },
];

/// The first rewrite that applies to `token`, with its result.
pub(crate) fn rewrite(token: &str) -> Option<(&'static str, String)> {
    REWRITES
        .iter()
        .find(|rule| (rule.applies)(token))
        .map(|rule| (rule.name, (rule.apply)(token)))
}
