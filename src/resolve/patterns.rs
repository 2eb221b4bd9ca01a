//! Small nom recognizers for the token shapes the rule table cannot express as literals.

use nom::{
    branch::alt,
    character::complete::{anychar, char, digit0, digit1, one_of},
    combinator::{all_consuming, map, opt, recognize, value},
    multi::{fold_many0, many0_count, many1_count},
    sequence::{pair, preceded, tuple},
    IResult,
};

/// Number of carbons in an aliphatic run like `CH2CH2CH`: each unit is a `C`
/// or `c`, an `H`, and any number of `2`s.
pub(crate) fn aliphatic_run(token: &str) -> Option<usize> {
    let unit = tuple((one_of("cC"), char('H'), many0_count(char('2'))));
    let result: IResult<&str, usize> = all_consuming(many1_count(unit))(token);
    result.ok().map(|(_, units)| units)
}

/// A parenthesized group followed by a count, e.g. `(CH2)3` or `(CH3)2N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GroupRepeat<'a> {
    pub inner: &'a str,
    pub digits: &'a str,
    /// The group was written in front of a trailing nitrogen.
    pub nitrogen: bool,
}

impl GroupRepeat<'_> {
    pub fn count(&self) -> Option<usize> {
        self.digits.parse().ok()
    }
}

/// The group spans from the leading `(` to the last `)`.
pub(crate) fn group_repeat(token: &str) -> Option<GroupRepeat<'_>> {
    let rest = token.strip_prefix('(')?;
    let close = rest.rfind(')')?;
    let (inner, tail) = (&rest[..close], &rest[close + 1..]);
    let result: IResult<&str, (&str, Option<char>)> = all_consuming(pair(digit1, opt(char('N'))))(tail);
    let (_, (digits, nitrogen)) = result.ok()?;
    Some(GroupRepeat {
        inner,
        digits,
        nitrogen: nitrogen.is_some(),
    })
}

/// A bare count such as `3`. Zero is not a count.
pub(crate) fn positive_integer(token: &str) -> Option<usize> {
    let result: IResult<&str, &str> = all_consuming(preceded(opt(char('+')), digit1))(token);
    let (_, digits) = result.ok()?;
    digits.parse().ok().filter(|count| *count > 0)
}

/// Vertical strokes of a hashed bond read in front of an oxygen: `IO`, `IIO`, ...
pub(crate) fn dashed_oxygen(token: &str) -> bool {
    let result: IResult<&str, (usize, char)> = all_consuming(pair(many1_count(char('I')), char('O')))(token);
    result.is_ok()
}

/// A nitrogen followed by hashed-bond strokes: `Nl`, `NIl`, ...
pub(crate) fn dashed_nitrogen(token: &str) -> bool {
    let result: IResult<&str, usize> = all_consuming(preceded(char('N'), many1_count(one_of("lI"))))(token);
    result.is_ok()
}

/// Remove every hydrogen together with its count (`H`, `H2`, `H12`), keeping
/// everything else in place. A count never starts with `0`.
pub(crate) fn strip_hydrogen_counts(token: &str) -> String {
    let hydrogen = recognize(pair(char('H'), opt(pair(one_of("123456789"), digit0))));
    let result: IResult<&str, String> = fold_many0(
        alt((value(None, hydrogen), map(anychar, Some))),
        String::new,
        |mut kept, c| {
            if let Some(c) = c {
                kept.push(c);
            }
            kept
        },
    )(token);
    match result {
        Ok((_, kept)) => kept,
        Err(_) => token.to_string(),
    }
}
