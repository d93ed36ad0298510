//! Placeholder grammar for macro templates.
//!
//! Two token shapes are recognized anywhere inside a key or value string:
//!
//! - **single** — `${N}`, replaced by argument `N`.
//! - **range** — `${N1...N2}` or the open form `${N1...}`, which stands for
//!   every argument from `N1` up to `N2` (or the last argument).
//!
//! Anything else that looks like `${...}` is ordinary text. Index literals
//! that overflow `usize` are ignored rather than rejected.

use std::ops::RangeInclusive;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static SINGLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{(\d+)\}").expect("single placeholder regex"));

static RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{(\d+)\.\.\.(\d*)\}").expect("range placeholder regex"));

/// A `${N1...N2}` or `${N1...}` token found in a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeToken<'a> {
    /// The token exactly as written, e.g. `"${0...}"`.
    pub text: &'a str,
    pub start: usize,
    /// `None` for the open form.
    pub end: Option<usize>,
}

impl RangeToken<'_> {
    /// Clamp the token to `arg_count` arguments.
    ///
    /// Returns `None` when the clamped range is empty, in which case the
    /// token does not expand.
    pub fn bounded(&self, arg_count: usize) -> Option<RangeInclusive<usize>> {
        let last = arg_count.checked_sub(1)?;
        let end = self.end.map_or(last, |end| end.min(last));
        (self.start <= end).then_some(self.start..=end)
    }
}

/// Indices of every single placeholder in `s`, in order of appearance.
pub fn single_indices(s: &str) -> impl Iterator<Item = usize> + '_ {
    SINGLE_RE
        .captures_iter(s)
        .filter_map(|caps| caps[1].parse().ok())
}

/// Every range token in `s`, in order of appearance.
pub fn ranges(s: &str) -> impl Iterator<Item = RangeToken<'_>> + '_ {
    RANGE_RE.captures_iter(s).filter_map(|caps| {
        let text = caps.get(0)?.as_str();
        let start = caps.get(1)?.as_str().parse().ok()?;
        let end = match caps.get(2).map(|m| m.as_str()) {
            None | Some("") => None,
            Some(digits) => Some(digits.parse().ok()?),
        };
        Some(RangeToken { text, start, end })
    })
}

/// The first range token in `s`.
pub fn first_range(s: &str) -> Option<RangeToken<'_>> {
    ranges(s).next()
}

/// Replace every `${i}` with `args[i]` for `i < limit`.
///
/// Indices at or past `limit`, or without a supplied argument, stay as
/// written. Substitution is a single pass, so argument text is never
/// rescanned for placeholders.
pub fn substitute_singles(s: &str, limit: usize, args: &[String]) -> String {
    SINGLE_RE
        .replace_all(s, |caps: &Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .filter(|i| *i < limit)
                .and_then(|i| args.get(i))
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn finds_single_indices() {
        let found: Vec<usize> = single_indices("K${0}_${12}").collect();
        assert_eq!(found, vec![0, 12]);
    }

    #[test]
    fn single_does_not_match_range() {
        assert_eq!(single_indices("${0...2}").count(), 0);
        assert_eq!(single_indices("${0...}").count(), 0);
    }

    #[test]
    fn parses_closed_and_open_ranges() {
        let found: Vec<RangeToken> = ranges("${1...3} and ${2...}").collect();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].text, "${1...3}");
        assert_eq!((found[0].start, found[0].end), (1, Some(3)));
        assert_eq!((found[1].start, found[1].end), (2, None));
    }

    #[test]
    fn unrecognized_shapes_are_ignored() {
        for text in ["${x}", "${-1}", "${0..2}", "${ 0 }", "$0", "${0....}"] {
            assert_eq!(single_indices(text).count(), 0, "{text}");
            assert!(first_range(text).is_none(), "{text}");
        }
    }

    #[test]
    fn overflowing_index_is_ignored() {
        assert_eq!(single_indices("${99999999999999999999999}").count(), 0);
    }

    #[test]
    fn bounded_clamps_to_arguments() {
        let open = first_range("${1...}").unwrap();
        assert_eq!(open.bounded(4), Some(1..=3));
        let closed = first_range("${0...9}").unwrap();
        assert_eq!(closed.bounded(2), Some(0..=1));
    }

    #[test]
    fn bounded_empty_when_start_past_arguments() {
        let token = first_range("${2...}").unwrap();
        assert_eq!(token.bounded(2), None);
        assert_eq!(token.bounded(0), None);
    }

    #[test]
    fn substitutes_within_limit_only() {
        let a = args(&["a", "b"]);
        assert_eq!(substitute_singles("${0}-${1}", 2, &a), "a-b");
        assert_eq!(substitute_singles("${0}-${1}", 1, &a), "a-${1}");
        assert_eq!(substitute_singles("${0}-${5}", 9, &a), "a-${5}");
    }

    #[test]
    fn substitution_does_not_rescan_arguments() {
        let a = args(&["${1}", "x"]);
        assert_eq!(substitute_singles("${0}", 2, &a), "${1}");
    }
}
