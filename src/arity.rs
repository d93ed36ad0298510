//! Macro arity analysis.
//!
//! Scans a template body once at load time, works out how many arguments the
//! macro takes, and rejects templates whose placeholder indices are not a
//! contiguous run starting at 0.

use crate::error::{MacroDefect, WeaveError};
use crate::placeholder;
use crate::types::Section;

/// How many arguments a macro takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Arguments `0..n` are referenced.
    Finite(usize),
    /// An open range `${N...}` consumes every remaining argument.
    Unbounded,
}

impl Arity {
    /// Number of single-index substitutions to attempt for `arg_count`
    /// supplied arguments.
    pub fn effective_count(self, arg_count: usize) -> usize {
        match self {
            Arity::Finite(n) => n,
            Arity::Unbounded => arg_count,
        }
    }
}

/// Analyze every key and value string of `body`.
///
/// Open ranges neither cover indices nor raise the highest index, but the
/// finite indices must still be gap-free.
pub fn analyze(name: &str, body: &Section) -> Result<Arity, WeaveError> {
    let mut scan = Scan::default();
    for (key, value) in body.iter() {
        scan.visit(name, key)?;
        for s in value.strings() {
            scan.visit(name, s)?;
        }
    }
    scan.finish(name)
}

#[derive(Default)]
struct Scan {
    /// Inclusive index intervals covered by singles and finite ranges.
    covered: Vec<(usize, usize)>,
    max_index: Option<usize>,
    open_range: bool,
}

impl Scan {
    fn visit(&mut self, name: &str, s: &str) -> Result<(), WeaveError> {
        for index in placeholder::single_indices(s) {
            self.cover(index, index);
        }
        for token in placeholder::ranges(s) {
            match token.end {
                None => self.open_range = true,
                Some(end) if end < token.start => {
                    return Err(WeaveError::MalformedMacro {
                        name: name.to_string(),
                        defect: MacroDefect::InvertedRange(token.text.to_string()),
                    });
                }
                Some(end) => self.cover(token.start, end),
            }
        }
        Ok(())
    }

    fn cover(&mut self, start: usize, end: usize) {
        self.covered.push((start, end));
        self.max_index = Some(self.max_index.map_or(end, |max| max.max(end)));
    }

    fn finish(mut self, name: &str) -> Result<Arity, WeaveError> {
        self.covered.sort_unstable();
        let mut next = 0usize;
        for &(start, end) in &self.covered {
            if start > next {
                return Err(WeaveError::MalformedMacro {
                    name: name.to_string(),
                    defect: MacroDefect::MissingIndex(next),
                });
            }
            next = next.max(end.saturating_add(1));
        }

        if self.open_range {
            return Ok(Arity::Unbounded);
        }
        Ok(match self.max_index {
            Some(max) => Arity::Finite(max.saturating_add(1)),
            None => Arity::Finite(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::section;

    fn arity(entries: &[(&str, &str)]) -> Result<Arity, WeaveError> {
        analyze("test", &section(entries))
    }

    #[test]
    fn no_placeholders_is_zero() {
        assert_eq!(arity(&[("Used", "true")]).unwrap(), Arity::Finite(0));
    }

    #[test]
    fn singles_in_keys_and_values() {
        assert_eq!(
            arity(&[("K${0}", "${1}-${2}")]).unwrap(),
            Arity::Finite(3)
        );
    }

    #[test]
    fn finite_range_counts_its_upper_bound() {
        assert_eq!(arity(&[("${0...2}", "x")]).unwrap(), Arity::Finite(3));
    }

    #[test]
    fn ranges_and_singles_combine() {
        assert_eq!(
            arity(&[("${0}", "${1...3}"), ("Tail", "${4}")]).unwrap(),
            Arity::Finite(5)
        );
    }

    #[test]
    fn open_range_is_unbounded() {
        assert_eq!(
            arity(&[("First", "${0}"), ("Rest", "${1...}")]).unwrap(),
            Arity::Unbounded
        );
    }

    #[test]
    fn open_range_alone_is_unbounded() {
        assert_eq!(arity(&[("All", "${0...}")]).unwrap(), Arity::Unbounded);
    }

    #[test]
    fn gap_is_rejected() {
        let err = arity(&[("A", "${0}"), ("B", "${2}")]).unwrap_err();
        assert!(matches!(
            err,
            WeaveError::MalformedMacro {
                defect: MacroDefect::MissingIndex(1),
                ..
            }
        ));
    }

    #[test]
    fn gap_is_rejected_even_with_open_range() {
        let err = arity(&[("A", "${0}"), ("B", "${2}"), ("C", "${3...}")]).unwrap_err();
        assert!(matches!(
            err,
            WeaveError::MalformedMacro {
                defect: MacroDefect::MissingIndex(1),
                ..
            }
        ));
    }

    #[test]
    fn must_start_at_zero() {
        let err = arity(&[("A", "${1}")]).unwrap_err();
        match err {
            WeaveError::MalformedMacro { name, defect } => {
                assert_eq!(name, "test");
                assert_eq!(defect, MacroDefect::MissingIndex(0));
            }
            other => panic!("Expected MalformedMacro, got: {other:?}"),
        }
    }

    #[test]
    fn overlapping_ranges_are_contiguous() {
        assert_eq!(
            arity(&[("A", "${0...3}"), ("B", "${2...5}"), ("C", "${6}")]).unwrap(),
            Arity::Finite(7)
        );
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = arity(&[("A", "${3...1}")]).unwrap_err();
        match err {
            WeaveError::MalformedMacro { defect, .. } => {
                assert_eq!(defect, MacroDefect::InvertedRange("${3...1}".into()));
            }
            other => panic!("Expected MalformedMacro, got: {other:?}"),
        }
    }

    #[test]
    fn list_values_are_scanned() {
        let mut body = Section::new();
        body.push("Voices", vec!["${0}", "${1}"]);
        assert_eq!(analyze("list", &body).unwrap(), Arity::Finite(2));
    }

    #[test]
    fn effective_count_uses_arguments_when_unbounded() {
        assert_eq!(Arity::Finite(2).effective_count(5), 2);
        assert_eq!(Arity::Unbounded.effective_count(5), 5);
    }
}
