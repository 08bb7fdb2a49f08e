//! Interpreter version constraints, e.g. `>=3.6` or `>=3.6, <4`.
//!
//! A specifier set is a comma-separated list of comparison clauses. Like
//! [`Version`], parsing is validation only: the declared string is carried
//! through to the manifest unchanged.

use std::fmt;

use crate::error::Error;
use crate::metadata::Version;

/// Comparison operator of a single specifier clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// `~=` (compatible release)
    Compatible,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `>=`
    Ge,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `<`
    Lt,
}

/// A single clause, e.g. `>=3.6`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specifier {
    pub op: Op,
    pub version: Version,
}

/// A full constraint string: one or more comma-separated clauses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecifierSet {
    specifiers: Vec<Specifier>,
    raw: String,
}

// Longest operators first so ">=" is not consumed as ">".
const OPS: [(&str, Op); 7] = [
    ("~=", Op::Compatible),
    ("==", Op::Eq),
    ("!=", Op::Ne),
    (">=", Op::Ge),
    ("<=", Op::Le),
    (">", Op::Gt),
    ("<", Op::Lt),
];

impl SpecifierSet {
    /// Parse a constraint string such as `">=3.6"` or `">=3.6, <4"`.
    pub fn parse(input: &str) -> Result<Self, Error> {
        let invalid = |reason: String| Error::MetadataValidation {
            field: "requires_python",
            reason,
        };

        if input.trim().is_empty() {
            return Err(invalid(format!("{input:?}: empty constraint")));
        }

        let mut specifiers = Vec::new();
        for clause in input.split(',') {
            let clause = clause.trim();
            let Some((op, rest)) = OPS
                .iter()
                .find_map(|(tag, op)| clause.strip_prefix(tag).map(|rest| (*op, rest)))
            else {
                return Err(invalid(format!("{clause:?}: missing comparison operator")));
            };

            let version = Version::parse(rest.trim()).map_err(|err| match err {
                Error::MetadataValidation { reason, .. } => invalid(reason),
                other => other,
            })?;

            // `~=` needs at least two release segments to define the series.
            if op == Op::Compatible && version.release.len() < 2 {
                return Err(invalid(format!(
                    "{clause:?}: compatible release clause requires at least two version segments"
                )));
            }

            specifiers.push(Specifier { op, version });
        }

        Ok(SpecifierSet {
            specifiers,
            raw: input.to_string(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Specifier> {
        self.specifiers.iter()
    }

    pub fn len(&self) -> usize {
        self.specifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specifiers.is_empty()
    }
}

impl fmt::Display for SpecifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_clause() {
        let set = SpecifierSet::parse(">=3.6").unwrap();
        assert_eq!(set.len(), 1);
        let spec = set.iter().next().unwrap();
        assert_eq!(spec.op, Op::Ge);
        assert_eq!(spec.version.release, vec![3, 6]);
    }

    #[test]
    fn test_parse_multiple_clauses() {
        let set = SpecifierSet::parse(">=3.6, <4").unwrap();
        assert_eq!(set.len(), 2);
        let ops: Vec<Op> = set.iter().map(|s| s.op).collect();
        assert_eq!(ops, vec![Op::Ge, Op::Lt]);
    }

    #[test]
    fn test_parse_all_operators() {
        for (text, op) in [
            ("~=3.6", Op::Compatible),
            ("==3.6", Op::Eq),
            ("!=3.6", Op::Ne),
            (">=3.6", Op::Ge),
            ("<=3.6", Op::Le),
            (">3.6", Op::Gt),
            ("<3.6", Op::Lt),
        ] {
            let set = SpecifierSet::parse(text).unwrap();
            assert_eq!(set.iter().next().unwrap().op, op, "clause {text:?}");
        }
    }

    #[test]
    fn test_parse_rejects_missing_operator() {
        let err = SpecifierSet::parse("3.6").unwrap_err();
        assert!(err.to_string().contains("missing comparison operator"));
    }

    #[test]
    fn test_parse_rejects_bad_version() {
        let err = SpecifierSet::parse(">=python3").unwrap_err();
        assert!(err.to_string().starts_with("invalid requires_python:"));
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(SpecifierSet::parse("").is_err());
        assert!(SpecifierSet::parse(">=3.6,,<4").is_err());
    }

    #[test]
    fn test_compatible_requires_two_segments() {
        assert!(SpecifierSet::parse("~=3").is_err());
        assert!(SpecifierSet::parse("~=3.6").is_ok());
    }

    #[test]
    fn test_display_preserves_raw_text() {
        let set = SpecifierSet::parse(">=3.6, <4").unwrap();
        assert_eq!(set.to_string(), ">=3.6, <4");
    }
}
