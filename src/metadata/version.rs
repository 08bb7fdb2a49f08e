//! Version scheme for package metadata.
//!
//! Parses a PEP 440-style subset: optional epoch (`1!`), dotted numeric
//! release segments, optional pre-release (`a1`, `b2`, `rc3`), optional
//! `.postN` and `.devN` suffixes. Parsing is validation only: the declared
//! string is emitted verbatim in manifests, never reformatted.

use std::fmt;

use crate::error::Error;

/// Pre-release phase tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreRelease {
    Alpha,
    Beta,
    Rc,
}

impl fmt::Display for PreRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreRelease::Alpha => write!(f, "a"),
            PreRelease::Beta => write!(f, "b"),
            PreRelease::Rc => write!(f, "rc"),
        }
    }
}

/// A parsed version string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub epoch: u32,
    pub release: Vec<u32>,
    pub pre: Option<(PreRelease, u32)>,
    pub post: Option<u32>,
    pub dev: Option<u32>,
}

impl Version {
    /// Parse a version string, e.g. `"0.0.1"`, `"v2.1"`, `"1!1.0rc2.post1"`.
    pub fn parse(input: &str) -> Result<Self, Error> {
        let invalid = |reason: &str| Error::MetadataValidation {
            field: "version",
            reason: format!("{input:?}: {reason}"),
        };

        let s = input.trim();
        if s.is_empty() {
            return Err(invalid("empty version string"));
        }
        let s = s.strip_prefix(['v', 'V']).unwrap_or(s);

        let (epoch, s) = match s.split_once('!') {
            Some((epoch, rest)) => (
                epoch
                    .parse::<u32>()
                    .map_err(|_| invalid("epoch must be numeric"))?,
                rest,
            ),
            None => (0, s),
        };

        // Release: one or more dot-separated numeric segments.
        let mut release = Vec::new();
        let mut rest = s;
        loop {
            let (segment, tail) =
                take_number(rest).ok_or_else(|| invalid("expected numeric release segment"))?;
            release.push(segment);
            match tail.strip_prefix('.') {
                Some(next) if next.starts_with(|c: char| c.is_ascii_digit()) => rest = next,
                _ => {
                    rest = tail;
                    break;
                }
            }
        }

        // Suffixes: optional pre-release, then .postN, then .devN.
        let lowered = rest.to_ascii_lowercase();
        let mut tail = lowered.as_str();
        if let Some(after) = tail.strip_prefix('.') {
            if after.is_empty() {
                return Err(invalid("trailing dot"));
            }
            tail = after;
        }

        let mut pre = None;
        for (tag, kind) in [
            ("rc", PreRelease::Rc),
            ("a", PreRelease::Alpha),
            ("b", PreRelease::Beta),
        ] {
            if let Some(after) = tail.strip_prefix(tag) {
                let (number, after) = take_number(after)
                    .ok_or_else(|| invalid("pre-release tag requires a number"))?;
                pre = Some((kind, number));
                tail = after;
                break;
            }
        }

        let mut post = None;
        if let Some(after) = strip_tag(tail, "post") {
            let (number, after) =
                take_number(after).ok_or_else(|| invalid("post tag requires a number"))?;
            post = Some(number);
            tail = after;
        }

        let mut dev = None;
        if let Some(after) = strip_tag(tail, "dev") {
            let (number, after) =
                take_number(after).ok_or_else(|| invalid("dev tag requires a number"))?;
            dev = Some(number);
            tail = after;
        }

        if !tail.is_empty() {
            return Err(invalid("unrecognized trailing characters"));
        }

        Ok(Version {
            epoch,
            release,
            pre,
            post,
            dev,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}!", self.epoch)?;
        }
        let release: Vec<String> = self.release.iter().map(u32::to_string).collect();
        write!(f, "{}", release.join("."))?;
        if let Some((kind, number)) = &self.pre {
            write!(f, "{kind}{number}")?;
        }
        if let Some(post) = self.post {
            write!(f, ".post{post}")?;
        }
        if let Some(dev) = self.dev {
            write!(f, ".dev{dev}")?;
        }
        Ok(())
    }
}

/// Split a leading decimal number off `s`.
fn take_number(s: &str) -> Option<(u32, &str)> {
    let digits = s.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    s[..digits].parse().ok().map(|n| (n, &s[digits..]))
}

/// Strip a suffix tag with an optional leading dot, e.g. `post` or `.post`.
fn strip_tag<'a>(s: &'a str, tag: &str) -> Option<&'a str> {
    s.strip_prefix(tag)
        .or_else(|| s.strip_prefix('.').and_then(|s| s.strip_prefix(tag)))
}
