//! Version specifiers and semver increments.

use std::fmt;

use semver::{BuildMetadata, Prerelease, Version};

use crate::error::{Error, Result};

/// A relative semver bump keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemverBump {
    Major,
    Premajor,
    Minor,
    Preminor,
    Patch,
    Prepatch,
    Prerelease,
}

impl SemverBump {
    /// All keywords, in the order they are offered interactively.
    pub const ALL: [SemverBump; 7] = [
        SemverBump::Major,
        SemverBump::Premajor,
        SemverBump::Minor,
        SemverBump::Preminor,
        SemverBump::Patch,
        SemverBump::Prepatch,
        SemverBump::Prerelease,
    ];

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            SemverBump::Major => "major",
            SemverBump::Premajor => "premajor",
            SemverBump::Minor => "minor",
            SemverBump::Preminor => "preminor",
            SemverBump::Patch => "patch",
            SemverBump::Prepatch => "prepatch",
            SemverBump::Prerelease => "prerelease",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        SemverBump::ALL
            .into_iter()
            .find(|bump| bump.as_str() == keyword)
    }

    /// The `pre*` counterpart of a release bump.
    pub fn to_pre(self) -> Self {
        match self {
            SemverBump::Major => SemverBump::Premajor,
            SemverBump::Minor => SemverBump::Preminor,
            SemverBump::Patch => SemverBump::Prepatch,
            other => other,
        }
    }
}

impl fmt::Display for SemverBump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The requested kind of version change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Specifier {
    Bump(SemverBump),
    Exact(Version),
}

impl Specifier {
    /// Parses a bump keyword or an explicit version. A leading `v` is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSpecifier`] for anything else.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if let Some(bump) = SemverBump::from_keyword(trimmed) {
            return Ok(Specifier::Bump(bump));
        }
        parse_version(trimmed)
            .map(Specifier::Exact)
            .map_err(|_| Error::InvalidSpecifier(input.to_string()))
    }

    /// Computes the version that results from applying this specifier.
    ///
    /// # Errors
    ///
    /// Returns an error if `preid` is not a valid prerelease identifier.
    pub fn apply(&self, current: &Version, preid: Option<&str>) -> Result<Version> {
        match self {
            Specifier::Exact(version) => Ok(version.clone()),
            Specifier::Bump(bump) => increment(current, *bump, preid),
        }
    }
}

impl From<SemverBump> for Specifier {
    fn from(bump: SemverBump) -> Self {
        Specifier::Bump(bump)
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Specifier::Bump(bump) => write!(f, "{}", bump),
            Specifier::Exact(version) => write!(f, "{}", version),
        }
    }
}

/// Parses a semver version, ignoring a leading `v`.
pub fn parse_version(input: &str) -> Result<Version> {
    let trimmed = input.trim();
    let stripped = trimmed.strip_prefix('v').unwrap_or(trimmed);
    Version::parse(stripped).map_err(|e| Error::InvalidVersion {
        version: input.to_string(),
        message: e.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Identifier {
    Numeric(u64),
    Alpha(String),
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Numeric(n) => write!(f, "{}", n),
            Identifier::Alpha(s) => f.write_str(s),
        }
    }
}

fn split_prerelease(pre: &Prerelease) -> Vec<Identifier> {
    if pre.is_empty() {
        return Vec::new();
    }
    pre.as_str()
        .split('.')
        .map(|part| match part.parse::<u64>() {
            Ok(n) => Identifier::Numeric(n),
            Err(_) => Identifier::Alpha(part.to_string()),
        })
        .collect()
}

fn join_prerelease(identifiers: &[Identifier]) -> Result<Prerelease> {
    let joined = identifiers
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(".");
    Prerelease::new(&joined).map_err(|e| Error::Config(format!(
        "Invalid prerelease identifier \"{}\": {}",
        joined, e
    )))
}

/// Increments `current` the way npm's `semver.inc` does.
///
/// Release bumps of a prerelease graduate it (`1.0.0-beta.1` + `major` is
/// `1.0.0`); `pre*` bumps start or continue a prerelease series, optionally
/// under `preid`.
pub fn increment(current: &Version, bump: SemverBump, preid: Option<&str>) -> Result<Version> {
    let mut next = current.clone();
    next.build = BuildMetadata::EMPTY;
    let mut pre = split_prerelease(&current.pre);

    match bump {
        SemverBump::Major => {
            if next.minor != 0 || next.patch != 0 || pre.is_empty() {
                next.major += 1;
            }
            next.minor = 0;
            next.patch = 0;
            pre.clear();
        }
        SemverBump::Minor => {
            if next.patch != 0 || pre.is_empty() {
                next.minor += 1;
            }
            next.patch = 0;
            pre.clear();
        }
        SemverBump::Patch => {
            if pre.is_empty() {
                next.patch += 1;
            }
            pre.clear();
        }
        SemverBump::Premajor => {
            next.major += 1;
            next.minor = 0;
            next.patch = 0;
            pre = increment_prerelease(Vec::new(), preid);
        }
        SemverBump::Preminor => {
            next.minor += 1;
            next.patch = 0;
            pre = increment_prerelease(Vec::new(), preid);
        }
        SemverBump::Prepatch => {
            next.patch += 1;
            pre = increment_prerelease(Vec::new(), preid);
        }
        SemverBump::Prerelease => {
            if pre.is_empty() {
                next.patch += 1;
            }
            pre = increment_prerelease(pre, preid);
        }
    }

    next.pre = join_prerelease(&pre)?;
    Ok(next)
}

fn increment_prerelease(mut pre: Vec<Identifier>, preid: Option<&str>) -> Vec<Identifier> {
    if pre.is_empty() {
        pre.push(Identifier::Numeric(0));
    } else if let Some(Identifier::Numeric(n)) = pre
        .iter_mut()
        .rev()
        .find(|id| matches!(id, Identifier::Numeric(_)))
    {
        *n += 1;
    } else {
        pre.push(Identifier::Numeric(0));
    }

    if let Some(preid) = preid.filter(|p| !p.is_empty()) {
        let fresh = vec![Identifier::Alpha(preid.to_string()), Identifier::Numeric(0)];
        let same_series = matches!(pre.first(), Some(Identifier::Alpha(first)) if first == preid);
        if !same_series || !matches!(pre.get(1), Some(Identifier::Numeric(_))) {
            pre = fresh;
        }
    }

    pre
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inc(current: &str, bump: SemverBump, preid: Option<&str>) -> String {
        increment(&Version::parse(current).unwrap(), bump, preid)
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_release_bumps() {
        assert_eq!(inc("1.2.3", SemverBump::Major, None), "2.0.0");
        assert_eq!(inc("1.2.3", SemverBump::Minor, None), "1.3.0");
        assert_eq!(inc("1.2.3", SemverBump::Patch, None), "1.2.4");
    }

    #[test]
    fn test_release_bumps_graduate_prereleases() {
        assert_eq!(inc("2.0.0-rc.1", SemverBump::Major, None), "2.0.0");
        assert_eq!(inc("1.3.0-beta.0", SemverBump::Minor, None), "1.3.0");
        assert_eq!(inc("1.2.4-alpha.3", SemverBump::Patch, None), "1.2.4");
        assert_eq!(inc("1.2.4-alpha.3", SemverBump::Minor, None), "1.3.0");
    }

    #[test]
    fn test_pre_bumps() {
        assert_eq!(inc("1.2.3", SemverBump::Premajor, None), "2.0.0-0");
        assert_eq!(inc("1.2.3", SemverBump::Preminor, Some("beta")), "1.3.0-beta.0");
        assert_eq!(inc("1.2.3", SemverBump::Prepatch, Some("rc")), "1.2.4-rc.0");
    }

    #[test]
    fn test_prerelease_continues_series() {
        assert_eq!(inc("1.0.0-beta.1", SemverBump::Prerelease, None), "1.0.0-beta.2");
        assert_eq!(inc("1.0.0-beta.1", SemverBump::Prerelease, Some("beta")), "1.0.0-beta.2");
        assert_eq!(inc("1.0.0-beta.1", SemverBump::Prerelease, Some("rc")), "1.0.0-rc.0");
        assert_eq!(inc("1.0.0-beta", SemverBump::Prerelease, None), "1.0.0-beta.0");
        assert_eq!(inc("1.0.0", SemverBump::Prerelease, None), "1.0.1-0");
    }

    #[test]
    fn test_parse_specifier() {
        assert_eq!(Specifier::parse("minor").unwrap(), Specifier::Bump(SemverBump::Minor));
        assert_eq!(
            Specifier::parse("v1.4.0").unwrap(),
            Specifier::Exact(Version::parse("1.4.0").unwrap())
        );
        assert!(matches!(
            Specifier::parse("bigger"),
            Err(Error::InvalidSpecifier(_))
        ));
    }

    #[test]
    fn test_exact_specifier_passes_through() {
        let spec = Specifier::parse("3.0.0-rc.1").unwrap();
        let current = Version::parse("1.0.0").unwrap();
        assert_eq!(spec.apply(&current, Some("beta")).unwrap().to_string(), "3.0.0-rc.1");
    }

    #[test]
    fn test_build_metadata_dropped() {
        assert_eq!(inc("1.0.0+build.5", SemverBump::Patch, None), "1.0.1");
    }
}
