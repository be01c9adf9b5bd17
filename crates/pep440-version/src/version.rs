use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::str::FromStr;
use std::sync::LazyLock;

use num_bigint::{BigUint, ParseBigIntError};
use regex::{Captures, Regex};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::part::{Part, Parts};

/// The PEP 440 version grammar, see
/// <https://peps.python.org/pep-0440/#appendix-b-parsing-version-strings-with-regular-expressions>.
const VERSION_RE_INNER: &str = r"
v?                                                # <https://peps.python.org/pep-0440/#preceding-v-character>
(?:
    (?:(?P<epoch>[0-9]+)!)?                       # epoch
    (?P<release>[0-9]+(?:\.[0-9]+)*)              # release segment
    (?P<pre_field>                                # pre-release
        [-_\.]?
        (?P<pre_name>(a|b|c|rc|alpha|beta|pre|preview))
        [-_\.]?
        (?P<pre>[0-9]+)?
    )?
    (?P<post_field>                               # post release
        (?:-(?P<post_old>[0-9]+))
        |
        (?:
            [-_\.]?
            (?P<post_l>post|rev|r)
            [-_\.]?
            (?P<post_new>[0-9]+)?
        )
    )?
    (?P<dev_field>                                # dev release
        [-_\.]?
        (?P<dev_l>dev)
        [-_\.]?
        (?P<dev>[0-9]+)?
    )?
)
(?:\+(?P<local>[a-z0-9]+(?:[-_\.][a-z0-9]+)*))?   # local version
";

/// Matches a whole version, such as `1.19.a1`, allowing surrounding whitespace.
static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?xi)^\s*{VERSION_RE_INNER}\s*$")).unwrap());

/// An error that occurs when a string is not a valid PEP 440 version.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionParseError {
    /// The string does not match the version grammar.
    #[error("Version `{0}` doesn't match PEP 440 rules")]
    Malformed(String),
    /// A numeric segment is not a non-negative integer.
    #[error("Failed to parse version `{version}`: `{segment}` is not a valid non-negative integer")]
    InvalidNumber {
        /// The version that failed to parse.
        version: String,
        /// The offending segment.
        segment: String,
        /// The underlying integer error.
        #[source]
        source: ParseBigIntError,
    },
}

/// The kind of a pre-release: alpha, beta or release candidate.
///
/// <https://peps.python.org/pep-0440/#pre-releases>
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PrereleaseKind {
    /// `a`, spelled `a` or `alpha`
    Alpha,
    /// `b`, spelled `b` or `beta`
    Beta,
    /// `rc`, spelled `rc`, `c`, `pre` or `preview`
    Rc,
}

impl PrereleaseKind {
    /// Normalize one of the accepted spellings, case-insensitively.
    fn from_alias(alias: &str) -> Option<Self> {
        match alias.to_ascii_lowercase().as_str() {
            "a" | "alpha" => Some(Self::Alpha),
            "b" | "beta" => Some(Self::Beta),
            "rc" | "c" | "pre" | "preview" => Some(Self::Rc),
            _ => None,
        }
    }
}

impl Display for PrereleaseKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alpha => f.write_str("a"),
            Self::Beta => f.write_str("b"),
            Self::Rc => f.write_str("rc"),
        }
    }
}

/// A pre-release marker such as `rc2` in `1.0rc2`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Prerelease {
    /// The pre-release kind.
    pub kind: PrereleaseKind,
    /// The pre-release number, `0` when the input omitted it.
    pub number: BigUint,
}

impl Display for Prerelease {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind, self.number)
    }
}

/// A dot-separated token of a local version label.
///
/// > When comparing a numeric and lexicographic segment, the numeric section always compares
/// > as greater than the lexicographic segment.
///
/// The derived `Ord` matches that rule since `String` is declared first. Numbers have no
/// upper bound, `1.0+18446744073709551616` sorts above `1.0+1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum LocalSegment {
    String(String),
    Number(BigUint),
}

impl From<&str> for LocalSegment {
    fn from(segment: &str) -> Self {
        // `BigUint` parsing also accepts `+` and `_`, which are not digits in a local label.
        if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(number) = segment.parse::<BigUint>() {
                return Self::Number(number);
            }
        }
        Self::String(segment.to_ascii_lowercase())
    }
}

/// The total-order key of a version, built once at parse time.
///
/// Fields compare lexicographically in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct VersionKey {
    epoch: BigUint,
    release: Parts<BigUint>,
    pre: Part<(PrereleaseKind, BigUint)>,
    post: Part<BigUint>,
    dev: Part<BigUint>,
    local: Part<Vec<LocalSegment>>,
}

impl VersionKey {
    /// <https://peps.python.org/pep-0440/#summary-of-permitted-suffixes-and-relative-ordering>
    fn new(
        epoch: &BigUint,
        release: &[BigUint],
        pre: Option<&Prerelease>,
        post: Option<&BigUint>,
        dev: Option<&BigUint>,
        local: Option<&str>,
    ) -> Self {
        let pre = match (pre, post, dev) {
            // A bare dev release sorts before every pre-release of the same release.
            (None, None, Some(_)) => Part::NegativeInfinity,
            // A final release sorts after its pre-releases.
            (None, _, _) => Part::Infinity,
            (Some(pre), _, _) => Part::Value((pre.kind, pre.number.clone())),
        };
        let post = post.map_or(Part::NegativeInfinity, |post| Part::Value(post.clone()));
        let dev = dev.map_or(Part::Infinity, |dev| Part::Value(dev.clone()));
        let local = local.map_or(Part::NegativeInfinity, |local| {
            Part::Value(local.split('.').map(LocalSegment::from).collect())
        });
        Self {
            epoch: epoch.clone(),
            release: Parts::normalized(release.to_vec()),
            pre,
            post,
            dev,
            local,
        }
    }
}

/// A version number such as `1.2.3` or `4!5.6.7-a8.post9.dev0`.
///
/// Parse with [`Version::from_str`]:
///
/// ```rust
/// use std::str::FromStr;
/// use pep440_version::Version;
///
/// let version = Version::from_str("v1.0-RC1").unwrap();
/// assert_eq!(version.to_string(), "1.0rc1");
/// assert_eq!(version.original(), "v1.0-RC1");
/// ```
///
/// Versions are immutable. Equality, ordering and hashing use the PEP 440 ordering, so
/// `1.0 == 1.0.0` even though their string forms differ.
#[derive(Debug, Clone)]
pub struct Version {
    epoch: BigUint,
    release: Vec<BigUint>,
    pre: Option<Prerelease>,
    post: Option<BigUint>,
    dev: Option<BigUint>,
    local: Option<String>,
    original: String,
    key: VersionKey,
}

impl Version {
    fn from_parts(
        original: String,
        epoch: BigUint,
        release: Vec<BigUint>,
        pre: Option<Prerelease>,
        post: Option<BigUint>,
        dev: Option<BigUint>,
        local: Option<String>,
    ) -> Self {
        let key = VersionKey::new(
            &epoch,
            &release,
            pre.as_ref(),
            post.as_ref(),
            dev.as_ref(),
            local.as_deref(),
        );
        Self {
            epoch,
            release,
            pre,
            post,
            dev,
            local,
            original,
            key,
        }
    }

    /// Parse a version that is known to be valid, such as a compiled-in constant.
    ///
    /// # Panics
    ///
    /// Panics if the version is malformed.
    #[track_caller]
    pub fn from_static(version: &'static str) -> Self {
        match Self::from_str(version) {
            Ok(version) => version,
            Err(err) => panic!("{err}"),
        }
    }

    /// The versioning epoch, `0` unless given as `N!`.
    pub fn epoch(&self) -> &BigUint {
        &self.epoch
    }

    /// The release segment, e.g. `[1, 2, 3]` for `1.2.3rc1`.
    pub fn release(&self) -> &[BigUint] {
        &self.release
    }

    /// The pre-release marker, if any.
    pub fn pre(&self) -> Option<&Prerelease> {
        self.pre.as_ref()
    }

    /// The post-release number, if any.
    pub fn post(&self) -> Option<&BigUint> {
        self.post.as_ref()
    }

    /// The development release number, if any.
    pub fn dev(&self) -> Option<&BigUint> {
        self.dev.as_ref()
    }

    /// The input exactly as given, including whitespace, case and a `v` prefix.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// The lowercased local version label, or `""` if there is none.
    pub fn local(&self) -> &str {
        self.local.as_deref().unwrap_or_default()
    }

    /// Whether the version carries a local label (e.g. `1.2.3+ubuntu1`).
    pub fn is_local(&self) -> bool {
        self.local.is_some()
    }

    /// Whether this is an alpha, beta, release candidate or dev version.
    pub fn is_pre_release(&self) -> bool {
        self.pre.is_some() || self.dev.is_some()
    }

    /// Whether this is a post release.
    pub fn is_post_release(&self) -> bool {
        self.post.is_some()
    }

    /// The epoch and release only, e.g. `1!2.0` for `1!2.0rc1.post2+local`.
    pub fn base_version(&self) -> String {
        let epoch = if self.epoch == BigUint::default() {
            String::new()
        } else {
            format!("{}!", self.epoch)
        };
        let release = self
            .release
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<String>>()
            .join(".");
        format!("{epoch}{release}")
    }

    /// The canonical form without the local label.
    pub fn public(&self) -> String {
        let pre = self
            .pre
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        let post = self
            .post
            .as_ref()
            .map(|post| format!(".post{post}"))
            .unwrap_or_default();
        let dev = self
            .dev
            .as_ref()
            .map(|dev| format!(".dev{dev}"))
            .unwrap_or_default();
        format!("{}{pre}{post}{dev}", self.base_version())
    }

    /// The same version with its local label dropped.
    ///
    /// "local version labels MUST be ignored entirely when checking if candidate versions
    /// match a given version specifier", except where noted otherwise.
    pub fn without_local(&self) -> Self {
        if self.local.is_none() {
            return self.clone();
        }
        Self::from_parts(
            self.public(),
            self.epoch.clone(),
            self.release.clone(),
            self.pre.clone(),
            self.post.clone(),
            self.dev.clone(),
            None,
        )
    }

    /// Whether both versions have the same epoch and (zero-padded) release.
    pub(crate) fn same_base(&self, other: &Self) -> bool {
        self.key.epoch == other.key.epoch && self.key.release == other.key.release
    }

    /// Compare under PEP 440 ordering.
    pub fn compare(&self, other: &Self) -> Ordering {
        // Identical canonical forms.
        if self.epoch == other.epoch
            && self.release == other.release
            && self.pre == other.pre
            && self.post == other.post
            && self.dev == other.dev
            && self.local == other.local
        {
            return Ordering::Equal;
        }
        self.key.cmp(&other.key)
    }

    /// Whether both versions are equal under PEP 440 ordering.
    pub fn equal(&self, other: &Self) -> bool {
        self.compare(other).is_eq()
    }

    /// Whether `self` sorts before `other`.
    pub fn less_than(&self, other: &Self) -> bool {
        self.compare(other).is_lt()
    }

    /// Whether `self` sorts before or equal to `other`.
    pub fn less_than_or_equal(&self, other: &Self) -> bool {
        self.compare(other).is_le()
    }

    /// Whether `self` sorts after `other`.
    pub fn greater_than(&self, other: &Self) -> bool {
        self.compare(other).is_gt()
    }

    /// Whether `self` sorts after or equal to `other`.
    pub fn greater_than_or_equal(&self, other: &Self) -> bool {
        self.compare(other).is_ge()
    }

    fn from_captures(version: &str, captures: &Captures) -> Result<Self, VersionParseError> {
        let number_field = |field_name: &str| {
            captures
                .name(field_name)
                .map(|field| parse_number(version, field.as_str()))
                .transpose()
        };

        // "If no explicit epoch is given, the implicit epoch is 0"
        let epoch = number_field("epoch")?.unwrap_or_default();
        let release = captures
            .name("release")
            .ok_or_else(|| VersionParseError::Malformed(version.to_string()))?
            .as_str()
            .split('.')
            .map(|segment| parse_number(version, segment))
            .collect::<Result<Vec<BigUint>, _>>()?;
        let pre = match captures.name("pre_name") {
            Some(name) => Some(Prerelease {
                kind: PrereleaseKind::from_alias(name.as_str())
                    .ok_or_else(|| VersionParseError::Malformed(version.to_string()))?,
                // <https://peps.python.org/pep-0440/#implicit-pre-release-number>
                number: number_field("pre")?.unwrap_or_default(),
            }),
            None => None,
        };
        let post = if captures.name("post_field").is_some() {
            Some(
                number_field("post_new")?
                    .or(number_field("post_old")?)
                    .unwrap_or_default(),
            )
        } else {
            None
        };
        let dev = if captures.name("dev_field").is_some() {
            // <https://peps.python.org/pep-0440/#implicit-development-release-number>
            Some(number_field("dev")?.unwrap_or_default())
        } else {
            None
        };
        let local = captures
            .name("local")
            .map(|local| local.as_str().to_ascii_lowercase());

        Ok(Self::from_parts(
            version.to_string(),
            epoch,
            release,
            pre,
            post,
            dev,
            local,
        ))
    }
}

fn parse_number(version: &str, segment: &str) -> Result<BigUint, VersionParseError> {
    segment
        .parse::<BigUint>()
        .map_err(|source| VersionParseError::InvalidNumber {
            version: version.to_string(),
            segment: segment.to_string(),
            source,
        })
}

impl FromStr for Version {
    type Err = VersionParseError;

    /// Parses a version such as `1.19`, `1.0a1`, `1.0+abc.5` or `1!2012.2`.
    fn from_str(version: &str) -> Result<Self, Self::Err> {
        let captures = VERSION_RE
            .captures(version)
            .ok_or_else(|| VersionParseError::Malformed(version.to_string()))?;
        Self::from_captures(version, &captures)
    }
}

/// Shows the canonical version.
impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.local {
            Some(local) => write!(f, "{}+{local}", self.public()),
            None => f.write_str(&self.public()),
        }
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.equal(other)
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    /// 1.0.dev456 < 1.0a1 < 1.0a2.dev456 < 1.0a12.dev456 < 1.0a12 < 1.0b1.dev456 < 1.0b2
    /// < 1.0b2.post345.dev456 < 1.0b2.post345 < 1.0c1.dev456 < 1.0c1 < 1.0 < 1.0.post456.dev34
    /// < 1.0.post456
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

/// <https://github.com/serde-rs/serde/issues/1316#issue-332908452>
impl<'de> Deserialize<'de> for Version {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(de::Error::custom)
    }
}

/// <https://github.com/serde-rs/serde/issues/1316#issue-332908452>
impl Serialize for Version {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// A list of versions that can be sorted in place through `len`, `less` and `swap`.
///
/// ```rust
/// use pep440_version::{SortedVersions, Version};
///
/// let mut versions: SortedVersions = ["1.0", "1.0rc1", "1.0.dev1"]
///     .into_iter()
///     .map(|v| v.parse::<Version>().unwrap())
///     .collect();
/// versions.sort();
/// assert_eq!(versions[0].to_string(), "1.0.dev1");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortedVersions(Vec<Version>);

impl SortedVersions {
    /// Wrap the versions without reordering them.
    pub fn new(versions: Vec<Version>) -> Self {
        Self(versions)
    }

    /// The number of versions.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no versions.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the version at `i` sorts before the version at `j`.
    pub fn less(&self, i: usize, j: usize) -> bool {
        self.0[i].less_than(&self.0[j])
    }

    /// Exchange the versions at `i` and `j`.
    pub fn swap(&mut self, i: usize, j: usize) {
        self.0.swap(i, j);
    }

    /// Sort ascending. The sort is stable, so equal versions such as `1.0` and `1.0.0` keep
    /// their relative order.
    pub fn sort(&mut self) {
        self.0.sort_by(Version::compare);
    }

    /// Unwrap the versions.
    pub fn into_inner(self) -> Vec<Version> {
        self.0
    }
}

impl Deref for SortedVersions {
    type Target = [Version];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Version>> for SortedVersions {
    fn from(versions: Vec<Version>) -> Self {
        Self(versions)
    }
}

impl FromIterator<Version> for SortedVersions {
    fn from_iter<T: IntoIterator<Item = Version>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests;
