use std::fmt::{self, Display, Formatter};
use std::iter;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use tracing::{trace, warn};

use crate::{Version, VersionParseError};

/// A single clause such as `>= 1.19` or `== 4.1.*`.
static CONSTRAINT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?P<operator>~=|===|==|!=|<=|>=|<|>)\s*(?P<version>[^\s]*)\s*$").unwrap()
});

/// A release number directly followed by a pre-release, such as `0rc1` in `1.0rc1`.
static PRE_RELEASE_BOUNDARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)((?:a|b|c|rc)[0-9]+)$").unwrap());

/// An error that occurs when a constraint clause or expression is invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConstraintError {
    /// The clause is not an operator followed by a version.
    #[error("Improper constraint: `{0}`")]
    Malformed(String),
    /// The operator is not one of the PEP 440 comparison operators.
    #[error("No such comparison operator `{0}`, must be one of ~= == != <= >= < > ===")]
    UnknownOperator(String),
    /// The version after the operator is not a valid PEP 440 version.
    #[error("Invalid version in constraint `{constraint}`: {err}")]
    InvalidVersion {
        /// The offending clause.
        constraint: String,
        /// Why the version failed to parse.
        #[source]
        err: VersionParseError,
    },
    /// A trailing `.*` was used with an operator other than `==` or `!=`.
    #[error("Operator {operator} cannot be used with a wildcard version: `{constraint}`")]
    WildcardNotAllowed {
        /// The operator given.
        operator: Operator,
        /// The offending clause.
        constraint: String,
    },
    /// A trailing `.*` was combined with a dev release or a local label.
    #[error(
        "The (non)equality operators don't allow a wildcard together with a dev or local version: `{0}`"
    )]
    WildcardWithDevOrLocal(String),
    /// A local label was used with an operator other than `==` or `!=`.
    #[error(
        "Operator {operator} is incompatible with versions containing a local segment: `{constraint}`"
    )]
    LocalNotAllowed {
        /// The operator given.
        operator: Operator,
        /// The offending clause.
        constraint: String,
    },
    /// `~=` was used with a single-segment release.
    #[error("The ~= operator requires at least two segments in the release version: `{0}`")]
    CompatibleRelease(String),
}

/// One of `~=` `==` `!=` `<=` `>=` `<` `>` `===`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `~=`, the compatible release clause
    TildeEqual,
    /// `===` (discouraged)
    ///
    /// <https://peps.python.org/pep-0440/#arbitrary-equality>
    ExactEqual,
    /// `==`, with or without a trailing `.*`
    Equal,
    /// `!=`, with or without a trailing `.*`
    NotEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessThanEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanEqual,
}

impl FromStr for Operator {
    type Err = ConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let operator = match s {
            "~=" => Self::TildeEqual,
            "===" => Self::ExactEqual,
            "==" => Self::Equal,
            "!=" => Self::NotEqual,
            "<" => Self::LessThan,
            "<=" => Self::LessThanEqual,
            ">" => Self::GreaterThan,
            ">=" => Self::GreaterThanEqual,
            other => return Err(ConstraintError::UnknownOperator(other.to_string())),
        };
        Ok(operator)
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let operator = match self {
            Self::TildeEqual => "~=",
            Self::ExactEqual => "===",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::LessThan => "<",
            Self::LessThanEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanEqual => ">=",
        };
        f.write_str(operator)
    }
}

/// What a validated clause compares against, with the operator folded in.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Matcher {
    Equal(Version),
    /// `== X.Y.*`, holding the tokenized prefix.
    EqualPrefix(Vec<String>),
    NotEqual(Version),
    NotEqualPrefix(Vec<String>),
    LessThan(Version),
    LessThanEqual(Version),
    GreaterThan(Version),
    GreaterThanEqual(Version),
    /// `~=`: the lower bound and the prefix candidates must share.
    Compatible(Version, Vec<String>),
    /// `===` compares against the raw text.
    Arbitrary,
}

impl Matcher {
    fn new(operator: Operator, version: &str, clause: &str) -> Result<Self, ConstraintError> {
        if operator == Operator::ExactEqual {
            warn!("Using arbitrary equality (`===`) is discouraged: `{clause}`");
            return Ok(Self::Arbitrary);
        }

        let (version, wildcard) = match version.strip_suffix(".*") {
            Some(prefix) => (prefix, true),
            None => (version, false),
        };
        let version =
            Version::from_str(version).map_err(|err| ConstraintError::InvalidVersion {
                constraint: clause.to_string(),
                err,
            })?;

        match operator {
            Operator::Equal | Operator::NotEqual if wildcard => {
                if version.dev().is_some() || version.is_local() {
                    return Err(ConstraintError::WildcardWithDevOrLocal(clause.to_string()));
                }
                let prefix = split_version(&version.to_string());
                if operator == Operator::Equal {
                    Ok(Self::EqualPrefix(prefix))
                } else {
                    Ok(Self::NotEqualPrefix(prefix))
                }
            }
            Operator::Equal => Ok(Self::Equal(version)),
            Operator::NotEqual => Ok(Self::NotEqual(version)),
            _ if wildcard => Err(ConstraintError::WildcardNotAllowed {
                operator,
                constraint: clause.to_string(),
            }),
            Operator::TildeEqual if version.release().len() < 2 => {
                Err(ConstraintError::CompatibleRelease(clause.to_string()))
            }
            _ if version.is_local() => Err(ConstraintError::LocalNotAllowed {
                operator,
                constraint: clause.to_string(),
            }),
            Operator::TildeEqual => {
                let prefix = compatible_prefix(&version);
                Ok(Self::Compatible(version, prefix))
            }
            Operator::LessThan => Ok(Self::LessThan(version)),
            Operator::LessThanEqual => Ok(Self::LessThanEqual(version)),
            Operator::GreaterThan => Ok(Self::GreaterThan(version)),
            Operator::GreaterThanEqual => Ok(Self::GreaterThanEqual(version)),
            Operator::ExactEqual => unreachable!("`===` is matched before parsing the version"),
        }
    }

    fn operator(&self) -> Operator {
        match self {
            Self::Equal(_) | Self::EqualPrefix(_) => Operator::Equal,
            Self::NotEqual(_) | Self::NotEqualPrefix(_) => Operator::NotEqual,
            Self::LessThan(_) => Operator::LessThan,
            Self::LessThanEqual(_) => Operator::LessThanEqual,
            Self::GreaterThan(_) => Operator::GreaterThan,
            Self::GreaterThanEqual(_) => Operator::GreaterThanEqual,
            Self::Compatible(..) => Operator::TildeEqual,
            Self::Arbitrary => Operator::ExactEqual,
        }
    }
}

/// A single validated clause such as `>=1.2` or `==1.1.*`.
///
/// ```rust
/// use std::str::FromStr;
/// use pep440_version::{Constraint, Version};
///
/// let constraint = Constraint::from_str("== 1.*").unwrap();
/// assert!(constraint.check(&Version::from_str("1.19").unwrap()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    matcher: Matcher,
    /// The text after the operator, e.g. `1.1.*`.
    version: String,
    /// The clause as given, including surrounding whitespace.
    original: String,
}

impl Constraint {
    /// The comparison operator.
    pub fn operator(&self) -> Operator {
        self.matcher.operator()
    }

    /// The text after the operator, including a trailing `.*`.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The clause exactly as given.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Whether this is an `==` or `!=` clause with a trailing `.*`.
    pub fn is_wildcard(&self) -> bool {
        matches!(
            self.matcher,
            Matcher::EqualPrefix(_) | Matcher::NotEqualPrefix(_)
        )
    }

    /// Whether the given version satisfies this clause.
    ///
    /// See:
    /// - <https://peps.python.org/pep-0440/#version-specifiers>
    /// - <https://github.com/pypa/packaging/blob/a6407e3a7e19bd979e93f58cfc7f6641a7378c46/packaging/specifiers.py>
    pub fn check(&self, version: &Version) -> bool {
        match &self.matcher {
            Matcher::Equal(spec) => equal(spec, version),
            Matcher::EqualPrefix(prefix) => prefix_match(prefix, version),
            Matcher::NotEqual(spec) => !equal(spec, version),
            Matcher::NotEqualPrefix(prefix) => !prefix_match(prefix, version),
            Matcher::LessThan(spec) => less_than(spec, version),
            Matcher::LessThanEqual(spec) => version.without_local() <= *spec,
            Matcher::GreaterThan(spec) => greater_than(spec, version),
            Matcher::GreaterThanEqual(spec) => version.without_local() >= *spec,
            // "~=2.2" is equivalent to ">=2.2,==2.*".
            Matcher::Compatible(spec, prefix) => {
                version.without_local() >= *spec && prefix_match(prefix, version)
            }
            Matcher::Arbitrary => version.to_string().eq_ignore_ascii_case(&self.version),
        }
    }
}

impl FromStr for Constraint {
    type Err = ConstraintError;

    /// Parses a clause such as `>= 1.19`, `== 1.1.*`, `~=1.0` or `<=1!2012.2`.
    fn from_str(clause: &str) -> Result<Self, Self::Err> {
        let captures = CONSTRAINT_RE
            .captures(clause)
            .ok_or_else(|| ConstraintError::Malformed(clause.trim().to_string()))?;
        let operator = captures
            .name("operator")
            .map_or("", |operator| operator.as_str());
        let version = captures
            .name("version")
            .map_or("", |version| version.as_str());

        let operator = Operator::from_str(operator)?;
        let matcher = Matcher::new(operator, version, clause.trim())?;
        Ok(Self {
            matcher,
            version: version.to_string(),
            original: clause.to_string(),
        })
    }
}

impl Display for Constraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator(), self.version)
    }
}

/// <https://github.com/serde-rs/serde/issues/1316#issue-332908452>
impl<'de> Deserialize<'de> for Constraint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(de::Error::custom)
    }
}

impl Serialize for Constraint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// A constraint expression such as `>=1.2, <2.0 || ==3.*`.
///
/// Clauses separated by `,` must all match, groups separated by `||` are alternatives.
///
/// ```rust
/// use std::str::FromStr;
/// use pep440_version::{Constraints, Version};
///
/// let constraints = Constraints::from_str(">=1.16, <2.0 || ==3.*").unwrap();
/// assert!(constraints.check(&Version::from_str("1.19").unwrap()));
/// assert!(constraints.check(&Version::from_str("3.4").unwrap()));
/// assert!(!constraints.check(&Version::from_str("2.1").unwrap()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraints {
    groups: Vec<Vec<Constraint>>,
}

impl Constraints {
    /// Whether every clause of at least one group matches the given version.
    pub fn check(&self, version: &Version) -> bool {
        self.groups
            .iter()
            .any(|group| group.iter().all(|constraint| constraint.check(version)))
    }

    /// The `||`-separated groups, each a list of clauses that must all match.
    pub fn groups(&self) -> impl Iterator<Item = &[Constraint]> {
        self.groups.iter().map(Vec::as_slice)
    }
}

impl FromStr for Constraints {
    type Err = ConstraintError;

    fn from_str(expression: &str) -> Result<Self, Self::Err> {
        let groups = expression
            .split("||")
            .map(|group| {
                group
                    .split(',')
                    .map(Constraint::from_str)
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        trace!(
            "Parsed `{expression}` into {} alternative constraint group(s)",
            groups.len()
        );
        Ok(Self { groups })
    }
}

impl Display for Constraints {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (idx, group) in self.groups.iter().enumerate() {
            if idx > 0 {
                f.write_str(" || ")?;
            }
            for (idx, constraint) in group.iter().enumerate() {
                if idx > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{constraint}")?;
            }
        }
        Ok(())
    }
}

/// <https://github.com/serde-rs/serde/issues/1316#issue-332908452>
impl<'de> Deserialize<'de> for Constraints {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(de::Error::custom)
    }
}

impl Serialize for Constraints {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Local labels only count when the specifier carries one itself.
fn equal(spec: &Version, candidate: &Version) -> bool {
    if spec.is_local() {
        candidate == spec
    } else {
        candidate.without_local() == *spec
    }
}

fn less_than(spec: &Version, candidate: &Version) -> bool {
    let public = candidate.without_local();
    if public >= *spec {
        return false;
    }

    // Unless the specifier itself is a pre-release, don't accept pre-releases of the
    // version it names (`<3.1` must not match `3.1.dev0`, but does match `3.0.dev0`).
    !(!spec.is_pre_release() && public.is_pre_release() && public.same_base(spec))
}

fn greater_than(spec: &Version, candidate: &Version) -> bool {
    let public = candidate.without_local();
    if public <= *spec {
        return false;
    }

    // Unless the specifier itself is a post-release, don't accept post-releases of the
    // version it names (`>3.1` must not match `3.1.post0`, but does match `3.2.post0`).
    if !spec.is_post_release() && public.is_post_release() && public.same_base(spec) {
        return false;
    }

    // A local version of the version named is technically greater, but never matches.
    !(candidate.is_local() && candidate.same_base(spec))
}

/// Whether the candidate, local label dropped, starts with the tokenized prefix.
fn prefix_match(prefix: &[String], candidate: &Version) -> bool {
    let candidate = split_version(&candidate.public());
    // Shorten the candidate to the prefix length, so that a match means "starts with".
    let candidate = &candidate[..candidate.len().min(prefix.len())];
    let (prefix, candidate) = pad_release(prefix, candidate);
    prefix == candidate
}

/// Split a canonical version into its epoch, its dot-separated tokens, and an implicit token
/// boundary between a release number and a pre-release (`1.0rc1` is `0`, `1`, `0`, `rc1`).
fn split_version(version: &str) -> Vec<String> {
    let (epoch, rest) = version.rsplit_once('!').unwrap_or(("0", version));
    let mut tokens = vec![epoch.to_string()];
    for item in rest.split('.') {
        if let Some(captures) = PRE_RELEASE_BOUNDARY_RE.captures(item) {
            tokens.extend(
                captures
                    .iter()
                    .skip(1)
                    .flatten()
                    .map(|token| token.as_str().to_string()),
            );
        } else {
            tokens.push(item.to_string());
        }
    }
    tokens
}

/// Zero-pad the leading numeric tokens of both sides to the same width, keeping each side's
/// own remaining tokens.
fn pad_release<'a>(left: &'a [String], right: &'a [String]) -> (Vec<&'a str>, Vec<&'a str>) {
    let numeric = |tokens: &[String]| {
        tokens
            .iter()
            .take_while(|token| !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()))
            .count()
    };
    let left_release = numeric(left);
    let right_release = numeric(right);
    let width = left_release.max(right_release);

    let pad = |tokens: &'a [String], release: usize| -> Vec<&'a str> {
        let (release_tokens, rest) = tokens.split_at(release);
        release_tokens
            .iter()
            .map(String::as_str)
            .chain(iter::repeat_n("0", width - release))
            .chain(rest.iter().map(String::as_str))
            .collect()
    };
    (pad(left, left_release), pad(right, right_release))
}

/// The prefix a `~=` candidate must share: the release and pre-release tokens with the last
/// one dropped.
///
/// Post- and dev-release tokens are ignored, while a pre-release counts as its own token, so
/// `~=2.2.post3` requires `2.*` and `~=1.4.5a4` requires `1.4.5.*`.
fn compatible_prefix(version: &Version) -> Vec<String> {
    let mut prefix: Vec<String> = split_version(&version.public())
        .into_iter()
        .take_while(|token| !token.starts_with("post") && !token.starts_with("dev"))
        .collect();
    prefix.pop();
    prefix
}
