//! Python version numbers and version constraints, implementing
//! [PEP 440](https://peps.python.org/pep-0440)
//!
//! ```rust
//! use std::str::FromStr;
//! use pep440_version::{Constraints, Version};
//!
//! let version = Version::from_str("1.19").unwrap();
//! let constraints = Constraints::from_str(">=1.16, <2.0").unwrap();
//! assert!(constraints.check(&version));
//! ```
//!
//! A few PEP 440 rules are easy to trip over:
//!
//! * An epoch can prefix the version, e.g. `1!1.2.3`. A lower epoch always means a lower
//!   version (`2024.1 < 1!0.1`).
//! * Dev releases attached to a final release sort before its pre-releases
//!   (`1.0.dev1 < 1.0a1`), while dev releases attached to a pre- or post-release sort just
//!   below it (`1.0a1.post1.dev1 < 1.0a1.post1`).
//! * Local versions (`1.0+ubuntu1`) sort above the public version but are ignored by most
//!   operators, so `==1.0` matches `1.0+ubuntu1`. Ordering and matching disagree on purpose.
//! * `<V` excludes pre-releases of `V` and `>V` excludes post-releases of `V`, unless `V` is
//!   itself such a release.
//! * `===` compares strings, not versions.
//!
//! Constraint expressions accept `,` for "and" and `||` for "or", with "and" binding tighter:
//! `>=1.0,<2.0 || >=3.0` is `(>=1.0 and <2.0) or >=3.0`.
#![deny(missing_docs)]

pub use {
    constraint::{Constraint, ConstraintError, Constraints, Operator},
    version::{Prerelease, PrereleaseKind, SortedVersions, Version, VersionParseError},
};

mod constraint;
mod part;
mod version;
