use std::cmp::Ordering;
use std::collections::HashSet;
use std::str::FromStr;

use insta::assert_snapshot;
use num_bigint::BigUint;

use super::*;

const VERSIONS_ALL: &[&str] = &[
    // Implicit epoch of 0
    "1.0.dev456",
    "1.0a1",
    "1.0a2.dev456",
    "1.0a12.dev456",
    "1.0a12",
    "1.0b1.dev456",
    "1.0b2",
    "1.0b2.post345.dev456",
    "1.0b2.post345",
    "1.0b2-346",
    "1.0c1.dev456",
    "1.0c1",
    "1.0rc2",
    "1.0c3",
    "1.0",
    "1.0.post456.dev34",
    "1.0.post456",
    "1.1.dev1",
    "1.2+123abc",
    "1.2+123abc456",
    "1.2+abc",
    "1.2+abc123",
    "1.2+abc123def",
    "1.2+1234.abc",
    "1.2+123456",
    "1.2.r32+123456",
    "1.2.rev33+123456",
    // Explicit epoch of 1
    "1!1.0.dev456",
    "1!1.0a1",
    "1!1.0a2.dev456",
    "1!1.0a12.dev456",
    "1!1.0a12",
    "1!1.0b1.dev456",
    "1!1.0b2",
    "1!1.0b2.post345.dev456",
    "1!1.0b2.post345",
    "1!1.0b2-346",
    "1!1.0c1.dev456",
    "1!1.0c1",
    "1!1.0rc2",
    "1!1.0c3",
    "1!1.0",
    "1!1.0.post456.dev34",
    "1!1.0.post456",
    "1!1.1.dev1",
    "1!1.2+123abc",
    "1!1.2+123abc456",
    "1!1.2+abc",
    "1!1.2+abc123",
    "1!1.2+abc123def",
    "1!1.2+1234.abc",
    "1!1.2+123456",
    "1!1.2.r32+123456",
    "1!1.2.rev33+123456",
];

fn parse_err(version: &str) -> String {
    Version::from_str(version).unwrap_err().to_string()
}

/// <https://github.com/pypa/packaging/blob/237ff3aa348486cf835a980592af3a59fccd6101/tests/test_version.py#L91-L100>
#[test]
fn test_packaging_failures() {
    let versions = [
        // Nonsensical versions should be invalid
        "french toast",
        // Versions with invalid local versions
        "1.0+a+",
        "1.0++",
        "1.0+_foobar",
        "1.0+foo&asd",
        "1.0+1+1",
        // Wildcards are only meaningful in constraints
        "1.0.*",
        "",
    ];
    for version in versions {
        assert_eq!(
            Version::from_str(version).unwrap_err(),
            VersionParseError::Malformed(version.to_string())
        );
    }
}

#[test]
fn test_regex_mismatch() {
    assert_snapshot!(parse_err("blergh"), @"Version `blergh` doesn't match PEP 440 rules");
}

#[test]
fn test_large_numbers() {
    // Numbers are not bounded by a machine integer.
    let version = Version::from_str("1.0.20231231235959123456").unwrap();
    assert_eq!(version.to_string(), "1.0.20231231235959123456");
    assert_eq!(
        version.release()[2],
        BigUint::from_str("20231231235959123456").unwrap()
    );
    assert!(version > Version::from_str("1.0.18446744073709551615").unwrap());
    assert!(version < Version::from_str("1.0.100000000000000000000").unwrap());
    assert!(
        Version::from_str("18446744073709551616!1.0").unwrap()
            > Version::from_str("18446744073709551615!9.0").unwrap()
    );
    assert_eq!(
        Version::from_str("1.0.post00018446744073709551616").unwrap(),
        Version::from_str("1.0.post18446744073709551616").unwrap()
    );
}

#[test]
fn test_large_local_numbers() {
    let big = Version::from_str("1.0+18446744073709551616").unwrap();
    let small = Version::from_str("1.0+1").unwrap();
    assert_eq!(big.local(), "18446744073709551616");
    assert!(big > small);
    // Still a number, so it sorts above any text segment.
    assert!(big > Version::from_str("1.0+zzz").unwrap());
    assert!(
        Version::from_str("1.0+abc.18446744073709551616").unwrap()
            > Version::from_str("1.0+abc.99").unwrap()
    );
}

#[test]
fn test_equality_and_normalization() {
    let versions = [
        // Various development release incarnations
        ("1.0dev", "1.0.dev0"),
        ("1.0.dev", "1.0.dev0"),
        ("1.0dev1", "1.0.dev1"),
        ("1.0-dev", "1.0.dev0"),
        ("1.0-dev1", "1.0.dev1"),
        ("1.0DEV", "1.0.dev0"),
        ("1.0.DEV1", "1.0.dev1"),
        ("1.0_dev_2", "1.0.dev2"),
        // Various alpha incarnations
        ("1.0a", "1.0a0"),
        ("1.0.a1", "1.0a1"),
        ("1.0-a1", "1.0a1"),
        ("1.0alpha", "1.0a0"),
        ("1.0.alpha1", "1.0a1"),
        ("1.0-ALPHA1", "1.0a1"),
        ("1.0_A_1", "1.0a1"),
        // Various beta incarnations
        ("1.0b", "1.0b0"),
        ("1.0.b1", "1.0b1"),
        ("1.0beta", "1.0b0"),
        ("1.0-BETA1", "1.0b1"),
        // Various release candidate incarnations
        ("1.0c", "1.0rc0"),
        ("1.0.c1", "1.0rc1"),
        ("1.0rc", "1.0rc0"),
        ("1.0-RC1", "1.0rc1"),
        ("1.0pre", "1.0rc0"),
        ("1.0-preview2", "1.0rc2"),
        // Various post release incarnations
        ("1.0post", "1.0.post0"),
        ("1.0.post", "1.0.post0"),
        ("1.0post1", "1.0.post1"),
        ("1.0-POST1", "1.0.post1"),
        ("1.0r", "1.0.post0"),
        ("1.0rev", "1.0.post0"),
        ("1.0.r1", "1.0.post1"),
        ("1.0.rev1", "1.0.post1"),
        ("1.0-5", "1.0.post5"),
        ("1.0-r5", "1.0.post5"),
        ("1.0-rev5", "1.0.post5"),
        // Local version case insensitivity
        ("1.0+AbC", "1.0+abc"),
        // Integer Normalization
        ("1.01", "1.1"),
        ("1.0a05", "1.0a5"),
        ("1.0b07", "1.0b7"),
        ("1.0c056", "1.0rc56"),
        ("1.0rc09", "1.0rc9"),
        ("1.0.post000", "1.0.post0"),
        ("1.1.dev09000", "1.1.dev9000"),
        ("00!1.2", "1.2"),
        ("0100!0.0", "100!0.0"),
        // Various other normalizations
        ("v1.0", "1.0"),
        ("V1.0", "1.0"),
        ("   v1.0\t\n", "1.0"),
        ("1.0a1-2.dev3", "1.0a1.post2.dev3"),
    ];
    for (version_str, normalized_str) in versions {
        let version = Version::from_str(version_str).unwrap();
        let normalized = Version::from_str(normalized_str).unwrap();
        assert_eq!(version, normalized, "{version_str} {normalized_str}");
        assert_eq!(
            version.to_string(),
            normalized_str,
            "{version_str} {normalized_str}"
        );
        assert_eq!(version.original(), version_str);
    }
}

/// <https://github.com/pypa/packaging/blob/237ff3aa348486cf835a980592af3a59fccd6101/tests/test_version.py#L666-L707>
#[test]
fn test_total_order() {
    let versions: Vec<Version> = VERSIONS_ALL
        .iter()
        .map(|version| Version::from_str(version).unwrap())
        .collect();

    for (i, a) in versions.iter().enumerate() {
        for (j, b) in versions.iter().enumerate() {
            let expected = i.cmp(&j);
            assert_eq!(a.compare(b), expected, "{a} {expected:?} {b}");
            assert_eq!(a.less_than(b), expected == Ordering::Less, "{a} < {b}");
            assert_eq!(a.equal(b), expected == Ordering::Equal, "{a} == {b}");
            assert_eq!(a.greater_than(b), expected == Ordering::Greater, "{a} > {b}");
            assert_eq!(a.less_than_or_equal(b), expected != Ordering::Greater);
            assert_eq!(a.greater_than_or_equal(b), expected != Ordering::Less);
        }
    }
}

#[test]
fn test_suffix_ordering() {
    let ascending = [
        "1.0.dev1",
        "1.0a1",
        "1.0a1.post1.dev1",
        "1.0a1.post1",
        "1.0b1",
        "1.0rc1",
        "1.0",
        "1.0.post1",
        "1.1.dev1",
    ];
    for pair in ascending.windows(2) {
        let lower = Version::from_str(pair[0]).unwrap();
        let higher = Version::from_str(pair[1]).unwrap();
        assert!(lower < higher, "{lower} < {higher}");
        assert!(higher > lower, "{higher} > {lower}");
    }
}

#[test]
fn test_release_padding() {
    let short = Version::from_str("1.0").unwrap();
    let long = Version::from_str("1.0.0").unwrap();
    assert_eq!(short, long);
    assert_eq!(short.compare(&long), Ordering::Equal);
    assert_ne!(short.to_string(), long.to_string());

    // Equal versions hash equally even though their release lengths differ.
    let set: HashSet<Version> = [short, long, Version::from_str("1").unwrap()]
        .into_iter()
        .collect();
    assert_eq!(set.len(), 1);

    assert!(Version::from_str("1.2").unwrap() < Version::from_str("1.2.1").unwrap());
    assert!(Version::from_str("1.2.0.0.1").unwrap() > Version::from_str("1.2").unwrap());
    assert!(Version::from_str("1.10").unwrap() > Version::from_str("1.9.9").unwrap());
}

#[test]
fn test_epoch_dominates() {
    assert!(Version::from_str("1!0.1").unwrap() > Version::from_str("2024.1").unwrap());
    assert_eq!(
        Version::from_str("0!1.0").unwrap(),
        Version::from_str("1.0").unwrap()
    );
}

#[test]
fn test_local_ordering() {
    let ascending = ["1.0", "1.0+abc", "1.0+abc.1", "1.0+1", "1.0+1.1", "1.0+2", "1.0.post0"];
    for pair in ascending.windows(2) {
        let lower = Version::from_str(pair[0]).unwrap();
        let higher = Version::from_str(pair[1]).unwrap();
        assert!(lower < higher, "{lower} < {higher}");
    }
    // Local labels are opaque text, other separators are not normalized.
    assert_ne!(
        Version::from_str("1.0+abc-1").unwrap(),
        Version::from_str("1.0+abc.1").unwrap()
    );
}

#[test]
fn test_canonicalization_is_idempotent() {
    let inputs = VERSIONS_ALL
        .iter()
        .copied()
        .chain(["  V2!01.02-Preview-3_R.DEV+Ubuntu-1 ", "1.0-5", "1.0_c_1"]);
    for input in inputs {
        let version = Version::from_str(input).unwrap();
        let canonical = version.to_string();
        let reparsed = Version::from_str(&canonical).unwrap();
        assert_eq!(reparsed.to_string(), canonical, "{input}");
        assert_eq!(reparsed, version, "{input}");
    }
}

#[test]
fn test_accessors() {
    let version = Version::from_str(" v2!1.02.3-Preview-3_R.DEV+Ubuntu-1 ").unwrap();
    assert_eq!(version.to_string(), "2!1.2.3rc3.post0.dev0+ubuntu-1");
    assert_eq!(version.original(), " v2!1.02.3-Preview-3_R.DEV+Ubuntu-1 ");
    assert_eq!(*version.epoch(), BigUint::from(2u32));
    assert_eq!(
        version.release(),
        [1u32, 2, 3].map(BigUint::from).as_slice()
    );
    assert_eq!(
        version.pre(),
        Some(&Prerelease {
            kind: PrereleaseKind::Rc,
            number: BigUint::from(3u32)
        })
    );
    assert_eq!(version.post(), Some(&BigUint::default()));
    assert_eq!(version.dev(), Some(&BigUint::default()));
    assert_eq!(version.base_version(), "2!1.2.3");
    assert_eq!(version.public(), "2!1.2.3rc3.post0.dev0");
    assert_eq!(version.local(), "ubuntu-1");
    assert!(version.is_local());
    assert!(version.is_pre_release());
    assert!(version.is_post_release());

    let without_local = version.without_local();
    assert_eq!(without_local.to_string(), "2!1.2.3rc3.post0.dev0");
    assert_eq!(without_local.local(), "");
    assert!(without_local < version);

    let plain = Version::from_str("3.11").unwrap();
    assert_eq!(plain.base_version(), "3.11");
    assert_eq!(plain.public(), "3.11");
    assert_eq!(plain.local(), "");
    assert!(!plain.is_pre_release());
    assert!(!plain.is_post_release());
    assert!(Version::from_str("3.11.dev0").unwrap().is_pre_release());
    assert!(!Version::from_str("3.11.post1").unwrap().is_pre_release());
}

#[test]
fn test_from_static() {
    assert_eq!(Version::from_static("1.0").to_string(), "1.0");
}

#[test]
#[should_panic(expected = "Version `not a version` doesn't match PEP 440 rules")]
fn test_from_static_panics() {
    Version::from_static("not a version");
}

#[test]
fn test_sorted_versions() {
    let mut versions: SortedVersions = ["1.1.dev1", "1.0", "1.0.post1", "1.0rc1", "1.0.dev1"]
        .into_iter()
        .map(|version| Version::from_str(version).unwrap())
        .collect();
    assert_eq!(versions.len(), 5);
    assert!(!versions.is_empty());
    assert!(versions.less(1, 0));
    assert!(!versions.less(0, 1));

    versions.swap(0, 4);
    assert_eq!(versions[0].to_string(), "1.0.dev1");

    versions.sort();
    let sorted: Vec<String> = versions.iter().map(ToString::to_string).collect();
    assert_eq!(
        sorted,
        ["1.0.dev1", "1.0rc1", "1.0", "1.0.post1", "1.1.dev1"]
    );
    for i in 1..versions.len() {
        assert!(versions.less(i - 1, i));
    }
    assert_eq!(versions.into_inner().len(), 5);
    assert!(SortedVersions::default().is_empty());
}

#[test]
fn test_serde() {
    let version = Version::from_str("v1.0-RC1").unwrap();
    assert_eq!(serde_json::to_string(&version).unwrap(), r#""1.0rc1""#);

    let parsed: Version = serde_json::from_str(r#""1.0.post2+local""#).unwrap();
    assert_eq!(parsed.to_string(), "1.0.post2+local");

    let err = serde_json::from_str::<Version>(r#""1.0+""#).unwrap_err();
    assert!(err.to_string().contains("doesn't match PEP 440 rules"));
}

#[test]
fn test_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Version>();
    assert_send_sync::<SortedVersions>();
}
