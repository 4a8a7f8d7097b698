//! Release (fix version) ordering and primary/backport derivation.
//!
//! Release names are split on `.` and `-` into tokens. Numeric tokens
//! compare by value; any other token (`RC2`, `M1`, `GA`) compares by a
//! stable 32-bit polynomial string hash (base 31 over UTF-16 code units), so
//! orderings stay identical between runs and match previously migrated data.
//! One consequence: `5.1-RC2` sorts *after* `5.1.0`, because the hash of
//! `RC2` is larger than `0`.

use serde::Deserialize;
use std::cmp::Ordering;

/// Which releases may serve as an issue's primary release.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReleasePolicy {
    /// Pre-releases (`RC`, `M`, alpha, beta, snapshot) are skipped when
    /// choosing the primary and never become backport targets.
    #[default]
    ExcludePreRelease,

    /// Every release is eligible; the newest one is primary.
    PreReleaseEligible,
}

/// An issue's releases sorted newest first, split into primary and backports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseLines {
    /// All distinct release names, newest first.
    pub sorted: Vec<String>,

    /// Release the issue is filed against.
    pub primary: Option<String>,

    /// Older release lines the fix was backported to, newest first.
    pub backports: Vec<String>,
}

impl ReleaseLines {
    /// Sorts `names` and derives primary and backport releases under `policy`.
    #[must_use]
    pub fn derive(names: &[String], policy: ReleasePolicy) -> Self {
        let sorted = sort_descending(names);

        let (primary, backports) = match policy {
            ReleasePolicy::PreReleaseEligible => {
                let primary = sorted.first().cloned();
                let backports = sorted.iter().skip(1).cloned().collect();
                (primary, backports)
            }
            ReleasePolicy::ExcludePreRelease => {
                match sorted.iter().position(|name| !is_pre_release(name)) {
                    Some(index) => {
                        let backports = sorted[index + 1..]
                            .iter()
                            .filter(|name| !is_pre_release(name))
                            .cloned()
                            .collect();
                        (Some(sorted[index].clone()), backports)
                    }
                    // Only pre-releases: file against the newest, no backports.
                    None => (sorted.first().cloned(), Vec::new()),
                }
            }
        };

        Self {
            sorted,
            primary,
            backports,
        }
    }
}

/// Returns the distinct release names sorted newest first.
#[must_use]
pub fn sort_descending(names: &[String]) -> Vec<String> {
    let mut sorted: Vec<String> = names.to_vec();
    sorted.sort_by(|a, b| compare_releases(b, a));
    sorted.dedup();
    sorted
}

/// Total ascending order over release names.
///
/// Tokens are compared pairwise by ordinal; when one name's tokens are a
/// prefix of the other's, the longer name is newer. Names with identical
/// ordinals fall back to plain string comparison so the order is strict.
#[must_use]
pub fn compare_releases(a: &str, b: &str) -> Ordering {
    let left: Vec<i64> = tokens(a).map(token_ordinal).collect();
    let right: Vec<i64> = tokens(b).map(token_ordinal).collect();

    left.iter()
        .zip(&right)
        .map(|(l, r)| l.cmp(r))
        .find(|ordering| ordering.is_ne())
        .unwrap_or_else(|| left.len().cmp(&right.len()))
        .then_with(|| a.cmp(b))
}

/// Returns true for milestone, release-candidate and other pre-release names.
#[must_use]
pub fn is_pre_release(name: &str) -> bool {
    tokens(name).any(|token| {
        let lower = token.to_ascii_lowercase();
        let tagged = |prefix: &str| {
            lower
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.chars().all(|c| c.is_ascii_digit()))
        };
        tagged("rc")
            || tagged("m")
            || tagged("cr")
            || tagged("alpha")
            || tagged("beta")
            || tagged("pre")
            || lower == "snapshot"
            || lower == "build-snapshot"
    })
}

fn tokens(name: &str) -> impl Iterator<Item = &str> {
    name.split(['.', '-']).filter(|token| !token.is_empty())
}

fn token_ordinal(token: &str) -> i64 {
    if !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(value) = token.parse::<i64>() {
            return value;
        }
    }
    i64::from(string_hash(token))
}

/// Base-31 polynomial hash over UTF-16 code units, wrapping at 32 bits.
fn string_hash(token: &str) -> i32 {
    token
        .encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn numeric_tokens_compare_by_value() {
        assert_eq!(compare_releases("5.0.10", "5.0.9"), Ordering::Greater);
        assert_eq!(compare_releases("4.3.19", "5.0.9"), Ordering::Less);
        assert_eq!(compare_releases("5.0", "5.0.0"), Ordering::Less);
    }

    #[test]
    fn text_tokens_use_polynomial_string_hash() {
        assert_eq!(string_hash("RC2"), 80929);
        assert_eq!(string_hash(""), 0);
        // "Aa" and "BB" collide; ties fall back to the name.
        assert_eq!(string_hash("Aa"), string_hash("BB"));
        assert_eq!(compare_releases("1.Aa", "1.BB"), Ordering::Less);
    }

    #[test]
    fn pre_release_sorts_after_matching_numeric_line() {
        assert_eq!(compare_releases("5.1-RC2", "5.1.0"), Ordering::Greater);
        assert_eq!(compare_releases("5.1-RC2", "5.0.9"), Ordering::Greater);
    }

    #[test]
    fn sort_is_strictly_descending_and_deterministic() {
        let input = names(&["4.3.19", "5.1-RC2", "5.0.9", "5.0.9", "5.0.x", "4.3.19"]);

        let first = sort_descending(&input);
        let second = sort_descending(&input);

        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
        for pair in first.windows(2) {
            assert_eq!(compare_releases(&pair[0], &pair[1]), Ordering::Greater);
        }
    }

    #[test]
    fn excluding_pre_releases_skips_rc_primary() {
        let lines = ReleaseLines::derive(
            &names(&["4.3.19", "5.1-RC2", "5.0.9"]),
            ReleasePolicy::ExcludePreRelease,
        );

        assert_eq!(lines.sorted, names(&["5.1-RC2", "5.0.9", "4.3.19"]));
        assert_eq!(lines.primary.as_deref(), Some("5.0.9"));
        assert_eq!(lines.backports, names(&["4.3.19"]));
    }

    #[test]
    fn eligible_pre_releases_become_primary() {
        let lines = ReleaseLines::derive(
            &names(&["4.3.19", "5.1-RC2", "5.0.9"]),
            ReleasePolicy::PreReleaseEligible,
        );

        assert_eq!(lines.primary.as_deref(), Some("5.1-RC2"));
        assert_eq!(lines.backports, names(&["5.0.9", "4.3.19"]));
    }

    #[test]
    fn only_pre_releases_keep_newest_as_primary() {
        let lines = ReleaseLines::derive(
            &names(&["6.0.0-M1", "6.0.0-M2"]),
            ReleasePolicy::ExcludePreRelease,
        );

        assert_eq!(lines.primary.as_deref(), Some("6.0.0-M2"));
        assert!(lines.backports.is_empty());
    }

    #[test]
    fn no_releases_means_no_primary() {
        let lines = ReleaseLines::derive(&[], ReleasePolicy::ExcludePreRelease);
        assert_eq!(lines, ReleaseLines::default());
    }

    #[test]
    fn recognises_pre_release_tokens() {
        assert!(is_pre_release("5.1-RC2"));
        assert!(is_pre_release("6.0.0-M1"));
        assert!(is_pre_release("2.0.0.BUILD-SNAPSHOT"));
        assert!(is_pre_release("1.0-beta"));
        assert!(!is_pre_release("5.0.9"));
        assert!(!is_pre_release("4.3.x"));
        assert!(!is_pre_release("General Backlog"));
    }
}
