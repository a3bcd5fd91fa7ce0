//! Allowlist matching for DNS question names
//!
//! FQDN format:
//! `<host>.<subdomain>...<domain>.<tld>.` with the trailing `.` being the root.
//!
//! Names under the `local` TLD (cluster service discovery, mDNS) are never
//! forwarded, whatever the allowlist says. Everything else is forwarded
//! unless some allowlist pattern matches the name.
//!
//! The `local` label is compared ASCII case-insensitively rather than as an
//! exact string: DNS names are case-insensitive (RFC 4343), so a resolver
//! asking for `printer.LOCAL` is making the same internal lookup.
//! Allowlist patterns are not folded; they match the name as received.

use crate::allowlist::AllowlistSnapshot;

/// Label that marks internal lookups
pub const LOCAL_TLD: &str = "local";

/// Why a question was not forwarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Last label is `local`
    LocalDomain,
    /// Matched the allowlist pattern at this index
    Allowlisted(usize),
}

/// Decision for a single question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Not whitelisted, send downstream
    Forward,
    /// Whitelisted or internal
    Drop(DropReason),
}

impl Verdict {
    /// True if the question must not be forwarded
    pub fn is_drop(self) -> bool {
        matches!(self, Self::Drop(_))
    }
}

/// Strip a single trailing root separator
pub fn trim_root(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

/// True if the last label of an already trimmed name is `local`
pub fn is_local(trimmed: &str) -> bool {
    trimmed
        .rsplit('.')
        .next()
        .is_some_and(|label| label.eq_ignore_ascii_case(LOCAL_TLD))
}

/// Decide what to do with `name` under `snapshot`
pub fn evaluate(name: &str, snapshot: &AllowlistSnapshot) -> Verdict {
    let name = trim_root(name);

    if is_local(name) {
        return Verdict::Drop(DropReason::LocalDomain);
    }

    snapshot
        .patterns()
        .iter()
        .position(|pattern| pattern.is_match(name))
        .map_or(Verdict::Forward, |idx| Verdict::Drop(DropReason::Allowlisted(idx)))
}

/// True if `name` is whitelisted (must be dropped)
pub fn matches(name: &str, snapshot: &AllowlistSnapshot) -> bool {
    evaluate(name, snapshot).is_drop()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allowlist::AllowPattern;
    use proptest::prelude::*;

    fn snapshot(patterns: &[&str]) -> AllowlistSnapshot {
        let compiled = patterns.iter().map(|p| AllowPattern::new(p).unwrap()).collect();
        AllowlistSnapshot::new("test".into(), compiled)
    }

    #[test]
    fn test_trim_root() {
        assert_eq!(trim_root("www.example.com."), "www.example.com");
        assert_eq!(trim_root("www.example.com"), "www.example.com");
        assert_eq!(trim_root("."), "");
    }

    #[test]
    fn test_cluster_name_dropped() {
        let empty = snapshot(&[]);
        assert_eq!(
            evaluate("app.internal.svc.cluster.local", &empty),
            Verdict::Drop(DropReason::LocalDomain)
        );
        assert!(matches("printer.LOCAL.", &empty));
        // only the last label counts
        assert!(!matches("local.example.com", &empty));
        assert!(!matches("notlocal", &empty));
    }

    #[test]
    fn test_local_label_ignores_case() {
        let empty = snapshot(&[]);
        for name in ["printer.LOCAL", "nas.Local.", "svc.cluster.lOcAl"] {
            assert_eq!(evaluate(name, &empty), Verdict::Drop(DropReason::LocalDomain), "{name}");
        }
        assert!(!matches("printer.LOCALE", &empty));
    }

    #[test]
    fn test_empty_allowlist_forwards() {
        assert_eq!(evaluate("www.example.com", &snapshot(&[])), Verdict::Forward);
    }

    #[test]
    fn test_pattern_match_drops() {
        let allow = snapshot(&["^cdn\\.", "ads\\..*"]);
        assert_eq!(
            evaluate("ads.tracker.net", &allow),
            Verdict::Drop(DropReason::Allowlisted(1))
        );
        assert_eq!(
            evaluate("cdn.example.com.", &allow),
            Verdict::Drop(DropReason::Allowlisted(0))
        );
        assert_eq!(evaluate("www.example.com", &allow), Verdict::Forward);
    }

    #[test]
    fn test_match_uses_trimmed_name() {
        let allow = snapshot(&["\\.com$"]);
        assert!(matches("www.example.com.", &allow));
    }

    fn label() -> impl Strategy<Value = String> {
        "[a-z0-9]{1,12}"
    }

    fn name() -> impl Strategy<Value = String> {
        prop::collection::vec(label(), 1..5).prop_map(|labels| labels.join("."))
    }

    proptest! {
        #[test]
        fn prop_local_always_dropped(prefix in name(), patterns in prop::collection::vec("[a-z]{1,4}", 0..4)) {
            let refs: Vec<&str> = patterns.iter().map(String::as_str).collect();
            let allow = snapshot(&refs);
            let fqdn = format!("{prefix}.local");
            prop_assert!(matches(&fqdn, &allow));
            let rooted = format!("{fqdn}.");
            prop_assert!(matches(&rooted, &allow));
        }

        #[test]
        fn prop_empty_allowlist_forwards_non_local(n in name()) {
            prop_assume!(!is_local(&n));
            prop_assert!(!matches(&n, &snapshot(&[])));
        }

        #[test]
        fn prop_pattern_order_irrelevant(
            n in name(),
            mut patterns in prop::collection::vec("[a-z0-9]{1,3}", 0..6),
        ) {
            let forward: Vec<&str> = patterns.iter().map(String::as_str).collect();
            let expected = matches(&n, &snapshot(&forward));

            patterns.reverse();
            let reversed: Vec<&str> = patterns.iter().map(String::as_str).collect();
            prop_assert_eq!(matches(&n, &snapshot(&reversed)), expected);

            let mid = patterns.len() / 2;
            patterns.rotate_left(mid);
            let rotated: Vec<&str> = patterns.iter().map(String::as_str).collect();
            prop_assert_eq!(matches(&n, &snapshot(&rotated)), expected);
        }

        #[test]
        fn prop_name_itself_as_pattern_drops(n in name()) {
            let escaped = regex::escape(&n);
            prop_assert!(matches(&n, &snapshot(&[escaped.as_str()])));
        }
    }
}
