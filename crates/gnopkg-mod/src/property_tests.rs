//! Property-based tests for replace handling.
//!
//! Run with: cargo test --features proptest --package gnopkg-mod property_tests

use crate::{ModuleDescriptor, Replacement};
use proptest::prelude::*;
use std::collections::HashSet;

fn replace_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec(("(|a\\.b/[a-c])", "(|a\\.b/[a-c]|\\./[a-c])"), 0..=12)
}

fn descriptor(pairs: &[(String, String)]) -> ModuleDescriptor {
    let mut m = ModuleDescriptor::new("a.b/app");
    m.replace = pairs
        .iter()
        .map(|(o, n)| Replacement::new(o.clone(), n.clone()))
        .collect();
    m
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Property: after sanitize every `old` is unique and non-trivial
    #[test]
    fn prop_sanitize_leaves_unique_olds(pairs in replace_strategy()) {
        let mut m = descriptor(&pairs);
        m.sanitize();

        let mut olds = HashSet::new();
        for r in &m.replace {
            prop_assert!(!r.old.is_empty() && !r.new.is_empty());
            prop_assert_ne!(&r.old, &r.new);
            prop_assert!(olds.insert(r.old.clone()), "duplicate old {}", r.old);
        }
    }

    /// Property: sanitize agrees with first-match resolution for usable entries
    #[test]
    fn prop_sanitize_keeps_first_usable_match(pairs in replace_strategy(), target in "a\\.b/[a-c]") {
        let raw = descriptor(&pairs);
        let expected = pairs
            .iter()
            .filter(|(o, n)| !o.is_empty() && !n.is_empty() && o != n)
            .find(|(o, _)| *o == target)
            .map(|(_, n)| n.clone())
            .unwrap_or_else(|| target.clone());

        let mut m = raw.clone();
        m.sanitize();
        prop_assert_eq!(m.resolve(&target), expected.as_str());
    }
}
