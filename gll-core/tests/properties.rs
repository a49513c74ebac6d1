//! Property-based tests for the combinator engine.
//!
//! These verify laws that must hold for ANY literal and input, not just
//! crafted examples. proptest generates the cases and shrinks failures
//! to minimal ones.

use proptest::prelude::*;

use gll_core::{Grammar, ResultView};

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 128,
        max_shrink_iters: 200,
        ..ProptestConfig::default()
    }
}

// =============================================================================
// Literal laws
// =============================================================================

proptest! {
    #![proptest_config(config())]

    /// A literal consumes exactly itself from any input it prefixes.
    #[test]
    fn literal_matches_its_prefix(lit in "[a-z]{1,6}", tail in "[a-z]{0,6}") {
        let mut g = Grammar::new();
        let parser = g.literal(&lit);
        let input = format!("{}{}", lit, tail);

        let parsed = g.parse(parser, &input);
        match g.view(parsed.single().unwrap()) {
            ResultView::Success { value, rest } => {
                prop_assert_eq!(value.as_text(), Some(lit.as_str()));
                prop_assert_eq!(rest, tail.as_str());
            }
            other => prop_assert!(false, "expected success, got {:?}", other),
        }
    }

    /// A literal leaves non-matching input untouched.
    #[test]
    fn literal_rejects_without_consuming(lit in "[a-z]{1,6}", input in "[a-z]{0,12}") {
        prop_assume!(!input.starts_with(&lit));

        let mut g = Grammar::new();
        let parser = g.literal(&lit);

        let parsed = g.parse(parser, &input);
        match g.view(parsed.single().unwrap()) {
            ResultView::Failure { rest, .. } => prop_assert_eq!(rest, input.as_str()),
            other => prop_assert!(false, "expected failure, got {:?}", other),
        }
    }
}

// =============================================================================
// Composition laws
// =============================================================================

proptest! {
    #![proptest_config(config())]

    /// `a.followed_by(b)` succeeds exactly when `a` succeeds and `b`
    /// succeeds on `a`'s remainder, pairing the values.
    #[test]
    fn sequence_agrees_with_two_step_parse(
        a in "[a-z]{1,4}",
        b in "[a-z]{1,4}",
        input in "[a-z]{0,10}",
    ) {
        let mut g = Grammar::new();
        let pa = g.literal(&a);
        let pb = g.literal(&b);
        let pab = g.followed_by(pa, pb);

        // Snapshot the composed outcome as owned data; the two-step
        // comparison below keeps parsing with the same grammar.
        let composed = g.parse(pab, &input).single().unwrap();
        let (composed_ok, composed_leaves, composed_rest) = match g.view(composed) {
            ResultView::Success { value, rest } => {
                let leaves: Vec<String> =
                    value.leaves().iter().map(|s| s.to_string()).collect();
                (true, leaves, rest.to_owned())
            }
            ResultView::Failure { .. } => (false, Vec::new(), String::new()),
        };

        let step_a = g.parse(pa, &input).single().unwrap();
        let after_a = match g.view(step_a) {
            ResultView::Success { rest, .. } => Some(rest.to_owned()),
            ResultView::Failure { .. } => None,
        };

        match after_a {
            None => prop_assert!(!composed_ok),
            Some(after_a) => {
                let step_b = g.parse(pb, &after_a).single().unwrap();
                match g.view(step_b) {
                    ResultView::Failure { .. } => prop_assert!(!composed_ok),
                    ResultView::Success { rest: after_b, .. } => {
                        prop_assert!(composed_ok);
                        prop_assert_eq!(composed_leaves, vec![a.clone(), b.clone()]);
                        prop_assert_eq!(composed_rest.as_str(), after_b);
                    }
                }
            }
        }
    }

    /// A disjunction over any set of literals never delivers the same
    /// canonical result twice.
    #[test]
    fn disjunction_output_is_a_set(
        lits in prop::collection::vec("[a-z]{1,3}", 1..5),
        input in "[a-z]{0,6}",
    ) {
        let mut g = Grammar::new();
        let mut parser = g.literal(&lits[0]);
        for lit in &lits[1..] {
            let next = g.literal(lit);
            parser = g.alternately(parser, next);
        }

        let parsed = g.parse(parser, &input);
        let results = parsed.results();
        for (i, a) in results.iter().enumerate() {
            for b in &results[i + 1..] {
                prop_assert_ne!(a, b);
            }
        }
    }

    /// Parsing is total: any grammar of literals over any input returns
    /// without panicking, and every failure leaves its position intact.
    #[test]
    fn parse_never_panics(
        lits in prop::collection::vec("[a-z]{0,4}", 1..6),
        input in "\\PC{0,20}",
    ) {
        let mut g = Grammar::new();
        let mut parser = g.literal(&lits[0]);
        for (i, lit) in lits[1..].iter().enumerate() {
            let next = g.literal(lit);
            parser = if i % 2 == 0 {
                g.alternately(parser, next)
            } else {
                g.followed_by(parser, next)
            };
        }

        let parsed = g.parse(parser, &input);
        for view in g.views(&parsed) {
            if let ResultView::Failure { rest, .. } = view {
                prop_assert!(input.ends_with(rest));
            }
        }
    }
}
