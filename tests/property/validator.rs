//! Property-based tests for validation, scoring and dedup guarantees

use leadgen::validation::{
    normalize_phone, similarity, Evaluation, RejectReason, ScoreInputs, ScoreWeights,
    ValidationConfig, Validator,
};
use leadgen::{GenerationRequest, RawCandidate, SourceId};
use proptest::prelude::*;

fn request() -> GenerationRequest {
    GenerationRequest::new("petshop", "Curitiba", 10, "prop")
}

/// A candidate with neither phone nor email is never accepted
#[test]
fn test_no_contact_is_never_accepted() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(
                proptest::option::of("[a-zA-Z ]{0,20}"),
                proptest::option::of("https?://[a-z]{1,10}\\.com"),
                proptest::option::of("[a-zA-Z]{0,12}"),
            ),
            |(name, website, city)| {
                let mut validator = Validator::new(ValidationConfig::default());
                let candidate = RawCandidate {
                    name,
                    website,
                    city,
                    ..RawCandidate::default()
                };
                let outcome = validator.evaluate(&candidate, &SourceId::new("s"), &request());
                prop_assert!(!outcome.is_accepted());
                Ok(())
            },
        )
        .unwrap();
}

/// Scores never exceed the cap, whatever the configured weights
#[test]
fn test_score_is_capped_for_any_weights() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(
                any::<[u8; 5]>(),
                any::<(bool, bool, bool, bool, bool)>(),
            ),
            |(w, (has_name, phone_valid, email_valid, website_valid, has_city))| {
                let weights = ScoreWeights {
                    name: w[0],
                    phone: w[1],
                    email: w[2],
                    website: w[3],
                    city: w[4],
                };
                let score = weights.score(ScoreInputs {
                    has_name,
                    phone_valid,
                    email_valid,
                    website_valid,
                    has_city,
                });
                prop_assert!(score <= 100);
                Ok(())
            },
        )
        .unwrap();
}

proptest! {
    /// Digit-only phones of at least ten digits always normalize to themselves
    #[test]
    fn long_digit_phones_are_accepted(phone in "[0-9]{10,15}") {
        prop_assert_eq!(normalize_phone(&phone, 10), Some(phone.clone()));
    }

    /// Any non-digit, non-separator character invalidates a phone
    #[test]
    fn phones_with_letters_are_rejected(prefix in "[0-9]{10}", letter in "[a-zA-Z+]") {
        let phone = format!("{prefix}{letter}");
        prop_assert_eq!(normalize_phone(&phone, 10), None);
    }

    /// Similarity is symmetric and bounded
    #[test]
    fn similarity_is_symmetric_and_bounded(a in "\\PC{0,24}", b in "\\PC{0,24}") {
        let ab = similarity(&a, &b);
        let ba = similarity(&b, &a);
        prop_assert!((ab - ba).abs() < 1e-9);
        prop_assert!((0.0..=1.0).contains(&ab));
        prop_assert!((similarity(&a, &a) - 1.0).abs() < 1e-9);
    }

    /// Resubmitting an accepted candidate is always rejected as a duplicate
    #[test]
    fn accepted_names_block_their_repeats(name in "[a-z]{3,20}", phone in "[0-9]{10,12}") {
        let mut validator = Validator::new(ValidationConfig::default());
        let candidate = RawCandidate::named(name.clone()).with_phone(phone);
        let source = SourceId::new("s");

        let first = validator.evaluate(&candidate, &source, &request());
        prop_assert!(matches!(first, Evaluation::Accepted(_)));

        let repeat = RawCandidate::named(name.to_uppercase()).with_email("x@y.com");
        let second = validator.evaluate(&repeat, &source, &request());
        let is_duplicate = matches!(second, Evaluation::Rejected(RejectReason::Duplicate { .. }));
        prop_assert!(is_duplicate);
        prop_assert_eq!(validator.rejections().duplicate, 1);
    }
}
