//! Property tests for placeholder scanning and template assembly.

use proptest::prelude::*;

use simpack::{find_placeholders, replace_first, SimpackError, TemplateAssembler};

fn token_name() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Za-z0-9_.\\-]{1,12}").unwrap()
}

fn token_free_value() -> impl Strategy<Value = String> {
    // values must not introduce new placeholder candidates
    proptest::string::string_regex("[a-z0-9 <>/=\"]{0,24}")
        .unwrap()
        .prop_filter("no placeholder syntax", |s| !s.contains("{{"))
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 96,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: the scanner never panics on arbitrary input.
    #[test]
    fn property_find_placeholders_never_panics(
        document in "(?s).{0,512}"
    ) {
        let _ = find_placeholders(&document);
    }

    /// PROPERTY: every scanned token occurs in the document in `{{...}}` form.
    #[test]
    fn property_scanned_tokens_occur_in_document(
        document in "(?s).{0,256}"
    ) {
        for token in find_placeholders(&document) {
            let pattern = format!("{{{{{}}}}}", token);
            prop_assert!(document.contains(&pattern));
        }
    }

    /// PROPERTY: a single-occurrence token substitutes cleanly and the
    /// result is exactly prefix + value + suffix.
    #[test]
    fn property_single_token_round_trip(
        name in token_name(),
        value in token_free_value(),
        prefix in token_free_value(),
        suffix in token_free_value(),
    ) {
        let template = format!("{prefix}{{{{{name}}}}}{suffix}");
        let mut assembler = TemplateAssembler::new(template);
        assembler.set(name.as_str(), value.as_str());

        let output = assembler.assemble().unwrap();
        prop_assert_eq!(output, format!("{prefix}{value}{suffix}"));
    }

    /// PROPERTY: assembly either produces a token-free document or fails
    /// with a leak; a surviving token never ships silently.
    #[test]
    fn property_assembly_never_ships_a_leak(
        document in "(?s).{0,256}",
        value in token_free_value(),
    ) {
        let tokens = find_placeholders(&document);
        let mut assembler = TemplateAssembler::new(document.as_str());
        for token in &tokens {
            assembler.set(token.as_str(), value.as_str());
        }

        match assembler.assemble() {
            Ok(output) => {
                for token in &tokens {
                    let pattern = format!("{{{{{}}}}}", token);
                    prop_assert!(!output.contains(&pattern));
                }
            }
            Err(SimpackError::PlaceholderLeak { .. }) => {}
            Err(other) => return Err(TestCaseError::fail(format!(
                "unexpected error: {other}"
            ))),
        }
    }

    /// PROPERTY: replace_first leaves later occurrences untouched.
    #[test]
    fn property_replace_first_preserves_later_occurrences(
        name in token_name(),
        value in token_free_value(),
        occurrences in 2usize..5,
    ) {
        let pattern = format!("{{{{{}}}}}", name);
        let document = vec![pattern.clone(); occurrences].join(" ");

        let output = replace_first(&document, &name, &value);
        prop_assert_eq!(output.matches(&pattern).count(), occurrences - 1);
    }
}
