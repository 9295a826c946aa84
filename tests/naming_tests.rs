//! Naming helper tests

use catalogue_sync_sdk::naming::{MAX_SAFE_NAME_LEN, distinguishing_suffix, to_safe_name};

mod safe_name_tests {
    use super::*;

    #[test]
    fn test_collapses_runs_and_lowercases() {
        assert_eq!(to_safe_name("ABC def_123!!"), "abc-def-123");
        assert_eq!(to_safe_name("Roads // Highways"), "roads-highways");
    }

    #[test]
    fn test_strips_leading_and_trailing_separators() {
        assert_eq!(to_safe_name("--hello--"), "hello");
        assert_eq!(to_safe_name("__hello.world__"), "hello-world");
        assert_eq!(to_safe_name("...a..."), "a");
    }

    #[test]
    fn test_pathological_input_yields_empty() {
        assert_eq!(to_safe_name(""), "");
        assert_eq!(to_safe_name("!!! *** ///"), "");
    }

    #[test]
    fn test_truncates_to_limit() {
        let name = to_safe_name(&"ab ".repeat(60));
        assert!(name.len() <= MAX_SAFE_NAME_LEN);
        assert!(!name.ends_with('-'));
    }

    #[test]
    fn test_truncation_restrips_exposed_separator() {
        // Normalized form is 62 a's, a hyphen, then "bcd"; the cut at 63
        // lands right after the hyphen.
        let input = format!("{}-bcd", "a".repeat(62));
        assert_eq!(to_safe_name(&input), "a".repeat(62));
    }

    #[test]
    fn test_idempotent() {
        for input in [
            "ABC def_123!!",
            "  Forêt / Carte 2021  ",
            "--x--",
            "plain-name",
            "",
        ] {
            let once = to_safe_name(input);
            assert_eq!(to_safe_name(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_output_matches_identifier_grammar() {
        for input in ["Hello World!", "a_b.c-d", "123 GO", "ÜBER maps"] {
            let name = to_safe_name(input);
            assert!(
                name.is_empty()
                    || name
                        .chars()
                        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'),
                "bad chars in {name:?}"
            );
            assert!(!name.starts_with('-') && !name.ends_with('-'));
        }
    }
}

mod suffix_tests {
    use super::*;

    #[test]
    fn test_year_wins_over_everything() {
        assert_eq!(distinguishing_suffix("Roads Service 2023"), "2023");
        assert_eq!(distinguishing_suffix("v3 export 1998"), "1998");
    }

    #[test]
    fn test_year_requires_century_range() {
        // 2150 is not a recognized year, so the digits tier picks it up.
        assert_eq!(distinguishing_suffix("Roads 2150"), "2150");
    }

    #[test]
    fn test_version_tokens_normalize() {
        assert_eq!(distinguishing_suffix("Parcel Map v2"), "v2");
        assert_eq!(distinguishing_suffix("Parcel Map Version 10"), "v10");
        assert_eq!(distinguishing_suffix("parcel VERSION-7"), "v7");
        // A year glued to a v has no word boundary, so the version tier
        // claims it whole.
        assert_eq!(distinguishing_suffix("Inventory v2023"), "v2023");
    }

    #[test]
    fn test_standalone_digit_runs() {
        assert_eq!(distinguishing_suffix("Region 42 layer"), "42");
        // Single digits are not distinguishing enough for this tier and
        // fall through to the word tier.
        assert_eq!(distinguishing_suffix("Region 4 layer"), "4-layer");
    }

    #[test]
    fn test_word_fallback_drops_generic_words() {
        assert_eq!(
            distinguishing_suffix("Forest Road Tenure WMS getCapabilities service"),
            "road-tenure"
        );
        assert_eq!(distinguishing_suffix("ArcGIS rest service points"), "points");
    }

    #[test]
    fn test_all_generic_words_fall_back_to_tail() {
        // "wms-getcapabilities-service" has no surviving words; the last
        // ten characters of the normalized name are used.
        assert_eq!(
            distinguishing_suffix("WMS getCapabilities service"),
            "es-service"
        );
    }
}
