//! Property tests for request validation and pagination math.

use bugvault_api::types::{Paginated, ReportRequest};
use bugvault_api::validation::{validate_page, validate_report, MAX_PAGE_LIMIT, MIN_PAGE_LIMIT};
use proptest::prelude::*;

fn report(error_code: String, severity: String) -> ReportRequest {
    ReportRequest {
        error_code,
        title: "a title".to_string(),
        message: "a message".to_string(),
        severity,
        stack_trace: None,
        context: None,
    }
}

proptest! {
    #[test]
    fn well_formed_error_codes_validate(code in "[A-Z0-9_]{1,100}") {
        prop_assert!(validate_report(&report(code, "low".to_string())).is_ok());
    }

    #[test]
    fn error_codes_with_other_characters_fail(
        code in "[A-Z0-9_]{0,10}[a-z !@#.-][A-Z0-9_]{0,10}",
    ) {
        prop_assert!(validate_report(&report(code, "low".to_string())).is_err());
    }

    #[test]
    fn unknown_severities_fail(severity in "[a-z]{1,12}") {
        let req = report("E_CODE".to_string(), severity.clone());
        let expected = matches!(severity.as_str(), "critical" | "high" | "medium" | "low");
        prop_assert_eq!(validate_report(&req).is_ok(), expected);
    }

    #[test]
    fn page_validation_accepts_exactly_the_legal_range(
        limit in -50i64..200,
        offset in -50i64..1000,
    ) {
        let legal = (MIN_PAGE_LIMIT..=MAX_PAGE_LIMIT).contains(&limit) && offset >= 0;
        prop_assert_eq!(validate_page(Some(limit), Some(offset)).is_ok(), legal);
    }

    #[test]
    fn pagination_metadata_is_consistent(
        total in 0u64..10_000,
        limit in 1i64..=100,
        offset in 0i64..10_000,
    ) {
        let page: Paginated<u64> = Paginated::new(Vec::new(), total, limit, offset);
        let p = &page.pagination;

        prop_assert!(p.current_page >= 1);
        prop_assert_eq!(p.total_pages, total.div_ceil(limit as u64));
        // Pages cover exactly the item count.
        prop_assert!(p.total_pages * (limit as u64) >= total);
        prop_assert_eq!(p.has_prev_page, offset > 0);
        prop_assert_eq!(p.has_next_page, (offset as u64) + (limit as u64) < total);
        // No next page ever points past the data.
        if p.has_next_page {
            prop_assert!((offset as u64) < total);
        }
    }
}
