//! Property tests for error formatting.

use fakekit_errors::{ErrorCategory, FakeError};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_out_of_range_mentions_all_fields(
        method in "[a-z_]{1,24}",
        index in 0usize..10_000,
        count in 0usize..10_000,
    ) {
        let msg = FakeError::out_of_range(method.clone(), index, count).to_string();
        prop_assert!(msg.contains(&method));
        prop_assert!(msg.contains(&index.to_string()));
        prop_assert!(msg.contains(&count.to_string()));
    }

    #[test]
    fn prop_unknown_method_never_recoverable(method in "[a-zA-Z_]{1,32}") {
        let err = FakeError::unknown_method(method);
        prop_assert!(!err.is_recoverable());
        prop_assert_eq!(err.category(), ErrorCategory::Setup);
    }
}
