//! Tests for commission error types.

use super::*;

#[test]
fn test_validation_error_message_names_field() {
    let error = CommissionError::validation("transfer.USD.SW", "missing required field");

    assert_eq!(
        error.to_string(),
        "Invalid commission data: transfer.USD.SW - missing required field"
    );
}

#[test]
fn test_persistence_error_message() {
    let error = CommissionError::persistence("commit_global_change", "disk full");

    match &error {
        CommissionError::Persistence { operation, reason } => {
            assert_eq!(operation, "commit_global_change");
            assert_eq!(reason, "disk full");
        }
        _ => panic!("Expected Persistence"),
    }
    assert!(error.to_string().contains("disk full"));
}

#[test]
fn test_not_found_classification() {
    assert!(CommissionError::UserNotFound {
        user_id: UserId::new(7)
    }
    .is_not_found());
    assert!(CommissionError::UserSettingsNotFound {
        user_id: UserId::new(7)
    }
    .is_not_found());
    assert!(!CommissionError::Cache {
        reason: "poisoned".to_string()
    }
    .is_not_found());
}

#[test]
fn test_user_not_found_message_contains_id() {
    let error = CommissionError::UserNotFound {
        user_id: UserId::new(42),
    };

    assert_eq!(error.to_string(), "User not found: 42");
}
