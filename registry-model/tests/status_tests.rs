use registry_model::status::{check_editing, check_terminated, check_transition};
use registry_model::{StatusError, StatusRule, StatusTransitionTable};
use serde_json::json;
use std::collections::BTreeSet;

fn table() -> StatusTransitionTable {
    StatusTransitionTable::new([
        ("draft", StatusRule::new(&["owner"]).allow("pending", &["owner"])),
        (
            "pending",
            StatusRule::new(&["owner", "Administrator"])
                .allow("active", &["concierge"])
                .allow("deleted", &["owner"]),
        ),
    ])
}

fn forbidden(status: &str) -> StatusError {
    StatusError::Forbidden(format!("Can't update asset in current ({status}) status"))
}

#[test]
fn permitted_transition_passes() {
    assert_eq!(check_transition("asset", "draft", Some("pending"), "owner", &table()), Ok(()));
}

#[test]
fn wrong_role_is_forbidden() {
    assert_eq!(
        check_transition("asset", "draft", Some("pending"), "other", &table()),
        Err(forbidden("draft"))
    );
}

#[test]
fn unlisted_target_is_forbidden() {
    assert_eq!(
        check_transition("asset", "draft", Some("active"), "owner", &table()),
        Err(forbidden("draft"))
    );
}

#[test]
fn unknown_current_status_is_forbidden() {
    assert_eq!(
        check_transition("asset", "archived", Some("draft"), "owner", &table()),
        Err(forbidden("archived"))
    );
}

#[test]
fn same_or_missing_status_is_a_noop() {
    for role in ["owner", "other", ""] {
        assert_eq!(check_transition("asset", "draft", Some("draft"), role, &table()), Ok(()));
        assert_eq!(check_transition("asset", "draft", None, role, &table()), Ok(()));
        assert_eq!(check_transition("asset", "draft", Some(""), role, &table()), Ok(()));
    }
}

#[test]
fn terminal_statuses_reject_everything() {
    let terminal: BTreeSet<String> = ["deleted".to_string(), "complete".to_string()].into();
    assert_eq!(check_terminated("asset", "deleted", &terminal), Err(forbidden("deleted")));
    assert_eq!(check_terminated("asset", "pending", &terminal), Ok(()));
}

#[test]
fn editing_roles_per_status() {
    let table = table();
    assert_eq!(check_editing("asset", "pending", "Administrator", &table), Ok(()));
    assert_eq!(check_editing("asset", "draft", "Administrator", &table), Err(forbidden("draft")));
    assert_eq!(check_editing("asset", "gone", "owner", &table), Err(forbidden("gone")));
}

#[test]
fn table_from_json() {
    let table: StatusTransitionTable = serde_json::from_value(json!({
        "draft": {"next_status": {"pending": ["owner"]}}
    }))
    .unwrap();
    assert!(table.permits("draft", "pending", "owner"));
    assert!(table.rule("draft").unwrap().editing_roles.is_empty());
    assert_eq!(table.statuses().collect::<Vec<_>>(), vec!["draft"]);
}

#[test]
fn error_message_is_the_display() {
    assert_eq!(
        forbidden("draft").to_string(),
        "Can't update asset in current (draft) status"
    );
}
