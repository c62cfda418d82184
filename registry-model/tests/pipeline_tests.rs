mod common;

use common::{asset_data, kyiv, object, registry, stored_asset};
use pretty_assertions::assert_eq;
use registry_model::{
    validate_json_data, FieldErrors, PipelineError, RootContext, ValidationPipeline,
};
use serde_json::{json, Value};

// ── validate_json_data ───────────────────────────────────────────

#[test]
fn malformed_json_is_rejected() {
    assert!(matches!(
        validate_json_data(b"{not json"),
        Err(PipelineError::Malformed(_))
    ));
}

#[test]
fn missing_data_envelope_is_rejected() {
    let bodies: [&[u8]; 4] = [b"[]", b"{}", br#"{"data": []}"#, br#"{"data": "x"}"#];
    for body in bodies {
        assert_eq!(
            validate_json_data(body),
            Err(PipelineError::Malformed("Data not available".into()))
        );
    }
}

#[test]
fn data_envelope_is_unwrapped() {
    let data = validate_json_data(br#"{"data": {"title": "x"}}"#).unwrap();
    assert_eq!(Value::Object(data), json!({"title": "x"}));
}

// ── Create path ──────────────────────────────────────────────────

#[test]
fn create_applies_defaults_and_create_role() {
    let registry = registry();
    let pipeline = ValidationPipeline::new(&registry, kyiv());
    let mut data = asset_data();
    data.insert("status".into(), json!("active"));
    let out = pipeline
        .validate_data("Asset", &data, None, &RootContext::new("broker"))
        .unwrap();
    assert!(out.get("status").is_none(), "create role hides status");
    assert_eq!(out["value"]["currency"], json!("UAH"));
    assert_eq!(out["title"], json!("Land plot"));
}

#[test]
fn create_collects_all_errors() {
    let registry = registry();
    let pipeline = ValidationPipeline::new(&registry, kyiv());
    let data = object(json!({"description": "x"}));
    let Err(PipelineError::Validation(errors)) =
        pipeline.validate_data("Asset", &data, None, &RootContext::new("broker"))
    else {
        panic!("expected validation failure");
    };
    assert!(errors.contains("title"));
    assert!(errors.contains("classification"));
    assert!(errors.contains("assetCustodian"));
}

#[test]
fn create_without_create_role_is_forbidden() {
    let registry = registry();
    let pipeline = ValidationPipeline::new(&registry, kyiv());
    let data = object(common::custodian());
    assert_eq!(
        pipeline.validate_data("Organization", &data, None, &RootContext::new("broker")),
        Err(PipelineError::ForbiddenRole("create".into()))
    );
}

// ── Edit path ────────────────────────────────────────────────────

#[test]
fn edit_overlays_changes_under_edit_role() {
    let registry = registry();
    let pipeline = ValidationPipeline::new(&registry, kyiv());
    let existing = stored_asset();
    let data = object(json!({"title": "Forest", "status": "pending"}));
    let out = pipeline
        .validate_data("Asset", &data, Some(&existing), &RootContext::new("asset_owner"))
        .unwrap();
    assert_eq!(out["title"], json!("Forest"));
    assert_eq!(out["status"], json!("pending"));
    assert_eq!(out["value"]["amount"], json!(100.0));
    assert!(out.get("owner").is_none());
    assert!(out.get("owner_token").is_none());
}

#[test]
fn administrator_edits_under_own_role() {
    let registry = registry();
    let pipeline = ValidationPipeline::new(&registry, kyiv());
    let existing = stored_asset();
    let data = object(json!({"owner": "another-broker"}));
    let out = pipeline
        .validate_data("Asset", &data, Some(&existing), &RootContext::new("Administrator"))
        .unwrap();
    assert_eq!(out["owner"], json!("another-broker"));
}

#[test]
fn edit_without_changes_returns_existing_projection() {
    let registry = registry();
    let pipeline = ValidationPipeline::new(&registry, kyiv());
    let existing = stored_asset();
    let out = pipeline
        .validate_data("Asset", &serde_json::Map::new(), Some(&existing), &RootContext::new("broker"))
        .unwrap();
    assert_eq!(out["title"], json!("Land plot"));
}

#[test]
fn edit_validates_merged_document() {
    let registry = registry();
    let pipeline = ValidationPipeline::new(&registry, kyiv());
    let existing = stored_asset();
    let data = object(json!({"value": {"amount": -5}, "color": "red"}));
    let Err(PipelineError::Validation(errors)) =
        pipeline.validate_data("Asset", &data, Some(&existing), &RootContext::new("broker"))
    else {
        panic!("expected validation failure");
    };
    let mut expected = FieldErrors::single("color", "Rogue field");
    expected.insert(
        "value",
        serde_json::from_value(json!({"amount": ["Float value should be greater than 0."]})).unwrap(),
    );
    assert_eq!(errors, expected);
}

#[test]
fn edit_on_type_without_edit_role_is_forbidden() {
    let registry = registry();
    let pipeline = ValidationPipeline::new(&registry, kyiv());
    let existing = object(common::custodian());
    let data = object(json!({"name": "Renamed"}));
    assert_eq!(
        pipeline.validate_data("Organization", &data, Some(&existing), &RootContext::new("broker")),
        Err(PipelineError::ForbiddenRole("edit".into()))
    );
}

#[test]
fn unknown_schema_is_a_model_error() {
    let registry = registry();
    let pipeline = ValidationPipeline::new(&registry, kyiv());
    assert!(matches!(
        pipeline.validate_data("Lot", &asset_data(), None, &RootContext::new("broker")),
        Err(PipelineError::Model(_))
    ));
}

#[test]
fn edit_role_mapping() {
    assert_eq!(RootContext::new("Administrator").edit_role(), "Administrator");
    assert_eq!(RootContext::new("asset_owner").edit_role(), "edit");
    assert_eq!(RootContext::new("concierge").edit_role(), "edit");
}
