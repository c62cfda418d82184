#![allow(dead_code)]

use chrono::FixedOffset;
use registry_model::{Catalogs, SchemaRegistry};
use serde_json::{json, Map, Value};

pub fn registry() -> SchemaRegistry {
    SchemaRegistry::builtin(Catalogs::builtin()).unwrap()
}

pub fn kyiv() -> FixedOffset {
    FixedOffset::east_opt(2 * 3600).unwrap()
}

pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

pub fn custodian() -> Value {
    json!({
        "name": "State Property Fund",
        "identifier": {"scheme": "UA-EDR", "id": "00037256", "uri": "http://www.spfu.gov.ua"},
        "address": {"countryName": "Україна", "locality": "Київ"},
        "contactPoint": {"name": "Desk", "telephone": "+380440000000"}
    })
}

/// A create request body for the `Asset` schema.
pub fn asset_data() -> Map<String, Value> {
    object(json!({
        "title": "Land plot",
        "assetCustodian": custodian(),
        "classification": {"scheme": "CAV", "id": "39513200-3", "description": "Cartons"},
        "value": {"amount": 100}
    }))
}

/// An asset as the server stores it after creation.
pub fn stored_asset() -> Map<String, Value> {
    let mut asset = object(json!({
        "id": "8f5b1e4c2d3a4b5c9e0f1a2b3c4d5e6f",
        "title": "Land plot",
        "assetType": "basic",
        "status": "draft",
        "owner": "broker",
        "owner_token": "c0ffee",
        "date": "2026-01-01T10:00:00.000000+02:00",
        "dateModified": "2026-01-01T10:00:00.000000+02:00",
        "classification": {"scheme": "CAV", "id": "39513200-3", "description": "Cartons"},
        "additionalClassifications": [],
        "value": {"amount": 100.0, "currency": "UAH", "valueAddedTaxIncluded": true},
        "doc_type": "Asset"
    }));
    asset.insert("assetCustodian".into(), custodian());
    asset
}
