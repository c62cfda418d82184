//! Built-in business schemas.

use crate::catalog::{CatalogList, DEFAULT_CURRENCY, DEFAULT_ITEM_CLASSIFICATION};
use crate::field::{Choices, DefaultValue, FieldSpec};
use crate::roles::{FieldFilter, RoleVisibilityTable};
use crate::schema::{DocumentSchema, Rule};
use serde_json::json;

/// Pattern for MIME types such as `application/pdf`.
pub const DOCUMENT_FORMAT: &str = r"^[-\w]+/[-\.\w\+]+$";

/// Roles shared by every embedded type.
fn embedded_roles() -> RoleVisibilityTable {
    RoleVisibilityTable::new([
        ("default", FieldFilter::wholelist()),
        ("embedded", FieldFilter::wholelist()),
    ])
    .with_fallback()
}

fn translated(name: &str) -> [FieldSpec; 2] {
    [
        FieldSpec::string(&format!("{name}_en")),
        FieldSpec::string(&format!("{name}_ru")),
    ]
}

fn value() -> DocumentSchema {
    DocumentSchema::new(
        "Value",
        vec![
            FieldSpec::float("amount", Some(0.0)).required(),
            FieldSpec::sized("currency", Some(3), Some(3))
                .required()
                .with_default(DefaultValue::Value(json!(DEFAULT_CURRENCY))),
            FieldSpec::bool("valueAddedTaxIncluded")
                .required()
                .with_default(DefaultValue::Value(json!(true))),
        ],
        embedded_roles(),
    )
}

fn period() -> DocumentSchema {
    DocumentSchema::new(
        "Period",
        vec![FieldSpec::datetime("startDate"), FieldSpec::datetime("endDate")],
        embedded_roles(),
    )
    .with_rule(Rule::PeriodOrder {
        start: "startDate".into(),
        end: "endDate".into(),
    })
}

fn period_end_required() -> DocumentSchema {
    period()
        .renamed("PeriodEndRequired")
        .override_field(FieldSpec::datetime("endDate").required())
}

fn classification() -> DocumentSchema {
    let mut fields = vec![
        FieldSpec::string("scheme").required(),
        FieldSpec::string("id").required(),
        FieldSpec::string("description").required(),
    ];
    fields.extend(translated("description"));
    fields.push(FieldSpec::url("uri"));
    DocumentSchema::new("Classification", fields, embedded_roles())
}

fn item_classification() -> DocumentSchema {
    classification()
        .renamed("ItemClassification")
        .override_field(
            FieldSpec::choice("scheme", Choices::Catalog(CatalogList::ItemSchemes))
                .required()
                .with_default(DefaultValue::Value(json!(DEFAULT_ITEM_CLASSIFICATION))),
        )
        .with_rule(Rule::CatalogCode {
            scheme: "scheme".into(),
            code: "id".into(),
        })
}

fn unit() -> DocumentSchema {
    let mut fields = vec![FieldSpec::string("name")];
    fields.extend(translated("name"));
    fields.push(FieldSpec::model("value", "Value"));
    fields.push(FieldSpec::string("code").required());
    DocumentSchema::new("Unit", fields, embedded_roles())
}

fn address() -> DocumentSchema {
    let mut fields = vec![
        FieldSpec::string("streetAddress"),
        FieldSpec::string("locality"),
        FieldSpec::string("region"),
        FieldSpec::string("postalCode"),
        FieldSpec::string("countryName").required(),
    ];
    fields.extend(translated("countryName"));
    DocumentSchema::new("Address", fields, embedded_roles())
}

fn location() -> DocumentSchema {
    DocumentSchema::new(
        "Location",
        vec![
            FieldSpec::any("latitude").required(),
            FieldSpec::any("longitude").required(),
            FieldSpec::any("elevation"),
        ],
        embedded_roles(),
    )
}

/// Fields a client may not set on a document: the server assigns them.
const DOCUMENT_SERVER_FIELDS: &[&str] = &["id", "datePublished", "dateModified", "author"];

fn document() -> DocumentSchema {
    let mut fields = vec![
        FieldSpec::md5("id")
            .required()
            .with_default(DefaultValue::GeneratedId),
        FieldSpec::hash("hash"),
        FieldSpec::choice("documentType", Choices::Catalog(CatalogList::DocumentTypes)),
        FieldSpec::string("title").required(),
    ];
    fields.extend(translated("title"));
    fields.push(FieldSpec::string("description"));
    fields.extend(translated("description"));
    fields.extend([
        FieldSpec::pattern("format", DOCUMENT_FORMAT).required(),
        FieldSpec::string("url").required(),
        FieldSpec::datetime("datePublished").with_default(DefaultValue::Now),
        FieldSpec::datetime("dateModified").with_default(DefaultValue::Now),
        FieldSpec::string("language"),
        FieldSpec::md5("relatedItem"),
        FieldSpec::string("author"),
    ]);
    DocumentSchema::new(
        "Document",
        fields,
        RoleVisibilityTable::new([
            ("create", FieldFilter::blacklist(DOCUMENT_SERVER_FIELDS)),
            ("edit", FieldFilter::blacklist(DOCUMENT_SERVER_FIELDS)),
            ("Administrator", FieldFilter::blacklist(DOCUMENT_SERVER_FIELDS)),
            ("view", FieldFilter::wholelist()),
            ("default", FieldFilter::wholelist()),
            ("embedded", FieldFilter::wholelist()),
            ("revisions", FieldFilter::whitelist(&["url"])),
        ]),
    )
}

fn identifier() -> DocumentSchema {
    let mut fields = vec![
        FieldSpec::choice("scheme", Choices::Catalog(CatalogList::IdentifierSchemes)).required(),
        FieldSpec::any("id").required(),
        FieldSpec::string("legalName"),
    ];
    fields.extend(translated("legalName"));
    fields.push(FieldSpec::url("uri"));
    DocumentSchema::new("Identifier", fields, embedded_roles())
}

fn item() -> DocumentSchema {
    let mut fields = vec![
        FieldSpec::sized("id", Some(1), None)
            .required()
            .with_default(DefaultValue::GeneratedId),
        FieldSpec::string("description").required(),
    ];
    fields.extend(translated("description"));
    fields.extend([
        FieldSpec::model("classification", "ItemClassification"),
        FieldSpec::model_list("additionalClassifications", "Classification")
            .with_default(DefaultValue::EmptyList),
        FieldSpec::model("unit", "Unit"),
        FieldSpec::int("quantity"),
        FieldSpec::model("address", "Address"),
        FieldSpec::model("location", "Location"),
        FieldSpec::md5("relatedLot"),
    ]);
    DocumentSchema::new("Item", fields, embedded_roles())
}

fn contact_point() -> DocumentSchema {
    let mut fields = vec![FieldSpec::string("name").required()];
    fields.extend(translated("name"));
    fields.extend([
        FieldSpec::email("email"),
        FieldSpec::string("telephone"),
        FieldSpec::string("faxNumber"),
        FieldSpec::url("url"),
    ]);
    DocumentSchema::new("ContactPoint", fields, embedded_roles()).with_rule(Rule::AtLeastOne {
        target: "email".into(),
        others: vec!["telephone".into()],
        message: "telephone or email should be present".into(),
    })
}

fn organization() -> DocumentSchema {
    let mut fields = vec![FieldSpec::string("name").required()];
    fields.extend(translated("name"));
    fields.extend([
        FieldSpec::model("identifier", "Identifier").required(),
        FieldSpec::model_list("additionalIdentifiers", "Identifier"),
        FieldSpec::model("address", "Address").required(),
        FieldSpec::model("contactPoint", "ContactPoint").required(),
    ]);
    DocumentSchema::new(
        "Organization",
        fields,
        RoleVisibilityTable::new([
            ("embedded", FieldFilter::wholelist()),
            ("view", FieldFilter::wholelist()),
            ("default", FieldFilter::wholelist()),
        ]),
    )
}

fn revision() -> DocumentSchema {
    DocumentSchema::new(
        "Revision",
        vec![
            FieldSpec::string("author"),
            FieldSpec::datetime("date").with_default(DefaultValue::Now),
            FieldSpec::list("changes", crate::field::FieldKind::Dict)
                .with_default(DefaultValue::EmptyList),
            FieldSpec::string("rev"),
        ],
        embedded_roles(),
    )
}

fn asset() -> DocumentSchema {
    let mut fields = vec![
        FieldSpec::md5("id"),
        FieldSpec::string("title").required(),
    ];
    fields.extend(translated("title"));
    fields.push(FieldSpec::string("description"));
    fields.extend(translated("description"));
    fields.extend([
        FieldSpec::string("assetType").with_default(DefaultValue::Value(json!("basic"))),
        FieldSpec::string("status"),
        FieldSpec::choice("mode", Choices::Values(vec!["test".into()])),
        FieldSpec::string("owner"),
        FieldSpec::string("owner_token"),
        FieldSpec::datetime("date"),
        FieldSpec::datetime("dateModified"),
        FieldSpec::model("assetCustodian", "Organization").required(),
        FieldSpec::model("classification", "ItemClassification").required(),
        FieldSpec::model_list("additionalClassifications", "Classification")
            .with_default(DefaultValue::EmptyList),
        FieldSpec::model("unit", "Unit"),
        FieldSpec::int("quantity"),
        FieldSpec::model("address", "Address"),
        FieldSpec::model("location", "Location"),
        FieldSpec::model("value", "Value"),
        FieldSpec::model_list("items", "Item"),
        FieldSpec::model_list("documents", "Document"),
        FieldSpec::model_list("revisions", "Revision"),
        FieldSpec::string("doc_type"),
    ]);
    DocumentSchema::new(
        "Asset",
        fields,
        RoleVisibilityTable::new([
            (
                "create",
                FieldFilter::blacklist(&[
                    "id", "owner", "owner_token", "date", "dateModified", "status", "doc_type",
                    "revisions", "documents",
                ]),
            ),
            (
                "edit",
                FieldFilter::blacklist(&[
                    "id", "owner", "owner_token", "date", "dateModified", "doc_type", "revisions",
                    "documents", "mode",
                ]),
            ),
            (
                "Administrator",
                FieldFilter::blacklist(&[
                    "id", "owner_token", "date", "dateModified", "doc_type", "revisions",
                    "documents",
                ]),
            ),
            ("view", FieldFilter::blacklist(&["owner_token", "revisions", "doc_type"])),
            ("listing", FieldFilter::whitelist(&["id", "dateModified"])),
            ("plain", FieldFilter::blacklist(&["revisions", "dateModified"])),
            ("revisions", FieldFilter::whitelist(&["revisions"])),
            ("default", FieldFilter::blacklist(&["owner_token", "doc_type"])),
            ("embedded", FieldFilter::blacklist(&["owner_token", "revisions", "doc_type"])),
        ]),
    )
}

/// Every schema the registry ships with.
pub fn builtin_schemas() -> Vec<DocumentSchema> {
    vec![
        value(),
        period(),
        period_end_required(),
        classification(),
        item_classification(),
        unit(),
        address(),
        location(),
        document(),
        identifier(),
        item(),
        contact_point(),
        organization(),
        revision(),
        asset(),
    ]
}
