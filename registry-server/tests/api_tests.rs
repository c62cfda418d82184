mod common;

use common::{asset_data, document_data, spawn_test_server, state, ADMIN, BROKER, CONCIERGE, OTHER_BROKER};
use pretty_assertions::assert_eq;
use registry_storage::DocumentStore;
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};

struct Created {
    id: String,
    token: String,
    data: Value,
}

async fn create_asset(client: &Client, base: &str, data: Value) -> Created {
    let resp = client
        .post(format!("{base}/assets"))
        .bearer_auth(BROKER)
        .json(&json!({ "data": data }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();
    Created {
        id: body["data"]["id"].as_str().unwrap().to_string(),
        token: body["access"]["token"].as_str().unwrap().to_string(),
        data: body["data"].clone(),
    }
}

async fn patch_asset(client: &Client, base: &str, key: &str, id: &str, token: Option<&str>, data: Value) -> Response {
    let mut url = format!("{base}/assets/{id}");
    if let Some(token) = token {
        url.push_str(&format!("?acc_token={token}"));
    }
    client
        .patch(url)
        .bearer_auth(key)
        .json(&json!({ "data": data }))
        .send()
        .await
        .unwrap()
}

async fn error_of(resp: Response) -> (StatusCode, Value) {
    let status = resp.status();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], json!(status.as_u16()));
    (status, body["errors"].clone())
}

// ── Create / read ────────────────────────────────────────────────

#[tokio::test]
async fn create_assigns_server_fields() {
    let base = spawn_test_server(state()).await;
    let client = Client::new();
    let resp = client
        .post(format!("{base}/assets"))
        .basic_auth(BROKER, None::<&str>)
        .json(&json!({ "data": asset_data() }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let location = resp.headers()["location"].to_str().unwrap().to_string();
    let body: Value = resp.json().await.unwrap();
    let data = &body["data"];
    assert!(location.ends_with(data["id"].as_str().unwrap()));
    assert_eq!(data["status"], json!("draft"));
    assert_eq!(data["owner"], json!("broker"));
    assert_eq!(data["assetType"], json!("basic"));
    assert_eq!(data["value"]["currency"], json!("UAH"));
    assert!(data.get("owner_token").is_none());
    assert!(data.get("revisions").is_none());
    assert!(data.get("doc_type").is_none());
    assert_eq!(body["access"]["token"].as_str().unwrap().len(), 32);
}

#[tokio::test]
async fn create_requires_credentials() {
    let base = spawn_test_server(state()).await;
    let resp = Client::new()
        .post(format!("{base}/assets"))
        .json(&json!({ "data": asset_data() }))
        .send()
        .await
        .unwrap();
    let (status, errors) = error_of(resp).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        errors,
        json!([{"location": "url", "name": "permission", "description": "Forbidden"}])
    );
}

#[tokio::test]
async fn create_requires_a_creating_group() {
    let base = spawn_test_server(state()).await;
    let resp = Client::new()
        .post(format!("{base}/assets"))
        .bearer_auth(CONCIERGE)
        .json(&json!({ "data": asset_data() }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn create_reports_every_missing_field() {
    let base = spawn_test_server(state()).await;
    let resp = Client::new()
        .post(format!("{base}/assets"))
        .bearer_auth(BROKER)
        .json(&json!({ "data": {"classification": asset_data()["classification"]} }))
        .send()
        .await
        .unwrap();
    let (status, errors) = error_of(resp).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        errors,
        json!([
            {"location": "body", "name": "assetCustodian", "description": ["This field is required."]},
            {"location": "body", "name": "title", "description": ["This field is required."]}
        ])
    );
}

#[tokio::test]
async fn create_rejects_rogue_fields_and_bad_envelopes() {
    let base = spawn_test_server(state()).await;
    let client = Client::new();

    let mut data = asset_data();
    data["colour"] = json!("green");
    let resp = client
        .post(format!("{base}/assets"))
        .bearer_auth(BROKER)
        .json(&json!({ "data": data }))
        .send()
        .await
        .unwrap();
    let (status, errors) = error_of(resp).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(errors[0]["name"], json!("colour"));
    assert_eq!(errors[0]["description"], json!(["Rogue field"]));

    let resp = client
        .post(format!("{base}/assets"))
        .bearer_auth(BROKER)
        .json(&json!({ "title": "no envelope" }))
        .send()
        .await
        .unwrap();
    let (status, errors) = error_of(resp).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        errors,
        json!([{"location": "body", "name": "data", "description": "Data not available"}])
    );
}

#[tokio::test]
async fn read_and_unknown_ids() {
    let base = spawn_test_server(state()).await;
    let client = Client::new();
    let created = create_asset(&client, &base, asset_data()).await;

    let resp = client.get(format!("{base}/assets/{}", created.id)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"], created.data);

    let resp = client.get(format!("{base}/assets/{}", "0".repeat(32))).send().await.unwrap();
    let (status, errors) = error_of(resp).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        errors,
        json!([{"location": "url", "name": "asset_id", "description": "Not Found"}])
    );

    let resp = client.get(format!("{base}/lots")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mode_titles_are_marked() {
    let base = spawn_test_server(state()).await;
    let client = Client::new();
    let mut data = asset_data();
    data["mode"] = json!("test");
    let created = create_asset(&client, &base, data).await;
    assert_eq!(created.data["title"], json!("[ТЕСТУВАННЯ] Land plot"));
    assert_eq!(created.data["title_en"], json!("[TESTING] "));
}

// ── Patch and status gate ────────────────────────────────────────

#[tokio::test]
async fn owner_patches_with_token() {
    let base = spawn_test_server(state()).await;
    let client = Client::new();
    let created = create_asset(&client, &base, asset_data()).await;

    let resp = patch_asset(
        &client,
        &base,
        BROKER,
        &created.id,
        Some(&created.token),
        json!({"title": "Forest", "value": {"amount": 250}}),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["title"], json!("Forest"));
    assert_eq!(body["data"]["value"]["amount"], json!(250.0));
    assert_eq!(body["data"]["value"]["currency"], json!("UAH"));
    assert_eq!(body["data"]["owner"], json!("broker"));
    assert_ne!(body["data"]["dateModified"], created.data["dateModified"]);
}

#[tokio::test]
async fn patch_cannot_touch_server_fields() {
    let base = spawn_test_server(state()).await;
    let client = Client::new();
    let created = create_asset(&client, &base, asset_data()).await;

    let resp = patch_asset(
        &client,
        &base,
        BROKER,
        &created.id,
        Some(&created.token),
        json!({"owner": "someone-else", "title": "Forest"}),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["owner"], json!("broker"));
    assert_eq!(body["data"]["title"], json!("Forest"));
}

#[tokio::test]
async fn patch_without_owner_token_is_refused() {
    let base = spawn_test_server(state()).await;
    let client = Client::new();
    let created = create_asset(&client, &base, asset_data()).await;

    for (key, token) in [(BROKER, None), (BROKER, Some("wrong")), (OTHER_BROKER, Some(created.token.as_str()))] {
        let resp = patch_asset(&client, &base, key, &created.id, token, json!({"title": "x"})).await;
        let (status, errors) = error_of(resp).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(
            errors,
            json!([{
                "location": "body",
                "name": "data",
                "description": "Can't update asset in current (draft) status"
            }])
        );
    }
}

#[tokio::test]
async fn status_transitions_follow_roles() {
    let base = spawn_test_server(state()).await;
    let client = Client::new();
    let created = create_asset(&client, &base, asset_data()).await;
    let token = Some(created.token.as_str());

    // The owner may not skip straight to active.
    let resp = patch_asset(&client, &base, BROKER, &created.id, token, json!({"status": "active"})).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = patch_asset(&client, &base, BROKER, &created.id, token, json!({"status": "pending"})).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = patch_asset(&client, &base, CONCIERGE, &created.id, None, json!({"status": "active"})).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["status"], json!("active"));

    // Active assets are no longer editable by the owner.
    let resp = patch_asset(&client, &base, BROKER, &created.id, token, json!({"title": "x"})).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = patch_asset(&client, &base, ADMIN, &created.id, None, json!({"status": "complete"})).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = patch_asset(&client, &base, ADMIN, &created.id, None, json!({"title": "x"})).await;
    let (status, errors) = error_of(resp).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        errors[0]["description"],
        json!("Can't update asset in current (complete) status")
    );
}

#[tokio::test]
async fn patch_validation_errors_are_batched() {
    let base = spawn_test_server(state()).await;
    let client = Client::new();
    let created = create_asset(&client, &base, asset_data()).await;

    let resp = patch_asset(
        &client,
        &base,
        BROKER,
        &created.id,
        Some(&created.token),
        json!({"quantity": "many", "value": {"amount": "lots"}}),
    )
    .await;
    let (status, errors) = error_of(resp).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let names: Vec<_> = errors.as_array().unwrap().iter().map(|e| e["name"].clone()).collect();
    assert_eq!(names, vec![json!("quantity"), json!("value")]);
}

#[tokio::test]
async fn writes_append_reversible_revisions() {
    let state = state();
    let base = spawn_test_server(state.clone()).await;
    let client = Client::new();
    let created = create_asset(&client, &base, asset_data()).await;
    let resp = patch_asset(
        &client,
        &base,
        BROKER,
        &created.id,
        Some(&created.token),
        json!({"title": "Forest"}),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let stored = state.store.get(&created.id).unwrap().unwrap();
    assert!(stored.rev.starts_with("2-"));
    let revisions = stored.body["revisions"].as_array().unwrap();
    assert_eq!(revisions.len(), 2);
    assert_eq!(revisions[1]["author"], json!("broker"));
    assert_eq!(
        revisions[1]["changes"],
        json!([{"op": "replace", "path": "/title", "value": "Land plot"}])
    );
    assert!(revisions[1]["rev"].as_str().unwrap().starts_with("1-"));
}

#[tokio::test]
async fn empty_patch_changes_nothing() {
    let state = state();
    let base = spawn_test_server(state.clone()).await;
    let client = Client::new();
    let created = create_asset(&client, &base, asset_data()).await;
    let resp = patch_asset(&client, &base, BROKER, &created.id, Some(&created.token), json!({})).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let stored = state.store.get(&created.id).unwrap().unwrap();
    assert!(stored.rev.starts_with("1-"));
}

// ── Listings ─────────────────────────────────────────────────────

#[tokio::test]
async fn listing_pages_and_modes() {
    let base = spawn_test_server(state()).await;
    let client = Client::new();
    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(create_asset(&client, &base, asset_data()).await.id);
    }
    let mut test_data = asset_data();
    test_data["mode"] = json!("test");
    let test_id = create_asset(&client, &base, test_data).await.id;

    let body: Value = client
        .get(format!("{base}/assets?limit=2"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let page: Vec<_> = body["data"].as_array().unwrap().iter().map(|d| d["id"].clone()).collect();
    assert_eq!(page, vec![json!(ids[0]), json!(ids[1])]);
    assert!(body.get("prev_page").is_none());
    let next = body["next_page"]["uri"].as_str().unwrap().to_string();
    assert!(next.contains("limit=2"));

    let body: Value = client.get(next).send().await.unwrap().json().await.unwrap();
    let page: Vec<_> = body["data"].as_array().unwrap().iter().map(|d| d["id"].clone()).collect();
    assert_eq!(page, vec![json!(ids[2])]);
    assert!(body.get("prev_page").is_some());

    let body: Value = client
        .get(format!("{base}/assets?mode=test"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["id"], json!(test_id));
    assert!(body["next_page"]["path"].as_str().unwrap().contains("mode=test"));
}

#[tokio::test]
async fn listing_fields() {
    let base = spawn_test_server(state()).await;
    let client = Client::new();
    let created = create_asset(&client, &base, asset_data()).await;

    let body: Value = client
        .get(format!("{base}/assets?opt_fields=status,title"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        body["data"][0],
        json!({
            "id": created.id,
            "status": "draft",
            "title": "Land plot",
            "dateModified": created.data["dateModified"]
        })
    );

    let body: Value = client
        .get(format!("{base}/assets?opt_fields=owner"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        body["data"][0],
        json!({"id": created.id, "owner": "broker", "dateModified": created.data["dateModified"]})
    );
}

#[tokio::test]
async fn changes_feed_uses_sealed_offsets() {
    let base = spawn_test_server(state()).await;
    let client = Client::new();
    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(create_asset(&client, &base, asset_data()).await.id);
    }

    let body: Value = client
        .get(format!("{base}/assets?feed=changes&limit=2"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    let offset = body["next_page"]["offset"].as_str().unwrap().to_string();
    assert!(offset.len() > 2);
    assert!(offset.bytes().all(|b| b.is_ascii_hexdigit()));

    let body: Value = client
        .get(format!("{base}/assets?feed=changes&limit=2&offset={offset}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"][0]["id"], json!(ids[2]));
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let resp = client
        .get(format!("{base}/assets?feed=changes&offset=not-a-token"))
        .send()
        .await
        .unwrap();
    let (status, errors) = error_of(resp).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        errors,
        json!([{"location": "querystring", "name": "offset", "description": "Offset expired/invalid"}])
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_writes_and_reads_all_complete() {
    let base = spawn_test_server(state()).await;
    let client = Client::new();
    let mut tasks = tokio::task::JoinSet::new();
    for n in 0..16 {
        let client = client.clone();
        let base = base.clone();
        tasks.spawn(async move {
            let mut data = asset_data();
            data["title"] = json!(format!("Plot {n}"));
            create_asset(&client, &base, data).await.id
        });
    }
    let mut ids = Vec::new();
    while let Some(id) = tasks.join_next().await {
        ids.push(id.unwrap());
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 16);

    let page: Value = client
        .get(format!("{base}/assets?limit=100"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["data"].as_array().unwrap().len(), 16);
}

// ── Documents ────────────────────────────────────────────────────

#[tokio::test]
async fn document_versions() {
    let base = spawn_test_server(state()).await;
    let client = Client::new();
    let created = create_asset(&client, &base, asset_data()).await;
    let docs = format!("{base}/assets/{}/documents", created.id);

    let resp = client
        .post(format!("{docs}?acc_token={}", created.token))
        .bearer_auth(BROKER)
        .json(&json!({ "data": document_data("plan.pdf", "http://ds/plan-1") }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();
    let doc_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["author"], json!("asset_owner"));
    let published = body["data"]["datePublished"].clone();

    let resp = client
        .put(format!("{docs}/{doc_id}?acc_token={}", created.token))
        .bearer_auth(BROKER)
        .json(&json!({ "data": document_data("plan-v2.pdf", "http://ds/plan-2") }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["id"], json!(doc_id));
    assert_eq!(body["data"]["datePublished"], published);
    assert_eq!(body["data"]["documentType"], json!("notice"));

    let body: Value = client.get(format!("{docs}/{doc_id}")).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["data"]["title"], json!("plan-v2.pdf"));
    assert_eq!(body["data"]["previousVersions"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["previousVersions"][0]["url"], json!("http://ds/plan-1"));

    let body: Value = client.get(docs.clone()).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    let body: Value = client.get(format!("{docs}?all=1")).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let resp = client
        .patch(format!("{docs}/{doc_id}?acc_token={}", created.token))
        .bearer_auth(BROKER)
        .json(&json!({ "data": {"description": "Site plan"} }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["description"], json!("Site plan"));
    assert_eq!(body["data"]["title"], json!("plan-v2.pdf"));

    let resp = client.get(format!("{docs}/{}", "f".repeat(32))).send().await.unwrap();
    let (status, errors) = error_of(resp).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(errors[0]["name"], json!("document_id"));
}

#[tokio::test]
async fn documents_need_the_owner() {
    let base = spawn_test_server(state()).await;
    let client = Client::new();
    let created = create_asset(&client, &base, asset_data()).await;
    let resp = client
        .post(format!("{base}/assets/{}/documents", created.id))
        .bearer_auth(OTHER_BROKER)
        .json(&json!({ "data": document_data("plan.pdf", "http://ds/plan") }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
