mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use clinic_audit::db::Param;
use common::{ALL_COLUMNS, BASIC_COLUMNS, ScriptedDb, Step, row, schema};

async fn get(db: &ScriptedDb, uri: &str) -> (StatusCode, Value) {
    let app = clinic_audit::build_app(db.writer());
    let resp = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::String(
        String::from_utf8_lossy(&bytes).into_owned(),
    ));
    (status, body)
}

// ── Health ──────────────────────────────────────────────────────

#[tokio::test]
async fn health_returns_ok() {
    let db = ScriptedDb::default();

    let (status, body) = get(&db, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ok"));
    assert_eq!(db.opens(), 0);
}

// ── Audit history ───────────────────────────────────────────────

#[tokio::test]
async fn history_lists_entries_newest_first() {
    let mut columns = vec!["id"];
    columns.extend(ALL_COLUMNS);
    let db = ScriptedDb::new(vec![
        schema(&columns),
        Step::Rows(vec![
            row(json!({ "id": 2, "usuario_id": "u1", "accion": "logout" })),
            row(json!({ "id": 1, "usuario_id": "u1", "accion": "login" })),
        ]),
    ]);

    let (status, body) = get(&db, "/api/v1/audit").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entries"].as_array().unwrap().len(), 2);
    assert_eq!(body["entries"][0]["accion"], "logout");
    assert_eq!(body["page"], 1);
    assert_eq!(body["per_page"], 20);

    let list = &db.executed()[1];
    assert_eq!(
        list.sql,
        "SELECT * FROM `auditoria` ORDER BY `id` DESC LIMIT ? OFFSET ?"
    );
    assert_eq!(list.params, vec![Param::Int(20), Param::Int(0)]);
}

#[tokio::test]
async fn history_applies_filters_and_pagination() {
    let db = ScriptedDb::new(vec![schema(&BASIC_COLUMNS), Step::Rows(vec![])]);

    let (status, body) = get(
        &db,
        "/api/v1/audit?actor=u1&module=pacientes&action=update&page=3&per_page=500",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entries"], json!([]));
    assert_eq!(body["per_page"], 100);

    let list = &db.executed()[1];
    assert_eq!(
        list.sql,
        "SELECT * FROM `auditoria` WHERE `usuario_id` = ? AND `modulo` = ? AND `accion` = ? LIMIT ? OFFSET ?"
    );
    assert_eq!(
        list.params,
        vec![
            Param::Text("u1".to_string()),
            Param::Text("pacientes".to_string()),
            Param::Text("update".to_string()),
            Param::Int(100),
            Param::Int(200),
        ]
    );
}

#[tokio::test]
async fn history_saturates_offset_for_huge_page() {
    let db = ScriptedDb::new(vec![schema(&BASIC_COLUMNS), Step::Rows(vec![])]);

    let (status, body) = get(&db, "/api/v1/audit?page=9223372036854775807").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entries"], json!([]));

    let list = &db.executed()[1];
    assert_eq!(list.params, vec![Param::Int(20), Param::Int(i64::MAX)]);
}

#[tokio::test]
async fn history_rejects_unknown_action() {
    let db = ScriptedDb::default();

    let (status, body) = get(&db, "/api/v1/audit?action=approve").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("approve"));
    assert_eq!(db.opens(), 0);
}

#[tokio::test]
async fn history_hides_database_errors() {
    let db = ScriptedDb::new(vec![Step::Fatal]);

    let (status, body) = get(&db, "/api/v1/audit").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
    assert_eq!(db.opens(), db.closes());
}
