use anyhow::Result;
use httpmock::prelude::*;
use httpmock::Method::PATCH;
use licensy_admin::core::{AlertKind, StatusFilter, TokenStore, View};
use licensy_admin::{
    AdminApp, AdminError, ApiClient, AppSettings, FileTokenStore, GuardEvent, MemoryTokenStore,
};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc::{self, UnboundedReceiver};

fn license(id: i64, key: &str, is_active: bool) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "key": key,
        "user": 1,
        "is_active": is_active,
        "created_at": "2026-10-10T10:00:00Z",
        "updated_at": "2026-10-10T10:00:00Z"
    })
}

type App<T> = AdminApp<ApiClient, T>;

/// 以已保存的 token 啟動，模擬重新開啟管理介面
async fn started_app<T: TokenStore>(
    server: &MockServer,
    tokens: T,
) -> (App<T>, UnboundedReceiver<GuardEvent>) {
    let client = ApiClient::new(&server.url("/api"), "Token", Duration::from_secs(5)).unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    let mut app = AdminApp::new(client, tokens, AppSettings::default(), tx);
    let _ = app.startup().await;
    (app, rx)
}

#[tokio::test]
async fn test_listing_and_filtering() -> Result<()> {
    let server = MockServer::start();
    let list = server.mock(|when, then| {
        when.method(GET)
            .path("/api/licenses/")
            .header("Authorization", "Token saved");
        then.status(200).json_body(serde_json::json!([
            license(1, "PRO-AAAA", true),
            license(2, "pro-bbbb", false),
            license(3, "TRIAL-CCCC", true)
        ]));
    });

    let (mut app, _rx) = started_app(&server, MemoryTokenStore::with_token("saved")).await;
    list.assert();
    assert_eq!(app.view(), View::Authenticated);

    assert_eq!(app.filtered_licenses().len(), 3);

    app.set_query("PRO");
    assert_eq!(app.filtered_licenses().len(), 2);

    app.set_status_filter(StatusFilter::Active);
    let ids: Vec<i64> = app.filtered_licenses().iter().map(|l| l.id).collect();
    assert_eq!(ids, vec![1]);

    app.set_query("");
    app.set_status_filter(StatusFilter::Inactive);
    let ids: Vec<i64> = app.filtered_licenses().iter().map(|l| l.id).collect();
    assert_eq!(ids, vec![2]);

    app.set_query("enterprise");
    app.set_status_filter(StatusFilter::All);
    assert!(app.filtered_licenses().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_create_toggle_delete_refresh_the_list() -> Result<()> {
    let server = MockServer::start();
    let list = server.mock(|when, then| {
        when.method(GET).path("/api/licenses/");
        then.status(200)
            .json_body(serde_json::json!([license(1, "PRO-AAAA", true)]));
    });
    let create = server.mock(|when, then| {
        when.method(POST)
            .path("/api/licenses/")
            .header("Authorization", "Token saved")
            .json_body(serde_json::json!({"key": "NEW-KEY", "author": 1}));
        then.status(201).json_body(license(2, "NEW-KEY", true));
    });
    let toggle = server.mock(|when, then| {
        when.method(PATCH)
            .path("/api/licenses/1/")
            .json_body(serde_json::json!({"is_active": false}));
        then.status(200).json_body(license(1, "PRO-AAAA", false));
    });
    let delete = server.mock(|when, then| {
        when.method(DELETE).path("/api/licenses/2/");
        then.status(204);
    });

    let (mut app, _rx) = started_app(&server, MemoryTokenStore::with_token("saved")).await;

    let created = app.create_license("  NEW-KEY ").await?;
    assert_eq!(created.map(|l| l.id), Some(2));
    create.assert();

    let updated = app.toggle_license(1).await?;
    assert_eq!(updated.map(|l| l.is_active), Some(false));
    toggle.assert();

    app.delete_license(2).await?;
    delete.assert();

    // 啟動一次，之後每個成功動作各重新載入一次
    list.assert_hits(4);
    assert!(app.alert().is_none());

    Ok(())
}

/// 伺服器只回部分欄位 (沒有 is_active) 時，新增仍算成功並重新載入清單
#[tokio::test]
async fn test_create_with_partial_response_body_refreshes() -> Result<()> {
    let server = MockServer::start();
    let list = server.mock(|when, then| {
        when.method(GET).path("/api/licenses/");
        then.status(200)
            .json_body(serde_json::json!([license(1, "PRO-AAAA", true)]));
    });
    let created = server.mock(|when, then| {
        when.method(POST).path("/api/licenses/");
        then.status(201).json_body(serde_json::json!({
            "id": 7,
            "key": "NEW",
            "user": 1,
            "created_at": "2026-10-18T10:00:00Z",
            "updated_at": "2026-10-18T10:00:00Z"
        }));
    });
    let toggled = server.mock(|when, then| {
        when.method(PATCH).path("/api/licenses/1/");
        then.status(200).body("");
    });

    let (mut app, _rx) = started_app(&server, MemoryTokenStore::with_token("saved")).await;

    let license = app.create_license("NEW").await?;
    created.assert();
    assert_eq!(license.map(|l| l.id), Some(7));
    assert!(app.alert().is_none());

    assert_eq!(app.toggle_license(1).await?, None);
    toggled.assert();
    assert!(app.alert().is_none());

    list.assert_hits(3);
    Ok(())
}

/// 沒有時區的時間格式 (USE_TZ=False) 也要能顯示清單
#[tokio::test]
async fn test_naive_timestamps_still_list() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/licenses/");
        then.status(200).json_body(serde_json::json!([{
            "id": 1,
            "key": "PRO-AAAA",
            "is_active": true,
            "created_at": "2026-10-18T10:00:00.123456",
            "updated_at": "2026-10-18T10:00:00.123456"
        }]));
    });

    let (app, _rx) = started_app(&server, MemoryTokenStore::with_token("saved")).await;

    assert_eq!(app.licenses().len(), 1);
    assert!(app.alert().is_none());
    Ok(())
}

#[tokio::test]
async fn test_create_failure_shows_server_detail() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/licenses/");
        then.status(200).json_body(serde_json::json!([]));
    });
    server.mock(|when, then| {
        when.method(POST).path("/api/licenses/");
        then.status(400)
            .json_body(serde_json::json!({"detail": "license with this key already exists."}));
    });

    let (mut app, _rx) = started_app(&server, MemoryTokenStore::with_token("saved")).await;

    let err = app.create_license("DUP").await.unwrap_err();
    assert!(matches!(err, AdminError::ApiStatus { status: 400, .. }));

    let alert = app.take_alert().unwrap();
    assert_eq!(alert.kind, AlertKind::ActionFailure);
    assert_eq!(alert.message, "license with this key already exists.");
    assert!(app.is_authenticated());

    Ok(())
}

#[tokio::test]
async fn test_toggle_and_delete_failures_use_generic_messages() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/licenses/");
        then.status(200)
            .json_body(serde_json::json!([license(1, "PRO-AAAA", true)]));
    });
    server.mock(|when, then| {
        when.method(PATCH).path("/api/licenses/1/");
        then.status(500);
    });
    server.mock(|when, then| {
        when.method(DELETE).path("/api/licenses/1/");
        then.status(403)
            .json_body(serde_json::json!({"detail": "forbidden"}));
    });

    let (mut app, _rx) = started_app(&server, MemoryTokenStore::with_token("saved")).await;

    assert!(app.toggle_license(1).await.is_err());
    assert_eq!(
        app.take_alert().unwrap().message,
        "An error occurred while updating the license."
    );

    assert!(app.delete_license(1).await.is_err());
    assert_eq!(
        app.take_alert().unwrap().message,
        "An error occurred while deleting the license."
    );

    Ok(())
}

/// 任何帶 token 的呼叫收到 401：清掉 token、回到未登入、提示 session 過期
#[tokio::test]
async fn test_unauthorized_response_forces_logout() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/licenses/");
        then.status(200)
            .json_body(serde_json::json!([license(1, "PRO-AAAA", true)]));
    });
    server.mock(|when, then| {
        when.method(PATCH).path("/api/licenses/1/");
        then.status(401)
            .json_body(serde_json::json!({"detail": "Invalid token."}));
    });

    let temp_dir = TempDir::new()?;
    let token_path = temp_dir.path().join("token");
    std::fs::write(&token_path, "saved")?;

    let (mut app, _rx) = started_app(&server, FileTokenStore::new(&token_path)).await;
    assert!(app.is_authenticated());
    assert!(app.guard().is_session_active());

    let err = app.toggle_license(1).await.unwrap_err();
    assert!(err.is_unauthorized());

    assert_eq!(app.view(), View::Unauthenticated);
    assert!(!token_path.exists());
    assert!(app.licenses().is_empty());
    assert!(!app.guard().is_session_active());
    assert_eq!(app.take_alert().unwrap().kind, AlertKind::SessionExpired);

    Ok(())
}

#[tokio::test]
async fn test_data_fetch_failure_keeps_session() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/licenses/");
        then.status(500);
    });

    let (app, _rx) = started_app(&server, MemoryTokenStore::with_token("saved")).await;

    assert!(app.is_authenticated());
    assert_eq!(app.alert().unwrap().kind, AlertKind::DataFetchFailure);

    Ok(())
}
