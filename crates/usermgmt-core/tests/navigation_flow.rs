use mockito::{Matcher, Server};
use serde_json::json;

use usermgmt_core::auth::{MemoryStore, TOKEN_KEY, USER_KEY};
use usermgmt_core::config::{Config, StorageBackend};
use usermgmt_core::models::LoginRequest;
use usermgmt_core::router::{Redirect, View};
use usermgmt_core::{AppContext, SharedStore};

fn config_for(server: &Server) -> Config {
    Config {
        server_url: Some(server.url()),
        request_timeout_secs: Some(5),
        storage: StorageBackend::Memory,
        last_username: None,
    }
}

#[tokio::test]
async fn admin_login_then_server_rejects_token() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/auth/login")
        .match_body(Matcher::Json(json!({"username": "root", "password": "pw"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"accessToken":"T1","tokenType":"Bearer","expiresIn":3600000,"user":{"id":1,"username":"root","role":"ADMIN"}}"#)
        .create_async()
        .await;
    let list = server
        .mock("GET", "/api/users")
        .match_header("authorization", "Bearer T1")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message":"Token expired"}"#)
        .create_async()
        .await;

    let store: SharedStore = MemoryStore::shared();
    let mut ctx = AppContext::init(&config_for(&server), store.clone()).unwrap();

    // Logged out: the admin page bounces to login
    assert_eq!(ctx.open("/admin/users").redirected, Some(Redirect::Login));

    ctx.session_mut().login(&LoginRequest::new("root", "pw")).await.unwrap();
    assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("T1"));

    let nav = ctx.open("/admin/users");
    assert_eq!(nav.view(), View::UserManagement);
    assert!(!nav.is_redirect());

    // The server now rejects the token
    assert!(ctx.api().list_users().await.is_err());
    list.assert_async().await;
    assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
    assert_eq!(store.get(USER_KEY).unwrap(), None);

    // Memory still holds the stale session until events are pumped
    assert!(ctx.session().is_logged_in());
    assert!(ctx.pump_events());
    assert!(!ctx.session().is_logged_in());
    assert_eq!(ctx.navigator().current().route.view, View::Login);

    assert_eq!(ctx.open("/users").redirected, Some(Redirect::Login));
    ctx.shutdown();
}

#[tokio::test]
async fn regular_user_is_kept_out_of_admin_pages() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/auth/login")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"accessToken":"U1","user":{"id":2,"username":"bob","role":"USER"}}"#)
        .create_async()
        .await;

    let mut ctx = AppContext::init(&config_for(&server), MemoryStore::shared()).unwrap();
    ctx.session_mut().login(&LoginRequest::new("bob", "pw")).await.unwrap();

    assert_eq!(ctx.open("/users/2").view(), View::UserDetail);
    assert_eq!(ctx.open("/admin/users").redirected, Some(Redirect::Home));
    assert_eq!(ctx.navigator().current().route.view, View::Home);
}

#[tokio::test]
async fn session_survives_restart_through_shared_store() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/auth/login")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"accessToken":"T2","user":{"id":3,"role":"ADMIN"}}"#)
        .create_async()
        .await;

    let store: SharedStore = MemoryStore::shared();
    let config = config_for(&server);

    let mut first = AppContext::init(&config, store.clone()).unwrap();
    first.session_mut().login(&LoginRequest::new("x", "y")).await.unwrap();
    first.shutdown();

    let mut second = AppContext::init(&config, store.clone()).unwrap();
    assert_eq!(second.session().token(), Some("T2"));
    assert!(second.session().is_admin());
    assert_eq!(second.open("/admin/users").view(), View::UserManagement);

    second.session_mut().logout();
    second.shutdown();

    let third = AppContext::init(&config, store).unwrap();
    assert!(!third.session().is_logged_in());
}
