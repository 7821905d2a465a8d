#![allow(missing_docs)]

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use dungeoneer::catalog::{seed_demo, Catalog, OpenOptions};
use dungeoneer::server::{build_router, ServeOptions, ServerState, IDENTITY_HEADER};
use serde_json::Value;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

async fn spawn_server(read_only: bool) -> (SocketAddr, TempDir) {
    let dir = TempDir::new().expect("tempdir");
    let db_path = dir.path().join("catalog.db");
    {
        let mut catalog = Catalog::open(&db_path, &OpenOptions::default()).expect("open catalog");
        seed_demo(&mut catalog).expect("seed catalog");
    }

    let state = ServerState::new(ServeOptions {
        db_path,
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        assets_dir: None,
        read_only,
        allow_origins: Vec::new(),
    });
    let app = build_router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    (addr, dir)
}

async fn send_request(addr: SocketAddr, request: String) -> (u16, String, String) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    stream
        .write_all(request.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("status");
    (status, head.to_string(), body.to_string())
}

async fn get(addr: SocketAddr, path: &str) -> (u16, String, String) {
    let request = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    send_request(addr, request).await
}

async fn post(
    addr: SocketAddr,
    path: &str,
    identity: Option<&str>,
    body: &str,
) -> (u16, String, String) {
    let mut request = format!(
        "POST {path} HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n",
        body.len()
    );
    if let Some(user) = identity {
        request.push_str(&format!("{IDENTITY_HEADER}: {user}\r\n"));
    }
    request.push_str("Connection: close\r\n\r\n");
    request.push_str(body);
    send_request(addr, request).await
}

fn json(body: &str) -> Value {
    serde_json::from_str(body).expect("json body")
}

#[tokio::test]
async fn health_reports_the_service_mode() {
    let (addr, _dir) = spawn_server(false).await;
    let (status, _, body) = get(addr, "/health").await;
    assert_eq!(status, 200);
    let health = json(&body);
    assert_eq!(health["status"], "ok");
    assert_eq!(health["read_only"], false);
}

#[tokio::test]
async fn get_all_walks_a_catalog_page_by_page() {
    let (addr, _dir) = spawn_server(false).await;

    let (status, _, body) = get(addr, "/rpc/minions.getAll?limit=3").await;
    assert_eq!(status, 200);
    let page = json(&body);
    let items = page["items"].as_array().expect("items array");
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["id"], "baby-bun");
    assert_eq!(items[1]["id"], "wind-up-tonberry");
    assert_eq!(items[2]["id"], "paissa-brat");
    let cursor = page["nextCursor"].as_str().expect("next cursor").to_string();
    assert!(cursor.starts_with("v1."));

    let (status, _, body) =
        get(addr, &format!("/rpc/minions.getAll?cursor={cursor}&limit=3")).await;
    assert_eq!(status, 200);
    let page = json(&body);
    let items = page["items"].as_array().expect("items array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], "wind-up-silkie");
    assert!(page.get("nextCursor").is_none(), "last page carries no cursor");
}

#[tokio::test]
async fn instance_catalogs_embed_their_rewards() {
    let (addr, _dir) = spawn_server(false).await;
    let (status, _, body) = get(addr, "/rpc/variants.getAll").await;
    assert_eq!(status, 200);
    let page = json(&body);
    let items = page["items"].as_array().expect("items array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], "the-sildihn-subterrane");
    assert_eq!(items[0]["minions"][0]["id"], "wind-up-silkie");
    assert_eq!(items[0]["orchestrions"][0]["id"], "sands-of-amber");
    assert!(items[0]["mounts"].as_array().expect("mounts").is_empty());
}

#[tokio::test]
async fn mutations_require_an_identity() {
    let (addr, _dir) = spawn_server(false).await;
    let (status, _, body) = post(
        addr,
        "/rpc/minions.addToUser",
        None,
        r#"{"itemId":"baby-bun"}"#,
    )
    .await;
    assert_eq!(status, 401);
    assert_eq!(json(&body)["message"], "log in to modify your collection");
}

#[tokio::test]
async fn add_then_remove_round_trips_through_the_api() {
    let (addr, _dir) = spawn_server(false).await;

    let (status, _, body) = post(
        addr,
        "/rpc/minions.addToUser",
        Some("u1"),
        r#"{"itemId":"baby-bun"}"#,
    )
    .await;
    assert_eq!(status, 200);
    let summary = json(&body);
    assert_eq!(summary["id"], "baby-bun");
    assert_eq!(summary["name"], "Baby Bun");
    assert_eq!(summary["kind"], "minion");

    let (_, _, body) = get(addr, "/rpc/minions.getAll").await;
    let page = json(&body);
    assert_eq!(page["items"][0]["owners"], serde_json::json!(["u1"]));

    let (status, _, _) = post(
        addr,
        "/rpc/minions.removeFromUser",
        Some("u1"),
        r#"{"itemId":"baby-bun"}"#,
    )
    .await;
    assert_eq!(status, 200);

    let (_, _, body) = get(addr, "/rpc/minions.getAll").await;
    let page = json(&body);
    assert!(page["items"][0]["owners"]
        .as_array()
        .expect("owners")
        .is_empty());
}

#[tokio::test]
async fn unknown_names_are_not_found() {
    let (addr, _dir) = spawn_server(false).await;

    let (status, _, _) = get(addr, "/rpc/moogles.getAll").await;
    assert_eq!(status, 404);

    let (status, _, _) = get(addr, "/rpc/minions.dropAll").await;
    assert_eq!(status, 404);

    let (status, _, body) = post(
        addr,
        "/rpc/minions.addToUser",
        Some("u1"),
        r#"{"itemId":"phantom"}"#,
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(json(&body)["message"], "minion not found");
}

#[tokio::test]
async fn malformed_cursors_are_client_errors() {
    let (addr, _dir) = spawn_server(false).await;
    for cursor in ["garbage", "v2.MTA", "v1.!!!"] {
        let (status, _, _) = get(addr, &format!("/rpc/minions.getAll?cursor={cursor}")).await;
        assert_eq!(status, 400, "cursor {cursor:?} should be rejected");
    }
}

#[tokio::test]
async fn read_only_mode_forbids_mutations() {
    let (addr, _dir) = spawn_server(true).await;

    let (_, _, body) = get(addr, "/health").await;
    assert_eq!(json(&body)["read_only"], true);

    let (status, _, body) = post(
        addr,
        "/rpc/minions.addToUser",
        Some("u1"),
        r#"{"itemId":"baby-bun"}"#,
    )
    .await;
    assert_eq!(status, 403);
    assert_eq!(
        json(&body)["message"],
        "mutating endpoint is disabled in read-only mode"
    );

    let (status, _, _) = get(addr, "/rpc/minions.getAll").await;
    assert_eq!(status, 200, "queries stay open in read-only mode");
}

#[tokio::test]
async fn method_mismatch_is_rejected_with_405() {
    let (addr, _dir) = spawn_server(false).await;

    let (status, _, _) = get(addr, "/rpc/minions.addToUser").await;
    assert_eq!(status, 405);

    let (status, _, _) = post(
        addr,
        "/rpc/minions.getAll",
        None,
        r#"{"itemId":"baby-bun"}"#,
    )
    .await;
    assert_eq!(status, 405);
}

#[tokio::test]
async fn browse_pages_render_html() {
    let (addr, _dir) = spawn_server(false).await;

    let (status, head, body) = get(addr, "/").await;
    assert_eq!(status, 200);
    assert!(head.contains("text/html"));
    assert!(body.contains("<h2>Catalogs</h2>"));

    let (status, _, body) = get(addr, "/browse/minions").await;
    assert_eq!(status, 200);
    assert!(body.contains("<ul class=\"cards\">"));
    assert!(body.contains("Baby Bun"));

    let (status, _, _) = get(addr, "/browse/moogles").await;
    assert_eq!(status, 404);
}
