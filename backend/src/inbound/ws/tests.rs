//! End-to-end tests for the realtime socket.

use std::sync::Arc;
use std::time::Duration;

use actix_web::dev::{Server, ServerHandle};
use actix_web::http::StatusCode;
use actix_web::{App, HttpServer, test};
use awc::ws::{Codec, Frame, Message};
use awc::BoxedSocket;
use futures::{SinkExt, StreamExt};
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;

type Socket = actix_codec::Framed<BoxedSocket, Codec>;

fn state(heartbeat: Duration) -> WsState {
    WsState::new(
        Arc::new(ConnectionRegistry::new(Arc::new(DefaultClock))),
        heartbeat,
    )
}

fn start_server(state: WsState) -> (String, Server) {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .service(web::scope("/api/v1").service(ws_entry))
    })
    .listen(listener)
    .expect("listen")
    .disable_signals()
    .workers(1)
    .run();
    (format!("http://{addr}"), server)
}

async fn connect(url: &str, server: Server) -> (Socket, ServerHandle) {
    let handle = server.handle();
    actix_web::rt::spawn(server);
    let (_resp, socket) = awc::Client::default()
        .ws(format!("{url}/api/v1/realtime/ws/token-123"))
        .connect()
        .await
        .expect("websocket connect");
    (socket, handle)
}

async fn next_text(socket: &mut Socket) -> Value {
    loop {
        match socket.next().await.expect("frame").expect("valid frame") {
            Frame::Text(bytes) => return serde_json::from_slice(&bytes).expect("json frame"),
            Frame::Ping(_) | Frame::Pong(_) => continue,
            other => panic!("expected text frame, got {other:?}"),
        }
    }
}

#[fixture]
fn registry_state() -> WsState {
    state(Duration::from_secs(30))
}

#[rstest]
#[actix_rt::test]
async fn ping_frames_get_pong(registry_state: WsState) {
    let registry = Arc::clone(&registry_state.registry);
    let (url, server) = start_server(registry_state);
    let (mut socket, handle) = connect(&url, server).await;

    socket
        .send(Message::Text(r#"{"type":"ping"}"#.into()))
        .await
        .expect("send ping");
    assert_eq!(next_text(&mut socket).await, json!({"type": "pong"}));
    assert_eq!(registry.len(), 1);

    socket
        .send(Message::Text(r#"{"type":"broadcast"}"#.into()))
        .await
        .expect("send other");
    assert_eq!(
        next_text(&mut socket).await,
        json!({"type": "error", "message": "unsupported message"})
    );

    socket.send(Message::Close(None)).await.expect("close");
    drop(socket);
    for _ in 0..50 {
        if registry.is_empty() {
            break;
        }
        actix_rt::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(registry.is_empty(), "connection removed after close");
    handle.stop(true).await;
}

#[rstest]
#[actix_rt::test]
async fn idle_clients_are_closed() {
    let (url, server) = start_server(state(Duration::from_millis(20)));
    let (mut socket, handle) = connect(&url, server).await;

    let closed = loop {
        match socket.next().await {
            Some(Ok(Frame::Close(reason))) => break reason,
            Some(Ok(_)) => continue,
            other => panic!("expected close frame, got {other:?}"),
        }
    };
    assert_eq!(
        closed.and_then(|reason| reason.description).as_deref(),
        Some("heartbeat timeout")
    );
    handle.stop(true).await;
}

#[rstest]
#[actix_web::test]
async fn empty_token_is_unauthorised(registry_state: WsState) {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(registry_state))
            .service(web::scope("/api/v1").service(ws_entry)),
    )
    .await;
    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/realtime/ws/")
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}
