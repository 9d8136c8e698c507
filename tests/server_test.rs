// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use serde_derive::{Deserialize, Serialize};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::Notify,
    task::JoinHandle,
};
use webrouter::{with_config, with_middlewares, AccessLogBuilder, Config, HttpServer};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Order {
    id: u64,
    name: String,
}

struct TestServer {
    addr: SocketAddr,
    shutdown: Arc<Notify>,
    task: JoinHandle<()>,
    access_lines: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    async fn start() -> Self {
        let access_lines = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let lines = Arc::clone(&access_lines);
            move |line: &str| lines.lock().unwrap().push(line.to_string())
        };
        let config = Config::default().with_max_request_size(2048);
        let mut server = HttpServer::new(vec![
            with_config(config),
            with_middlewares(vec![AccessLogBuilder::new().with_sink(sink).build()]),
        ]);

        server.get("/", |ctx| ctx.resp_string(200, "hello, world")).unwrap();
        server
            .get("/order/detail/:id", |ctx| match ctx.path_value("id").as_u64() {
                Ok(id) => {
                    let order = Order {
                        id,
                        name: "book".to_string(),
                    };
                    ctx.resp_json(200, &order).unwrap();
                }
                Err(e) => ctx.resp_string(400, e.to_string()),
            })
            .unwrap();
        server
            .get("/search", |ctx| {
                let q = ctx.query_value("q").into_string().unwrap_or_default();
                ctx.resp_string(200, q);
            })
            .unwrap();
        server
            .post("/order", |ctx| match ctx.bind_json::<Order>() {
                Ok(order) => ctx.resp_json(201, &order).unwrap(),
                Err(e) => ctx.resp_string(400, e.to_string()),
            })
            .unwrap();
        server
            .get("/big", |ctx| ctx.resp_string(200, "webrouter ".repeat(500)))
            .unwrap();

        let dispatcher = server.into_dispatcher();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let task = tokio::spawn(dispatcher.serve_listener(listener, Arc::clone(&shutdown)));

        Self {
            addr,
            shutdown,
            task,
            access_lines,
        }
    }

    async fn send(&self, raw: &[u8]) -> String {
        let mut stream = TcpStream::connect(self.addr).await.unwrap();
        stream.write_all(raw).await.unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        String::from_utf8_lossy(&response).to_string()
    }

    async fn stop(self) {
        self.shutdown.notify_one();
        tokio::time::timeout(Duration::from_secs(2), self.task)
            .await
            .unwrap()
            .unwrap();
    }
}

fn status_code(response: &str) -> u16 {
    response
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap_or(0)
}

fn body(response: &str) -> &str {
    response.split_once("\r\n\r\n").map(|(_, body)| body).unwrap_or_default()
}

fn header<'a>(response: &'a str, name: &str) -> Option<&'a str> {
    let (head, _) = response.split_once("\r\n\r\n")?;
    head.split("\r\n").find_map(|line| {
        let (key, value) = line.split_once(": ")?;
        key.eq_ignore_ascii_case(name).then_some(value)
    })
}

#[tokio::test]
async fn test_get_root() {
    let server = TestServer::start().await;
    let response = server.send(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n").await;

    assert_eq!(status_code(&response), 200);
    assert_eq!(body(&response), "hello, world");
    assert_eq!(header(&response, "Server"), Some("webrouter"));
    assert_eq!(header(&response, "Connection"), Some("close"));
    server.stop().await;
}

#[tokio::test]
async fn test_path_param_json() {
    let server = TestServer::start().await;
    let response = server
        .send(b"GET /order/detail/12 HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await;

    assert_eq!(status_code(&response), 200);
    assert_eq!(header(&response, "Content-Type"), Some("application/json"));
    let order: Order = serde_json::from_str(body(&response)).unwrap();
    assert_eq!(order, Order { id: 12, name: "book".to_string() });

    let response = server
        .send(b"GET /order/detail/abc HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await;
    assert_eq!(status_code(&response), 400);
    server.stop().await;
}

#[tokio::test]
async fn test_query_value() {
    let server = TestServer::start().await;
    let response = server
        .send(b"GET /search?q=trie+router HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await;
    assert_eq!(body(&response), "trie router");
    server.stop().await;
}

#[tokio::test]
async fn test_post_json_body() {
    let server = TestServer::start().await;
    let payload = r#"{"id":3,"name":"pen"}"#;
    let raw = format!(
        "POST /order HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        payload.len(),
        payload
    );
    let response = server.send(raw.as_bytes()).await;

    assert_eq!(status_code(&response), 201);
    assert_eq!(body(&response), payload);
    server.stop().await;
}

#[tokio::test]
async fn test_not_found() {
    let server = TestServer::start().await;
    let response = server.send(b"GET /missing HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
    assert_eq!(status_code(&response), 404);
    assert_eq!(body(&response), "Not Found");

    let response = server.send(b"DELETE / HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
    assert_eq!(status_code(&response), 404);
    server.stop().await;
}

#[tokio::test]
async fn test_bad_request() {
    let server = TestServer::start().await;
    let response = server.send(b"BREW / HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
    assert_eq!(status_code(&response), 400);

    let response = server.send(b"GET / HTTP/9.9\r\nHost: localhost\r\n\r\n").await;
    assert_eq!(status_code(&response), 400);
    server.stop().await;
}

#[tokio::test]
async fn test_request_too_large() {
    let server = TestServer::start().await;
    // 只发送请求头，服务端根据 Content-Length 即可拒绝
    let response = server
        .send(b"POST /order HTTP/1.1\r\nHost: localhost\r\nContent-Length: 4096\r\n\r\n")
        .await;
    assert_eq!(status_code(&response), 413);
    server.stop().await;
}

#[tokio::test]
async fn test_gzip_negotiation() {
    let server = TestServer::start().await;
    let response = server
        .send(b"GET /big HTTP/1.1\r\nHost: localhost\r\nAccept-Encoding: gzip\r\n\r\n")
        .await;
    assert_eq!(status_code(&response), 200);
    assert_eq!(header(&response, "Content-Encoding"), Some("gzip"));

    let response = server.send(b"GET /big HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
    assert_eq!(header(&response, "Content-Encoding"), None);
    assert_eq!(body(&response).len(), 5000);
    server.stop().await;
}

#[tokio::test]
async fn test_access_log_lines() {
    let server = TestServer::start().await;
    server
        .send(b"GET /order/detail/5 HTTP/1.1\r\nHost: example.com\r\n\r\n")
        .await;

    let lines = server.access_lines.lock().unwrap().clone();
    assert_eq!(lines.len(), 1);
    let log: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(log["host"], "example.com");
    assert_eq!(log["route"], "/order/detail/:id");
    assert_eq!(log["http_method"], "GET");
    assert_eq!(log["path"], "/order/detail/5");
    assert_eq!(log["status"], 200);
    server.stop().await;
}

#[tokio::test]
async fn test_concurrent_requests() {
    let server = Arc::new(TestServer::start().await);
    let mut tasks = Vec::new();
    for i in 0..20u64 {
        let server = Arc::clone(&server);
        tasks.push(tokio::spawn(async move {
            let raw = format!("GET /order/detail/{} HTTP/1.1\r\nHost: localhost\r\n\r\n", i);
            let response = server.send(raw.as_bytes()).await;
            let order: Order = serde_json::from_str(body(&response)).unwrap();
            assert_eq!(order.id, i);
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
    if let Ok(server) = Arc::try_unwrap(server) {
        server.stop().await;
    }
}
