// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 服务器
//!
//! 服务器分为两个阶段：
//! - **注册阶段**：`HttpServer` 持有 `&mut Router`，通过 `get`/`post` 等方法注册路由。
//! - **服务阶段**：`HttpServer::into_dispatcher` 冻结路由森林并组装中间件链，
//!   得到可在多个连接任务之间共享的 `Dispatcher`。
//!
//! 每个 TCP 连接只处理一个请求，响应携带 `Connection: close`。

use std::{
    io,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use log::{debug, error, info, warn};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::TcpListener,
    sync::Notify,
};

use crate::{
    config::Config,
    context::Context,
    exception::{Exception, RouteError},
    handler::{chain, HandleFunc, Handler, Middleware},
    param::{HttpEncoding, HttpRequestMethod, CRLF, HEADER_END},
    request::{find_header_end, Request},
    response::Response,
    router::Router,
};

/// 构造服务器时应用的选项
pub type ServerOption = Box<dyn FnOnce(&mut HttpServer)>;

/// 追加中间件，按给出的顺序由外到内包裹处理函数
pub fn with_middlewares(middlewares: Vec<Middleware>) -> ServerOption {
    Box::new(move |server| server.middlewares.extend(middlewares))
}

pub fn with_config(config: Config) -> ServerOption {
    Box::new(move |server| server.config = config)
}

pub struct HttpServer {
    router: Router<Handler>,
    middlewares: Vec<Middleware>,
    config: Config,
}

impl Default for HttpServer {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl HttpServer {
    pub fn new(options: Vec<ServerOption>) -> Self {
        let mut server = Self {
            router: Router::new(),
            middlewares: Vec::new(),
            config: Config::default(),
        };
        for option in options {
            option(&mut server);
        }
        server
    }

    pub fn add_route(
        &mut self,
        method: HttpRequestMethod,
        path: &str,
        handler: Handler,
    ) -> Result<(), RouteError> {
        self.router.add_route(method.as_str(), path, handler)
    }

    pub fn get<F>(&mut self, path: &str, func: F) -> Result<(), RouteError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.add_route(HttpRequestMethod::Get, path, Handler::new(func))
    }

    pub fn head<F>(&mut self, path: &str, func: F) -> Result<(), RouteError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.add_route(HttpRequestMethod::Head, path, Handler::new(func))
    }

    pub fn post<F>(&mut self, path: &str, func: F) -> Result<(), RouteError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.add_route(HttpRequestMethod::Post, path, Handler::new(func))
    }

    pub fn put<F>(&mut self, path: &str, func: F) -> Result<(), RouteError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.add_route(HttpRequestMethod::Put, path, Handler::new(func))
    }

    pub fn delete<F>(&mut self, path: &str, func: F) -> Result<(), RouteError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.add_route(HttpRequestMethod::Delete, path, Handler::new(func))
    }

    pub fn patch<F>(&mut self, path: &str, func: F) -> Result<(), RouteError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.add_route(HttpRequestMethod::Patch, path, Handler::new(func))
    }

    pub fn options<F>(&mut self, path: &str, func: F) -> Result<(), RouteError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.add_route(HttpRequestMethod::Options, path, Handler::new(func))
    }

    pub fn router(&self) -> &Router<Handler> {
        &self.router
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 结束注册阶段。此后路由森林只读。
    pub fn into_dispatcher(self) -> Arc<Dispatcher> {
        let router = Arc::new(self.router);
        let endpoint: HandleFunc = {
            let router = Arc::clone(&router);
            Arc::new(move |ctx: &mut Context| serve(&router, ctx))
        };
        Arc::new(Dispatcher {
            root: chain(&self.middlewares, endpoint),
            router,
            config: self.config,
            active_connections: AtomicUsize::new(0),
        })
    }

    /// 绑定配置中的地址并持续服务，直到进程退出
    pub async fn start(self) -> io::Result<()> {
        let dispatcher = self.into_dispatcher();
        let listener = dispatcher.bind().await?;
        dispatcher.serve_listener(listener, Arc::new(Notify::new())).await;
        Ok(())
    }
}

/// 查找路由并调用处理函数。未命中或命中的节点没有处理函数时返回 404。
fn serve(router: &Router<Handler>, ctx: &mut Context) {
    let method = ctx.request().method().as_str();
    let Some(info) = router.find_route(method, ctx.request().path()) else {
        return not_found(ctx);
    };
    let Some(handler) = info.handler() else {
        return not_found(ctx);
    };
    let route = info.matched_route();
    ctx.set_route(route, info.into_path_params());
    handler.call(ctx);
}

fn not_found(ctx: &mut Context) {
    debug!("[ID{}]未找到路由：{} {}", ctx.id(), ctx.request().method(), ctx.request().path());
    ctx.resp_string(404, "Not Found");
}

/// 服务阶段的共享状态
pub struct Dispatcher {
    router: Arc<Router<Handler>>,
    root: HandleFunc,
    config: Config,
    active_connections: AtomicUsize,
}

impl Dispatcher {
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn router(&self) -> &Router<Handler> {
        &self.router
    }

    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::SeqCst)
    }

    /// 让请求依次经过中间件链与路由，并把上下文中的输出写成 `Response`
    pub fn handle(&self, request: Request, id: u128) -> Response {
        let accept_encoding = request.accept_encoding().to_vec();
        let is_head = request.method() == HttpRequestMethod::Head;
        let mut ctx = Context::new(request, id);
        (self.root)(&mut ctx);
        self.flush_resp(&ctx, &accept_encoding, is_head)
    }

    fn flush_resp(&self, ctx: &Context, accept_encoding: &[HttpEncoding], is_head: bool) -> Response {
        let mut response = Response::new();
        response
            .set_code(ctx.resp_status())
            .set_content(ctx.resp_content_type(), ctx.resp_data().clone());
        for (name, value) in ctx.resp_headers() {
            response.add_header(name, value);
        }
        if self.config.enable_compression() {
            response.encode(accept_encoding, ctx.id());
        }
        if is_head {
            response.head_only();
        }
        response
    }

    pub async fn bind(&self) -> io::Result<TcpListener> {
        let socket = self.config.socket_addr();
        match TcpListener::bind(socket).await {
            Ok(listener) => {
                info!("服务端将在{}上监听Socket连接", socket);
                Ok(listener)
            }
            Err(e) => {
                error!("无法绑定端口：{}，错误：{}", socket.port(), e);
                Err(e)
            }
        }
    }

    /// 接收连接并逐个派发到 tokio 任务，直到 `shutdown` 被通知
    pub async fn serve_listener(self: Arc<Self>, listener: TcpListener, shutdown: Arc<Notify>) {
        let mut id: u128 = 0;
        loop {
            let (mut stream, addr) = tokio::select! {
                _ = shutdown.notified() => {
                    info!("主循环接收到停机指令，正在退出...");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        error!("接受TCP连接失败：{}", e);
                        continue;
                    }
                },
            };
            debug!("[ID{}]TCP连接已建立：{}", id, addr);

            let dispatcher = Arc::clone(&self);
            tokio::spawn(async move {
                dispatcher.active_connections.fetch_add(1, Ordering::SeqCst);
                dispatcher.handle_connection(&mut stream, id).await;
                dispatcher.active_connections.fetch_sub(1, Ordering::SeqCst);
            });
            id += 1;
        }
    }

    /// 读取一个请求、生成响应并写回
    pub async fn handle_connection<S>(&self, stream: &mut S, id: u128)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let timeout = Duration::from_secs(self.config.read_timeout_secs());
        let buffer = read_request(stream, self.config.max_request_size(), timeout).await;
        let start_time = Instant::now();

        let response = match buffer {
            Ok(buffer) => match Request::try_from(&buffer, id) {
                Ok(request) => self.handle(request, id),
                Err(e) => {
                    warn!("[ID{}]解析HTTP请求失败：{}，返回400", id, e);
                    Response::response_400()
                }
            },
            Err(Exception::RequestTooLarge { limit }) => {
                warn!("[ID{}]请求超过{}字节，返回413", id, limit);
                Response::response_413()
            }
            Err(Exception::Timeout) => {
                warn!("[ID{}]读取请求超时，返回408", id);
                Response::from_status_code(408)
            }
            Err(e) => {
                debug!("[ID{}]连接未发送完整请求：{}", id, e);
                return;
            }
        };
        debug!(
            "[ID{}]HTTP响应构建完成，服务端用时{}ms。",
            id,
            start_time.elapsed().as_millis()
        );

        let response_bytes = response.as_bytes();
        if let Err(e) = stream.write_all(&response_bytes).await {
            error!("[ID{}]发送响应失败：{}", id, e);
            return;
        }
        if let Err(e) = stream.flush().await {
            debug!("[ID{}]刷新连接失败：{}", id, e);
        }
        if let Err(e) = stream.shutdown().await {
            debug!("[ID{}]关闭连接失败：{}", id, e);
        }
    }
}

/// 读取请求头与 `Content-Length` 指定长度的请求体。
///
/// 总字节数超过 `limit` 时返回 `RequestTooLarge`；对端在请求头结束前关闭连接时返回已读取的部分，
/// 交由解析器判定格式。
pub async fn read_request<S>(stream: &mut S, limit: usize, timeout: Duration) -> Result<Vec<u8>, Exception>
where
    S: AsyncRead + Unpin,
{
    let mut buffer = Vec::with_capacity(1024);
    let mut chunk = [0u8; 4096];
    loop {
        let n = match tokio::time::timeout(timeout, stream.read(&mut chunk)).await {
            Err(_) => return Err(Exception::Timeout),
            Ok(Err(e)) => return Err(Exception::Io(e.to_string())),
            Ok(Ok(n)) => n,
        };
        if n == 0 {
            if buffer.is_empty() {
                return Err(Exception::Io("连接在发送请求前关闭".to_string()));
            }
            return Ok(buffer);
        }
        buffer.extend_from_slice(&chunk[..n]);
        if buffer.len() > limit {
            return Err(Exception::RequestTooLarge { limit });
        }

        if let Some(pos) = find_header_end(&buffer) {
            let body_len = content_length(&buffer[..pos]).unwrap_or(0);
            let total = pos
                .checked_add(HEADER_END.len())
                .and_then(|n| n.checked_add(body_len))
                .filter(|total| *total <= limit)
                .ok_or(Exception::RequestTooLarge { limit })?;
            if buffer.len() >= total {
                return Ok(buffer);
            }
        }
    }
}

fn content_length(head: &[u8]) -> Option<usize> {
    String::from_utf8_lossy(head).split(CRLF).find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if name.trim().eq_ignore_ascii_case("content-length") {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}
