// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 示例服务
//!
//! 加载配置与日志，注册一组演示路由，并在后台运行管理控制台：
//! - `stop`：通知主循环退出
//! - `status`：查看活跃连接数
//! - `routes`：列出已注册的路由
//! - `help`：显示帮助

use std::{error::Error, path::Path, sync::Arc};

use log::{error, info, warn, LevelFilter};
use log4rs::{
    append::console::ConsoleAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
};
use serde_derive::{Deserialize, Serialize};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    runtime::Builder,
    sync::Notify,
};

use webrouter::{
    with_config, with_middlewares, AccessLogBuilder, Config, Context, Dispatcher, HttpServer,
    RouteError,
};

const LOG_CONFIG: &str = "config/log4rs.yaml";
const SERVER_CONFIG: &str = "config/development.toml";

#[derive(Debug, Serialize, Deserialize)]
struct EchoBody {
    message: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logging()?;

    let config = match Config::from_toml(SERVER_CONFIG) {
        Ok(config) => {
            info!("配置文件已载入");
            config
        }
        Err(e) => {
            warn!("{}，使用默认配置", e);
            Config::default()
        }
    };

    let runtime = Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .enable_all()
        .build()?;
    runtime.block_on(run(config))
}

/// 优先使用 YAML 日志配置，文件缺失时退回到控制台输出
fn init_logging() -> Result<(), Box<dyn Error>> {
    if Path::new(LOG_CONFIG).exists() {
        log4rs::init_file(LOG_CONFIG, Default::default())?;
        return Ok(());
    }
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{d(%Y-%m-%d %H:%M:%S)} {h({l})} - {m}{n}")))
        .build();
    let config = log4rs::Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info))?;
    log4rs::init_config(config)?;
    Ok(())
}

async fn run(config: Config) -> Result<(), Box<dyn Error>> {
    let mut middlewares = Vec::new();
    if config.access_log() {
        middlewares.push(AccessLogBuilder::new().build());
    }
    let mut server = HttpServer::new(vec![with_config(config), with_middlewares(middlewares)]);
    if let Err(e) = register_routes(&mut server) {
        error!("路由注册失败，服务无法启动：{}", e);
        return Err(e.into());
    }

    let dispatcher = server.into_dispatcher();
    let listener = dispatcher.bind().await?;
    let shutdown = Arc::new(Notify::new());
    tokio::spawn(admin_console(Arc::clone(&dispatcher), Arc::clone(&shutdown)));

    dispatcher.serve_listener(listener, shutdown).await;
    Ok(())
}

fn register_routes(server: &mut HttpServer) -> Result<(), RouteError> {
    server.get("/", |ctx| ctx.resp_string(200, "hello, world"))?;
    server.get("/user", |ctx| ctx.resp_string(200, "hello, user"))?;
    server.get("/user/home", |ctx| ctx.resp_string(200, "hello, user home"))?;
    server.get("/order/detail/:id", |ctx| {
        match ctx.path_value("id").as_str() {
            Ok(id) => {
                let body = format!("order detail {}", id);
                ctx.resp_string(200, body);
            }
            Err(e) => ctx.resp_string(400, e.to_string()),
        }
    })?;
    server.get("/reg/:id([0-9]+)", |ctx| match ctx.path_value("id").as_u64() {
        Ok(id) => ctx.resp_string(200, format!("reg {}", id)),
        Err(e) => ctx.resp_string(400, e.to_string()),
    })?;
    server.get("/static/*", |ctx| {
        let path = ctx.request().path().to_string();
        ctx.resp_string(200, format!("static {}", path));
    })?;
    server.post("/echo", echo)?;
    Ok(())
}

fn echo(ctx: &mut Context) {
    let result = ctx
        .bind_json::<EchoBody>()
        .and_then(|body| ctx.resp_json(200, &body));
    if let Err(e) = result {
        ctx.resp_string(400, e.to_string());
    }
}

async fn admin_console(dispatcher: Arc<Dispatcher>, shutdown: Arc<Notify>) {
    let mut reader = BufReader::new(tokio::io::stdin());
    let mut input = String::new();
    loop {
        input.clear();
        match reader.read_line(&mut input).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        match input.trim() {
            "stop" => {
                shutdown.notify_one();
                println!("停机指令已激活，服务器将停止接收新连接...");
                break;
            }
            "status" => {
                println!("== Webserver 状态 ===");
                println!("当前活跃连接数: {}", dispatcher.active_connections());
                println!("====================");
            }
            "routes" => {
                println!("== 已注册路由 ======");
                for (method, route) in dispatcher.router().routes() {
                    println!("{:<8}{}", method, route);
                }
                println!("====================");
            }
            "help" => {
                println!("== Webserver Help ==");
                println!("stop   - 发出停机信号");
                println!("status - 查看当前服务器运行状态");
                println!("routes - 列出已注册路由");
                println!("help   - 显示此帮助信息");
                println!("====================");
            }
            "" => {}
            cmd => println!("无效的命令：{}", cmd),
        }
    }
}
