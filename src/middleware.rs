// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 访问日志中间件
//!
//! 在处理函数返回后输出一行 JSON 访问日志，字段包括 host、命中的路由模板、
//! HTTP 方法、请求路径与响应状态码。日志默认写入 `access` 目标，
//! 可通过 `AccessLogBuilder::with_sink` 替换输出位置。

use std::sync::Arc;

use log::{error, info};
use serde_derive::Serialize;

use crate::{
    context::Context,
    handler::{HandleFunc, Middleware},
};

#[derive(Debug, Serialize)]
struct AccessLog<'a> {
    host: &'a str,
    route: &'a str,
    http_method: &'a str,
    path: &'a str,
    status: u16,
}

/// 访问日志的输出位置
#[cfg_attr(test, mockall::automock)]
pub trait AccessLogSink: Send + Sync {
    fn write(&self, line: &str);
}

impl<F> AccessLogSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn write(&self, line: &str) {
        self(line)
    }
}

/// 写入 log4rs 的 `access` 目标
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl AccessLogSink for LogSink {
    fn write(&self, line: &str) {
        info!(target: "access", "{}", line);
    }
}

pub struct AccessLogBuilder {
    sink: Arc<dyn AccessLogSink>,
}

impl Default for AccessLogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessLogBuilder {
    pub fn new() -> Self {
        Self {
            sink: Arc::new(LogSink),
        }
    }

    pub fn with_sink(mut self, sink: impl AccessLogSink + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    pub fn build(&self) -> Middleware {
        let sink = Arc::clone(&self.sink);
        Arc::new(move |next: HandleFunc| -> HandleFunc {
            let sink = Arc::clone(&sink);
            Arc::new(move |ctx: &mut Context| {
                next(ctx);
                write_access_log(sink.as_ref(), ctx);
            })
        })
    }
}

fn write_access_log(sink: &dyn AccessLogSink, ctx: &Context) {
    let request = ctx.request();
    let log = AccessLog {
        host: request.host(),
        route: ctx.matched_route().unwrap_or_default(),
        http_method: request.method().as_str(),
        path: request.path(),
        status: ctx.resp_status(),
    };
    match serde_json::to_string(&log) {
        Ok(line) => sink.write(&line),
        Err(e) => error!("[ID{}]访问日志序列化失败：{}", ctx.id(), e),
    }
}
