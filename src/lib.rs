// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # webrouter
//!
//! 基于前缀树的 HTTP 路由框架：每个 HTTP 动词一棵路由树，
//! 支持静态、参数（`:id`）、正则（`:id([0-9]+)`）与通配符（`*`）路由段。

pub mod config;
pub mod context;
pub mod exception;
pub mod handler;
pub mod middleware;
pub mod param;
pub mod request;
pub mod response;
pub mod router;
pub mod server;

pub use config::Config;
pub use context::{Context, ReqValue};
pub use exception::{Exception, RouteError};
pub use handler::{HandleFunc, Handler, HandlerId, Middleware};
pub use middleware::{AccessLogBuilder, AccessLogSink};
pub use param::{HttpEncoding, HttpRequestMethod, HttpVersion};
pub use request::Request;
pub use response::Response;
pub use router::{MatchInfo, Node, NodeKind, PathParams, Router, SpecialChild};
pub use server::{with_config, with_middlewares, Dispatcher, HttpServer, ServerOption};
