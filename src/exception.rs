// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了框架在两个阶段可能产生的错误：
//! - **注册阶段**：`RouteError`，路由注册失败。均为配置错误，调用方应立即终止启动流程。
//! - **请求阶段**：`Exception`，报文解析、参数绑定与配置加载失败。
//!
//! 路由查找未命中不是错误，`Router::find_route` 以 `None` 表示。

use thiserror::Error;

/// 路由注册失败的原因。
///
/// 每个变体携带出错的完整路由字面量以及可读的原因描述，便于在启动日志中直接定位。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// 路由字面量格式非法：空串、缺少前导 `/`、以 `/` 结尾、包含空路由段、正则无法提取或编译。
    #[error("非法路由 [{route}]：{reason}")]
    InvalidRoute { route: String, reason: String },
    /// 同一节点上尝试注册第二个特殊子节点（参数、正则、通配符三者互斥且只能注册一次）。
    #[error("路由冲突 [{route}]：{reason}")]
    RouteConflict { route: String, reason: String },
    /// 目标节点已经绑定了处理函数。
    #[error("重复注册路由 [{route}]")]
    DuplicateRoute { route: String },
}

impl RouteError {
    pub(crate) fn invalid(route: &str, reason: impl Into<String>) -> Self {
        RouteError::InvalidRoute {
            route: route.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn conflict(route: &str, reason: impl Into<String>) -> Self {
        RouteError::RouteConflict {
            route: route.to_string(),
            reason: reason.into(),
        }
    }
}

/// 服务器处理请求过程中发生的异常类型。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Exception {
    /// 请求头部无法解析为合法的 UTF-8 字符串。
    #[error("Request bytes can't be parsed in UTF-8")]
    RequestIsNotUtf8,
    /// 请求行不符合 `METHOD TARGET VERSION` 的格式。
    #[error("Malformed request line: {0}")]
    MalformedRequestLine(String),
    /// 客户端使用了框架不支持的 HTTP 方法。
    #[error("Unsupported request method: {0}")]
    UnSupportedRequestMethod(String),
    /// 客户端使用了框架不支持的 HTTP 协议版本。
    #[error("Unsupported HTTP version: {0}")]
    UnsupportedHttpVersion(String),
    /// 请求体超过 `max_request_size` 限制。对应 `413 Content Too Large`。
    #[error("Request exceeds {limit} bytes")]
    RequestTooLarge { limit: usize },
    /// 读取请求超时。对应 `408 Request Timeout`。
    #[error("Timed out reading request")]
    Timeout,
    /// 读取连接时发生 I/O 错误或连接提前关闭。
    #[error("I/O error: {0}")]
    Io(String),
    /// 从路径、查询串、表单或 JSON 请求体中取值失败。
    #[error("web绑定错误: {0}")]
    Binding(String),
    /// 响应数据序列化失败。
    #[error("序列化失败: {0}")]
    Serialization(String),
    /// 配置文件无法读取或解析。
    #[error("配置加载失败: {0}")]
    Config(String),
}
