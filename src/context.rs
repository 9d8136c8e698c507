// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 请求上下文
//!
//! 每个请求对应一个 `Context`，在中间件链与处理函数之间传递：
//! - 输入侧：原始 `Request`、路由命中后写入的路径参数与路由模板。
//! - 输出侧：处理函数写入的状态码、响应数据、内容类型与额外响应头。
//!
//! 连接处理器在处理函数返回后，根据输出侧字段构建 `Response`。

use std::collections::HashMap;

use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};

use crate::{exception::Exception, request::Request, router::PathParams};

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// 单个请求的上下文
#[derive(Debug)]
pub struct Context {
    id: u128,
    request: Request,
    path_params: PathParams,
    matched_route: Option<String>,
    /// 查询串只在首次访问时解析一次
    query_cache: Option<HashMap<String, Vec<String>>>,

    resp_status: u16,
    resp_data: Bytes,
    resp_content_type: Option<String>,
    resp_headers: Vec<(String, String)>,
}

impl Context {
    pub fn new(request: Request, id: u128) -> Self {
        Self {
            id,
            request,
            path_params: PathParams::new(),
            matched_route: None,
            query_cache: None,
            resp_status: 200,
            resp_data: Bytes::new(),
            resp_content_type: None,
            resp_headers: Vec::new(),
        }
    }

    pub fn id(&self) -> u128 {
        self.id
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// 路由命中后由服务器写入路径参数与路由模板
    pub(crate) fn set_route(&mut self, matched_route: Option<&str>, params: PathParams) {
        self.matched_route = matched_route.map(str::to_string);
        self.path_params = params;
    }

    /// 命中的路由模板，例如 `/order/detail/:id`；未命中时为 `None`
    pub fn matched_route(&self) -> Option<&str> {
        self.matched_route.as_deref()
    }

    pub fn path_params(&self) -> &PathParams {
        &self.path_params
    }

    /// 按名称读取路径参数
    pub fn path_value(&self, key: &str) -> ReqValue {
        match self.path_params.get(key) {
            Some(value) => ReqValue::found(value),
            None => ReqValue::missing(key),
        }
    }

    /// 按名称读取查询串参数，同名参数取第一个
    pub fn query_value(&mut self, key: &str) -> ReqValue {
        let request = &self.request;
        let cache = self
            .query_cache
            .get_or_insert_with(|| group_pairs(parse_urlencoded(request.query().unwrap_or_default())));
        match cache.get(key).and_then(|values| values.first()) {
            Some(value) => ReqValue::found(value),
            None => ReqValue::missing(key),
        }
    }

    /// 按名称读取表单参数。
    ///
    /// `application/x-www-form-urlencoded` 请求体中的值优先，其次是查询串。
    pub fn form_value(&mut self, key: &str) -> ReqValue {
        let is_form = self
            .request
            .content_type()
            .is_some_and(|t| t.starts_with(FORM_URLENCODED));
        if is_form {
            let body = String::from_utf8_lossy(self.request.body());
            if let Some((_, value)) = parse_urlencoded(&body).into_iter().find(|(k, _)| k == key) {
                return ReqValue::found(&value);
            }
        }
        self.query_value(key)
    }

    /// 将 JSON 请求体反序列化为 `T`
    pub fn bind_json<T: DeserializeOwned>(&self) -> Result<T, Exception> {
        let body = self.request.body();
        if body.is_empty() {
            return Err(Exception::Binding("请求体为空".to_string()));
        }
        serde_json::from_slice(body).map_err(|e| Exception::Binding(e.to_string()))
    }

    /// 以 JSON 格式写入响应
    pub fn resp_json<T: Serialize>(&mut self, status: u16, value: &T) -> Result<(), Exception> {
        let data = serde_json::to_vec(value).map_err(|e| Exception::Serialization(e.to_string()))?;
        self.resp_status = status;
        self.resp_data = Bytes::from(data);
        self.resp_content_type = Some("application/json".to_string());
        Ok(())
    }

    /// 以纯文本格式写入响应
    pub fn resp_string(&mut self, status: u16, content: impl Into<String>) {
        self.resp_status = status;
        self.resp_data = Bytes::from(content.into());
        self.resp_content_type = Some("text/plain;charset=utf-8".to_string());
    }

    pub fn set_status(&mut self, status: u16) {
        self.resp_status = status;
    }

    /// 写入原始响应数据，内容类型由调用方给出
    pub fn set_body(&mut self, content_type: &str, data: impl Into<Bytes>) {
        self.resp_data = data.into();
        self.resp_content_type = Some(content_type.to_string());
    }

    pub fn set_header(&mut self, name: &str, value: &str) {
        self.resp_headers.push((name.to_string(), value.to_string()));
    }

    pub fn resp_status(&self) -> u16 {
        self.resp_status
    }

    pub fn resp_data(&self) -> &Bytes {
        &self.resp_data
    }

    pub fn resp_content_type(&self) -> Option<&str> {
        self.resp_content_type.as_deref()
    }

    pub fn resp_headers(&self) -> &[(String, String)] {
        &self.resp_headers
    }
}

/// 从请求中读取的单个值，类型转换延迟到调用方决定
#[derive(Debug, Clone, PartialEq)]
pub struct ReqValue {
    value: Result<String, Exception>,
}

impl ReqValue {
    fn found(value: &str) -> Self {
        Self {
            value: Ok(value.to_string()),
        }
    }

    fn missing(key: &str) -> Self {
        Self {
            value: Err(Exception::Binding(format!("key [{}] 不存在", key))),
        }
    }

    pub fn is_present(&self) -> bool {
        self.value.is_ok()
    }

    pub fn as_str(&self) -> Result<&str, Exception> {
        self.value.as_deref().map_err(Clone::clone)
    }

    pub fn into_string(self) -> Result<String, Exception> {
        self.value
    }

    pub fn as_i64(&self) -> Result<i64, Exception> {
        self.parse()
    }

    pub fn as_u64(&self) -> Result<u64, Exception> {
        self.parse()
    }

    pub fn as_f64(&self) -> Result<f64, Exception> {
        self.parse()
    }

    fn parse<T>(&self) -> Result<T, Exception>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        let value = self.as_str()?;
        value
            .parse::<T>()
            .map_err(|e| Exception::Binding(format!("无法转换 [{}]：{}", value, e)))
    }
}

/// 解析 `a=1&b=2` 形式的 urlencoded 串。`+` 视为空格，无法解码的片段保持原样。
pub fn parse_urlencoded(raw: &str) -> Vec<(String, String)> {
    raw.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

fn group_pairs(pairs: Vec<(String, String)>) -> HashMap<String, Vec<String>> {
    let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
    for (key, value) in pairs {
        grouped.entry(key).or_default().push(value);
    }
    grouped
}
