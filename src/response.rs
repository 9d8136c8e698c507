// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 响应构建模块
//!
//! 处理函数只在 `Context` 上写入状态码与响应数据，本模块负责把它们整理成完整的
//! HTTP/1.1 响应报文：补齐 `Date`、`Server` 等标头，按 `Accept-Encoding` 协商压缩，
//! 并对 HEAD 请求去掉响应体。

use brotli::enc::{self, backward_references::BrotliEncoderParams};
use bytes::Bytes;
use chrono::prelude::*;
use flate2::{
    write::{DeflateEncoder, GzEncoder},
    Compression,
};
use log::{debug, error};

use std::io::{self, Write};

use crate::param::*;

#[derive(Debug, Clone)]
pub struct Response {
    version: HttpVersion,
    status_code: u16,
    information: String,
    content_type: Option<String>,
    content_length: u64,
    date: DateTime<Utc>,
    content_encoding: Option<HttpEncoding>,
    server_name: String,
    headers: Vec<(String, String)>,
    content: Option<Bytes>,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn new() -> Self {
        Self {
            version: HttpVersion::V1_1,
            status_code: 200,
            information: "OK".to_string(),
            content_type: None,
            content_length: 0,
            date: Utc::now(),
            content_encoding: None,
            server_name: SERVER_NAME.to_string(),
            headers: Vec::new(),
            content: None,
        }
    }

    /// 以状态码与原因短语作为纯文本响应体构造响应，用于 400/408/413 等框架自身产生的响应
    pub fn from_status_code(code: u16) -> Self {
        let mut response = Self::new();
        response.set_code(code);
        let body = response.information.clone();
        response.set_content(Some("text/plain;charset=utf-8"), Bytes::from(body));
        response
    }

    pub fn response_400() -> Self {
        Self::from_status_code(400)
    }

    pub fn response_413() -> Self {
        Self::from_status_code(413)
    }

    /// 设置状态码。状态码表中不存在的值视为处理函数的编程错误，改写为 500。
    pub fn set_code(&mut self, code: u16) -> &mut Self {
        let (code, information) = match STATUS_CODES.get(&code) {
            Some(&information) => (code, information),
            None => {
                error!("非法的状态码：{}，改为返回500", code);
                (500, "Internal Server Error")
            }
        };
        self.status_code = code;
        self.information = information.to_string();
        self
    }

    pub fn set_content(&mut self, content_type: Option<&str>, content: Bytes) -> &mut Self {
        self.content_type = content_type.map(str::to_string);
        self.content_length = content.len() as u64;
        self.content = Some(content);
        self
    }

    pub fn add_header(&mut self, name: &str, value: &str) -> &mut Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// 按客户端支持的编码压缩响应体。空响应体与已压缩的媒体类型保持原样；
    /// 压缩失败时记录错误并退回未压缩内容。
    pub fn encode(&mut self, accept_encoding: &[HttpEncoding], id: u128) -> &mut Self {
        let Some(content) = self.content.clone().filter(|c| !c.is_empty()) else {
            return self;
        };
        if self
            .content_type
            .as_deref()
            .map_or(false, should_skip_compression)
        {
            debug!("[ID{}]跳过压缩，Content-Type: {:?}", id, self.content_type);
            return self;
        }
        let Some(encoding) = decide_encoding(accept_encoding) else {
            return self;
        };
        match compress(content.to_vec(), Some(encoding)) {
            Ok(compressed) => {
                debug!(
                    "[ID{}]使用{}压缩，原始: {} bytes -> 压缩后: {} bytes",
                    id,
                    encoding,
                    content.len(),
                    compressed.len()
                );
                self.content_encoding = Some(encoding);
                self.content_length = compressed.len() as u64;
                self.content = Some(Bytes::from(compressed));
            }
            Err(e) => error!("[ID{}]压缩响应失败: {}，返回未压缩内容", id, e),
        }
        self
    }

    /// HEAD 请求：保留 `Content-Length`，去掉响应体
    pub fn head_only(&mut self) -> &mut Self {
        self.content = None;
        self
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        let version: &str = match self.version {
            HttpVersion::V1_0 => "HTTP/1.0",
            HttpVersion::V1_1 => "HTTP/1.1",
        };
        let status_code: &str = &self.status_code.to_string();
        let information: &str = &self.information;
        let content_length: &str = &self.content_length.to_string();
        let date: &str = &format_date(&self.date);
        let server: &str = &self.server_name;

        let mut header = [
            version,
            " ",
            status_code,
            " ",
            information,
            CRLF,
            match &self.content_type {
                Some(t) => ["Content-Type: ", t, CRLF].concat(),
                None => "".to_string(),
            }
            .as_str(),
            match self.content_encoding {
                Some(e) => ["Content-Encoding: ", &e.to_string(), CRLF].concat(),
                None => "".to_string(),
            }
            .as_str(),
            "Content-Length: ",
            content_length,
            CRLF,
            "Date: ",
            date,
            CRLF,
            "Server: ",
            server,
            CRLF,
            "Connection: close",
            CRLF,
        ]
        .concat();
        for (name, value) in &self.headers {
            header.push_str(&[name.as_str(), ": ", value.as_str(), CRLF].concat());
        }
        header.push_str(CRLF);

        [
            header.as_bytes(),
            match &self.content {
                Some(c) => &c[..],
                None => &[],
            },
        ]
        .concat()
    }
}

impl Response {
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn information(&self) -> &str {
        &self.information
    }

    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    pub fn content_encoding(&self) -> Option<HttpEncoding> {
        self.content_encoding
    }

    pub fn content(&self) -> Option<&Bytes> {
        self.content.as_ref()
    }
}

fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc2822()
}

fn compress(data: Vec<u8>, mode: Option<HttpEncoding>) -> io::Result<Vec<u8>> {
    match mode {
        Some(HttpEncoding::Gzip) => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&data)?;
            encoder.finish()
        }
        Some(HttpEncoding::Deflate) => {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&data)?;
            encoder.finish()
        }
        Some(HttpEncoding::Br) => {
            let params = BrotliEncoderParams::default();
            let mut output = Vec::new();
            enc::BrotliCompress(&mut io::Cursor::new(data), &mut output, &params)?;
            Ok(output)
        }
        None => Ok(data),
    }
}

fn should_skip_compression(mime_type: &str) -> bool {
    INCOMPRESSIBLE_TYPES
        .iter()
        .any(|&skip_type| mime_type.starts_with(skip_type))
}

/// gzip 优先，其次 deflate；brotli 压缩耗时较高，不参与协商
fn decide_encoding(accept_encoding: &[HttpEncoding]) -> Option<HttpEncoding> {
    if accept_encoding.contains(&HttpEncoding::Gzip) {
        Some(HttpEncoding::Gzip)
    } else if accept_encoding.contains(&HttpEncoding::Deflate) {
        Some(HttpEncoding::Deflate)
    } else {
        None
    }
}
