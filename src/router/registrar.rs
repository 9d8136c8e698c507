// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由注册
//!
//! 注册分两步进行：先完整校验路由字面量并对每个路由段分类（包括编译正则），
//! 全部通过后才修改路由树。冲突只可能出现在已存在的节点上，
//! 因此一次失败的注册不会在树上留下残余节点。

use crate::exception::RouteError;
use crate::router::node::{Node, Segment};

/// 校验路由字面量并返回分类后的路由段列表。根路由 `/` 返回空列表。
pub fn parse_route(path: &str) -> Result<Vec<Segment<'_>>, RouteError> {
    if path.is_empty() {
        return Err(RouteError::invalid(path, "路由不能为空字符串"));
    }
    if !path.starts_with('/') {
        return Err(RouteError::invalid(path, "路由必须以 '/' 开头"));
    }
    if path == "/" {
        return Ok(Vec::new());
    }
    if path.ends_with('/') {
        return Err(RouteError::invalid(path, "路由不能以 '/' 结尾"));
    }

    path[1..]
        .split('/')
        .map(|segment| {
            if segment.is_empty() {
                return Err(RouteError::invalid(path, "路由中不得包含连续的 '/'"));
            }
            Segment::classify(segment, path)
        })
        .collect()
}

/// 将处理函数注册到给定路由树上。
pub fn insert<H>(root: &mut Node<H>, path: &str, handler: H) -> Result<(), RouteError> {
    let segments = parse_route(path)?;
    insert_segments(root, segments, path, handler)
}

/// 沿已校验的路由段逐层下行，按需创建节点，最后在目标节点上绑定处理函数。
pub(crate) fn insert_segments<H>(
    root: &mut Node<H>,
    segments: Vec<Segment<'_>>,
    path: &str,
    handler: H,
) -> Result<(), RouteError> {
    let mut target = root;
    for segment in segments {
        target = target.child_or_create(segment, path)?;
    }
    target.bind(handler, path)
}
