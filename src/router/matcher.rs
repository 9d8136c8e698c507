// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由查找
//!
//! 自根节点起逐段贪心下行，每一步按 静态 > 正则 > 参数 > 通配符 的优先级选择子节点，
//! 一旦选定不再回溯。若当前节点本身是通配符节点且没有任何子节点能匹配下一段，
//! 则停留在该节点上，由通配符吞掉这一段，从而支持末尾通配符匹配多段路径。

use std::fmt;

use crate::router::node::{Node, NodeKind};

/// 有序的路径参数表。
///
/// 按首次写入的顺序保存参数；同名参数再次写入时原位覆盖旧值。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    entries: Vec<(String, String)>,
}

impl PathParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: &str) {
        match self.entries.iter_mut().find(|(key, _)| key == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((name.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for PathParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (index, (key, value)) in self.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", key, value)?;
        }
        f.write_str("}")
    }
}

/// 一次查找的结果：命中的节点及沿途捕获的路径参数。
///
/// 命中的节点可能没有绑定处理函数（例如只注册了 `/order/detail` 时查找 `/order`），
/// 由调用方区分“路由不存在”与“路由存在但无处理函数”。
#[derive(Debug)]
pub struct MatchInfo<'r, H> {
    node: &'r Node<H>,
    path_params: PathParams,
}

impl<'r, H> MatchInfo<'r, H> {
    pub fn node(&self) -> &'r Node<H> {
        self.node
    }

    pub fn handler(&self) -> Option<&'r H> {
        self.node.handler()
    }

    /// 命中节点注册时的完整路由，中间节点为 `None`
    pub fn matched_route(&self) -> Option<&'r str> {
        self.node.full_route()
    }

    pub fn path_params(&self) -> &PathParams {
        &self.path_params
    }

    pub fn into_path_params(self) -> PathParams {
        self.path_params
    }
}

/// 在给定路由树中查找路径。
pub fn find<'r, H>(root: &'r Node<H>, path: &str) -> Option<MatchInfo<'r, H>> {
    let mut path_params = PathParams::new();
    if path == "/" {
        return Some(MatchInfo {
            node: root,
            path_params,
        });
    }

    let mut target = root;
    for segment in path.trim_matches('/').split('/') {
        match target.child_of(segment) {
            Some((child, capture)) => {
                if let Some(name) = capture {
                    path_params.insert(name, segment);
                }
                target = child;
            }
            None if target.kind() == NodeKind::Wildcard => {}
            None => return None,
        }
    }

    Some(MatchInfo {
        node: target,
        path_params,
    })
}
