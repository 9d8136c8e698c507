// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由树节点
//!
//! 每个节点对应路由中的一个路由段位置。节点上的子节点分为两类：
//! - **静态子节点**：按路由段字面量索引，数量不限。
//! - **特殊子节点**：参数、正则、通配符三者之一，至多一个，注册后不可更换。
//!
//! 节点分类只看路由段的字面量，判定顺序为：正则 > 参数 > 通配符 > 静态。

use std::collections::HashMap;

use regex::Regex;

use crate::exception::RouteError;

/// 节点类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// 路由树根节点，路径恒为 `/`
    Root,
    /// 静态路由
    Static,
    /// 正则路由，例如 `:id([0-9]+)`
    Regex,
    /// 参数路由，例如 `:id`
    Param,
    /// 通配符路由 `*`
    Wildcard,
}

/// 节点的特殊子节点。三种绑定方式在类型层面互斥。
#[derive(Debug)]
pub enum SpecialChild<H> {
    None,
    Param {
        name: String,
        child: Box<Node<H>>,
    },
    Regex {
        name: String,
        pattern: Regex,
        child: Box<Node<H>>,
    },
    Wildcard(Box<Node<H>>),
}

impl<H> SpecialChild<H> {
    fn describe(&self) -> &'static str {
        match self {
            SpecialChild::None => "无",
            SpecialChild::Param { .. } => "参数路由",
            SpecialChild::Regex { .. } => "正则路由",
            SpecialChild::Wildcard(_) => "通配符路由",
        }
    }

    fn child(&self) -> Option<&Node<H>> {
        match self {
            SpecialChild::None => None,
            SpecialChild::Param { child, .. }
            | SpecialChild::Regex { child, .. }
            | SpecialChild::Wildcard(child) => Some(&**child),
        }
    }

    fn child_mut(&mut self) -> Option<&mut Node<H>> {
        match self {
            SpecialChild::None => None,
            SpecialChild::Param { child, .. }
            | SpecialChild::Regex { child, .. }
            | SpecialChild::Wildcard(child) => Some(&mut **child),
        }
    }
}

/// 已分类的路由段，注册前由 [`Segment::classify`] 产生。
#[derive(Debug, Clone)]
pub enum Segment<'a> {
    Static(&'a str),
    Param { text: &'a str, name: &'a str },
    Regex { text: &'a str, name: &'a str, pattern: Regex },
    Wildcard,
}

impl<'a> Segment<'a> {
    /// 根据路由段字面量判定其类型。
    ///
    /// 正则路由的判定条件为：以 `:` 开头、包含 `(` 且以 `)` 结尾。
    /// 表达式取第一个 `(` 与最后一个 `)` 之间的内容，为空或编译失败时返回 `InvalidRoute`。
    pub fn classify(text: &'a str, route: &str) -> Result<Self, RouteError> {
        if let Some(rest) = text.strip_prefix(':') {
            if text.contains('(') && text.ends_with(')') {
                let (name, expr) = extract_regex(rest).ok_or_else(|| {
                    RouteError::invalid(route, format!("正则路由格式错误，路由段 {}", text))
                })?;
                let pattern = Regex::new(expr).map_err(|e| {
                    RouteError::invalid(
                        route,
                        format!("无法编译正则表达式，路由段 {}：{}", text, e),
                    )
                })?;
                return Ok(Segment::Regex {
                    text,
                    name,
                    pattern,
                });
            }
            return Ok(Segment::Param { text, name: rest });
        }
        if text == "*" {
            return Ok(Segment::Wildcard);
        }
        Ok(Segment::Static(text))
    }
}

/// 从 `name(expr)` 中拆出参数名与表达式。
fn extract_regex(rest: &str) -> Option<(&str, &str)> {
    let start = rest.find('(')?;
    let end = rest.rfind(')')?;
    if end <= start + 1 {
        return None;
    }
    Some((&rest[..start], &rest[start + 1..end]))
}

/// 路由树的节点
#[derive(Debug)]
pub struct Node<H> {
    kind: NodeKind,
    /// 创建该节点时的路由段字面量，根节点为 `/`
    path: String,
    children: HashMap<String, Node<H>>,
    special: SpecialChild<H>,
    handler: Option<H>,
    /// 绑定处理函数时记录的完整路由
    full_route: Option<String>,
}

impl<H> Node<H> {
    pub(crate) fn root() -> Self {
        Self::with_kind(NodeKind::Root, "/")
    }

    fn with_kind(kind: NodeKind, path: &str) -> Self {
        Self {
            kind,
            path: path.to_string(),
            children: HashMap::new(),
            special: SpecialChild::None,
            handler: None,
            full_route: None,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn handler(&self) -> Option<&H> {
        self.handler.as_ref()
    }

    pub fn full_route(&self) -> Option<&str> {
        self.full_route.as_deref()
    }

    pub fn special(&self) -> &SpecialChild<H> {
        &self.special
    }

    /// 按字面量查找静态子节点
    pub fn static_child(&self, segment: &str) -> Option<&Node<H>> {
        self.children.get(segment)
    }

    pub fn static_children(&self) -> impl Iterator<Item = &Node<H>> {
        self.children.values()
    }

    /// 获取给定路由段对应的子节点，不存在则创建。
    ///
    /// 静态子节点存在时直接复用；特殊子节点槽位已被占用时一律视为冲突，
    /// 无论已有的是哪一种、字面量是否相同。
    pub(crate) fn child_or_create(
        &mut self,
        segment: Segment<'_>,
        route: &str,
    ) -> Result<&mut Node<H>, RouteError> {
        if !matches!(segment, Segment::Static(_)) && !matches!(self.special, SpecialChild::None) {
            let existing = self.special.child().map_or("", |c| c.path.as_str());
            return Err(RouteError::conflict(
                route,
                format!(
                    "节点 {} 已有{} {}，不允许再注册 {}",
                    self.path,
                    self.special.describe(),
                    existing,
                    segment_text(&segment)
                ),
            ));
        }

        self.special = match segment {
            Segment::Static(text) => {
                return Ok(self
                    .children
                    .entry(text.to_string())
                    .or_insert_with(|| Node::with_kind(NodeKind::Static, text)));
            }
            Segment::Param { text, name } => SpecialChild::Param {
                name: name.to_string(),
                child: Box::new(Node::with_kind(NodeKind::Param, text)),
            },
            Segment::Regex {
                text,
                name,
                pattern,
            } => SpecialChild::Regex {
                name: name.to_string(),
                pattern,
                child: Box::new(Node::with_kind(NodeKind::Regex, text)),
            },
            Segment::Wildcard => {
                SpecialChild::Wildcard(Box::new(Node::with_kind(NodeKind::Wildcard, "*")))
            }
        };

        let node_path = self.path.clone();
        self.special
            .child_mut()
            .ok_or_else(|| RouteError::invalid(route, format!("节点 {} 的特殊子节点写入失败", node_path)))
    }

    /// 将处理函数绑定到当前节点，已绑定时返回 `DuplicateRoute`。
    pub(crate) fn bind(&mut self, handler: H, route: &str) -> Result<(), RouteError> {
        if self.handler.is_some() {
            return Err(RouteError::DuplicateRoute {
                route: route.to_string(),
            });
        }
        self.handler = Some(handler);
        self.full_route = Some(route.to_string());
        Ok(())
    }

    /// 按优先级查找与路由段匹配的子节点：静态 > 正则 > 参数 > 通配符。
    ///
    /// 命中参数或正则子节点时，同时返回需要捕获的参数名。
    pub(crate) fn child_of(&self, segment: &str) -> Option<(&Node<H>, Option<&str>)> {
        if let Some(child) = self.children.get(segment) {
            return Some((child, None));
        }
        match &self.special {
            SpecialChild::Regex {
                name,
                pattern,
                child,
            } if pattern.is_match(segment) => Some((&**child, Some(name.as_str()))),
            SpecialChild::Param { name, child } => Some((&**child, Some(name.as_str()))),
            SpecialChild::Wildcard(child) => Some((&**child, None)),
            _ => None,
        }
    }
}

fn segment_text<'a>(segment: &Segment<'a>) -> &'a str {
    match segment {
        Segment::Static(text) | Segment::Param { text, .. } | Segment::Regex { text, .. } => *text,
        Segment::Wildcard => "*",
    }
}
