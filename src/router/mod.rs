// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由森林
//!
//! 每个 HTTP 动词对应一棵路由树，`Router` 持有动词到树根的映射。
//!
//! ## 生命周期
//! 路由只在启动阶段通过 `&mut Router` 注册；服务阶段仅做只读查找。
//! 两个阶段在时间上分离，因此内部不做任何加锁。
//!
//! ## 路由段语法
//! - `user`：静态路由，按字面量精确匹配。
//! - `:id`：参数路由，匹配任意一段并以 `id` 为名捕获。
//! - `:id([0-9]+)`：正则路由，匹配表达式时以 `id` 为名捕获。
//! - `*`：通配符路由，不捕获，位于末尾时可吞掉多段。

pub mod matcher;
pub mod node;
pub mod registrar;

use std::collections::HashMap;

use log::{debug, error};

use crate::exception::RouteError;

pub use matcher::{MatchInfo, PathParams};
pub use node::{Node, NodeKind, SpecialChild};

/// 路由森林：HTTP 动词到路由树根节点的映射
#[derive(Debug)]
pub struct Router<H> {
    trees: HashMap<String, Node<H>>,
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> Router<H> {
    pub fn new() -> Self {
        Self {
            trees: HashMap::new(),
        }
    }

    /// 返回给定动词的路由树根节点，不存在时创建一棵空树
    pub fn tree_or_create(&mut self, method: &str) -> &mut Node<H> {
        self.trees
            .entry(method.to_string())
            .or_insert_with(Node::root)
    }

    pub fn tree(&self, method: &str) -> Option<&Node<H>> {
        self.trees.get(method)
    }

    /// 注册路由。
    ///
    /// 路由字面量在修改任何路由树之前完成校验，校验失败时不会为该动词创建空树。
    pub fn add_route(&mut self, method: &str, path: &str, handler: H) -> Result<(), RouteError> {
        let result = registrar::parse_route(path).and_then(|segments| {
            let root = self.tree_or_create(method);
            registrar::insert_segments(root, segments, path, handler)
        });
        match &result {
            Ok(()) => debug!("注册路由 {} {}", method, path),
            Err(e) => error!("注册路由 {} {} 失败：{}", method, path, e),
        }
        result
    }

    /// 查找路由。动词不存在或路径无法匹配时返回 `None`。
    pub fn find_route(&self, method: &str, path: &str) -> Option<MatchInfo<'_, H>> {
        let root = self.trees.get(method)?;
        matcher::find(root, path)
    }

    /// 已注册的动词，按字典序排列
    pub fn methods(&self) -> Vec<&str> {
        let mut methods: Vec<&str> = self.trees.keys().map(String::as_str).collect();
        methods.sort_unstable();
        methods
    }

    /// 所有绑定了处理函数的 `(动词, 完整路由)`，按动词与路由排序
    pub fn routes(&self) -> Vec<(&str, &str)> {
        let mut routes = Vec::new();
        for (method, root) in &self.trees {
            collect_routes(root, method, &mut routes);
        }
        routes.sort_unstable();
        routes
    }
}

fn collect_routes<'r, H>(node: &'r Node<H>, method: &'r str, routes: &mut Vec<(&'r str, &'r str)>) {
    if let Some(route) = node.full_route() {
        routes.push((method, route));
    }
    for child in node.static_children() {
        collect_routes(child, method, routes);
    }
    match node.special() {
        SpecialChild::None => {}
        SpecialChild::Param { child, .. }
        | SpecialChild::Regex { child, .. }
        | SpecialChild::Wildcard(child) => collect_routes(child, method, routes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_method_is_not_found() {
        let mut router = Router::new();
        router.add_route("GET", "/user", 1).unwrap();
        assert!(router.find_route("POST", "/user").is_none());
    }

    #[test]
    fn test_invalid_route_creates_no_tree() {
        let mut router: Router<u32> = Router::new();
        assert!(router.add_route("PUT", "login", 1).is_err());
        assert!(router.tree("PUT").is_none());
        assert!(router.methods().is_empty());
    }

    #[test]
    fn test_trees_are_per_method() {
        let mut router = Router::new();
        router.add_route("GET", "/user", 1).unwrap();
        router.add_route("POST", "/user", 2).unwrap();

        assert_eq!(router.find_route("GET", "/user").unwrap().handler(), Some(&1));
        assert_eq!(router.find_route("POST", "/user").unwrap().handler(), Some(&2));
        assert_eq!(router.methods(), vec!["GET", "POST"]);
    }

    #[test]
    fn test_routes_listing() {
        let mut router = Router::new();
        for (method, path) in [
            ("GET", "/"),
            ("GET", "/order/detail/:id"),
            ("GET", "/static/*"),
            ("POST", "/echo"),
        ] {
            router.add_route(method, path, ()).unwrap();
        }
        assert_eq!(
            router.routes(),
            vec![
                ("GET", "/"),
                ("GET", "/order/detail/:id"),
                ("GET", "/static/*"),
                ("POST", "/echo"),
            ]
        );
    }
}
