// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 处理函数与中间件链
//!
//! - `HandleFunc`：处理函数的统一形态，读写同一个 `Context`。
//! - `Middleware`：接收下一个处理函数，返回包装后的处理函数。
//! - `Handler`：注册到路由树上的处理函数，带有进程内唯一的 `HandlerId`，
//!   用于判断两次查找是否命中了同一个处理函数。

use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use crate::context::Context;

pub type HandleFunc = Arc<dyn Fn(&mut Context) + Send + Sync>;

pub type Middleware = Arc<dyn Fn(HandleFunc) -> HandleFunc + Send + Sync>;

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

/// 带身份的处理函数。克隆得到的 `Handler` 与原值相等。
#[derive(Clone)]
pub struct Handler {
    id: HandlerId,
    func: HandleFunc,
}

impl Handler {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        Self {
            id: HandlerId(NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed)),
            func: Arc::new(func),
        }
    }

    pub fn id(&self) -> HandlerId {
        self.id
    }

    pub fn call(&self, ctx: &mut Context) {
        (self.func)(ctx)
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Handler {}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").field("id", &self.id.0).finish()
    }
}

/// 将中间件按注册顺序包裹在 `endpoint` 外层：第一个中间件最先执行。
pub fn chain(middlewares: &[Middleware], endpoint: HandleFunc) -> HandleFunc {
    middlewares
        .iter()
        .rev()
        .fold(endpoint, |next, middleware| middleware(next))
}
