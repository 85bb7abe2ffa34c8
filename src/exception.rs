// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了分发器在请求处理生命周期中可能出现的各类异常情况。
//!
//! - [`Exception`]：请求解析、路由注册和配置加载阶段的错误。
//! - [`DispatchFault`]：调用处理函数时在调用边界被捕获的故障，
//!   在开启 `recover_panic` 时会被转化为 500 响应。

use std::fmt;

/// 服务器处理请求过程中发生的异常类型。
#[derive(Debug, Clone, PartialEq)]
pub enum Exception {
    /// 客户端发送的请求头无法解析为合法的 UTF-8 字符串。
    RequestIsNotUtf8,
    /// 请求行中的方法名不是合法的 HTTP token。
    UnSupportedRequestMethod,
    /// 客户端使用了服务器不支持的 HTTP 协议版本（仅支持 HTTP/1.0 与 HTTP/1.1）。
    UnsupportedHttpVersion,
    /// 请求报文结构不完整，例如请求行缺失字段或请求头不以空行结束。
    MalformedRequest,
    /// 注册路由时给出的模式不是合法的正则表达式。
    InvalidPattern { pattern: String, reason: String },
    /// 无法读取配置文件。
    ConfigUnreadable { path: String, reason: String },
}

use Exception::*;

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestIsNotUtf8 => write!(f, "Request bytes can't be parsed in UTF-8"),
            UnSupportedRequestMethod => write!(f, "Unsupported request method"),
            UnsupportedHttpVersion => write!(f, "Unsupported HTTP version"),
            MalformedRequest => write!(f, "Malformed HTTP request"),
            InvalidPattern { pattern, reason } => {
                write!(f, "Error in route regex {:?}: {}", pattern, reason)
            }
            ConfigUnreadable { path, reason } => {
                write!(f, "Couldn't read config file {}: {}", path, reason)
            }
        }
    }
}

impl std::error::Error for Exception {}

/// 处理函数调用边界上捕获到的故障。
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchFault {
    /// 捕获组数量与处理函数声明的字符串参数个数不一致。
    ArgumentMismatch { expected: usize, found: usize },
    /// 处理函数在执行过程中发生了 panic。
    Panicked { message: String },
}

impl fmt::Display for DispatchFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchFault::ArgumentMismatch { expected, found } => write!(
                f,
                "handler expects {} string arguments but the route captured {}",
                expected, found
            ),
            DispatchFault::Panicked { message } => write!(f, "handler panicked: {}", message),
        }
    }
}

impl std::error::Error for DispatchFault {}
