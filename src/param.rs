// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 协议参数与常量模块
//!
//! 该模块集中定义了分发器在处理请求时用到的 HTTP 协议常量：
//! - 状态码及其原因短语（Reason Phrase）。
//! - 静态文件与 `Context::content_type` 共用的 MIME 类型映射表。
//! - HTTP 方法与版本的强类型枚举。

use lazy_static::lazy_static;
use std::{collections::HashMap, fmt, str::FromStr};

use crate::exception::Exception;

/// 服务器名称标识，用于 HTTP 响应头的 `Server` 字段
pub const SERVER_NAME: &str = "webrouter";

/// HTTP 协议规定的换行符（Carriage Return Line Feed）
pub const CRLF: &str = "\r\n";

/// 路由扫描前设置的默认 `Content-Type`
pub const DEFAULT_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// 未匹配任何路由时依次尝试的目录首页文件
pub const INDEX_FILES: [&str; 2] = ["index.html", "index.htm"];

/// 404 终止时返回给客户端的固定正文
pub const NOT_FOUND_BODY: &str = "Page not found";

/// 处理函数崩溃（500）时返回给客户端的固定正文
pub const SERVER_ERROR_BODY: &str = "Server Error";

lazy_static! {
    /// HTTP 状态码与其对应的标准原因短语映射表。
    ///
    /// 参考标准：[RFC 9110: HTTP Semantics](https://www.rfc-editor.org/rfc/rfc9110.html)。
    pub static ref STATUS_CODES: HashMap<u16, &'static str> = [
        (100, "Continue"),
        (101, "Switching Protocols"),
        (200, "OK"),
        (201, "Created"),
        (202, "Accepted"),
        (204, "No Content"),
        (206, "Partial Content"),
        (301, "Moved Permanently"),
        (302, "Found"),
        (303, "See Other"),
        (304, "Not Modified"),
        (307, "Temporary Redirect"),
        (308, "Permanent Redirect"),
        (400, "Bad Request"),
        (401, "Unauthorized"),
        (403, "Forbidden"),
        (404, "Not Found"),
        (405, "Method Not Allowed"),
        (408, "Request Timeout"),
        (409, "Conflict"),
        (410, "Gone"),
        (413, "Content Too Large"),
        (414, "URI Too Long"),
        (415, "Unsupported Media Type"),
        (418, "I'm a teapot"),
        (422, "Unprocessable Content"),
        (500, "Internal Server Error"),
        (501, "Not Implemented"),
        (502, "Bad Gateway"),
        (503, "Service Unavailable"),
        (504, "Gateway Timeout"),
        (505, "HTTP Version Not Supported"),
    ]
    .into_iter()
    .collect();
}

lazy_static! {
    /// 文件后缀名（不含 `.`）到 MIME 类型的映射表。
    pub static ref MIME_TYPES: HashMap<&'static str, &'static str> = [
        ("css", "text/css; charset=utf-8"),
        ("csv", "text/csv"),
        ("gif", "image/gif"),
        ("gz", "application/gzip"),
        ("htm", "text/html; charset=utf-8"),
        ("html", "text/html; charset=utf-8"),
        ("ico", "image/x-icon"),
        ("jpeg", "image/jpeg"),
        ("jpg", "image/jpeg"),
        ("js", "text/javascript; charset=utf-8"),
        ("json", "application/json"),
        ("mjs", "text/javascript; charset=utf-8"),
        ("mp3", "audio/mpeg"),
        ("mp4", "video/mp4"),
        ("otf", "font/otf"),
        ("pdf", "application/pdf"),
        ("png", "image/png"),
        ("svg", "image/svg+xml"),
        ("tar", "application/x-tar"),
        ("ttf", "font/ttf"),
        ("txt", "text/plain; charset=utf-8"),
        ("wasm", "application/wasm"),
        ("webm", "video/webm"),
        ("webp", "image/webp"),
        ("woff", "font/woff"),
        ("woff2", "font/woff2"),
        ("xml", "text/xml; charset=utf-8"),
        ("zip", "application/zip"),
    ]
    .into_iter()
    .collect();
}

/// 按扩展名查找 MIME 类型，扩展名可以带前导 `.`，大小写不敏感。
pub fn mime_by_extension(extension: &str) -> Option<&'static str> {
    let extension = extension.trim_start_matches('.').to_ascii_lowercase();
    MIME_TYPES.get(extension.as_str()).copied()
}

/// 查找状态码对应的原因短语，未知状态码返回空串
pub fn status_text(code: u16) -> &'static str {
    STATUS_CODES.get(&code).copied().unwrap_or("")
}

/// 支持的 HTTP 协议版本
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVersion {
    /// HTTP/1.0 版本
    V1_0,
    /// HTTP/1.1 版本
    V1_1,
}

/// HTTP 请求方法。
///
/// 除常见方法外，`Extension` 保存任意合法 token，
/// 使 `Server::match_method` 可以为自定义方法注册路由。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HttpRequestMethod {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Extension(String),
}

impl HttpRequestMethod {
    /// 请求方法是否可以由静态文件直接响应（仅 GET 与 HEAD）
    pub fn is_safe_read(&self) -> bool {
        matches!(self, HttpRequestMethod::Get | HttpRequestMethod::Head)
    }
}

impl FromStr for HttpRequestMethod {
    type Err = Exception;

    /// 方法名按大写规范化；空串或包含非 token 字符时返回错误。
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_alphanumeric() || b"-_!#$%&'*+.^`|~".contains(&b)) {
            return Err(Exception::UnSupportedRequestMethod);
        }
        let method = match s.to_ascii_uppercase().as_str() {
            "GET" => HttpRequestMethod::Get,
            "HEAD" => HttpRequestMethod::Head,
            "POST" => HttpRequestMethod::Post,
            "PUT" => HttpRequestMethod::Put,
            "DELETE" => HttpRequestMethod::Delete,
            "PATCH" => HttpRequestMethod::Patch,
            "OPTIONS" => HttpRequestMethod::Options,
            other => HttpRequestMethod::Extension(other.to_string()),
        };
        Ok(method)
    }
}

impl fmt::Display for HttpVersion {
    /// 将枚举格式化为 HTTP 报文中的版本字符串
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HttpVersion::V1_0 => write!(f, "HTTP/1.0"),
            HttpVersion::V1_1 => write!(f, "HTTP/1.1"),
        }
    }
}

impl fmt::Display for HttpRequestMethod {
    /// 将枚举格式化为 HTTP 标准大写方法名
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpRequestMethod::Get => write!(f, "GET"),
            HttpRequestMethod::Head => write!(f, "HEAD"),
            HttpRequestMethod::Post => write!(f, "POST"),
            HttpRequestMethod::Put => write!(f, "PUT"),
            HttpRequestMethod::Delete => write!(f, "DELETE"),
            HttpRequestMethod::Patch => write!(f, "PATCH"),
            HttpRequestMethod::Options => write!(f, "OPTIONS"),
            HttpRequestMethod::Extension(name) => write!(f, "{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse_is_case_insensitive() {
        assert_eq!("get".parse::<HttpRequestMethod>().unwrap(), HttpRequestMethod::Get);
        assert_eq!("Delete".parse::<HttpRequestMethod>().unwrap(), HttpRequestMethod::Delete);
    }

    #[test]
    fn test_method_extension() {
        let method: HttpRequestMethod = "propfind".parse().unwrap();
        assert_eq!(method, HttpRequestMethod::Extension("PROPFIND".to_string()));
        assert_eq!(method.to_string(), "PROPFIND");
    }

    #[test]
    fn test_method_rejects_garbage() {
        assert!("".parse::<HttpRequestMethod>().is_err());
        assert!("GE T".parse::<HttpRequestMethod>().is_err());
        assert!("GET\r".parse::<HttpRequestMethod>().is_err());
    }

    #[test]
    fn test_mime_lookup() {
        assert_eq!(mime_by_extension("json"), Some("application/json"));
        assert_eq!(mime_by_extension(".PNG"), Some("image/png"));
        assert_eq!(mime_by_extension("unknown"), None);
    }

    #[test]
    fn test_status_text() {
        assert_eq!(status_text(404), "Not Found");
        assert_eq!(status_text(500), "Internal Server Error");
        assert_eq!(status_text(799), "");
    }
}
