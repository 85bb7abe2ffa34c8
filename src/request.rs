// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 请求处理模块
//!
//! 负责将 TCP 流中读取的原始字节解析为强类型的 `Request` 结构体：
//! 1. 请求行（Request-Line）的解析（方法、路径、查询串、版本）。
//! 2. 请求头（Headers）的提取，字段名大小写不敏感。
//! 3. 按 `Content-Length` 截取请求体。
//! 4. 查询串与 `application/x-www-form-urlencoded` 表单参数的解析。

use crate::{exception::Exception, param::*};
use log::error;
use std::borrow::Cow;

/// 表示一个完整的 HTTP 请求。
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP 请求方法
    method: HttpRequestMethod,
    /// 已完成百分号解码的路径部分（不含查询串）
    path: String,
    /// 原始查询串（不含 `?`）
    query: String,
    /// HTTP 协议版本
    version: HttpVersion,
    /// 请求头，按出现顺序保存
    headers: Vec<(String, String)>,
    /// 请求体
    body: Vec<u8>,
}

impl Request {
    /// 以方法和请求目标（路径加可选查询串）直接构建请求。
    pub fn new(method: HttpRequestMethod, target: &str) -> Self {
        let (path, query) = split_target(target);
        Self {
            method,
            path: percent_decode_path(path).into_owned(),
            query: query.to_string(),
            version: HttpVersion::V1_1,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// 从原始字节缓冲区尝试构建 `Request` 实例。
    ///
    /// # 参数
    /// * `buffer` - 从网络 Socket 读取的原始数据。
    /// * `id` - 连接 ID，用于在多线程环境下追踪日志。
    ///
    /// # 错误处理
    /// 请求头必须以空行结束且是合法 UTF-8，版本只接受 HTTP/1.0 与 HTTP/1.1。
    pub fn try_from(buffer: &[u8], id: u128) -> Result<Self, Exception> {
        let header_end = match find_header_end(buffer) {
            Some(end) => end,
            None => {
                error!("[ID{}]HTTP请求头不完整", id);
                return Err(Exception::MalformedRequest);
            }
        };

        // 1. 请求头必须是合法的 UTF-8
        let head = match std::str::from_utf8(&buffer[..header_end]) {
            Ok(head) => head,
            Err(_) => {
                error!("[ID{}]无法解析HTTP请求", id);
                return Err(Exception::RequestIsNotUtf8);
            }
        };

        let mut request_lines = head.split(CRLF);

        // 2. 解析请求行 (e.g., "GET /index.html HTTP/1.1")
        let request_line = request_lines.next().unwrap_or_default();
        let first_line_parts: Vec<&str> = request_line.split(' ').collect();
        if first_line_parts.len() < 3 {
            error!("[ID{}]HTTP请求行格式不正确：{}", id, request_line);
            return Err(Exception::MalformedRequest);
        }

        let method: HttpRequestMethod = match first_line_parts[0].parse() {
            Ok(m) => m,
            Err(e) => {
                error!("[ID{}]不支持的HTTP请求方法：{}", id, first_line_parts[0]);
                return Err(e);
            }
        };

        let version_str = first_line_parts[first_line_parts.len() - 1].to_uppercase();
        let version = match version_str.as_str() {
            "HTTP/1.1" => HttpVersion::V1_1,
            "HTTP/1.0" => HttpVersion::V1_0,
            _ => {
                error!("[ID{}]不支持的HTTP协议版本：{}", id, &version_str);
                return Err(Exception::UnsupportedHttpVersion);
            }
        };

        // 路径中可能包含空格，虽然不规范但通过 join 尝试恢复
        let target = first_line_parts[1..first_line_parts.len() - 1].join(" ");
        let (path, query) = split_target(&target);

        // 3. 迭代各行解析 Headers
        let mut headers = Vec::new();
        for line in request_lines {
            if line.is_empty() {
                continue;
            }
            match line.split_once(':') {
                Some((name, value)) => {
                    headers.push((name.trim().to_string(), value.trim().to_string()))
                }
                None => {
                    error!("[ID{}]无法解析的请求头：{}", id, line);
                    return Err(Exception::MalformedRequest);
                }
            }
        }

        let mut request = Self {
            method,
            path: percent_decode_path(path).into_owned(),
            query: query.to_string(),
            version,
            headers,
            body: Vec::new(),
        };

        // 4. 按 Content-Length 截取请求体
        let body = &buffer[header_end + 4..];
        let body_len = request.content_length().unwrap_or(0).min(body.len());
        request.body = body[..body_len].to_vec();

        Ok(request)
    }

    /// 缓冲区中是否已经包含一个完整的请求，是则返回其总长度。
    ///
    /// 传输层据此判断还需不需要继续从 Socket 读取。
    pub fn frame_len(buffer: &[u8]) -> Option<usize> {
        let total = Self::expected_len(buffer)?;
        if buffer.len() >= total {
            Some(total)
        } else {
            None
        }
    }

    /// 请求头已经完整时，按 `Content-Length` 计算整个请求应有的长度。
    ///
    /// 长度溢出时返回 `usize::MAX`，传输层会把它当作超长请求拒绝。
    pub fn expected_len(buffer: &[u8]) -> Option<usize> {
        let header_end = find_header_end(buffer)?;
        let head = String::from_utf8_lossy(&buffer[..header_end]);
        let content_length = head
            .split(CRLF)
            .skip(1)
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        Some(
            header_end
                .checked_add(4)
                .and_then(|n| n.checked_add(content_length))
                .unwrap_or(usize::MAX),
        )
    }

    /// 解析查询串与表单请求体中的参数。
    ///
    /// 表单参数排在查询参数之前，同名参数由调用方决定取舍。
    pub fn form(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        let is_form = self
            .header("Content-Type")
            .map_or(false, |t| t.starts_with("application/x-www-form-urlencoded"));
        let has_body = matches!(
            self.method,
            HttpRequestMethod::Post | HttpRequestMethod::Put | HttpRequestMethod::Patch
        );
        if is_form && has_body {
            pairs.extend(url::form_urlencoded::parse(&self.body).into_owned());
        }
        pairs.extend(url::form_urlencoded::parse(self.query.as_bytes()).into_owned());
        pairs
    }
}

// --- Getter 访问器实现 ---

impl Request {
    pub fn version(&self) -> HttpVersion {
        self.version
    }

    /// 获取请求路径（不含查询参数）
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn method(&self) -> &HttpRequestMethod {
        &self.method
    }

    /// 按名称查找第一个匹配的请求头，大小写不敏感
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn user_agent(&self) -> &str {
        self.header("User-Agent").unwrap_or("")
    }

    pub fn content_length(&self) -> Option<usize> {
        self.header("Content-Length").and_then(|v| v.parse().ok())
    }
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|w| w == b"\r\n\r\n")
}

fn split_target(target: &str) -> (&str, &str) {
    match target.split_once('?') {
        Some((path, query)) => (path, query),
        None => (target, ""),
    }
}

/// 对路径做百分号解码，非法的转义序列原样保留。
fn percent_decode_path(s: &str) -> Cow<'_, str> {
    if !s.contains('%') {
        return Cow::Borrowed(s);
    }

    let bytes = s.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                result.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        result.push(bytes[i]);
        i += 1;
    }

    Cow::Owned(String::from_utf8_lossy(&result).into_owned())
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
