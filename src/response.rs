//! 缓冲式 HTTP 响应。
//!
//! 处理函数、静态文件和分发器都只通过 [`ResponseWriter`] 的
//! 设置头 / 写状态 / 写正文三种操作与响应交互；传输层在分发结束后
//! 调用 [`Response::as_bytes`] 得到完整的报文。

use crate::param::*;

use bytes::{Bytes, BytesMut};
use log::{debug, warn};

use std::io;

/// 传输层提供给分发核心的可写响应。
pub trait ResponseWriter {
    /// 设置响应头。`unique` 为真时覆盖同名头，否则追加一条。
    fn set_header(&mut self, name: &str, value: &str, unique: bool);

    /// 读取第一个同名响应头，大小写不敏感。
    fn header(&self, name: &str) -> Option<&str>;

    /// 写出状态行。只有第一次调用生效，之后头部被冻结。
    fn write_header(&mut self, status: u16);

    /// 追加正文。尚未写状态时隐式写出 200。
    fn write(&mut self, data: &[u8]) -> io::Result<usize>;
}

#[derive(Debug, Clone, Default)]
pub struct Response {
    status_code: Option<u16>,
    headers: Vec<(String, String)>,
    content: BytesMut,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    /// 构建一个带固定正文的响应，供传输层在请求无法解析时使用。
    pub fn from_status(code: u16, body: &str) -> Self {
        let mut response = Self::new();
        response.set_header("Content-Type", "text/plain; charset=utf-8", true);
        response.write_header(code);
        response.content.extend_from_slice(body.as_bytes());
        response
    }

    /// 序列化为 HTTP/1.x 报文。
    ///
    /// `headonly` 为真（HEAD 请求）时保留 `Content-Length` 但省略正文。
    pub fn as_bytes(&self, version: HttpVersion, headonly: bool) -> Vec<u8> {
        let status_code = self.status_code();
        let mut header = format!("{} {} {}{}", version, status_code, status_text(status_code), CRLF);
        for (name, value) in &self.headers {
            header.push_str(&[name.as_str(), ": ", value.as_str(), CRLF].concat());
        }
        if self.header("Content-Length").is_none() {
            header.push_str(&format!("Content-Length: {}{}", self.content.len(), CRLF));
        }
        header.push_str(&["Connection: close", CRLF, CRLF].concat());

        let body: &[u8] = match headonly {
            true => b"",
            false => &self.content,
        };
        [header.as_bytes(), body].concat()
    }
}

impl Response {
    /// 当前状态码，未显式写出时为 200
    pub fn status_code(&self) -> u16 {
        self.status_code.unwrap_or(200)
    }

    pub fn information(&self) -> &'static str {
        status_text(self.status_code())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> Bytes {
        self.content.clone().freeze()
    }

    pub fn wrote_header(&self) -> bool {
        self.status_code.is_some()
    }
}

impl ResponseWriter for Response {
    fn set_header(&mut self, name: &str, value: &str, unique: bool) {
        if self.wrote_header() {
            debug!("响应头已写出，忽略对{}的修改", name);
            return;
        }
        if unique {
            self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        }
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn write_header(&mut self, status: u16) {
        match self.status_code {
            Some(code) => warn!("重复写出状态码：已是{}，忽略{}", code, status),
            None => self.status_code = Some(status),
        }
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if !self.wrote_header() {
            self.write_header(200);
        }
        self.content.extend_from_slice(data);
        Ok(data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(response: &Response, headonly: bool) -> String {
        String::from_utf8(response.as_bytes(HttpVersion::V1_1, headonly)).unwrap()
    }

    #[test]
    fn test_response_new() {
        let response = Response::new();
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.information(), "OK");
        assert!(!response.wrote_header());
    }

    #[test]
    fn test_response_as_bytes_basic() {
        let text = wire(&Response::new(), false);
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Length: 0\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_response_as_bytes_with_content() {
        let mut response = Response::new();
        response.set_header("Content-Type", "text/plain", true);
        response.write(b"Hello").unwrap();

        let text = wire(&response, false);
        assert!(text.contains("Content-Type: text/plain\r\n"));
        assert!(text.contains("Content-Length: 5\r\n"));
        assert!(text.ends_with("Hello"));
    }

    #[test]
    fn test_head_keeps_length_drops_body() {
        let mut response = Response::new();
        response.write(b"Hello").unwrap();

        let text = wire(&response, true);
        assert!(text.contains("Content-Length: 5\r\n"));
        assert!(!text.contains("Hello"));
    }

    #[test]
    fn test_unique_header_replaces_and_append_adds() {
        let mut response = Response::new();
        response.set_header("X-Tag", "a", true);
        response.set_header("x-tag", "b", true);
        response.set_header("Set-Cookie", "a=1", false);
        response.set_header("Set-Cookie", "b=2", false);

        let tags: Vec<_> = response.headers().iter().filter(|(n, _)| n == "x-tag").collect();
        assert_eq!(tags.len(), 1);
        assert_eq!(response.header("X-TAG"), Some("b"));
        let text = wire(&response, false);
        assert!(text.contains("Set-Cookie: a=1\r\nSet-Cookie: b=2\r\n"));
    }

    #[test]
    fn test_headers_frozen_after_write_header() {
        let mut response = Response::new();
        response.write_header(404);
        response.set_header("X-Late", "1", true);
        response.write_header(500);

        assert_eq!(response.status_code(), 404);
        assert!(response.header("X-Late").is_none());
    }

    #[test]
    fn test_write_implies_200() {
        let mut response = Response::new();
        response.write(b"x").unwrap();
        assert!(response.wrote_header());
        assert_eq!(response.status_code(), 200);
    }

    #[test]
    fn test_from_status() {
        let response = Response::from_status(400, "Bad Request");
        let text = wire(&response, false);
        assert!(text.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(text.ends_with("\r\n\r\nBad Request"));
    }
}
