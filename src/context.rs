//! 每个请求独享的上下文。
//!
//! `Context` 在请求到达时创建，打包了原始请求、由查询串与表单解析出的参数、
//! 服务器配置以及正在构建的响应；处理函数可以把它声明为第一个参数，
//! 借助它直接写出响应。响应写出后上下文即被丢弃，从不在请求之间共享。

use crate::{
    config::Config,
    param::mime_by_extension,
    request::Request,
    response::{Response, ResponseWriter},
    util::Cookie,
};

use log::error;
use std::{collections::HashMap, io, sync::Arc};

pub struct Context {
    request: Request,
    params: HashMap<String, String>,
    config: Arc<Config>,
    response: Response,
}

impl Context {
    /// 为一个请求创建上下文，同名参数只保留第一个值。
    pub fn new(request: Request, config: Arc<Config>) -> Self {
        let mut params = HashMap::new();
        for (name, value) in request.form() {
            params.entry(name).or_insert(value);
        }
        Self {
            request,
            params,
            config,
            response: Response::new(),
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn set_param(&mut self, name: &str, value: &str) {
        self.params.insert(name.to_string(), value.to_string());
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn into_response(self) -> Response {
        self.response
    }

    pub fn write_string(&mut self, content: &str) {
        if let Err(e) = self.response.write(content.as_bytes()) {
            error!("写出响应正文失败：{}", e);
        }
    }

    /// 写出状态码和一段正文，常用于返回 4xx / 5xx。
    ///
    /// 调用之后处理函数的返回值不会再改变状态码。
    pub fn abort(&mut self, status: u16, body: &str) {
        self.response.write_header(status);
        self.write_string(body);
    }

    /// 3xx 重定向
    pub fn redirect(&mut self, status: u16, url: &str) {
        self.response.set_header("Location", url, true);
        self.response.write_header(status);
        self.write_string(&format!("Redirecting to: {}", url));
    }

    pub fn not_modified(&mut self) {
        self.response.write_header(304);
    }

    pub fn not_found(&mut self, message: &str) {
        self.response.write_header(404);
        self.write_string(message);
    }

    /// 设置 `Content-Type`。
    ///
    /// 含有 `/` 的值原样使用，否则当作扩展名在 MIME 表中查找。
    /// 返回实际设置的类型，未找到时返回空串且不修改响应头。
    pub fn content_type(&mut self, val: &str) -> String {
        let ctype = if val.contains('/') {
            Some(val)
        } else {
            mime_by_extension(val)
        };
        match ctype {
            Some(ctype) => {
                self.response.set_header("Content-Type", ctype, true);
                ctype.to_string()
            }
            None => String::new(),
        }
    }

    /// 追加一个 `Set-Cookie` 响应头
    pub fn set_cookie(&mut self, cookie: &Cookie) {
        self.response.set_header("Set-Cookie", &cookie.to_string(), false);
    }
}

impl ResponseWriter for Context {
    fn set_header(&mut self, name: &str, value: &str, unique: bool) {
        self.response.set_header(name, value, unique);
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.response.header(name)
    }

    fn write_header(&mut self, status: u16) {
        self.response.write_header(status);
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.response.write(data)
    }
}
