//! # 服务器
//!
//! `Server` 持有路由表、配置与静态文件解析器。路由在开始服务之前注册，
//! 开始服务后整个 `Server` 被放进 `Arc` 只读共享，不再需要任何锁。
//!
//! 传输层基于 Tokio：每个连接一个任务，读到完整的请求后把同步的分发过程
//! 放到阻塞线程池执行，写出响应后关闭连接。

use crate::{
    config::Config,
    dispatch,
    handler::{Handler, IntoHandler},
    param::*,
    request::Request,
    response::Response,
    route::RouteTable,
    static_files::{StaticDir, StaticFiles},
};

use log::{debug, error, info, warn};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::Notify,
};

use std::{io, sync::Arc, time::Duration, time::Instant};

pub struct Server {
    config: Arc<Config>,
    routes: RouteTable,
    static_files: Box<dyn StaticFiles + Send + Sync>,
    shutdown: Arc<Notify>,
}

/// 用于从其它任务停止服务器的句柄
#[derive(Clone)]
pub struct ServerHandle {
    shutdown: Arc<Notify>,
}

impl ServerHandle {
    /// 停止接受新连接；已经在处理中的连接会继续完成。
    pub fn close(&self) {
        self.shutdown.notify_one();
    }
}

impl Server {
    pub fn new(config: Config) -> Self {
        let static_files = StaticDir::from_config(&config);
        Self {
            config: Arc::new(config),
            routes: RouteTable::new(),
            static_files: Box::new(static_files),
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// 替换静态文件解析器
    pub fn with_static_files<S>(mut self, static_files: S) -> Self
    where
        S: StaticFiles + Send + Sync + 'static,
    {
        self.static_files = Box::new(static_files);
        self
    }

    pub fn get<M>(&mut self, pattern: &str, handler: impl IntoHandler<M>) -> &mut Self {
        self.add_route(pattern, HttpRequestMethod::Get, handler.into_handler())
    }

    pub fn post<M>(&mut self, pattern: &str, handler: impl IntoHandler<M>) -> &mut Self {
        self.add_route(pattern, HttpRequestMethod::Post, handler.into_handler())
    }

    pub fn put<M>(&mut self, pattern: &str, handler: impl IntoHandler<M>) -> &mut Self {
        self.add_route(pattern, HttpRequestMethod::Put, handler.into_handler())
    }

    pub fn delete<M>(&mut self, pattern: &str, handler: impl IntoHandler<M>) -> &mut Self {
        self.add_route(pattern, HttpRequestMethod::Delete, handler.into_handler())
    }

    /// 为任意方法注册路由，方法名不合法时记录错误并忽略该路由。
    pub fn match_method<M>(&mut self, method: &str, pattern: &str, handler: impl IntoHandler<M>) -> &mut Self {
        match method.parse::<HttpRequestMethod>() {
            Ok(method) => self.add_route(pattern, method, handler.into_handler()),
            Err(e) => {
                error!("无法注册路由{}：{}（{}）", pattern, e, method);
                self
            }
        }
    }

    /// 模式无法编译时记录错误，路由不会被加入路由表。
    pub fn add_route(&mut self, pattern: &str, method: HttpRequestMethod, handler: Handler) -> &mut Self {
        if let Err(e) = self.routes.register(pattern, method, handler) {
            error!("{}", e);
        }
        self
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            shutdown: Arc::clone(&self.shutdown),
        }
    }

    /// 同步地处理一个已解析的请求
    pub fn process(&self, request: Request, id: u128) -> Response {
        dispatch::dispatch(&self.routes, self.static_files.as_ref(), &self.config, request, id)
    }

    /// 绑定 `addr` 并开始服务，直到 [`ServerHandle::close`] 被调用。
    pub async fn run(self, addr: &str) -> io::Result<()> {
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            error!("无法绑定地址：{}，错误：{}", addr, e);
            e
        })?;
        self.serve(listener).await
    }

    /// 在已绑定的监听器上服务
    pub async fn serve(self, listener: TcpListener) -> io::Result<()> {
        info!("{} serving {}", SERVER_NAME, listener.local_addr()?);
        let server = Arc::new(self);
        let mut id: u128 = 0;

        loop {
            let accepted = tokio::select! {
                _ = server.shutdown.notified() => {
                    info!("接收到停机指令，停止接受新连接");
                    break;
                }
                accepted = listener.accept() => accepted,
            };
            let (stream, addr) = match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("接受连接失败：{}", e);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    continue;
                }
            };
            debug!("[ID{}]TCP连接已建立：{}", id, addr);
            tokio::spawn(handle_connection(Arc::clone(&server), stream, id));
            id += 1;
        }
        Ok(())
    }
}

/// # 连接处理器
///
/// 读取完整的请求，分发，写出响应并关闭连接。
async fn handle_connection(server: Arc<Server>, mut stream: TcpStream, id: u128) {
    let limit = server.config.max_request_size();
    let mut buffer = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    let frame = loop {
        let expected = Request::expected_len(&buffer);
        if let Some(len) = expected.filter(|len| *len <= buffer.len()) {
            break len;
        }
        if buffer.len() > limit || expected.map_or(false, |len| len > limit) {
            warn!("[ID{}]请求超过{}字节，返回413", id, limit);
            send(&mut stream, &Response::from_status(413, "Request Entity Too Large"), HttpVersion::V1_1, false, id).await;
            return;
        }
        match stream.read(&mut chunk).await {
            Ok(0) if buffer.is_empty() => {
                debug!("[ID{}]客户端关闭了连接", id);
                return;
            }
            Ok(0) => break buffer.len(),
            Ok(n) => buffer.extend_from_slice(&chunk[..n]),
            Err(e) => {
                error!("[ID{}]读取TCPStream时遇到错误: {}", id, e);
                return;
            }
        }
    };
    debug!("[ID{}]HTTP请求接收完毕", id);

    let request = match Request::try_from(&buffer[..frame], id) {
        Ok(request) => request,
        Err(e) => {
            warn!("[ID{}]解析HTTP请求失败: {}，返回400", id, e);
            send(&mut stream, &Response::from_status(400, "Bad Request"), HttpVersion::V1_1, false, id).await;
            return;
        }
    };

    let start_time = Instant::now();
    let version = request.version();
    let headonly = *request.method() == HttpRequestMethod::Head;
    let summary = format!("{}, {}, {}", version, request.method(), request.path());
    let user_agent = request.user_agent().to_string();

    let worker = Arc::clone(&server);
    let response = match tokio::task::spawn_blocking(move || worker.process(request, id)).await {
        Ok(response) => response,
        Err(e) => {
            error!("[ID{}]处理请求时发生未被拦截的故障: {}", id, e);
            return;
        }
    };
    debug!(
        "[ID{}]HTTP响应构建完成，服务端用时{}ms。",
        id,
        start_time.elapsed().as_millis()
    );
    info!(
        "[ID{}] {}, {}, {}, {}",
        id,
        summary,
        response.status_code(),
        response.information(),
        user_agent,
    );

    send(&mut stream, &response, version, headonly, id).await;
}

async fn send(stream: &mut TcpStream, response: &Response, version: HttpVersion, headonly: bool, id: u128) {
    let bytes = response.as_bytes(version, headonly);
    if let Err(e) = stream.write_all(&bytes).await {
        error!("[ID{}]Error during write: {}", id, e);
        return;
    }
    let _ = stream.flush().await;
    let _ = stream.shutdown().await;
}
