//! # 请求分发
//!
//! 一个请求的完整生命周期：
//! 1. 创建上下文，写入 `Server`、`Date` 响应头；
//! 2. GET / HEAD 先尝试静态文件，命中则直接返回；
//! 3. 按注册顺序扫描路由表，命中后绑定参数并在调用边界内执行处理函数；
//! 4. 未命中时 GET / HEAD 再尝试目录下的 `index.html`、`index.htm`；
//! 5. 仍未命中则回复 404。
//!
//! 开启 `recover_panic`（默认）时，参数不匹配或处理函数内部的 panic
//! 都被限制在调用边界内：记录故障信息与调用栈后回复 500，后续请求照常处理。
//! 关闭后故障不再被拦截，交由外层任务自己的崩溃策略处理，仅用于开发调试。

use crate::{
    config::Config,
    context::Context,
    exception::DispatchFault,
    handler::{Arguments, Handler, Reply},
    param::*,
    request::Request,
    response::{Response, ResponseWriter},
    route::RouteTable,
    static_files::StaticFiles,
    util::web_time,
};

use chrono::Utc;
use log::{debug, error, info};

use std::{
    any::Any,
    backtrace::Backtrace,
    cell::{Cell, RefCell},
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Once},
};

/// 分发一个已解析的请求，返回待写出的响应。
pub fn dispatch(
    routes: &RouteTable,
    statics: &dyn StaticFiles,
    config: &Arc<Config>,
    request: Request,
    id: u128,
) -> Response {
    let mut ctx = Context::new(request, Arc::clone(config));
    let method = ctx.request().method().clone();
    let path = ctx.request().path().to_string();

    info!("[ID{}]{} {}", id, method, path);
    if !ctx.params().is_empty() {
        info!("[ID{}]Params: {:?}", id, ctx.params());
    }

    ctx.set_header("Server", SERVER_NAME, true);
    ctx.set_header("Date", &web_time(Utc::now()), true);

    if method.is_safe_read() && try_serving_file(statics, &mut ctx, &path, id) {
        return ctx.into_response();
    }

    ctx.set_header("Content-Type", DEFAULT_CONTENT_TYPE, true);

    if let Some(matched) = routes.find(&path, &method) {
        debug!("[ID{}]命中路由：{}", id, matched.route.pattern());
        let handler = matched.route.handler();
        let args = handler.bind(matched.captures, &mut ctx);
        match invoke(handler, args, config.recover_panic(), id) {
            Ok(reply) => {
                if let Some(payload) = reply.into_payload() {
                    ctx.set_header("Content-Length", &payload.len().to_string(), true);
                    if let Err(e) = ctx.write(&payload) {
                        error!("[ID{}]Error during write: {}", id, e);
                    }
                }
            }
            Err(_) => ctx.abort(500, SERVER_ERROR_BODY),
        }
        return ctx.into_response();
    }

    if method.is_safe_read() {
        let dir = path.trim_end_matches('/');
        for index in INDEX_FILES {
            if try_serving_file(statics, &mut ctx, &format!("{}/{}", dir, index), id) {
                return ctx.into_response();
            }
        }
    }

    debug!("[ID{}]没有匹配的路由：{}", id, path);
    ctx.abort(404, NOT_FOUND_BODY);
    ctx.into_response()
}

/// 请求路径对应一个静态文件时写出其内容并返回 `true`。
fn try_serving_file(statics: &dyn StaticFiles, ctx: &mut Context, name: &str, id: u128) -> bool {
    let Some(file) = statics.resolve(name) else {
        return false;
    };
    let content = match statics.read(&file) {
        Ok(content) => content,
        Err(e) => {
            error!("[ID{}]读取静态文件{}失败：{}", id, file.display(), e);
            return false;
        }
    };
    debug!("[ID{}]静态文件命中：{}", id, file.display());

    let ctype = file
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(mime_by_extension)
        .unwrap_or("application/octet-stream");
    ctx.set_header("Content-Type", ctype, true);
    ctx.set_header("Content-Length", &content.len().to_string(), true);
    if let Err(e) = ctx.write(&content) {
        error!("[ID{}]Error during write: {}", id, e);
    }
    true
}

thread_local! {
    static CONTAINED: Cell<bool> = const { Cell::new(false) };
    static LAST_TRACE: RefCell<Option<Backtrace>> = const { RefCell::new(None) };
}

static TRACE_HOOK: Once = Once::new();

/// 安装一次全局 panic hook：在调用边界内发生的 panic 只记录调用栈，
/// 其它 panic 交给原来的 hook。
fn install_trace_hook() {
    TRACE_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if CONTAINED.with(Cell::get) {
                LAST_TRACE.with(|slot| *slot.borrow_mut() = Some(Backtrace::force_capture()));
            } else {
                previous(info);
            }
        }));
    });
}

/// 在调用边界内执行处理函数。
pub fn invoke(handler: &Handler, args: Arguments<'_>, recover: bool, id: u128) -> Result<Reply, DispatchFault> {
    if !recover {
        return match handler.call(args) {
            Ok(reply) => Ok(reply),
            Err(fault) => panic!("[ID{}]{}", id, fault),
        };
    }

    install_trace_hook();
    CONTAINED.with(|flag| flag.set(true));
    let result = panic::catch_unwind(AssertUnwindSafe(|| handler.call(args)));
    CONTAINED.with(|flag| flag.set(false));

    let fault = match result {
        Ok(Ok(reply)) => {
            // 处理函数内部自行捕获的 panic 也会留下调用栈
            LAST_TRACE.with(|slot| slot.borrow_mut().take());
            return Ok(reply);
        }
        Ok(Err(fault)) => fault,
        Err(payload) => DispatchFault::Panicked {
            message: panic_message(payload.as_ref()),
        },
    };

    error!("[ID{}]Handler crashed with error: {}", id, fault);
    match LAST_TRACE.with(|slot| slot.borrow_mut().take()) {
        Some(trace) => {
            for frame in trace.to_string().lines() {
                error!("[ID{}]    {}", id, frame.trim());
            }
        }
        None => error!("[ID{}]    (没有可用的调用栈)", id),
    }
    Err(fault)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
