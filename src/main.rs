// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 示例服务器
//!
//! 载入配置与日志，注册几条演示路由后开始监听。

use webrouter::{
    util::{new_cookie, slug},
    Config, Context, Server,
};

use log::{error, info, warn};
use tokio::runtime::Builder;

use std::process;

fn main() {
    // 1. 日志：log4rs 通过外部 YAML 配置级别与输出目的地
    if let Err(e) = log4rs::init_file("config/log4rs.yaml", Default::default()) {
        eprintln!("无法初始化日志系统：{}", e);
    }

    // 2. 配置：读取失败时使用默认值
    let config = match Config::from_toml("config/development.toml") {
        Ok(config) => {
            info!("配置文件已载入");
            config
        }
        Err(e) => {
            warn!("{}，使用默认配置", e);
            Config::new()
        }
    };
    let addr = config.listen_addr();

    // 3. 运行时：按配置分配工作线程
    let runtime = match Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("无法创建运行时：{}", e);
            process::exit(1);
        }
    };

    let mut server = Server::new(config);
    server
        .get("/", || "webrouter is running")
        .get("/hello/(.+)", |name: String| format!("hello {}", name))
        .get("/slug/(.+)", |title: String| slug(&title, "-"))
        .get("/add/([0-9]+)/([0-9]+)", |a: String, b: String| {
            match (a.parse::<u64>(), b.parse::<u64>()) {
                (Ok(a), Ok(b)) => a.checked_add(b).map_or("overflow".to_string(), |sum| sum.to_string()),
                _ => "overflow".to_string(),
            }
        })
        .get("/login/(.+)", |ctx: &mut Context, user: String| {
            ctx.set_cookie(&new_cookie("user", &user, 3600));
            ctx.redirect(302, "/");
        })
        .post("/echo", |ctx: &mut Context| {
            let mut params: Vec<_> = ctx.params().iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            params.sort();
            params.join("\n")
        });

    info!("服务端将在{}上监听Socket连接", addr);
    if let Err(e) = runtime.block_on(server.run(&addr)) {
        error!("服务器异常退出：{}", e);
        process::exit(1);
    }
}
