use num_cpus;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use log::{error, warn};
use std::fs::File;
use std::io::prelude::*;
use std::path::{Path, PathBuf};

use crate::exception::Exception;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_addr")]
    addr: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    worker_threads: usize,
    #[serde(default)]
    static_dir: Option<PathBuf>,
    #[serde(default = "default_recover_panic")]
    recover_panic: bool,
    #[serde(default = "default_cache_size")]
    cache_size: usize,
    #[serde(default = "default_max_request_size")]
    max_request_size: usize,
}

fn default_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9999
}

fn default_recover_panic() -> bool {
    true
}

fn default_cache_size() -> usize {
    32
}

fn default_max_request_size() -> usize {
    1048576 // 1MB
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            addr: default_addr(),
            port: default_port(),
            worker_threads: num_cpus::get(),
            static_dir: None,
            recover_panic: default_recover_panic(),
            cache_size: default_cache_size(),
            max_request_size: default_max_request_size(),
        }
    }

    /// 从 TOML 文件加载配置。
    ///
    /// 文件无法读取时返回 `ConfigUnreadable`；内容无法解析时记录错误并使用默认配置。
    pub fn from_toml(filename: impl AsRef<Path>) -> Result<Self, Exception> {
        let filename = filename.as_ref();
        let unreadable = |e: std::io::Error| Exception::ConfigUnreadable {
            path: filename.display().to_string(),
            reason: e.to_string(),
        };
        let mut file = File::open(filename).map_err(unreadable)?;
        let mut str_val = String::new();
        file.read_to_string(&mut str_val).map_err(unreadable)?;
        Ok(Self::from_toml_str(&str_val))
    }

    pub fn from_toml_str(content: &str) -> Self {
        let mut raw_config: Config = match toml::from_str(content) {
            Ok(t) => t,
            Err(e) => {
                error!("无法成功从配置文件构建配置对象，使用默认配置：{}", e);
                Config::new()
            }
        };
        if raw_config.worker_threads == 0 {
            raw_config.worker_threads = num_cpus::get();
        }
        if raw_config.cache_size == 0 {
            warn!("cache_size被设置为0，但目前尚不支持禁用缓存，因此该值将被改为{}。", default_cache_size());
            raw_config.cache_size = default_cache_size();
        }
        raw_config
    }

    pub fn with_recover_panic(mut self, recover_panic: bool) -> Self {
        self.recover_panic = recover_panic;
        self
    }

    pub fn with_static_dir(mut self, static_dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(static_dir.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_max_request_size(mut self, max_request_size: usize) -> Self {
        self.max_request_size = max_request_size;
        self
    }
}

impl Config {
    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `addr:port` 形式的监听地址
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn static_dir(&self) -> Option<&Path> {
        self.static_dir.as_deref()
    }

    pub fn recover_panic(&self) -> bool {
        self.recover_panic
    }

    pub fn cache_size(&self) -> usize {
        self.cache_size
    }

    pub fn max_request_size(&self) -> usize {
        self.max_request_size
    }
}
