//! # 静态文件解析
//!
//! 分发器在扫描路由之前（以及未命中路由后查找目录首页时）询问静态文件解析器
//! 请求路径是否对应一个静态文件。解析器只负责回答「有没有」和「内容是什么」，
//! 响应头的设置由分发器完成。

use crate::{cache::FileCache, config::Config};

use bytes::Bytes;
use log::{debug, warn};

use std::{
    fs, io,
    path::{Component, Path, PathBuf},
    sync::Mutex,
};

/// 静态文件解析器接口。
#[cfg_attr(test, mockall::automock)]
pub trait StaticFiles {
    /// 请求路径对应的文件存在时返回其物理路径；目录不算匹配。
    fn resolve(&self, name: &str) -> Option<PathBuf>;

    /// 读取文件内容
    fn read(&self, path: &Path) -> io::Result<Bytes> {
        fs::read(path).map(Bytes::from)
    }
}

/// 基于文件系统目录的静态文件解析器，带修改时间校验的 LRU 缓存。
pub struct StaticDir {
    dirs: Vec<PathBuf>,
    cache: Mutex<FileCache>,
}

impl StaticDir {
    pub fn new(dirs: Vec<PathBuf>, cache_size: usize) -> Self {
        Self {
            dirs,
            cache: Mutex::new(FileCache::from_capacity(cache_size)),
        }
    }

    /// 配置了 `static_dir` 时只搜索该目录，否则依次搜索可执行文件旁的 `static/`
    /// 和当前工作目录下的 `static/`。
    pub fn from_config(config: &Config) -> Self {
        let dirs = match config.static_dir() {
            Some(dir) => vec![dir.to_path_buf()],
            None => default_static_dirs(),
        };
        debug!("静态文件目录：{:?}", dirs);
        Self::new(dirs, config.cache_size())
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }
}

impl StaticFiles for StaticDir {
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let relative = sanitize(name)?;
        self.dirs
            .iter()
            .map(|dir| dir.join(&relative))
            .find(|candidate| candidate.is_file())
    }

    fn read(&self, path: &Path) -> io::Result<Bytes> {
        let modified = fs::metadata(path)?.modified()?;
        let mut cache = match self.cache.lock() {
            Ok(lock) => lock,
            Err(poisoned) => {
                warn!("缓存锁被污染，恢复并继续");
                poisoned.into_inner()
            }
        };
        cache.get_or_load(path, modified, |p| fs::read(p))
    }
}

fn default_static_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(parent) = std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf)) {
        dirs.push(parent.join("static"));
    }
    if let Ok(wd) = std::env::current_dir() {
        dirs.push(wd.join("static"));
    }
    dirs
}

/// 把请求路径转换为相对路径；包含 `..` 时拒绝，防止目录遍历。
fn sanitize(name: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for component in Path::new(name.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if relative.as_os_str().is_empty() {
        return None;
    }
    Some(relative)
}
