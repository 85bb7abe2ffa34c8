use std::io;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use bytes::Bytes;
use lru::LruCache;

/// 静态文件内容的 LRU 缓存，按修改时间判定缓存是否仍然有效。
pub struct FileCache {
    cache: LruCache<PathBuf, (Bytes, SystemTime)>,
}

impl FileCache {
    // 容量为 0 时按 1 处理
    pub fn from_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
        }
    }

    // 查询有效缓存
    pub fn find(&mut self, path: &Path, modified_time: SystemTime) -> Option<Bytes> {
        match self.cache.get(path) {
            Some((content, cached_time)) if *cached_time == modified_time => Some(content.clone()),
            _ => None,
        }
    }

    pub fn push(&mut self, path: &Path, content: Bytes, modified_time: SystemTime) {
        self.cache.put(path.to_path_buf(), (content, modified_time));
    }

    /// 命中则直接返回，否则调用 `load` 读取并放入缓存。
    pub fn get_or_load<F>(&mut self, path: &Path, modified_time: SystemTime, load: F) -> io::Result<Bytes>
    where
        F: FnOnce(&Path) -> io::Result<Vec<u8>>,
    {
        if let Some(content) = self.find(path, modified_time) {
            return Ok(content);
        }
        let content = Bytes::from(load(path)?);
        self.push(path, content.clone(), modified_time);
        Ok(content)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
