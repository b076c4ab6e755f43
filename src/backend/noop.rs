//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 空缓存后端：读取总是未命中，写入和删除被忽略。

use super::CacheBackend;
use crate::error::Result;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBackend;

#[async_trait]
impl CacheBackend for NoopBackend {
    async fn get_bytes(&self, _key: &str) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }

    async fn set_bytes(&self, _key: &str, _value: Vec<u8>, _ttl_secs: u64) -> Result<()> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<()> {
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}
