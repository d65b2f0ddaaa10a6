//! 接入运行时错误类型。

/// 订阅缓存前置条件错误。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    #[error("node not onboarded: {0}")]
    NotOnboarded(String),
}

/// 接入运行时错误。
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("unresolvable broker host: {0}")]
    UnresolvableHost(String),
    #[error("dispatcher stopped")]
    Shutdown,
}

impl From<gateway_storage::StorageError> for IngestError {
    fn from(err: gateway_storage::StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}
