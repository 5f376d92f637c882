//! 错误类型定义

use thiserror::Error;

/// 库错误类型
#[derive(Error, Debug)]
pub enum Error {
    /// SQLite 错误
    #[error("数据库错误: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    /// WebSocket 传输错误
    #[error("WebSocket 错误: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 连接错误（单次连接尝试失败）
    #[error("连接错误: {0}")]
    Connection(String),

    /// 查询错误（单次轮询失败）
    #[error("查询错误: {0}")]
    Query(String),

    /// 重试次数耗尽
    #[error("连接重试耗尽: 共尝试 {attempts} 次")]
    RetryExhausted { attempts: u32 },

    /// 其他错误
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, Error>;
