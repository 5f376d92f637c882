//! 进程配置
//!
//! 所有配置项都可以通过环境变量覆盖，缺省时使用固定默认值，
//! 因此没有任何显式配置也能启动。

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::store::RetryPolicy;

pub const DEFAULT_POSTGRES_HOST: &str = "postgres-5432-tcp.vote-app.local";
pub const DEFAULT_POSTGRES_PORT: u16 = 5432;
pub const DEFAULT_POSTGRES_DB: &str = "postgres";
pub const DEFAULT_POSTGRES_USER: &str = "postgres";
pub const DEFAULT_POSTGRES_PASSWORD: &str = "postgres";
pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_RETRY_TIMES: u32 = 1000;
pub const DEFAULT_RETRY_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_CATEGORIES: &[&str] = &["a", "b"];

/// 连接模式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionMode {
    /// 远程 PostgreSQL
    Remote,
    /// 本地 SQLite 文件
    Local(PathBuf),
}

/// 存储连接配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    /// 连接模式
    pub mode: ConnectionMode,
}

impl StoreConfig {
    /// 创建本地 SQLite 配置
    pub fn local<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            mode: ConnectionMode::Local(path.into()),
            ..Self::from_lookup(|_| None)
        }
    }

    /// 从环境变量创建配置
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源创建配置（`VOTE_SQLITE_PATH` 存在时使用本地模式）
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = match lookup("VOTE_SQLITE_PATH") {
            Some(path) if !path.is_empty() => ConnectionMode::Local(PathBuf::from(path)),
            _ => ConnectionMode::Remote,
        };

        Self {
            host: lookup("POSTGRES_HOST").unwrap_or_else(|| DEFAULT_POSTGRES_HOST.to_string()),
            port: parse_or(&lookup, "POSTGRES_PORT", DEFAULT_POSTGRES_PORT),
            database: lookup("POSTGRES_DB").unwrap_or_else(|| DEFAULT_POSTGRES_DB.to_string()),
            user: lookup("POSTGRES_USER").unwrap_or_else(|| DEFAULT_POSTGRES_USER.to_string()),
            password: lookup("POSTGRES_PASSWORD")
                .unwrap_or_else(|| DEFAULT_POSTGRES_PASSWORD.to_string()),
            mode,
        }
    }

    /// 日志用的目标描述（不含密码）
    pub fn describe(&self) -> String {
        match &self.mode {
            ConnectionMode::Remote => format!(
                "postgres://{}@{}:{}/{}",
                self.user, self.host, self.port, self.database
            ),
            ConnectionMode::Local(path) => format!("sqlite://{}", path.display()),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// 服务配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// WebSocket 监听端口
    pub port: u16,
    /// 轮询间隔
    pub poll_interval: Duration,
    /// 启动连接重试策略
    pub retry: RetryPolicy,
    /// 已知投票类别（快照中始终存在）
    pub known_categories: Vec<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let known_categories = lookup("VOTE_CATEGORIES")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(String::from)
                    .collect::<Vec<_>>()
            })
            .filter(|list| !list.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect());

        Self {
            port: parse_or(&lookup, "PORT", DEFAULT_PORT),
            poll_interval: Duration::from_millis(parse_or(
                &lookup,
                "POLL_INTERVAL_MS",
                DEFAULT_POLL_INTERVAL_MS,
            )),
            retry: RetryPolicy {
                times: parse_or(&lookup, "DB_RETRY_TIMES", DEFAULT_RETRY_TIMES),
                interval: Duration::from_millis(parse_or(
                    &lookup,
                    "DB_RETRY_INTERVAL_MS",
                    DEFAULT_RETRY_INTERVAL_MS,
                )),
            },
            known_categories,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// 完整进程配置
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            store: StoreConfig::from_env(),
            server: ServerConfig::from_env(),
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Invalid {}={:?}, falling back to {}", key, raw, default);
                default
            }
        },
        None => default,
    }
}
