//! vote-result - 实时计票推送服务
//!
//! 周期性地从关系库聚合各选项票数，并通过 WebSocket 推送给所有在线观众。
//!
//! # 核心组件
//!
//! - **存储连接器** ([`store`]): 带固定间隔、有限次数重试的连接建立
//! - **聚合器** ([`aggregator`]): 定时查询 → 规整为快照 → 推送
//! - **广播中心** ([`hub`]): 观众注册、频道成员、快照扇出
//! - **进程监督器** ([`supervisor`]): 组装以上组件，管理启动状态机
//!
//! # Feature Flags
//!
//! - `postgres`: PostgreSQL 后端（默认开启）；关闭后只支持本地 SQLite

pub mod aggregator;
pub mod config;
pub mod error;
pub mod hub;
pub mod protocol;
pub mod schema;
pub mod store;
pub mod supervisor;
pub mod types;

// Re-exports
pub use aggregator::{normalize, Aggregator};
pub use config::{AppConfig, ConnectionMode, ServerConfig, StoreConfig};
pub use error::{Error, Result};
pub use hub::{Broadcaster, ConnId, HubServer};
pub use protocol::{ClientEvent, Push};
pub use store::{connect_with_retry, Connector, RetryPolicy, StoreConnector, VoteSource};
pub use supervisor::{State, Supervisor};
pub use types::{RawRow, Snapshot};
