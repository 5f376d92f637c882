//! 广播中心 - 观众注册 + 快照扇出
//!
//! - 维护所有观众连接与频道成员
//! - 新连接立即收到欢迎消息
//! - 每次轮询成功后把快照推送给所有连接

mod broadcaster;
mod handler;
mod server;

pub use broadcaster::{Broadcaster, ConnId, MessageSender};
pub use handler::Handler;
pub use server::HubServer;
