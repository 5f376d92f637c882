//! 数据库 Schema 定义

/// 固定的聚合查询：按类别分组统计投票数
pub const AGGREGATE_QUERY: &str = "SELECT vote, COUNT(id) AS count FROM votes GROUP BY vote";

/// 投票表（本地 SQLite 模式使用；远程模式下表由投票写入端维护）
pub const VOTES_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS votes (
    id TEXT NOT NULL PRIMARY KEY,  -- voter_id，每个投票人只保留一票
    vote TEXT NOT NULL
);
"#;

/// 写入或覆盖一个投票人的选择
pub const UPSERT_VOTE_SQL: &str =
    "INSERT INTO votes (id, vote) VALUES (?1, ?2) ON CONFLICT(id) DO UPDATE SET vote = excluded.vote";
