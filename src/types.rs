//! 数据类型定义

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// 聚合查询返回的一行原始数据
///
/// 计数以文本形式保存，由 [`crate::aggregator::normalize`] 负责解析。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 投票类别
    pub category: String,
    /// 该类别的计数（原始文本）
    pub count: String,
}

impl RawRow {
    pub fn new(category: impl Into<String>, count: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            count: count.into(),
        }
    }
}

/// 某一时刻的计票快照：类别 → 票数
///
/// 快照构造后不可变，每次轮询生成一个全新的值。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(BTreeMap<String, u64>);

impl Snapshot {
    /// 获取某个类别的票数
    pub fn get(&self, category: &str) -> Option<u64> {
        self.0.get(category).copied()
    }

    /// 序列化为 JSON 对象文本，如 `{"a":3,"b":0}`
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.0)?)
    }
}

impl From<BTreeMap<String, u64>> for Snapshot {
    fn from(map: BTreeMap<String, u64>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, u64)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
