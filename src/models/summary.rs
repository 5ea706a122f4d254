use serde::Serialize;
use std::collections::BTreeMap;

use super::target::AnalysisTarget;

/// 单个编辑的统计
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    /// 该编辑的文章总数（含失败）
    pub article_count: usize,
    /// 成功评分的文章数
    pub scored_count: usize,
    /// 平均分；全部失败时为 None
    pub average_score: Option<f64>,
}

/// 排行榜中的一条
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    /// 在输入序列中的位置（从 0 开始）
    pub index: usize,
    #[serde(flatten)]
    pub target: AnalysisTarget,
    pub score: f64,
}

/// 汇总统计，每次按需从结果重新计算，不持久化
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub total_count: usize,
    pub success_count: usize,
    pub failure_count: usize,
    /// 不同编辑的数量
    pub group_count: usize,
    /// 平均分（失败不计入分母）；没有任何成功时为 None
    pub average_score: Option<f64>,
    pub per_group: BTreeMap<String, GroupStats>,
    pub top: Vec<RankedEntry>,
    pub bottom: Vec<RankedEntry>,
}

impl SummaryStats {
    /// 编辑 → 平均分 映射（跳过没有成功结果的编辑）
    pub fn per_group_average(&self) -> BTreeMap<&str, f64> {
        self.per_group
            .iter()
            .filter_map(|(group, stats)| stats.average_score.map(|avg| (group.as_str(), avg)))
            .collect()
    }
}
