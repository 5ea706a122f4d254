//! 结果汇总
//!
//! 纯函数，没有任何 I/O。失败的目标计入总数，但不计入任何平均分的分母。

use std::collections::BTreeMap;

use crate::models::{AnalysisOutcome, AnalysisTarget, GroupStats, RankedEntry, SummaryStats};

#[derive(Default)]
struct GroupAccumulator {
    article_count: usize,
    scored_count: usize,
    score_sum: f64,
}

/// 从结果序列计算汇总统计
///
/// `outcomes[i]` 对应 `targets[i]`；`top_k` 控制排行榜长度。
/// 同分时按输入顺序排列。
pub fn summarize(
    outcomes: &[AnalysisOutcome],
    targets: &[AnalysisTarget],
    top_k: usize,
) -> SummaryStats {
    let mut groups: BTreeMap<String, GroupAccumulator> = BTreeMap::new();
    let mut ranked = Vec::new();
    let mut score_sum = 0.0;

    for (index, (outcome, target)) in outcomes.iter().zip(targets).enumerate() {
        let group = groups.entry(target.group.clone()).or_default();
        group.article_count += 1;

        if let Some(score) = outcome.score() {
            group.scored_count += 1;
            group.score_sum += score;
            score_sum += score;

            ranked.push(RankedEntry {
                index,
                target: target.clone(),
                score,
            });
        }
    }

    let success_count = ranked.len();
    let average_score = (success_count > 0).then(|| score_sum / success_count as f64);

    let per_group = groups
        .into_iter()
        .map(|(name, acc)| {
            let average_score =
                (acc.scored_count > 0).then(|| acc.score_sum / acc.scored_count as f64);
            (
                name,
                GroupStats {
                    article_count: acc.article_count,
                    scored_count: acc.scored_count,
                    average_score,
                },
            )
        })
        .collect::<BTreeMap<_, _>>();

    // sort_by 是稳定排序，同分保持输入顺序
    let mut top = ranked.clone();
    top.sort_by(|a, b| b.score.total_cmp(&a.score));
    top.truncate(top_k);

    let mut bottom = ranked;
    bottom.sort_by(|a, b| a.score.total_cmp(&b.score));
    bottom.truncate(top_k);

    SummaryStats {
        total_count: outcomes.len(),
        success_count,
        failure_count: outcomes.len() - success_count,
        group_count: per_group.len(),
        average_score,
        per_group,
        top,
        bottom,
    }
}
