use serde::{Deserialize, Serialize};

/// 一次成功分析的内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeoAnalysis {
    /// LLM 返回的原始文本
    pub raw_text: String,
    /// SEO 评分，范围 0–100
    pub score: f64,
    pub keywords: Vec<String>,
    pub recommendations: Vec<String>,
}

/// 单个目标的最终结果
///
/// 每个目标恰好产生一个结果，创建后不再修改。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Success(SeoAnalysis),
    Failure { reason: String },
}

impl AnalysisOutcome {
    pub fn failure(reason: impl Into<String>) -> Self {
        AnalysisOutcome::Failure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AnalysisOutcome::Success(_))
    }

    pub fn score(&self) -> Option<f64> {
        match self {
            AnalysisOutcome::Success(analysis) => Some(analysis.score),
            AnalysisOutcome::Failure { .. } => None,
        }
    }

    pub fn analysis(&self) -> Option<&SeoAnalysis> {
        match self {
            AnalysisOutcome::Success(analysis) => Some(analysis),
            AnalysisOutcome::Failure { .. } => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            AnalysisOutcome::Success(_) => None,
            AnalysisOutcome::Failure { reason } => Some(reason),
        }
    }
}
