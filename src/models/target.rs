use serde::{Deserialize, Serialize};

/// 待分析的目标：一篇文章
///
/// 身份由它在输入序列中的位置决定，允许重复。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisTarget {
    /// 编辑 / 作者名称
    pub group: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl AnalysisTarget {
    pub fn new(group: impl Into<String>, url: impl Into<String>, title: Option<String>) -> Self {
        Self {
            group: group.into(),
            url: url.into(),
            title,
        }
    }

    /// 用于显示的标题，没有标题时回退到 URL
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.url)
    }
}
