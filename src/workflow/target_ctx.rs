//! 目标处理上下文
//!
//! 封装"我正在处理第几个目标、属于哪个编辑"这一信息

use std::fmt::Display;

/// 目标处理上下文（仅用于日志与警告记录）
#[derive(Debug, Clone)]
pub struct TargetCtx {
    /// 在输入序列中的位置（从 0 开始）
    pub index: usize,
    /// 目标总数
    pub total: usize,
    /// 编辑名称
    pub group: String,
}

impl TargetCtx {
    pub fn new(index: usize, total: usize, group: impl Into<String>) -> Self {
        Self {
            index,
            total,
            group: group.into(),
        }
    }
}

impl Display for TargetCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[目标 {}/{} 编辑#{}]", self.index + 1, self.total, self.group)
    }
}
