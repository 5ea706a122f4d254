//! 警告写入服务 - 业务能力层
//!
//! 只负责"把失败的目标写进 warn.txt"，不关心流程

use std::fs::OpenOptions;
use std::io::Write;

use tracing::debug;

use crate::models::AnalysisTarget;
use crate::workflow::TargetCtx;

/// 警告写入服务
pub struct WarnWriter {
    warn_file_path: String,
}

impl WarnWriter {
    pub fn new() -> Self {
        Self {
            warn_file_path: "warn.txt".to_string(),
        }
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            warn_file_path: path.into(),
        }
    }

    /// 追加一条失败记录
    pub fn write(&self, ctx: &TargetCtx, target: &AnalysisTarget, reason: &str) -> std::io::Result<()> {
        debug!("写入警告: {} | 原因: {}", ctx, reason);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.warn_file_path)?;

        let warn_msg = format!(
            "目标 #{} | {} | {} | 原因: {}\n",
            ctx.index + 1,
            target.group,
            target.url,
            reason
        );

        file.write_all(warn_msg.as_bytes())
    }
}

impl Default for WarnWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_appends_lines() {
        let path = std::env::temp_dir().join(format!("seo_audit_warn_{}.txt", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let writer = WarnWriter::with_path(path.to_string_lossy());

        let target = AnalysisTarget::new("Ana", "https://x.test/1", None);
        writer.write(&TargetCtx::new(0, 2, "Ana"), &target, "timeout").unwrap();
        writer.write(&TargetCtx::new(1, 2, "Ana"), &target, "401").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "目标 #1 | Ana | https://x.test/1 | 原因: timeout");
        assert!(lines[1].starts_with("目标 #2"));

        let _ = std::fs::remove_file(&path);
    }
}
