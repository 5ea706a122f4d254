//! 报告导出服务 - 业务能力层
//!
//! 只负责把结果写成文件（CSV 明细 + JSON 汇总），不做任何计算

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ReportError;
use crate::models::{AnalysisOutcome, AnalysisTarget, SummaryStats};

/// 导出表格中的一行，对应一个目标
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    #[serde(rename = "Editor")]
    pub editor: String,
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "Título")]
    pub title: String,
    #[serde(rename = "Estado")]
    pub status: &'static str,
    #[serde(rename = "Puntuación SEO")]
    pub seo_score: Option<u32>,
    #[serde(rename = "Palabras clave")]
    pub keywords: String,
    #[serde(rename = "Recomendaciones")]
    pub recommendations: String,
    #[serde(rename = "Error")]
    pub error: String,
    #[serde(rename = "Fecha de Análisis")]
    pub analysed_at: String,
}

/// 把目标和结果展平成导出行
///
/// 失败的目标也会保留一行，`Estado` 为 `error` 并附带原因。
pub fn export_rows(
    targets: &[AnalysisTarget],
    outcomes: &[AnalysisOutcome],
    exported_at: DateTime<Local>,
) -> Vec<ExportRow> {
    let timestamp = exported_at.format("%Y-%m-%d %H:%M:%S").to_string();

    targets
        .iter()
        .zip(outcomes)
        .map(|(target, outcome)| {
            let mut row = ExportRow {
                editor: target.group.clone(),
                url: target.url.clone(),
                title: target.title.clone().unwrap_or_default(),
                status: "ok",
                seo_score: None,
                keywords: String::new(),
                recommendations: String::new(),
                error: String::new(),
                analysed_at: timestamp.clone(),
            };

            match outcome {
                AnalysisOutcome::Success(analysis) => {
                    row.seo_score = Some(analysis.score.round() as u32);
                    row.keywords = analysis.keywords.join(", ");
                    row.recommendations = analysis.recommendations.join("; ");
                }
                AnalysisOutcome::Failure { reason } => {
                    row.status = "error";
                    row.error = reason.clone();
                }
            }

            row
        })
        .collect()
}

/// 报告写入服务
pub struct ReportWriter {
    output_folder: PathBuf,
}

impl ReportWriter {
    pub fn new(output_folder: impl Into<PathBuf>) -> Self {
        Self {
            output_folder: output_folder.into(),
        }
    }

    /// 写入 `analisis-seo-YYYY-MM-DD.csv`
    pub fn write_csv(&self, rows: &[ExportRow], date: DateTime<Local>) -> Result<PathBuf, ReportError> {
        self.ensure_folder()?;
        let path = self
            .output_folder
            .join(format!("analisis-seo-{}.csv", date.format("%Y-%m-%d")));
        let csv_error = |source| ReportError::Csv {
            path: path.display().to_string(),
            source,
        };

        let mut writer = csv::Writer::from_path(&path).map_err(csv_error)?;
        for row in rows {
            writer.serialize(row).map_err(csv_error)?;
        }
        writer.flush().map_err(|source| io_error(&path, source))?;

        info!("📄 明细已导出: {} ({} 行)", path.display(), rows.len());
        Ok(path)
    }

    /// 写入 `resumen-seo-YYYY-MM-DD.json`
    pub fn write_summary_json(
        &self,
        summary: &SummaryStats,
        date: DateTime<Local>,
    ) -> Result<PathBuf, ReportError> {
        self.ensure_folder()?;
        let path = self
            .output_folder
            .join(format!("resumen-seo-{}.json", date.format("%Y-%m-%d")));

        let json = serde_json::to_string_pretty(summary)?;
        fs::write(&path, json).map_err(|source| io_error(&path, source))?;

        info!("📊 汇总已导出: {}", path.display());
        Ok(path)
    }

    fn ensure_folder(&self) -> Result<(), ReportError> {
        debug!("确保输出目录存在: {}", self.output_folder.display());
        fs::create_dir_all(&self.output_folder).map_err(|source| io_error(&self.output_folder, source))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> ReportError {
    ReportError::Io {
        path: path.display().to_string(),
        source,
    }
}
