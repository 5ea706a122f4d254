use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::infrastructure::{CompletionTransport, HttpTransport};
use crate::models::{load_targets_from_path, AnalysisOutcome, AnalysisTarget, SummaryStats};
use crate::orchestrator::batch_processor::{BatchProcessor, BatchStatus};
use crate::services::{
    export_rows, parser_from_config, summarize, AnalysisClient, LlmService, ReportWriter,
    RetryPolicy, WarnWriter,
};
use crate::utils::logging::{log_startup, log_targets_loaded, print_final_stats};
use crate::workflow::TargetCtx;

/// 一次完整运行的结果
#[derive(Debug, Clone)]
pub struct RunReport {
    pub status: BatchStatus,
    pub summary: SummaryStats,
    pub csv_path: PathBuf,
    pub json_path: PathBuf,
}

/// 应用主结构
pub struct App {
    config: Config,
    processor: BatchProcessor<AnalysisClient>,
    report_writer: ReportWriter,
    warn_writer: WarnWriter,
}

impl App {
    /// 初始化应用：校验配置并组装 HTTP 传输层
    pub fn initialize(config: Config) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config).context("创建 HTTP 客户端失败")?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// 使用自定义传输层初始化
    pub fn with_transport(config: Config, transport: Arc<dyn CompletionTransport>) -> Result<Self> {
        let llm_service = LlmService::new(&config, transport);
        let client = AnalysisClient::new(
            llm_service,
            parser_from_config(&config),
            RetryPolicy::from_config(&config),
        );
        let processor = BatchProcessor::new(Arc::new(client), &config)?;

        Ok(Self {
            report_writer: ReportWriter::new(&config.output_folder),
            warn_writer: WarnWriter::with_path(config.warn_file.clone()),
            processor,
            config,
        })
    }

    /// 运行应用主逻辑：加载 → 分析 → 汇总 → 导出
    pub async fn run(&self, cancel: CancellationToken) -> Result<RunReport> {
        log_startup(&self.config);

        let targets = load_targets(Path::new(&self.config.input_csv)).await?;
        log_targets_loaded(targets.len(), self.processor.group_size());

        let state = self
            .processor
            .run_batch_with_cancel(targets, &cancel, |progress| {
                info!(
                    "⏳ 进度: {:.0}% ({}/{})",
                    progress.fraction * 100.0,
                    progress.completed,
                    progress.total
                );
            })
            .await?;

        let status = state.status();
        if status == BatchStatus::Cancelled {
            warn!(
                "⚠️ 批次已取消，仅导出已完成的 {}/{} 个结果",
                state.completed(),
                state.targets().len()
            );
        }

        let (targets, outcomes) = state.into_parts();
        let targets = &targets[..outcomes.len()];

        let summary = summarize(&outcomes, targets, self.config.top_k);
        print_final_stats(&summary);

        self.record_failures(targets, &outcomes);

        let now = chrono::Local::now();
        let rows = export_rows(targets, &outcomes, now);
        let csv_path = self.report_writer.write_csv(&rows, now)?;
        let json_path = self.report_writer.write_summary_json(&summary, now)?;

        Ok(RunReport {
            status,
            summary,
            csv_path,
            json_path,
        })
    }

    fn record_failures(&self, targets: &[AnalysisTarget], outcomes: &[AnalysisOutcome]) {
        let total = targets.len();
        for (index, (target, outcome)) in targets.iter().zip(outcomes).enumerate() {
            if let Some(reason) = outcome.failure_reason() {
                let ctx = TargetCtx::new(index, total, &target.group);
                if let Err(e) = self.warn_writer.write(&ctx, target, reason) {
                    warn!("{} 写入警告文件失败: {}", ctx, e);
                }
            }
        }
    }
}

/// 加载待分析的文章
async fn load_targets(path: &Path) -> Result<Vec<AnalysisTarget>> {
    info!("\n📁 正在读取待分析的文章: {}", path.display());
    let targets = load_targets_from_path(path).await?;
    Ok(targets)
}
