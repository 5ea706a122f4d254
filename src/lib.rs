//! # SEO Audit Batch
//!
//! 批量调用大模型对文章做 SEO 评分的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有 HTTP 客户端，只暴露能力
//! - `CompletionTransport` - 发送一次 chat completion 请求并分类错误
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个目标
//! - `LlmService` - 构造分析提示词和请求
//! - `AnalysisClient` - 节流、指数退避重试、解析结果
//! - `summarize` - 汇总统计（纯函数）
//! - `ReportWriter` / `WarnWriter` - 写 CSV / JSON / warn.txt
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - `TargetCtx` 日志上下文（序号 + 编辑）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 分组并发、进度回调、取消
//! - `orchestrator/app` - 加载 CSV → 批处理 → 汇总 → 导出
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{CompletionTransport, HttpTransport};
pub use models::{AnalysisOutcome, AnalysisTarget, SeoAnalysis, SummaryStats};
pub use orchestrator::{App, BatchProcessor, BatchProgress, BatchState, BatchStatus, RunReport};
pub use services::{AnalysisClient, Analyzer, RetryPolicy};
pub use workflow::TargetCtx;
