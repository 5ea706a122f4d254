//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批处理器
//! - 按固定大小分组，组内并发、组间串行
//! - 维护批次状态（结果序列、进度、状态）
//! - 每组完成后回调进度，响应取消信号
//!
//! ### `app` - 应用生命周期
//! - 校验配置并组装各层（传输层 → LLM 服务 → 限流客户端 → 批处理器）
//! - 读取 CSV、运行批次、汇总、导出报告、写入警告文件
//!
//! ## 层次关系
//!
//! ```text
//! app (加载 / 汇总 / 导出)
//!     ↓
//! batch_processor (处理 Vec<AnalysisTarget>)
//!     ↓
//! services::AnalysisClient (处理单个目标：节流 / 重试 / 解析)
//!     ↓
//! services::LlmService (构造请求)
//!     ↓
//! infrastructure (基础设施：CompletionTransport)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：batch_processor 管调度，app 管输入输出
//! 2. **向下依赖**：编排层 → services → infrastructure
//! 3. **无业务逻辑**：只做调度和统计，不做具体分析判断

pub mod app;
pub mod batch_processor;

// 重新导出主要类型
pub use app::{App, RunReport};
pub use batch_processor::{BatchProcessor, BatchProgress, BatchState, BatchStatus};
