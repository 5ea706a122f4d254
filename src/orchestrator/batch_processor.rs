//! 批处理器 - 编排层
//!
//! ## 职责
//!
//! 按输入顺序遍历目标列表，按固定大小分组并发调用 [`Analyzer`]，
//! 把成功和失败按原始顺序合并成一个结果序列，并在每组完成后报告进度。
//!
//! ## 设计特点
//!
//! - **分组并发**：同组目标通过 `tokio::spawn` 同时发出，整组完成后才进入下一组
//! - **顺序保证**：按句柄的提交顺序等待，结果顺序与输入一致，与完成顺序无关
//! - **失败隔离**：单个目标失败只产生一个失败结果，不会中止批次
//! - **协作式取消**：每组开始前检查 [`CancellationToken`]，已追加的结果原样返回
//! - **随批次中止**：丢弃 `run_batch` 的 future 会中止组内仍在运行的任务

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tokio_util::task::AbortOnDropHandle;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::BatchError;
use crate::models::{AnalysisOutcome, AnalysisTarget};
use crate::services::Analyzer;
use crate::utils::logging::{log_group_complete, log_group_start};
use crate::workflow::TargetCtx;

/// 批次状态机
///
/// Idle → Running → Completed / Cancelled。
/// 输入非法时 `run_batch` 直接返回 [`BatchError`]，不会产生状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Idle,
    Running,
    Completed,
    Cancelled,
}

/// 一次批处理运行的全部状态，由批处理器独占
#[derive(Debug, Clone)]
pub struct BatchState {
    targets: Vec<AnalysisTarget>,
    outcomes: Vec<AnalysisOutcome>,
    progress: f64,
    status: BatchStatus,
}

impl BatchState {
    pub fn new(targets: Vec<AnalysisTarget>) -> Result<Self, BatchError> {
        if targets.is_empty() {
            return Err(BatchError::EmptyBatch);
        }
        let capacity = targets.len();
        Ok(Self {
            targets,
            outcomes: Vec::with_capacity(capacity),
            progress: 0.0,
            status: BatchStatus::Idle,
        })
    }

    pub fn targets(&self) -> &[AnalysisTarget] {
        &self.targets
    }

    pub fn outcomes(&self) -> &[AnalysisOutcome] {
        &self.outcomes
    }

    /// 已完成比例，范围 [0, 1]
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn status(&self) -> BatchStatus {
        self.status
    }

    pub fn completed(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_complete(&self) -> bool {
        self.outcomes.len() == self.targets.len()
    }

    pub fn into_parts(self) -> (Vec<AnalysisTarget>, Vec<AnalysisOutcome>) {
        (self.targets, self.outcomes)
    }

    /// 追加一组结果（已按输入顺序排列）
    fn append(&mut self, group_outcomes: Vec<AnalysisOutcome>) {
        self.outcomes.extend(group_outcomes);
        debug_assert!(self.outcomes.len() <= self.targets.len());
        self.progress = if self.is_complete() {
            1.0
        } else {
            self.outcomes.len() as f64 / self.targets.len() as f64
        };
    }

    fn snapshot(&self) -> BatchProgress<'_> {
        BatchProgress {
            completed: self.outcomes.len(),
            total: self.targets.len(),
            fraction: self.progress,
            outcomes: &self.outcomes,
        }
    }
}

/// 进度回调收到的只读快照
#[derive(Debug, Clone, Copy)]
pub struct BatchProgress<'a> {
    pub completed: usize,
    pub total: usize,
    pub fraction: f64,
    pub outcomes: &'a [AnalysisOutcome],
}

/// 批处理器
pub struct BatchProcessor<A> {
    analyzer: Arc<A>,
    group_size: usize,
    inter_group_pause: Duration,
}

impl<A: Analyzer + 'static> BatchProcessor<A> {
    pub fn new(analyzer: Arc<A>, config: &Config) -> Result<Self, BatchError> {
        Self::with_settings(analyzer, config.group_size, config.inter_group_pause())
    }

    pub fn with_settings(
        analyzer: Arc<A>,
        group_size: usize,
        inter_group_pause: Duration,
    ) -> Result<Self, BatchError> {
        if group_size == 0 {
            return Err(BatchError::InvalidGroupSize(group_size));
        }
        Ok(Self {
            analyzer,
            group_size,
            inter_group_pause,
        })
    }

    pub fn group_size(&self) -> usize {
        self.group_size
    }

    /// 处理全部目标（不可取消）
    pub async fn run_batch<P>(
        &self,
        targets: Vec<AnalysisTarget>,
        on_progress: P,
    ) -> Result<BatchState, BatchError>
    where
        P: FnMut(&BatchProgress<'_>),
    {
        self.run_batch_with_cancel(targets, &CancellationToken::new(), on_progress)
            .await
    }

    /// 处理全部目标，每组开始前检查取消信号
    ///
    /// # 返回
    /// - 正常完成：`outcomes.len() == targets.len()`，状态为 `Completed`
    /// - 被取消：只包含已完成的组，状态为 `Cancelled`
    /// - 目标列表为空：[`BatchError::EmptyBatch`]
    pub async fn run_batch_with_cancel<P>(
        &self,
        targets: Vec<AnalysisTarget>,
        cancel: &CancellationToken,
        mut on_progress: P,
    ) -> Result<BatchState, BatchError>
    where
        P: FnMut(&BatchProgress<'_>),
    {
        let mut state = BatchState::new(targets)?;
        state.status = BatchStatus::Running;

        let total = state.targets.len();
        let total_groups = total.div_ceil(self.group_size);

        for group_start in (0..total).step_by(self.group_size) {
            if cancel.is_cancelled() {
                warn!("⏹️ 收到取消信号，已完成 {}/{}，停止处理", state.completed(), total);
                state.status = BatchStatus::Cancelled;
                return Ok(state);
            }

            let group_end = (group_start + self.group_size).min(total);
            let group_num = group_start / self.group_size + 1;
            log_group_start(group_num, total_groups, group_start + 1, group_end, total);

            let group_outcomes = self
                .process_group(&state.targets[group_start..group_end], group_start, total)
                .await;

            let success = group_outcomes.iter().filter(|o| o.is_success()).count();
            log_group_complete(group_num, success, group_outcomes.len());

            state.append(group_outcomes);
            on_progress(&state.snapshot());

            if group_end < total && !self.inter_group_pause.is_zero() {
                tokio::select! {
                    _ = sleep(self.inter_group_pause) => {}
                    _ = cancel.cancelled() => {}
                }
            }
        }

        state.status = BatchStatus::Completed;
        Ok(state)
    }

    /// 并发处理一组目标，按输入顺序返回结果
    async fn process_group(
        &self,
        group: &[AnalysisTarget],
        group_start: usize,
        total: usize,
    ) -> Vec<AnalysisOutcome> {
        let handles: Vec<_> = group
            .iter()
            .map(|target| {
                let analyzer = Arc::clone(&self.analyzer);
                let target = target.clone();
                // 批次 future 被丢弃时，组内尚未完成的任务随句柄一起中止
                AbortOnDropHandle::new(tokio::spawn(async move { analyzer.analyze(&target).await }))
            })
            .collect();

        // join_all 按句柄顺序返回，与完成顺序无关
        join_all(handles)
            .await
            .into_iter()
            .zip(group)
            .enumerate()
            .map(|(offset, (joined, target))| {
                let ctx = TargetCtx::new(group_start + offset, total, &target.group);
                match joined {
                    Ok(outcome) => {
                        match &outcome {
                            AnalysisOutcome::Success(analysis) => {
                                info!("{} ✓ 评分 {:.0}: {}", ctx, analysis.score, target.url)
                            }
                            AnalysisOutcome::Failure { reason } => {
                                warn!("{} ❌ 分析失败: {} ({})", ctx, reason, target.url)
                            }
                        }
                        outcome
                    }
                    Err(e) => {
                        error!("{} 任务执行失败: {}", ctx, e);
                        AnalysisOutcome::failure(format!("任务执行失败: {}", e))
                    }
                }
            })
            .collect()
    }
}
