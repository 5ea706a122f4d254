//! 限流客户端 - 业务能力层
//!
//! 在 [`LlmService`] 之上加节流、指数退避重试和结果解析，
//! 对每个目标恰好产出一个 [`AnalysisOutcome`]，从不向上抛错。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ApiError;
use crate::models::{AnalysisOutcome, AnalysisTarget, SeoAnalysis};
use crate::services::llm_service::LlmService;
use crate::services::response_parser::ResponseParser;

/// 单个目标的分析能力
///
/// 编排层只依赖这个 trait，测试时可以替换成桩实现。
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, target: &AnalysisTarget) -> AnalysisOutcome;
}

/// 节流与重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 每个目标第一次请求前的等待
    pub pacing: Duration,
    /// 最大尝试次数（含第一次）
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            pacing: config.pacing_interval(),
            max_attempts: config.max_retries.max(1),
            base_delay: config.backoff_base(),
            max_delay: config.max_backoff(),
        }
    }

    /// 第 `attempt` 次失败后的等待：`base * 2^(attempt-1)`，不超过上限
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// 单次调用内的重试状态，调用结束即丢弃
#[derive(Debug, Clone, Copy)]
struct RetryState {
    attempt: u32,
    next_delay: Duration,
}

impl RetryState {
    fn start(policy: &RetryPolicy) -> Self {
        Self {
            attempt: 1,
            next_delay: policy.backoff_delay(1),
        }
    }

    /// 服务端给出 Retry-After 时，取两者较大值（仍受上限约束）
    fn wait_for(&self, err: &ApiError, policy: &RetryPolicy) -> Duration {
        match err.retry_after() {
            Some(secs) => self
                .next_delay
                .max(Duration::from_secs(secs).min(policy.max_delay)),
            None => self.next_delay,
        }
    }

    fn advance(&mut self, policy: &RetryPolicy) {
        self.attempt += 1;
        self.next_delay = policy.backoff_delay(self.attempt);
    }
}

/// 限流分析客户端
pub struct AnalysisClient {
    llm_service: LlmService,
    parser: Arc<dyn ResponseParser>,
    policy: RetryPolicy,
}

impl AnalysisClient {
    pub fn new(llm_service: LlmService, parser: Arc<dyn ResponseParser>, policy: RetryPolicy) -> Self {
        Self {
            llm_service,
            parser,
            policy,
        }
    }

    fn build_outcome(&self, raw_text: String) -> AnalysisOutcome {
        match self.parser.parse(&raw_text) {
            Ok(parsed) => AnalysisOutcome::Success(SeoAnalysis {
                raw_text,
                score: parsed.score,
                keywords: parsed.keywords,
                recommendations: parsed.recommendations,
            }),
            Err(e) => AnalysisOutcome::failure(e.to_string()),
        }
    }
}

#[async_trait]
impl Analyzer for AnalysisClient {
    async fn analyze(&self, target: &AnalysisTarget) -> AnalysisOutcome {
        if !self.policy.pacing.is_zero() {
            sleep(self.policy.pacing).await;
        }

        let mut state = RetryState::start(&self.policy);

        loop {
            debug!("请求分析 (尝试 {}/{}): {}", state.attempt, self.policy.max_attempts, target.url);

            let err = match self.llm_service.analyze_target(target).await {
                Ok(raw_text) => return self.build_outcome(raw_text),
                Err(e) => e,
            };

            if !err.is_transient() {
                warn!("不可重试的错误: {} ({})", err, target.url);
                return AnalysisOutcome::failure(err.to_string());
            }

            if state.attempt >= self.policy.max_attempts {
                warn!(
                    "已达到最大尝试次数 {}，放弃: {}",
                    self.policy.max_attempts, target.url
                );
                return AnalysisOutcome::failure(exhausted_reason(&err, state.attempt));
            }

            let delay = state.wait_for(&err, &self.policy);
            warn!(
                "{} (尝试 {}/{}), 等待 {:?} 后重试...",
                err, state.attempt, self.policy.max_attempts, delay
            );
            sleep(delay).await;
            state.advance(&self.policy);
        }
    }
}

fn exhausted_reason(err: &ApiError, attempts: u32) -> String {
    match err {
        ApiError::RateLimited { .. } => {
            format!("请求频率限制，尝试 {} 次后仍失败 (rate limit exceeded)", attempts)
        }
        other => format!("{}，尝试 {} 次后仍失败", other, attempts),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::CompletionTransport;
    use crate::services::response_parser::{ExtractingParser, SeededParser};
    use async_openai::types::chat::CreateChatCompletionRequest;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// 按顺序返回预设响应，最后一个响应会一直重复
    struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<String, ApiError>>>,
        calls: AtomicU32,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Result<String, ApiError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionTransport for ScriptedTransport {
        async fn complete(&self, _: &CreateChatCompletionRequest) -> Result<String, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().unwrap();
            if responses.len() > 1 {
                responses.pop_front().unwrap()
            } else {
                responses.front().cloned().unwrap()
            }
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            pacing: Duration::ZERO,
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        }
    }

    fn client_with(transport: Arc<ScriptedTransport>, max_attempts: u32) -> AnalysisClient {
        let llm = LlmService::new(&Config::default(), transport);
        AnalysisClient::new(llm, Arc::new(ExtractingParser), fast_policy(max_attempts))
    }

    fn target() -> AnalysisTarget {
        AnalysisTarget::new("Ana", "https://example.com/a", None)
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            pacing: Duration::ZERO,
            max_attempts: 5,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(5000),
        };
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(1000));
        assert_eq!(policy.backoff_delay(2), Duration::from_millis(2000));
        assert_eq!(policy.backoff_delay(3), Duration::from_millis(4000));
        assert_eq!(policy.backoff_delay(4), Duration::from_millis(5000));
        assert_eq!(policy.backoff_delay(40), Duration::from_millis(5000));
    }

    #[test]
    fn test_retry_after_raises_wait_within_cap() {
        let policy = RetryPolicy {
            pacing: Duration::ZERO,
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(3),
        };
        let state = RetryState::start(&policy);
        let err = ApiError::RateLimited {
            retry_after: Some(10),
        };
        assert_eq!(state.wait_for(&err, &policy), Duration::from_secs(3));
        assert_eq!(
            state.wait_for(&ApiError::Timeout, &policy),
            Duration::from_millis(100)
        );
    }

    #[tokio::test]
    async fn test_success_is_parsed() {
        let transport = ScriptedTransport::new(vec![Ok(
            "Puntuación SEO: 85/100\nPalabras clave: a, b".to_string()
        )]);
        let client = client_with(transport.clone(), 3);

        let outcome = client.analyze(&target()).await;
        let analysis = outcome.analysis().expect("应该成功");
        assert_eq!(analysis.score, 85.0);
        assert_eq!(analysis.keywords, vec!["a", "b"]);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_always_throttled_stops_after_max_attempts() {
        let transport =
            ScriptedTransport::new(vec![Err(ApiError::RateLimited { retry_after: None })]);
        let client = client_with(transport.clone(), 3);

        let outcome = client.analyze(&target()).await;

        assert_eq!(transport.calls(), 3);
        let reason = outcome.failure_reason().expect("应该失败");
        assert!(reason.contains("尝试 3 次后仍失败"));
        assert!(reason.contains("rate limit"));
    }

    #[tokio::test]
    async fn test_throttle_then_success() {
        let transport = ScriptedTransport::new(vec![
            Err(ApiError::RateLimited { retry_after: None }),
            Err(ApiError::Timeout),
            Ok("Score: 70".to_string()),
        ]);
        let client = client_with(transport.clone(), 3);

        let outcome = client.analyze(&target()).await;
        assert_eq!(outcome.score(), Some(70.0));
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let transport = ScriptedTransport::new(vec![Err(ApiError::BadStatus {
            status: 400,
            message: Some("bad request".to_string()),
        })]);
        let client = client_with(transport.clone(), 3);

        let outcome = client.analyze(&target()).await;
        assert_eq!(transport.calls(), 1);
        assert!(outcome.failure_reason().unwrap().contains("400"));
    }

    #[tokio::test]
    async fn test_transport_errors_exhaust_with_reason() {
        let transport =
            ScriptedTransport::new(vec![Err(ApiError::Transport("connection reset".into()))]);
        let client = client_with(transport.clone(), 2);

        let outcome = client.analyze(&target()).await;
        assert_eq!(transport.calls(), 2);
        let reason = outcome.failure_reason().unwrap();
        assert!(reason.contains("connection reset"));
        assert!(reason.contains("尝试 2 次后仍失败"));
    }

    #[tokio::test]
    async fn test_unparseable_completion_is_failure() {
        let transport = ScriptedTransport::new(vec![Ok("sin números".to_string())]);
        let client = client_with(transport.clone(), 3);

        let outcome = client.analyze(&target()).await;
        assert!(!outcome.is_success());
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_seeded_parser_accepts_free_text() {
        let transport = ScriptedTransport::new(vec![Ok("texto libre".to_string())]);
        let llm = LlmService::new(&Config::default(), transport);
        let client = AnalysisClient::new(llm, Arc::new(SeededParser::new(3)), fast_policy(3));

        let first = client.analyze(&target()).await;
        let second = client.analyze(&target()).await;
        assert!(first.is_success());
        assert_eq!(first, second);
    }

    /// 记录每次调用的时间点，始终返回限流
    struct TimedTransport {
        calls: Mutex<Vec<tokio::time::Instant>>,
    }

    #[async_trait]
    impl CompletionTransport for TimedTransport {
        async fn complete(&self, _: &CreateChatCompletionRequest) -> Result<String, ApiError> {
            self.calls.lock().unwrap().push(tokio::time::Instant::now());
            Err(ApiError::RateLimited { retry_after: None })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacing_precedes_first_attempt_only() {
        let transport = Arc::new(TimedTransport {
            calls: Mutex::new(Vec::new()),
        });
        let llm = LlmService::new(&Config::default(), transport.clone());
        let policy = RetryPolicy {
            pacing: Duration::from_millis(200),
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
        };
        let client = AnalysisClient::new(llm, Arc::new(ExtractingParser), policy);

        let start = tokio::time::Instant::now();
        let outcome = client.analyze(&target()).await;

        assert!(outcome.failure_reason().unwrap().contains("尝试 3 次后仍失败"));

        // 200ms 节流 + 100ms + 200ms 退避，重试之间不再节流
        let offsets: Vec<Duration> = transport
            .calls
            .lock()
            .unwrap()
            .iter()
            .map(|at| *at - start)
            .collect();
        let expected = [200, 300, 500].map(Duration::from_millis);
        assert_eq!(offsets.len(), expected.len());
        for (actual, expected) in offsets.iter().zip(expected) {
            assert!(
                *actual >= expected && *actual < expected + Duration::from_millis(5),
                "offsets = {:?}",
                offsets
            );
        }
    }
}
