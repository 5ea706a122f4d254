//! HTTP 传输 - 基础设施层
//!
//! 持有唯一的 HTTP 客户端，只暴露"发一次请求、拿回文本"的能力。
//! 不做重试，不做节流，只负责把响应分类成 [`ApiError`]。

use crate::config::Config;
use crate::error::ApiError;
use async_openai::types::chat::CreateChatCompletionRequest;
use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

/// 一次聊天补全请求的传输能力
///
/// 成功时返回 `choices[0].message.content`（已去除首尾空白）。
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn complete(&self, request: &CreateChatCompletionRequest) -> Result<String, ApiError>;
}

/// 基于 reqwest 的 OpenAI 兼容接口
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/chat/completions",
                config.llm_api_base_url.trim_end_matches('/')
            ),
            api_key: config.llm_api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionTransport for HttpTransport {
    async fn complete(&self, request: &CreateChatCompletionRequest) -> Result<String, ApiError> {
        debug!("POST {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        debug!("API 响应状态: {}", status);

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok());
            return Err(ApiError::RateLimited { retry_after });
        }

        let body = response.text().await.map_err(classify_send_error)?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Unauthorized {
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            return Err(ApiError::BadStatus {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        extract_content(&body)
    }
}

fn classify_send_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Transport(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct CompletionPayload {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// 只依赖 `choices[0].message.content`，其余字段忽略
fn extract_content(body: &str) -> Result<String, ApiError> {
    let payload: CompletionPayload = serde_json::from_str(body)
        .map_err(|e| ApiError::MalformedPayload(format!("无法解析响应: {}", e)))?;

    let content = payload
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| ApiError::MalformedPayload("LLM 返回内容为空".to_string()))?;

    Ok(content)
}

fn api_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .and_then(|payload| payload.error.message)
}
