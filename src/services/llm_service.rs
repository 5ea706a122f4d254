//! LLM 服务 - 业务能力层
//!
//! 只负责"向 LLM 请求一次 SEO 评估"，不关心节流和重试
//!
//! ## 技术栈
//! - 使用 `async-openai` 的请求类型构建消息
//! - 通过 [`CompletionTransport`] 发送，兼容任何 OpenAI 风格的接口

use std::sync::Arc;

use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs,
};
use tracing::debug;

use crate::config::Config;
use crate::error::ApiError;
use crate::infrastructure::CompletionTransport;
use crate::models::AnalysisTarget;

const SYSTEM_MESSAGE: &str = "Eres un experto en SEO especializado en análisis de contenido editorial. \
                              Proporciona análisis concisos y accionables.";

/// LLM 服务
///
/// 职责：
/// - 构建分析请求（系统消息 + 用户消息）
/// - 发送一次请求并返回原始文本
/// - 只处理单个目标
pub struct LlmService {
    transport: Arc<dyn CompletionTransport>,
    model_name: String,
    temperature: f32,
    max_tokens: u32,
    presence_penalty: f32,
    frequency_penalty: f32,
}

impl LlmService {
    pub fn new(config: &Config, transport: Arc<dyn CompletionTransport>) -> Self {
        Self {
            transport,
            model_name: config.llm_model_name.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            presence_penalty: config.presence_penalty,
            frequency_penalty: config.frequency_penalty,
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    ///
    /// # 返回
    /// 返回 LLM 的响应内容；失败时返回已分类的 [`ApiError`]
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> Result<String, ApiError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let request = self.build_request(user_message, system_message)?;
        self.transport.complete(&request).await
    }

    /// 请求对单个目标的 SEO 评估
    pub async fn analyze_target(&self, target: &AnalysisTarget) -> Result<String, ApiError> {
        let (user_message, system_message) = build_analysis_messages(target);
        self.send_to_llm(&user_message, Some(&system_message)).await
    }

    /// 构建请求体
    pub fn build_request(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> Result<CreateChatCompletionRequest, ApiError> {
        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(invalid_request)?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(invalid_request)?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .presence_penalty(self.presence_penalty)
            .frequency_penalty(self.frequency_penalty)
            .build()
            .map_err(invalid_request)
    }
}

fn invalid_request(err: async_openai::error::OpenAIError) -> ApiError {
    ApiError::InvalidRequest(err.to_string())
}

/// 构建单篇文章的分析消息
///
/// 返回 (user_message, system_message)
pub fn build_analysis_messages(target: &AnalysisTarget) -> (String, String) {
    let title = target.title.as_deref().unwrap_or("(sin título)");

    let user_message = format!(
        r#"Por favor realiza un análisis SEO del siguiente artículo:

Artículo por {}
URL: {}
Título: {}

Responde con este formato:
- Evaluación del título: una o dos frases.
- Puntuación SEO: un número entero de 0 a 100, escrito como "Puntuación SEO: NN/100".
- Palabras clave: lista separada por comas.
- Recomendaciones: lista numerada con las recomendaciones SEO principales.
- Puntos de mejora: lista breve."#,
        target.group, target.url, title
    );

    (user_message, SYSTEM_MESSAGE.to_string())
}
