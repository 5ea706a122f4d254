use crate::error::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// 默认配置文件名（存在时自动加载）
pub const DEFAULT_CONFIG_FILE: &str = "seo_audit.toml";

/// 程序配置
///
/// 所有节流、重试、分组相关的参数都集中在这里，
/// 构造客户端和批处理器时显式传入。
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,

    // --- 节流与重试 ---
    /// 每次请求前的最小等待（毫秒）
    pub pacing_interval_ms: u64,
    /// 单个目标的最大尝试次数（含第一次）
    pub max_retries: u32,
    /// 指数退避的基础延迟（毫秒）
    pub backoff_base_ms: u64,
    /// 单次退避的上限（毫秒）
    pub max_backoff_ms: u64,

    // --- 批处理 ---
    /// 每组并发处理的目标数量
    pub group_size: usize,
    /// 组与组之间的额外暂停（毫秒）
    pub inter_group_pause_ms: u64,

    // --- 评分策略 ---
    /// `extract` 从文本中提取分数，`seeded` 使用确定性伪分数
    pub score_strategy: String,
    pub score_seed: u64,
    /// 排行榜显示条数
    pub top_k: usize,

    // --- 文件 ---
    pub input_csv: String,
    pub output_folder: String,
    pub warn_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            max_tokens: 2000,
            presence_penalty: 0.1,
            frequency_penalty: 0.1,
            request_timeout_secs: 60,
            pacing_interval_ms: 2000,
            max_retries: 3,
            backoff_base_ms: 1000,
            max_backoff_ms: 60_000,
            group_size: 3,
            inter_group_pause_ms: 2000,
            score_strategy: "extract".to_string(),
            score_seed: 42,
            top_k: 5,
            input_csv: "articles.csv".to_string(),
            output_folder: "output".to_string(),
            warn_file: "warn.txt".to_string(),
            verbose_logging: false,
        }
    }
}

// 密钥不能出现在日志里
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("llm_api_key", &redact(&self.llm_api_key))
            .field("llm_api_base_url", &self.llm_api_base_url)
            .field("llm_model_name", &self.llm_model_name)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("pacing_interval_ms", &self.pacing_interval_ms)
            .field("max_retries", &self.max_retries)
            .field("backoff_base_ms", &self.backoff_base_ms)
            .field("max_backoff_ms", &self.max_backoff_ms)
            .field("group_size", &self.group_size)
            .field("inter_group_pause_ms", &self.inter_group_pause_ms)
            .field("score_strategy", &self.score_strategy)
            .field("score_seed", &self.score_seed)
            .field("top_k", &self.top_k)
            .field("input_csv", &self.input_csv)
            .field("output_folder", &self.output_folder)
            .field("warn_file", &self.warn_file)
            .field("verbose_logging", &self.verbose_logging)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

impl Config {
    /// 按 默认值 → TOML 文件 → 环境变量 的顺序加载配置
    pub fn load() -> Result<Self, ConfigError> {
        let base = match std::env::var("SEO_CONFIG_FILE") {
            Ok(path) => Self::from_toml_file(&path)?,
            Err(_) if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_toml_file(DEFAULT_CONFIG_FILE)?
            }
            Err(_) => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    /// 仅从环境变量加载（其余使用默认值）
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载，缺省字段使用默认值
    pub fn from_toml_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_string(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 用环境变量覆盖已有配置
    pub fn with_env_overrides(self) -> Self {
        let d = self;
        let api_key = std::env::var("LLM_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .unwrap_or(d.llm_api_key);
        Self {
            llm_api_key: api_key,
            llm_api_base_url: env_or("LLM_API_BASE_URL", d.llm_api_base_url),
            llm_model_name: env_or("LLM_MODEL_NAME", d.llm_model_name),
            temperature: env_parse("LLM_TEMPERATURE", d.temperature),
            max_tokens: env_parse("LLM_MAX_TOKENS", d.max_tokens),
            presence_penalty: d.presence_penalty,
            frequency_penalty: d.frequency_penalty,
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS", d.request_timeout_secs),
            pacing_interval_ms: env_parse("PACING_INTERVAL_MS", d.pacing_interval_ms),
            max_retries: env_parse("MAX_RETRIES", d.max_retries),
            backoff_base_ms: env_parse("BACKOFF_BASE_MS", d.backoff_base_ms),
            max_backoff_ms: env_parse("MAX_BACKOFF_MS", d.max_backoff_ms),
            group_size: env_parse("GROUP_SIZE", d.group_size),
            inter_group_pause_ms: env_parse("INTER_GROUP_PAUSE_MS", d.inter_group_pause_ms),
            score_strategy: env_or("SCORE_STRATEGY", d.score_strategy),
            score_seed: env_parse("SCORE_SEED", d.score_seed),
            top_k: env_parse("TOP_K", d.top_k),
            input_csv: env_or("INPUT_CSV", d.input_csv),
            output_folder: env_or("OUTPUT_FOLDER", d.output_folder),
            warn_file: env_or("WARN_FILE", d.warn_file),
            verbose_logging: env_parse("VERBOSE_LOGGING", d.verbose_logging),
        }
    }

    /// 校验运行所需的配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm_api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.group_size == 0 {
            return Err(invalid("group_size", self.group_size));
        }
        if self.max_retries == 0 {
            return Err(invalid("max_retries", self.max_retries));
        }
        if !matches!(self.score_strategy.as_str(), "extract" | "seeded") {
            return Err(invalid("score_strategy", &self.score_strategy));
        }
        Ok(())
    }

    pub fn pacing_interval(&self) -> Duration {
        Duration::from_millis(self.pacing_interval_ms)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    pub fn inter_group_pause(&self) -> Duration {
        Duration::from_millis(self.inter_group_pause_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn invalid(field: &str, value: impl fmt::Display) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
}
