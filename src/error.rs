use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 输入文件错误（CSV 无法解析）
    #[error("输入错误: {0}")]
    Input(#[from] InputError),
    /// 批处理致命错误
    #[error("批处理错误: {0}")]
    Batch(#[from] BatchError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 报告写入错误
    #[error("报告错误: {0}")]
    Report(#[from] ReportError),
}

/// 输入批次解析错误
///
/// 任何一种都会让整个批次在开始前中止。
#[derive(Debug, Error)]
pub enum InputError {
    /// 文件为空或没有任何数据行
    #[error("CSV 为空或没有有效数据行")]
    Empty,
    /// 表头缺少必需的列
    #[error("CSV 表头缺少必需的列: {column}")]
    MissingColumn { column: String },
    /// 数据行缺少必填字段
    #[error("第 {line} 行缺少字段: {field}")]
    MissingField { line: u64, field: String },
    /// CSV 格式错误
    #[error("第 {line} 行 CSV 格式错误: {source}")]
    Csv {
        line: u64,
        #[source]
        source: csv::Error,
    },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 外部分析 API 错误
///
/// 瞬时错误（限流、超时、网络）由客户端内部重试吸收，
/// 其余错误直接变成该目标的失败结果。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// 请求频率限制 (HTTP 429)
    #[error("API请求频率限制, 建议等待: {retry_after:?}秒")]
    RateLimited { retry_after: Option<u64> },
    /// 请求超时
    #[error("API请求超时")]
    Timeout,
    /// 网络层失败
    #[error("网络请求失败: {0}")]
    Transport(String),
    /// 认证失败 (401/403)
    #[error("API认证失败 (状态码: {status})")]
    Unauthorized { status: u16 },
    /// 其他非成功状态码
    #[error("API返回错误响应: status={status}, message={message:?}")]
    BadStatus {
        status: u16,
        message: Option<String>,
    },
    /// 返回内容结构不符合预期
    #[error("API返回内容格式错误: {0}")]
    MalformedPayload(String),
    /// 请求本身构建失败
    #[error("请求构建失败: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// 是否属于可重试的瞬时错误
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiError::RateLimited { .. } | ApiError::Timeout | ApiError::Transport(_)
        )
    }

    /// 服务端建议的等待秒数（仅限流时存在）
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            ApiError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// 批处理致命错误：整个批次中止，不产生部分结果
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    /// 目标列表为空
    #[error("目标列表为空，无法开始批处理")]
    EmptyBatch,
    /// 分组大小非法
    #[error("分组大小必须大于 0 (当前: {0})")]
    InvalidGroupSize(usize),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 缺少 API 密钥
    #[error("未设置 LLM_API_KEY")]
    MissingApiKey,
    /// 配置值非法
    #[error("配置项 {field} 的值 '{value}' 非法")]
    InvalidValue { field: String, value: String },
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 报告写入错误
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("写入文件失败 ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV写入失败 ({path}): {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("JSON序列化失败: {0}")]
    Json(#[from] serde_json::Error),
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
