use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{DiagnosisError, Result};

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 模型文件 ---
    /// 模型文件所在目录的 URL（必须以 `/` 结尾）
    pub model_base_url: String,
    pub model_file: String,
    pub metadata_file: String,
    pub weights_file: String,
    // --- 加载策略 ---
    /// 模型加载最大尝试次数
    pub max_load_attempts: u32,
    /// 单次加载超时（秒）
    pub load_timeout_secs: u64,
    /// 退避基数（毫秒）
    pub backoff_base_ms: u64,
    /// 退避上限（毫秒）
    pub backoff_cap_ms: u64,
    // --- 流程参数 ---
    /// 上传图片最大字节数
    pub max_upload_bytes: u64,
    /// 进入下一步所需的最低置信度（严格大于）
    pub confidence_threshold: f64,
    /// 解码后图片最长边，超出则缩放
    pub max_image_edge: u32,
    // --- 推理库 ---
    /// 浏览器调试端口，0 表示启动无头浏览器
    pub browser_debug_port: u16,
    /// 需要按顺序注入页面的脚本
    pub library_scripts: Vec<String>,
    // --- 日志 ---
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 会话日志文件
    pub session_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_base_url: "http://localhost:3000/model/".to_string(),
            model_file: "model.json".to_string(),
            metadata_file: "metadata.json".to_string(),
            weights_file: "weights.bin".to_string(),
            max_load_attempts: 3,
            load_timeout_secs: 60,
            backoff_base_ms: 1000,
            backoff_cap_ms: 5000,
            max_upload_bytes: 10 * 1024 * 1024,
            confidence_threshold: 0.5,
            max_image_edge: 1024,
            browser_debug_port: 0,
            library_scripts: vec![
                "https://cdn.jsdelivr.net/npm/@tensorflow/tfjs@3.18.0/dist/tf.min.js".to_string(),
                "https://cdn.jsdelivr.net/npm/@teachablemachine/image@0.8.5/dist/teachablemachine-image.min.js"
                    .to_string(),
            ],
            verbose_logging: false,
            session_log_file: "diagnosis_log.txt".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载配置，缺失字段使用默认值，之后再应用环境变量
    pub async fn from_toml_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            DiagnosisError::Config(format!("无法读取配置文件 {}: {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)?;
        let config = config.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn with_env_overrides(self) -> Self {
        let base = self;
        Self {
            model_base_url: std::env::var("MODEL_BASE_URL").unwrap_or(base.model_base_url),
            model_file: std::env::var("MODEL_FILE").unwrap_or(base.model_file),
            metadata_file: std::env::var("METADATA_FILE").unwrap_or(base.metadata_file),
            weights_file: std::env::var("WEIGHTS_FILE").unwrap_or(base.weights_file),
            max_load_attempts: std::env::var("MAX_LOAD_ATTEMPTS").ok().and_then(|v| v.parse().ok()).unwrap_or(base.max_load_attempts),
            load_timeout_secs: std::env::var("LOAD_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(base.load_timeout_secs),
            backoff_base_ms: std::env::var("BACKOFF_BASE_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(base.backoff_base_ms),
            backoff_cap_ms: std::env::var("BACKOFF_CAP_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(base.backoff_cap_ms),
            max_upload_bytes: std::env::var("MAX_UPLOAD_BYTES").ok().and_then(|v| v.parse().ok()).unwrap_or(base.max_upload_bytes),
            confidence_threshold: std::env::var("CONFIDENCE_THRESHOLD").ok().and_then(|v| v.parse().ok()).unwrap_or(base.confidence_threshold),
            max_image_edge: std::env::var("MAX_IMAGE_EDGE").ok().and_then(|v| v.parse().ok()).unwrap_or(base.max_image_edge),
            browser_debug_port: std::env::var("BROWSER_DEBUG_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(base.browser_debug_port),
            library_scripts: base.library_scripts,
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(base.verbose_logging),
            session_log_file: std::env::var("SESSION_LOG_FILE").unwrap_or(base.session_log_file),
        }
    }

    /// 检查配置是否可用
    pub fn validate(&self) -> Result<()> {
        if self.max_load_attempts == 0 {
            return Err(DiagnosisError::Config("max_load_attempts 必须大于 0".to_string()));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(DiagnosisError::Config(format!(
                "confidence_threshold 必须在 [0, 1] 之间, 当前: {}",
                self.confidence_threshold
            )));
        }
        if !self.model_base_url.ends_with('/') {
            return Err(DiagnosisError::Config(format!(
                "model_base_url 必须以 '/' 结尾: {}",
                self.model_base_url
            )));
        }
        Ok(())
    }

    pub fn model_url(&self) -> String {
        format!("{}{}", self.model_base_url, self.model_file)
    }

    pub fn metadata_url(&self) -> String {
        format!("{}{}", self.model_base_url, self.metadata_file)
    }

    pub fn weights_url(&self) -> String {
        format!("{}{}", self.model_base_url, self.weights_file)
    }

    /// 模型服务的源（`scheme://host[:port]/`），推理页面在这里打开
    ///
    /// 无法解析或没有可用源（如 `file://`）时返回 `about:blank`
    pub fn model_origin(&self) -> String {
        match reqwest::Url::parse(&self.model_base_url) {
            Ok(url) if url.origin().is_tuple() => format!("{}/", url.origin().ascii_serialization()),
            _ => "about:blank".to_string(),
        }
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs)
    }
}
