//! 模型加载服务 - 业务能力层
//!
//! 负责"拿到一个可用模型"：导入推理库（只导入一次）、带超时的加载、指数退避重试。
//! 超时只是放弃等待，底层加载请求不会被中止。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{DiagnosisError, Result};
use crate::inference::{InferenceLibrary, LibraryProvider, Model};

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadPolicy {
    pub max_attempts: u32,
    pub timeout: Duration,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
}

impl Default for LoadPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout: Duration::from_secs(60),
            backoff_base: Duration::from_millis(1000),
            backoff_cap: Duration::from_millis(5000),
        }
    }
}

impl LoadPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.max_load_attempts,
            timeout: config.load_timeout(),
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            backoff_cap: Duration::from_millis(config.backoff_cap_ms),
        }
    }

    /// 第 `attempt` 次（从 1 开始）失败后的等待时间：`min(base * 2^(attempt-1), cap)`
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.backoff_base
            .checked_mul(factor)
            .unwrap_or(self.backoff_cap)
            .min(self.backoff_cap)
    }
}

/// 模型加载器
///
/// 持有推理库句柄的缓存。每次 `load()` 都会重新加载模型文件，
/// 模型实例由调用方在会话内复用。
pub struct ModelLoader {
    provider: Arc<dyn LibraryProvider>,
    library: OnceCell<Arc<dyn InferenceLibrary>>,
    policy: LoadPolicy,
    model_url: String,
    metadata_url: String,
}

impl ModelLoader {
    pub fn new(
        provider: Arc<dyn LibraryProvider>,
        policy: LoadPolicy,
        model_url: impl Into<String>,
        metadata_url: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            library: OnceCell::new(),
            policy,
            model_url: model_url.into(),
            metadata_url: metadata_url.into(),
        }
    }

    pub fn from_config(provider: Arc<dyn LibraryProvider>, config: &Config) -> Self {
        Self::new(
            provider,
            LoadPolicy::from_config(config),
            config.model_url(),
            config.metadata_url(),
        )
    }

    pub fn policy(&self) -> &LoadPolicy {
        &self.policy
    }

    /// 加载模型（带重试）
    ///
    /// # 返回
    /// 成功返回模型；全部尝试失败后返回 `ModelLoad`，包含尝试次数和最后一次错误
    pub async fn load(&self) -> Result<Model> {
        let max_attempts = self.policy.max_attempts;
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            info!("正在加载模型 (尝试 {}/{})...", attempt, max_attempts);

            match self.try_load().await {
                Ok(model) => {
                    info!("✓ 模型加载成功");
                    info!("✓ 可以开始预测");
                    return Ok(model);
                }
                Err(e) => {
                    error!("第 {} 次加载失败: {}", attempt, e);
                    last_error = Some(e);

                    if attempt < max_attempts {
                        let delay = self.policy.backoff_delay(attempt);
                        warn!("{}ms 后重试...", delay.as_millis());
                        sleep(delay).await;
                    }
                }
            }
        }

        let source = last_error
            .unwrap_or_else(|| DiagnosisError::LibraryUnavailable("no attempt was made".to_string()));
        let err = DiagnosisError::ModelLoad {
            attempts: max_attempts,
            source: Box::new(source),
        };
        error!("{}", err);
        Err(err)
    }

    /// 单次尝试：取得推理库，再与超时赛跑
    async fn try_load(&self) -> Result<Model> {
        let library = self.library().await?;

        debug!("模型地址: {}", self.model_url);
        debug!("元数据地址: {}", self.metadata_url);

        match timeout(
            self.policy.timeout,
            library.load(&self.model_url, &self.metadata_url),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(DiagnosisError::Timeout(self.policy.timeout)),
        }
    }

    /// 推理库只在首次成功后缓存，失败的导入下次会重试
    async fn library(&self) -> Result<Arc<dyn InferenceLibrary>> {
        let library = self
            .library
            .get_or_try_init(|| async {
                debug!("导入推理库...");
                self.provider.import().await.map_err(|e| {
                    error!("推理库导入失败: {}", e);
                    e
                })
            })
            .await?;
        Ok(Arc::clone(library))
    }
}
