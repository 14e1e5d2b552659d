//! 模型文件诊断 - 业务能力层
//!
//! 检查 model.json / metadata.json / weights.bin 是否可访问，
//! 并核对 metadata 中的类别是否都有对应的病害描述

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{DiagnosisError, Result};
use crate::models::disease;

/// metadata.json 中用到的字段
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelMetadata {
    pub labels: Vec<String>,
    #[serde(default)]
    pub image_size: Option<u32>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub tfjs_version: Option<String>,
}

impl ModelMetadata {
    /// 知识库中没有描述信息的类别
    pub fn unknown_labels(&self) -> Vec<&str> {
        self.labels
            .iter()
            .map(String::as_str)
            .filter(|label| disease::lookup(label).is_none())
            .collect()
    }

    /// 知识库中有、但模型不会输出的类别
    pub fn missing_classes(&self) -> Vec<&'static str> {
        let mut missing: Vec<&'static str> = disease::known_classes()
            .filter(|class| !self.labels.iter().any(|label| label == class))
            .collect();
        missing.sort_unstable();
        missing
    }
}

/// 单个文件的检查结果
#[derive(Debug, Clone)]
pub struct ArtifactStatus {
    pub name: String,
    pub url: String,
    pub status: Option<u16>,
    pub error: Option<String>,
}

impl ArtifactStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self.status, Some(code) if (200..300).contains(&code))
    }
}

/// 诊断报告
#[derive(Debug, Clone)]
pub struct ArtifactReport {
    pub artifacts: Vec<ArtifactStatus>,
    pub metadata: Option<ModelMetadata>,
}

impl ArtifactReport {
    pub fn is_healthy(&self) -> bool {
        self.artifacts.iter().all(ArtifactStatus::is_ok) && self.metadata.is_some()
    }
}

/// 模型文件检查器
pub struct ArtifactChecker {
    client: reqwest::Client,
}

impl ArtifactChecker {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| DiagnosisError::Config(format!("无法创建 HTTP 客户端: {}", e)))?;
        Ok(Self { client })
    }

    /// 检查三个模型文件
    pub async fn check(&self, config: &Config) -> ArtifactReport {
        let targets = [
            (config.model_file.clone(), config.model_url()),
            (config.metadata_file.clone(), config.metadata_url()),
            (config.weights_file.clone(), config.weights_url()),
        ];

        let mut artifacts = Vec::with_capacity(targets.len());
        for (name, url) in targets {
            artifacts.push(self.probe(name, url).await);
        }

        let metadata = match self.fetch_metadata(&config.metadata_url()).await {
            Ok(metadata) => {
                info!("✓ metadata.json 包含 {} 个类别", metadata.labels.len());
                let unknown = metadata.unknown_labels();
                if !unknown.is_empty() {
                    warn!("⚠️ 以下类别没有病害描述: {:?}", unknown);
                }
                let missing = metadata.missing_classes();
                if !missing.is_empty() {
                    info!("模型不包含以下类别: {:?}", missing);
                }
                Some(metadata)
            }
            Err(e) => {
                warn!("⚠️ 无法读取 metadata.json: {}", e);
                None
            }
        };

        ArtifactReport {
            artifacts,
            metadata,
        }
    }

    async fn probe(&self, name: String, url: String) -> ArtifactStatus {
        debug!("检查 {}: {}", name, url);
        match self.client.get(&url).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                info!("{}: {}", name, status);
                ArtifactStatus {
                    name,
                    url,
                    status: Some(status),
                    error: None,
                }
            }
            Err(e) => {
                warn!("{}: 请求失败 {}", name, e);
                ArtifactStatus {
                    name,
                    url,
                    status: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// 读取并解析 metadata.json
    pub async fn fetch_metadata(&self, url: &str) -> Result<ModelMetadata> {
        let artifact_error = |reason: String| DiagnosisError::Artifact {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| artifact_error(e.to_string()))?
            .error_for_status()
            .map_err(|e| artifact_error(e.to_string()))?;

        response
            .json::<ModelMetadata>()
            .await
            .map_err(|e| artifact_error(format!("metadata.json 格式错误: {}", e)))
    }
}
