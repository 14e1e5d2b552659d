//! Teachable Machine 适配器
//!
//! 在浏览器页面中运行 `@teachablemachine/image`：
//! - import：打开与模型同源的页面，注入 TF.js 与 Teachable Machine 脚本，确认 `tmImage.load` 可用
//! - load：在页面中调用 `tmImage.load(modelURL, metadataURL)`，模型保存在 `window.__padiModels`
//! - predict：把图片以 data URL 传入页面，调用 `model.predict(img)`

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chromiumoxide::Browser;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{DiagnosisError, Result};
use crate::infrastructure::{open_page, JsExecutor};
use crate::inference::{ImageClassifier, InferenceLibrary, LibraryProvider, Model};
use crate::models::{ClassProbability, PreparedImage};

/// 浏览器会话：浏览器进程与唯一的页面
struct BrowserSession {
    _browser: Browser,
    executor: JsExecutor,
}

/// 通过浏览器导入 Teachable Machine
pub struct BrowserLibraryProvider {
    debug_port: u16,
    /// 页面地址，需与模型文件同源，否则 `tmImage.load` 的请求会被 CORS 拦截
    page_url: String,
    scripts: Vec<String>,
}

impl BrowserLibraryProvider {
    pub fn new(debug_port: u16, page_url: impl Into<String>, scripts: Vec<String>) -> Self {
        Self {
            debug_port,
            page_url: page_url.into(),
            scripts,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.browser_debug_port,
            config.model_origin(),
            config.library_scripts.clone(),
        )
    }
}

#[async_trait]
impl LibraryProvider for BrowserLibraryProvider {
    async fn import(&self) -> Result<Arc<dyn InferenceLibrary>> {
        let (browser, page) = open_page(self.debug_port, &self.page_url).await?;
        let executor = JsExecutor::new(page);

        for script in &self.scripts {
            executor.inject_script(script).await?;
        }

        let kind: String = executor
            .eval_as("typeof tmImage === 'undefined' ? 'undefined' : typeof tmImage.load")
            .await?;
        if kind != "function" {
            return Err(DiagnosisError::LibraryUnavailable(format!(
                "Teachable Machine module not properly loaded. Got: {}",
                kind
            )));
        }
        info!("✓ Teachable Machine 已导入");

        Ok(Arc::new(TeachableMachineLibrary {
            session: Arc::new(BrowserSession {
                _browser: browser,
                executor,
            }),
            next_model_id: AtomicU64::new(0),
        }))
    }
}

/// 页面中已导入的 Teachable Machine
struct TeachableMachineLibrary {
    session: Arc<BrowserSession>,
    next_model_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadedModelInfo {
    total_classes: u32,
}

#[async_trait]
impl InferenceLibrary for TeachableMachineLibrary {
    async fn load(&self, model_url: &str, metadata_url: &str) -> Result<Model> {
        let model_id = self.next_model_id.fetch_add(1, Ordering::Relaxed);
        info!("正在获取模型: {}", model_url);
        info!("正在获取元数据: {}", metadata_url);

        let js_code = format!(
            r#"
            (async () => {{
                const model = await tmImage.load({model_url}, {metadata_url});
                window.__padiModels = window.__padiModels || {{}};
                window.__padiModels[{model_id}] = model;
                return {{ totalClasses: model.getTotalClasses() }};
            }})()
            "#,
            model_url = serde_json::to_string(model_url)?,
            metadata_url = serde_json::to_string(metadata_url)?,
            model_id = model_id,
        );

        let loaded: LoadedModelInfo = self.session.executor.eval_as(js_code).await?;
        debug!("模型 #{} 包含 {} 个类别", model_id, loaded.total_classes);

        Ok(Arc::new(TeachableMachineModel {
            session: Arc::clone(&self.session),
            model_id,
        }))
    }
}

/// 页面中的一个模型实例
struct TeachableMachineModel {
    session: Arc<BrowserSession>,
    model_id: u64,
}

#[async_trait]
impl ImageClassifier for TeachableMachineModel {
    async fn predict(&self, image: &PreparedImage) -> Result<Vec<ClassProbability>> {
        let data_url = image.to_png_data_url()?;
        let js_code = format!(
            r#"
            (async () => {{
                const model = window.__padiModels[{model_id}];
                const img = new Image();
                img.crossOrigin = 'anonymous';
                img.src = {data_url};
                await img.decode();
                const predictions = await model.predict(img);
                return predictions.map(p => ({{ className: p.className, probability: p.probability }}));
            }})()
            "#,
            model_id = self.model_id,
            data_url = serde_json::to_string(&data_url)?,
        );

        self.session
            .executor
            .eval_as(js_code)
            .await
            .map_err(|e| match e {
                DiagnosisError::Browser(message) => DiagnosisError::Inference(message),
                other => other,
            })
    }
}
