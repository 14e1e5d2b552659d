//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行 JS"的能力

use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::Result;

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() / inject_script() 能力
/// - 不认识模型或类别
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 执行 JS 代码并返回 JSON 结果（Promise 会被等待）
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 以 `<script src>` 方式注入外部脚本，等待加载完成
    pub async fn inject_script(&self, src: &str) -> Result<()> {
        debug!("注入脚本: {}", src);
        let src_literal = serde_json::to_string(src)?;
        let js_code = format!(
            r#"
            new Promise((resolve, reject) => {{
                const script = document.createElement('script');
                script.src = {src};
                script.onload = () => resolve(true);
                script.onerror = () => reject(new Error('failed to load script ' + {src}));
                document.head.appendChild(script);
            }})
            "#,
            src = src_literal
        );
        self.eval(js_code).await?;
        Ok(())
    }
}
