//! 推理库边界
//!
//! 分类模型本身是黑盒，这里只定义三种能力：
//! - `LibraryProvider`：导入推理库（可能很慢，由 `ModelLoader` 缓存）
//! - `InferenceLibrary`：按 (model_url, metadata_url) 加载模型
//! - `ImageClassifier`：对一张图片输出所有类别的概率

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ClassProbability, PreparedImage};

pub mod teachable_machine;

pub use teachable_machine::BrowserLibraryProvider;

/// 已加载的模型
pub type Model = Arc<dyn ImageClassifier>;

/// 图片分类能力
#[async_trait]
pub trait ImageClassifier: Send + Sync {
    /// 返回模型已知的全部类别及概率，顺序不保证
    async fn predict(&self, image: &PreparedImage) -> Result<Vec<ClassProbability>>;
}

/// 模型加载能力
#[async_trait]
pub trait InferenceLibrary: Send + Sync {
    async fn load(&self, model_url: &str, metadata_url: &str) -> Result<Model>;
}

/// 推理库导入
#[async_trait]
pub trait LibraryProvider: Send + Sync {
    async fn import(&self) -> Result<Arc<dyn InferenceLibrary>>;
}
