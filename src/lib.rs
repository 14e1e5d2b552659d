//! # Padi Diagnosis
//!
//! 水稻叶片病虫害诊断：图片分类 + 症状问卷，融合成一个诊断得分
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（浏览器 Page），只暴露能力
//! - `JsExecutor` - 唯一的 page owner，提供 eval() 能力
//!
//! ### ② 推理边界（Inference）
//! - `inference/` - 推理库的三个 trait，以及浏览器中运行的 Teachable Machine 适配器
//!
//! ### ③ 业务能力层（Services）
//! - `scoring` - 问卷得分、融合得分、等级标签
//! - `ModelLoader` - 带超时与指数退避的模型加载
//! - `prediction_runner` - 预测并按概率排序
//! - `image_service` - 上传校验与解码
//! - `ArtifactChecker` - 模型文件诊断
//!
//! ### ④ 流程层（Workflow）
//! - `DiagnosisFlow` - 四步状态机（upload → chart → validation → result）
//!
//! ### ⑤ 编排层（Orchestration）
//! - `App` - 命令行入口，驱动单个会话
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod inference;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{DiagnosisError, InputError, Result};
pub use inference::{ImageClassifier, InferenceLibrary, LibraryProvider, Model};
pub use models::{AnswerSet, ClassProbability, DiagnosisResult, Prediction, PreparedImage, UploadedImage};
pub use orchestrator::App;
pub use services::{LoadPolicy, ModelLoader};
pub use workflow::{DiagnosisFlow, FlowSettings, Step};
