//! 编排层（Orchestration Layer）
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::App (命令行，单个会话)
//!     ↓
//! workflow::DiagnosisFlow (upload → chart → validation → result)
//!     ↓
//! services (能力层：scoring / model_loader / prediction_runner / image / artifact_check)
//!     ↓
//! inference (推理库边界) → infrastructure (浏览器、JsExecutor)
//! ```

pub mod app;

pub use app::{check_artifacts, App};
