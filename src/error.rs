//! 错误类型
//!
//! 分为两层：
//! - `InputError`：用户输入问题，直接展示给用户，可恢复
//! - `DiagnosisError`：库内所有操作的统一错误

use std::time::Duration;

use thiserror::Error;

/// 用户输入错误
///
/// Display 文本即展示给用户的提示语（印尼语界面）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// 预测尚未完成，拒绝新的图片
    #[error("Tunggu hingga analisis selesai sebelum mengunggah gambar baru.")]
    PredictionPending,
    /// 文件不是图片类型
    #[error("Silakan pilih file gambar yang valid (JPG, PNG, dll)")]
    NotAnImage { mime_type: String },
    /// 文件过大
    #[error("Ukuran file terlalu besar. Maksimal {} MB.", .max_bytes / (1024 * 1024))]
    FileTooLarge { size: u64, max_bytes: u64 },
    /// 图片无法解码
    #[error("Gagal memproses gambar. Silakan coba lagi.")]
    UndecodableImage { reason: String },
    /// 尚未选择图片
    #[error("Silakan pilih gambar terlebih dahulu.")]
    NoImageSelected,
    /// 模型尚未就绪
    #[error("Model AI belum sepenuhnya dimuat. Silakan tunggu beberapa saat.")]
    ModelNotReady,
    /// 问卷未全部作答
    #[error("Silakan jawab semua pertanyaan terlebih dahulu.")]
    MissingAnswers,
    /// 问卷答案超出范围
    #[error("Jawaban pertanyaan {question} harus di antara 0 dan 100.")]
    AnswerOutOfRange { question: usize, value: u32 },
    /// 没有预测结果
    #[error("Data prediksi tidak ditemukan")]
    NoPrediction,
}

/// 诊断流程错误
#[derive(Debug, Error)]
pub enum DiagnosisError {
    /// 输入校验失败
    #[error(transparent)]
    InvalidInput(#[from] InputError),

    /// 模型多次加载失败
    #[error("Model failed to load after {attempts} attempts: {source}")]
    ModelLoad {
        attempts: u32,
        #[source]
        source: Box<DiagnosisError>,
    },

    /// 推理库导入失败或不完整
    #[error("Inference library unavailable: {0}")]
    LibraryUnavailable(String),

    /// 模型加载超时
    #[error("Model loading timeout ({0:?} exceeded)")]
    Timeout(Duration),

    /// 推理调用失败
    #[error("Inference failed: {0}")]
    Inference(String),

    /// 浏览器相关错误
    #[error("Browser error: {0}")]
    Browser(String),

    /// 模型文件检查失败
    #[error("Artifact check failed ({url}): {reason}")]
    Artifact { url: String, reason: String },

    /// 配置错误
    #[error("Config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<chromiumoxide::error::CdpError> for DiagnosisError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        DiagnosisError::Browser(err.to_string())
    }
}

impl From<serde_json::Error> for DiagnosisError {
    fn from(err: serde_json::Error) -> Self {
        DiagnosisError::Inference(format!("invalid JSON from inference library: {}", err))
    }
}

impl From<toml::de::Error> for DiagnosisError {
    fn from(err: toml::de::Error) -> Self {
        DiagnosisError::Config(err.to_string())
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, DiagnosisError>;
