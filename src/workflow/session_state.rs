//! 会话状态
//!
//! 四个步骤及会话中暂存的数据

use std::fmt::Display;

use serde::Serialize;

use crate::models::PreparedImage;

/// 流程步骤，只能向前推进，或通过重置回到 `Upload`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Upload,
    Chart,
    Validation,
    Result,
}

impl Step {
    pub const ALL: [Step; 4] = [Step::Upload, Step::Chart, Step::Validation, Step::Result];

    /// 步骤序号（从 0 开始）
    pub fn index(self) -> usize {
        match self {
            Step::Upload => 0,
            Step::Chart => 1,
            Step::Validation => 2,
            Step::Result => 3,
        }
    }

    /// 进度条上显示的名称
    pub fn label(self) -> &'static str {
        match self {
            Step::Upload => "Unggah",
            Step::Chart => "Grafik",
            Step::Validation => "Validasi",
            Step::Result => "Hasil",
        }
    }
}

impl Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}/{} {}]", self.index() + 1, Step::ALL.len(), self.label())
    }
}

/// 已选择并解码的图片
#[derive(Debug, Clone)]
pub struct SelectedImage {
    pub file_name: String,
    pub image: PreparedImage,
}
