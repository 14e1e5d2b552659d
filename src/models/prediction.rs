use serde::{Deserialize, Serialize};

use crate::error::{DiagnosisError, Result};

/// 推理库返回的单个类别概率
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassProbability {
    pub class_name: String,
    pub probability: f64,
}

impl ClassProbability {
    pub fn new(class_name: impl Into<String>, probability: f64) -> Self {
        Self {
            class_name: class_name.into(),
            probability,
        }
    }
}

/// 一次预测的结果
///
/// `all_predictions` 按概率降序排列，首项即主预测
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    class: String,
    probability: f64,
    all_predictions: Vec<ClassProbability>,
}

impl Prediction {
    /// 从推理库的原始输出构造
    ///
    /// 稳定排序：概率相同的类别保持原始顺序。
    /// 输出为空或概率不在 [0, 1] 内视为推理失败。
    pub fn from_raw(mut raw: Vec<ClassProbability>) -> Result<Self> {
        if let Some(bad) = raw
            .iter()
            .find(|p| !p.probability.is_finite() || !(0.0..=1.0).contains(&p.probability))
        {
            return Err(DiagnosisError::Inference(format!(
                "probability out of range for '{}': {}",
                bad.class_name, bad.probability
            )));
        }

        raw.sort_by(|a, b| b.probability.total_cmp(&a.probability));

        let top = raw
            .first()
            .ok_or_else(|| DiagnosisError::Inference("model returned no predictions".to_string()))?;

        Ok(Self {
            class: top.class_name.clone(),
            probability: top.probability,
            all_predictions: raw,
        })
    }

    /// 主预测类别
    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn all_predictions(&self) -> &[ClassProbability] {
        &self.all_predictions
    }
}
