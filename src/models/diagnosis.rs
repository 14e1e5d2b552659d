use serde::Serialize;

use crate::models::answers::AnswerSet;
use crate::models::disease::{self, DiseaseInfo};
use crate::models::prediction::Prediction;
use crate::services::scoring;

/// 最终诊断结果
///
/// 只能由一次预测 + 一份完整问卷生成，生成后不可修改
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisResult {
    disease_class: String,
    disease_name: String,
    ai_probability: f64,
    user_score: u8,
    final_score: f64,
    disease_info: Option<&'static DiseaseInfo>,
}

impl DiagnosisResult {
    pub fn from_parts(prediction: &Prediction, answers: &AnswerSet) -> Self {
        let disease_class = prediction.class().to_string();
        let ai_probability = prediction.probability();
        let user_score = scoring::calculate_user_score(answers);
        let final_score = scoring::calculate_final_score(ai_probability, user_score);

        Self {
            disease_name: disease::localized_name(&disease_class),
            disease_info: disease::lookup(&disease_class),
            disease_class,
            ai_probability,
            user_score,
            final_score,
        }
    }

    pub fn disease_class(&self) -> &str {
        &self.disease_class
    }

    /// 本地化名称
    pub fn disease_name(&self) -> &str {
        &self.disease_name
    }

    pub fn ai_probability(&self) -> f64 {
        self.ai_probability
    }

    pub fn user_score(&self) -> u8 {
        self.user_score
    }

    pub fn final_score(&self) -> f64 {
        self.final_score
    }

    pub fn disease_info(&self) -> Option<&'static DiseaseInfo> {
        self.disease_info
    }

    /// 置信度等级文本
    pub fn confidence_level(&self) -> &'static str {
        scoring::confidence_level(self.final_score)
    }
}
