//! 评分引擎 - 业务能力层
//!
//! 纯函数：问卷得分、AI 概率与问卷得分的加权融合、展示用的等级标签

use serde::Serialize;

use crate::models::answers::AnswerSet;
use crate::models::disease::Severity;

/// AI 概率权重
pub const AI_WEIGHT: f64 = 0.7;
/// 问卷得分权重
pub const USER_WEIGHT: f64 = 0.3;

/// 展示颜色分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorCategory {
    Red,
    Yellow,
    Blue,
    Green,
    Gray,
}

/// 计算问卷得分 (0-100)
///
/// `round(总分 / 300 * 100)`
pub fn calculate_user_score(answers: &AnswerSet) -> u8 {
    let percentage = f64::from(answers.total()) / f64::from(AnswerSet::max_total()) * 100.0;
    percentage.round() as u8
}

/// 计算最终得分，保留两位小数
///
/// `ai_probability` 为 0-1 的小数，`user_score` 为 0-100，两者不做统一刻度，
/// 直接按 70% / 30% 加权。
pub fn calculate_final_score(ai_probability: f64, user_score: u8) -> f64 {
    let blended = ai_probability * AI_WEIGHT + f64::from(user_score) * USER_WEIGHT;
    (blended * 100.0).round() / 100.0
}

/// 把概率格式化为百分比字符串，如 `0.873 -> "87%"`
pub fn format_probability(probability: f64) -> String {
    format!("{}%", (probability * 100.0).round() as i64)
}

/// 严重程度文本
pub fn severity_text(severity: Severity) -> &'static str {
    match severity {
        Severity::Severe => "Parah",
        Severity::Moderate => "Sedang",
        Severity::Mild => "Ringan",
        Severity::Healthy => "Sehat",
        Severity::Other => "Tidak Diketahui",
    }
}

/// 严重程度颜色
pub fn severity_color(severity: Severity) -> ColorCategory {
    match severity {
        Severity::Severe => ColorCategory::Red,
        Severity::Moderate => ColorCategory::Yellow,
        Severity::Mild => ColorCategory::Blue,
        Severity::Healthy => ColorCategory::Green,
        Severity::Other => ColorCategory::Gray,
    }
}

/// 根据最终得分给出置信度等级
pub fn confidence_level(final_score: f64) -> &'static str {
    if final_score >= 80.0 {
        "Sangat Tinggi"
    } else if final_score >= 60.0 {
        "Tinggi"
    } else if final_score >= 40.0 {
        "Sedang"
    } else {
        "Rendah"
    }
}

pub fn confidence_level_color(final_score: f64) -> ColorCategory {
    if final_score >= 80.0 {
        ColorCategory::Green
    } else if final_score >= 60.0 {
        ColorCategory::Blue
    } else if final_score >= 40.0 {
        ColorCategory::Yellow
    } else {
        ColorCategory::Red
    }
}
