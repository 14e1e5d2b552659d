//! 症状问卷答案

use serde::Serialize;

use crate::error::InputError;

/// 问卷题目（印尼语界面），每题 0-100 分
pub const QUESTIONNAIRE: [&str; 3] = [
    "Seberapa sesuai bercak atau perubahan warna pada daun dengan hasil deteksi?",
    "Seberapa luas gejala menyebar pada rumpun padi di sekitar tanaman ini?",
    "Seberapa cepat gejala berkembang dalam beberapa hari terakhir?",
];

/// 完整的问卷答案
///
/// 只能通过 `new` / `from_partial` 构造，保证三题齐全且都在 0-100 之间
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnswerSet {
    question1: u8,
    question2: u8,
    question3: u8,
}

impl AnswerSet {
    /// 单题最高分
    pub const MAX_SCORE: u8 = 100;

    pub fn new(question1: u32, question2: u32, question3: u32) -> Result<Self, InputError> {
        Ok(Self {
            question1: check_range(1, question1)?,
            question2: check_range(2, question2)?,
            question3: check_range(3, question3)?,
        })
    }

    /// 从可能缺项的输入构造，任一缺项即失败
    pub fn from_partial(
        question1: Option<u32>,
        question2: Option<u32>,
        question3: Option<u32>,
    ) -> Result<Self, InputError> {
        match (question1, question2, question3) {
            (Some(a), Some(b), Some(c)) => Self::new(a, b, c),
            _ => Err(InputError::MissingAnswers),
        }
    }

    pub fn question1(&self) -> u8 {
        self.question1
    }

    pub fn question2(&self) -> u8 {
        self.question2
    }

    pub fn question3(&self) -> u8 {
        self.question3
    }

    /// 三题总分
    pub fn total(&self) -> u32 {
        u32::from(self.question1) + u32::from(self.question2) + u32::from(self.question3)
    }

    /// 满分总和（300）
    pub fn max_total() -> u32 {
        u32::from(Self::MAX_SCORE) * 3
    }
}

fn check_range(question: usize, value: u32) -> Result<u8, InputError> {
    if value > u32::from(AnswerSet::MAX_SCORE) {
        return Err(InputError::AnswerOutOfRange { question, value });
    }
    Ok(value as u8)
}
