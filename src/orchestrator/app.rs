//! 命令行应用 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：会话日志、推理库提供者、加载模型
//! 2. **驱动流程**：按 upload → chart → validation → result 调用 `DiagnosisFlow`
//! 3. **终端展示**：概率图表、问卷、诊断结果
//! 4. **模型文件诊断**：`diagnose` 命令

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::config::Config;
use crate::inference::BrowserLibraryProvider;
use crate::models::{AnswerSet, DiagnosisResult, Prediction, UploadedImage, QUESTIONNAIRE};
use crate::services::{scoring, ArtifactChecker, ModelLoader};
use crate::utils::logging::{append_diagnosis, init_log_file, log_startup};
use crate::workflow::{DiagnosisFlow, FlowSettings, Step};

/// 图表中最长的条形宽度
const BAR_WIDTH: usize = 30;

/// 应用主结构
pub struct App {
    config: Config,
    flow: DiagnosisFlow,
}

impl App {
    /// 初始化应用并加载模型
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate()?;
        init_log_file(&config.session_log_file)
            .with_context(|| format!("无法创建会话日志: {}", config.session_log_file))?;

        log_startup(&config);

        let provider = Arc::new(BrowserLibraryProvider::from_config(&config));
        let loader = ModelLoader::from_config(provider, &config);
        let flow = DiagnosisFlow::initialize(loader, FlowSettings::from_config(&config)).await;

        if !flow.is_model_ready() {
            bail!(
                "{}",
                flow.error_message().unwrap_or("Model gagal dimuat")
            );
        }

        Ok(Self { config, flow })
    }

    /// 对一张图片执行完整诊断
    ///
    /// # 参数
    /// - `image_path`: 叶片照片路径
    /// - `answers`: 三题答案，缺省时在终端逐题询问
    pub async fn run(&mut self, image_path: &Path, answers: Option<[u32; 3]>) -> Result<()> {
        // ========== 步骤 1: 上传并预测 ==========
        let upload = UploadedImage::from_path(image_path)
            .await
            .with_context(|| format!("无法读取图片: {}", image_path.display()))?;
        let file_name = upload.file_name.clone();

        if !self.flow.select_image(upload).await {
            bail!("{}", self.current_error());
        }

        if self.flow.predict().await != Step::Chart {
            if let Some(prediction) = self.flow.prediction() {
                print_chart(prediction);
            }
            bail!("{}", self.current_error());
        }

        // ========== 步骤 2: 概率图表 ==========
        if let Some(prediction) = self.flow.prediction() {
            print_chart(prediction);
        }
        self.flow.proceed_to_validation();

        // ========== 步骤 3: 问卷 ==========
        let [q1, q2, q3] = match answers {
            Some(answers) => answers,
            None => prompt_answers().await?,
        };
        if self.flow.submit_partial_answers(Some(q1), Some(q2), Some(q3)) != Step::Result {
            bail!("{}", self.current_error());
        }

        // ========== 步骤 4: 结果 ==========
        if let Some(result) = self.flow.result() {
            print_result(result);
            if let Err(e) = append_diagnosis(&self.config.session_log_file, &file_name, result) {
                warn!("⚠️ 写入会话日志失败: {}", e);
            }
        }

        self.flow.reset();
        Ok(())
    }

    fn current_error(&self) -> String {
        self.flow
            .error_message()
            .unwrap_or("Terjadi kesalahan yang tidak terduga.")
            .to_string()
    }
}

/// 检查模型文件是否都可访问
///
/// # 返回
/// 全部正常返回 true
pub async fn check_artifacts(config: &Config) -> Result<bool> {
    config.validate()?;
    info!("🔍 检查模型文件: {}", config.model_base_url);
    let checker = ArtifactChecker::new()?;
    let report = checker.check(config).await;

    for artifact in &report.artifacts {
        match (artifact.status, &artifact.error) {
            (Some(code), _) => println!("{:<16} {}", artifact.name, code),
            (None, Some(e)) => println!("{:<16} ✗ {}", artifact.name, e),
            (None, None) => println!("{:<16} ✗", artifact.name),
        }
    }
    if let Some(metadata) = &report.metadata {
        println!("labels: {}", metadata.labels.join(", "));
    }

    Ok(report.is_healthy())
}

/// 逐题询问，输入无效时重新询问
async fn prompt_answers() -> Result<[u32; 3]> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut answers = [0u32; 3];

    for (index, question) in QUESTIONNAIRE.iter().enumerate() {
        loop {
            println!("{}. {} (0-{})", index + 1, question, AnswerSet::MAX_SCORE);
            let line = lines
                .next_line()
                .await?
                .context("输入已结束，问卷未完成")?;

            match line.trim().parse::<u32>() {
                Ok(value) if value <= u32::from(AnswerSet::MAX_SCORE) => {
                    answers[index] = value;
                    break;
                }
                _ => println!(
                    "Jawaban pertanyaan {} harus di antara 0 dan 100.",
                    index + 1
                ),
            }
        }
    }

    Ok(answers)
}

fn print_chart(prediction: &Prediction) {
    println!("\n{}", "─".repeat(60));
    for item in prediction.all_predictions() {
        let bar = "█".repeat((item.probability * BAR_WIDTH as f64).round() as usize);
        println!(
            "{:<24} {:<width$} {:>4}",
            item.class_name,
            bar,
            scoring::format_probability(item.probability),
            width = BAR_WIDTH
        );
    }
    println!("{}\n", "─".repeat(60));
}

fn print_result(result: &DiagnosisResult) {
    println!("\n{}", "=".repeat(60));
    println!("Diagnosis     : {} ({})", result.disease_name(), result.disease_class());
    println!("Probabilitas AI: {}", scoring::format_probability(result.ai_probability()));
    println!("Skor validasi : {}", result.user_score());
    println!(
        "Skor akhir    : {} ({})",
        result.final_score(),
        result.confidence_level()
    );

    if let Some(info) = result.disease_info() {
        println!("Tingkat       : {}", scoring::severity_text(info.severity));
        println!("\n{}", info.description);
        print_list("Gejala", info.symptoms);
        print_list("Penanganan", info.treatment);
        print_list("Pencegahan", info.prevention);
    }
    println!("{}", "=".repeat(60));
}

fn print_list(title: &str, items: &[&str]) {
    if items.is_empty() {
        return;
    }
    println!("\n{}:", title);
    for item in items {
        println!("  - {}", item);
    }
}
