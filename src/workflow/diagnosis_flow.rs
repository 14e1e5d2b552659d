//! 诊断流程 - 流程层
//!
//! 核心职责：定义"一次诊断"的完整流程
//!
//! 流程顺序：
//! 1. upload：选择图片 → 预测，置信度 > 阈值才进入下一步
//! 2. chart：查看各类别概率，用户确认后进入问卷
//! 3. validation：提交完整问卷 → 计算融合得分
//! 4. result：展示诊断结果
//!
//! 任意步骤都可以重置回 upload。所有错误都在这里转换成一条提示信息，不向外抛出。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{DiagnosisError, InputError, Result};
use crate::inference::Model;
use crate::models::{AnswerSet, DiagnosisResult, PreparedImage, Prediction, UploadedImage};
use crate::services::{image_service, prediction_runner, scoring, ModelLoader};
use crate::workflow::session_state::{SelectedImage, Step};

/// 流程参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowSettings {
    pub max_upload_bytes: u64,
    /// 置信度必须严格大于该值
    pub confidence_threshold: f64,
    pub max_image_edge: u32,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            max_upload_bytes: 10 * 1024 * 1024,
            confidence_threshold: 0.5,
            max_image_edge: 1024,
        }
    }
}

impl FlowSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_upload_bytes: config.max_upload_bytes,
            confidence_threshold: config.confidence_threshold,
            max_image_edge: config.max_image_edge,
        }
    }
}

/// 标识一次预测请求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictionTicket {
    id: u64,
    generation: u64,
}

/// 已通过检查、等待执行的预测
///
/// job 存活期间流程拒绝新的图片和新的预测。执行完成后交回 `finish_prediction`；
/// 中途被丢弃（包括 `predict` 的 future 被取消）时预测槽位同样释放。
pub struct PredictionJob {
    ticket: PredictionTicket,
    model: Model,
    image: PreparedImage,
    slot: Arc<AtomicBool>,
}

impl Drop for PredictionJob {
    fn drop(&mut self) {
        self.slot.store(false, Ordering::Release);
    }
}

impl PredictionJob {
    pub fn ticket(&self) -> PredictionTicket {
        self.ticket
    }

    pub async fn run(&self) -> Result<Prediction> {
        prediction_runner::predict(self.model.as_ref(), &self.image).await
    }
}

/// 诊断流程（单个会话）
pub struct DiagnosisFlow {
    loader: ModelLoader,
    settings: FlowSettings,
    step: Step,
    model: Option<Model>,
    model_loading: bool,
    selected_image: Option<SelectedImage>,
    prediction: Option<Prediction>,
    result: Option<DiagnosisResult>,
    error_message: Option<String>,
    /// 预测槽位，由存活的 `PredictionJob` 占用
    in_flight: Arc<AtomicBool>,
    next_ticket_id: u64,
    generation: u64,
}

impl DiagnosisFlow {
    /// 创建流程并立即加载模型
    ///
    /// 加载失败不会返回错误，而是记录在 `error_message` 中，流程停留在 upload
    pub async fn initialize(loader: ModelLoader, settings: FlowSettings) -> Self {
        let mut flow = Self {
            loader,
            settings,
            step: Step::Upload,
            model: None,
            model_loading: false,
            selected_image: None,
            prediction: None,
            result: None,
            error_message: None,
            in_flight: Arc::new(AtomicBool::new(false)),
            next_ticket_id: 0,
            generation: 0,
        };
        flow.load_model().await;
        flow
    }

    async fn load_model(&mut self) {
        self.model_loading = true;
        self.error_message = None;
        info!("正在初始化 AI 模型...");

        match self.loader.load().await {
            Ok(model) => {
                self.model = Some(model);
                info!("✓ AI 模型就绪");
            }
            Err(e) => {
                error!("模型加载错误: {}", e);
                self.error_message = Some(format!(
                    "Gagal memuat model AI ({}). Coba muat ulang aplikasi atau cek koneksi internet Anda.",
                    e
                ));
            }
        }

        self.model_loading = false;
    }

    // ========== 步骤 1: upload ==========

    /// 选择图片
    ///
    /// # 返回
    /// 图片是否被接受
    pub async fn select_image(&mut self, upload: UploadedImage) -> bool {
        if self.step != Step::Upload {
            warn!("{} 当前步骤不能选择图片", self.step);
            return false;
        }
        if self.is_prediction_pending() {
            self.fail_input(InputError::PredictionPending);
            return false;
        }
        if let Err(e) = image_service::validate_upload(&upload, self.settings.max_upload_bytes) {
            self.fail_input(e);
            return false;
        }

        match image_service::decode(&upload, self.settings.max_image_edge).await {
            Ok(image) => {
                let (width, height) = image.dimensions();
                info!("✓ 已选择图片: {} ({}x{})", upload.file_name, width, height);
                self.selected_image = Some(SelectedImage {
                    file_name: upload.file_name,
                    image,
                });
                self.error_message = None;
                true
            }
            Err(DiagnosisError::InvalidInput(e)) => {
                self.fail_input(e);
                false
            }
            Err(e) => {
                error!("读取图片失败: {}", e);
                self.fail("Gagal membaca file. Silakan coba lagi.".to_string());
                false
            }
        }
    }

    /// 检查预测前置条件并占用预测槽位
    ///
    /// 返回 `None` 时原因已写入 `error_message`
    pub fn start_prediction(&mut self) -> Option<PredictionJob> {
        if self.step != Step::Upload {
            warn!("{} 当前步骤不能发起预测", self.step);
            return None;
        }
        if self.is_prediction_pending() {
            self.fail_input(InputError::PredictionPending);
            return None;
        }
        if self.selected_image.is_none() {
            self.fail_input(InputError::NoImageSelected);
            return None;
        }
        if self.model.is_none() {
            self.fail_input(InputError::ModelNotReady);
            return None;
        }
        let (Some(selected), Some(model)) = (&self.selected_image, &self.model) else {
            return None;
        };

        let ticket = PredictionTicket {
            id: self.next_ticket_id,
            generation: self.generation,
        };
        let job = PredictionJob {
            ticket,
            model: Arc::clone(model),
            image: selected.image.clone(),
            slot: Arc::clone(&self.in_flight),
        };

        self.next_ticket_id += 1;
        self.in_flight.store(true, Ordering::Release);
        self.error_message = None;
        info!("🔍 正在分析图片: {}", selected.file_name);
        Some(job)
    }

    /// 交回预测结果
    ///
    /// 置信度严格大于阈值时进入 chart，否则停留在 upload 并提示换图。
    /// 重置之前发起的预测结果会被丢弃。交回的 job 在这里释放预测槽位。
    pub fn finish_prediction(&mut self, job: PredictionJob, outcome: Result<Prediction>) -> Step {
        let ticket = job.ticket();
        drop(job);
        if ticket.generation != self.generation {
            debug!("丢弃重置前的预测结果 (#{})", ticket.id);
            return self.step;
        }

        match outcome {
            Ok(prediction) => {
                let probability = prediction.probability();
                info!(
                    "✓ 预测完成: {} ({})",
                    prediction.class(),
                    scoring::format_probability(probability)
                );

                if probability > self.settings.confidence_threshold {
                    self.step = Step::Chart;
                } else {
                    self.fail(format!(
                        "Probabilitas prediksi rendah ({}). Coba dengan gambar yang lebih jelas atau dari sudut berbeda.",
                        scoring::format_probability(probability)
                    ));
                }
                self.prediction = Some(prediction);
            }
            Err(e) => {
                error!("预测错误: {}", e);
                self.fail("Terjadi kesalahan saat memprediksi gambar. Silakan coba lagi.".to_string());
            }
        }

        self.step
    }

    /// 发起预测并等待完成
    pub async fn predict(&mut self) -> Step {
        let Some(job) = self.start_prediction() else {
            return self.step;
        };
        let outcome = job.run().await;
        self.finish_prediction(job, outcome)
    }

    // ========== 步骤 2: chart ==========

    /// 用户确认图表，进入问卷
    pub fn proceed_to_validation(&mut self) -> Step {
        if self.step == Step::Chart {
            self.step = Step::Validation;
            info!("{} 进入问卷", self.step);
        } else {
            warn!("{} 当前步骤不能进入问卷", self.step);
        }
        self.step
    }

    // ========== 步骤 3: validation ==========

    /// 提交问卷，生成诊断结果
    pub fn submit_answers(&mut self, answers: AnswerSet) -> Step {
        if self.step != Step::Validation {
            warn!("{} 当前步骤不能提交问卷", self.step);
            return self.step;
        }
        let Some(prediction) = &self.prediction else {
            self.fail_input(InputError::NoPrediction);
            return self.step;
        };

        let result = DiagnosisResult::from_parts(prediction, &answers);
        info!(
            "✓ 诊断完成: {} | AI: {} | 问卷: {} | 最终: {}",
            result.disease_name(),
            scoring::format_probability(result.ai_probability()),
            result.user_score(),
            result.final_score()
        );

        self.result = Some(result);
        self.error_message = None;
        self.step = Step::Result;
        self.step
    }

    /// 提交可能缺项的问卷
    pub fn submit_partial_answers(
        &mut self,
        question1: Option<u32>,
        question2: Option<u32>,
        question3: Option<u32>,
    ) -> Step {
        match AnswerSet::from_partial(question1, question2, question3) {
            Ok(answers) => self.submit_answers(answers),
            Err(e) => {
                self.fail_input(e);
                self.step
            }
        }
    }

    // ========== 重置 ==========

    /// 回到 upload，清空图片、预测、结果和提示
    pub fn reset(&mut self) -> Step {
        self.step = Step::Upload;
        self.selected_image = None;
        self.prediction = None;
        self.result = None;
        self.error_message = None;
        self.generation += 1;
        info!("{} 已重置", self.step);
        self.step
    }

    // ========== 查询 ==========

    pub fn step(&self) -> Step {
        self.step
    }

    /// 当前步骤之前的步骤都视为已完成
    pub fn completed_steps(&self) -> Vec<Step> {
        Step::ALL
            .into_iter()
            .filter(|step| *step < self.step)
            .collect()
    }

    pub fn is_model_ready(&self) -> bool {
        self.model.is_some()
    }

    pub fn is_model_loading(&self) -> bool {
        self.model_loading
    }

    pub fn is_prediction_pending(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn selected_image(&self) -> Option<&SelectedImage> {
        self.selected_image.as_ref()
    }

    pub fn prediction(&self) -> Option<&Prediction> {
        self.prediction.as_ref()
    }

    pub fn result(&self) -> Option<&DiagnosisResult> {
        self.result.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn settings(&self) -> &FlowSettings {
        &self.settings
    }

    // ========== 辅助方法 ==========

    fn fail_input(&mut self, e: InputError) {
        self.fail(e.to_string());
    }

    fn fail(&mut self, message: String) {
        warn!("{} ⚠️ {}", self.step, message);
        self.error_message = Some(message);
    }
}
