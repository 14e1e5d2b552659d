use std::io::Cursor;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, RgbImage};
use padi_diagnosis::error::{DiagnosisError, Result};
use padi_diagnosis::inference::{ImageClassifier, InferenceLibrary, LibraryProvider, Model};
use padi_diagnosis::models::{AnswerSet, ClassProbability, PreparedImage, UploadedImage};
use padi_diagnosis::services::{LoadPolicy, ModelLoader};
use padi_diagnosis::workflow::{DiagnosisFlow, FlowSettings, Step};
use tokio::time::Instant;
use tokio_test::assert_ok;

// ========== 测试用推理库 ==========

/// 固定输出的分类器
struct FakeClassifier {
    output: Vec<ClassProbability>,
    fail: bool,
    hang: bool,
}

#[async_trait]
impl ImageClassifier for FakeClassifier {
    async fn predict(&self, _image: &PreparedImage) -> Result<Vec<ClassProbability>> {
        if self.hang {
            futures::future::pending::<()>().await;
        }
        if self.fail {
            return Err(DiagnosisError::Inference("WebGL context lost".to_string()));
        }
        Ok(self.output.clone())
    }
}

/// 前 `failures` 次加载失败的推理库
struct FakeLibrary {
    failures: u32,
    hang: bool,
    loads: AtomicU32,
    output: Vec<ClassProbability>,
    fail_predict: bool,
    hang_predict: bool,
}

impl FakeLibrary {
    fn new(output: Vec<ClassProbability>) -> Self {
        Self {
            failures: 0,
            hang: false,
            loads: AtomicU32::new(0),
            output,
            fail_predict: false,
            hang_predict: false,
        }
    }

    fn failing(failures: u32) -> Self {
        Self {
            failures,
            ..Self::new(healthy_output(0.9))
        }
    }

    fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::new(healthy_output(0.9))
        }
    }
}

#[async_trait]
impl InferenceLibrary for FakeLibrary {
    async fn load(&self, model_url: &str, metadata_url: &str) -> Result<Model> {
        assert!(model_url.ends_with("model.json"));
        assert!(metadata_url.ends_with("metadata.json"));

        let attempt = self.loads.fetch_add(1, Ordering::SeqCst) + 1;
        if self.hang {
            futures::future::pending::<()>().await;
        }
        if attempt <= self.failures {
            return Err(DiagnosisError::Browser(format!(
                "404 Not Found (load #{})",
                attempt
            )));
        }
        Ok(Arc::new(FakeClassifier {
            output: self.output.clone(),
            fail: self.fail_predict,
            hang: self.hang_predict,
        }))
    }
}

struct FakeProvider {
    library: Arc<FakeLibrary>,
    imports: AtomicU32,
    import_failures: u32,
}

impl FakeProvider {
    fn new(library: FakeLibrary) -> Arc<Self> {
        Arc::new(Self {
            library: Arc::new(library),
            imports: AtomicU32::new(0),
            import_failures: 0,
        })
    }
}

#[async_trait]
impl LibraryProvider for FakeProvider {
    async fn import(&self) -> Result<Arc<dyn InferenceLibrary>> {
        let attempt = self.imports.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.import_failures {
            return Err(DiagnosisError::LibraryUnavailable(
                "Teachable Machine module not properly loaded. Got: undefined".to_string(),
            ));
        }
        Ok(self.library.clone() as Arc<dyn InferenceLibrary>)
    }
}

// ========== 辅助函数 ==========

fn healthy_output(top: f64) -> Vec<ClassProbability> {
    let rest = (1.0 - top) / 2.0;
    vec![
        ClassProbability::new("Brown Spot", rest),
        ClassProbability::new("Healthy", top),
        ClassProbability::new("Leaf Blast", rest),
    ]
}

fn loader(provider: Arc<FakeProvider>) -> ModelLoader {
    ModelLoader::new(
        provider,
        LoadPolicy::default(),
        "http://localhost:3000/model/model.json",
        "http://localhost:3000/model/metadata.json",
    )
}

fn png_upload(name: &str) -> UploadedImage {
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 48, image::Rgb([40, 160, 60])))
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    UploadedImage::new(name, "image/png", buffer)
}

async fn flow_with_output(output: Vec<ClassProbability>) -> DiagnosisFlow {
    let provider = FakeProvider::new(FakeLibrary::new(output));
    DiagnosisFlow::initialize(loader(provider), FlowSettings::default()).await
}

// ========== ModelLoader ==========

#[tokio::test(start_paused = true)]
async fn test_loader_retries_with_exponential_backoff() {
    let provider = FakeProvider::new(FakeLibrary::failing(2));
    let loader = loader(provider.clone());

    let start = Instant::now();
    let model = assert_ok!(loader.load().await);
    let elapsed = start.elapsed();

    // 1000ms + 2000ms
    assert!(elapsed >= Duration::from_millis(3000), "elapsed: {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(3010), "elapsed: {:?}", elapsed);
    assert_eq!(provider.library.loads.load(Ordering::SeqCst), 3);
    // 推理库只导入一次
    assert_eq!(provider.imports.load(Ordering::SeqCst), 1);

    let image = PreparedImage::from_rgb(RgbImage::new(8, 8));
    let raw = assert_ok!(model.predict(&image).await);
    assert_eq!(raw.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_loader_gives_up_after_three_attempts() {
    let provider = FakeProvider::new(FakeLibrary::failing(3));
    let loader = loader(provider.clone());

    let start = Instant::now();
    let Err(err) = loader.load().await else {
        panic!("加载应当失败");
    };

    assert!(start.elapsed() < Duration::from_millis(3010));
    assert!(matches!(err, DiagnosisError::ModelLoad { attempts: 3, .. }));
    let message = err.to_string();
    assert!(message.contains("after 3 attempts"), "message: {}", message);
    assert!(message.contains("load #3"), "应当包含最后一次错误: {}", message);
    assert_eq!(provider.library.loads.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_loader_times_out_each_attempt() {
    let provider = FakeProvider::new(FakeLibrary::hanging());
    let loader = loader(provider);

    let start = Instant::now();
    let Err(err) = loader.load().await else {
        panic!("加载应当超时");
    };
    let elapsed = start.elapsed();

    // 3 × 60s 超时 + 1s + 2s 退避
    assert!(elapsed >= Duration::from_secs(183), "elapsed: {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(184), "elapsed: {:?}", elapsed);
    match err {
        DiagnosisError::ModelLoad { attempts, source } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*source, DiagnosisError::Timeout(d) if d == Duration::from_secs(60)));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_sub_second_timeout_reported_in_millis() {
    let provider = FakeProvider::new(FakeLibrary::hanging());
    let loader = ModelLoader::new(
        provider,
        LoadPolicy {
            max_attempts: 1,
            timeout: Duration::from_millis(500),
            ..LoadPolicy::default()
        },
        "http://localhost:3000/model/model.json",
        "http://localhost:3000/model/metadata.json",
    );

    let Err(err) = loader.load().await else {
        panic!("加载应当超时");
    };
    assert!(
        err.to_string().contains("(500ms exceeded)"),
        "message: {}",
        err
    );
}

#[tokio::test(start_paused = true)]
async fn test_failed_import_is_not_memoized() {
    let provider = Arc::new(FakeProvider {
        library: Arc::new(FakeLibrary::new(healthy_output(0.9))),
        imports: AtomicU32::new(0),
        import_failures: 1,
    });
    let loader = loader(provider.clone());

    assert_ok!(loader.load().await);
    assert_eq!(provider.imports.load(Ordering::SeqCst), 2);
    assert_eq!(provider.library.loads.load(Ordering::SeqCst), 1);

    // 再次加载：复用推理库，但重新加载模型
    assert_ok!(loader.load().await);
    assert_eq!(provider.imports.load(Ordering::SeqCst), 2);
    assert_eq!(provider.library.loads.load(Ordering::SeqCst), 2);
}

// ========== DiagnosisFlow ==========

#[tokio::test]
async fn test_confident_prediction_moves_to_chart() {
    let mut flow = flow_with_output(healthy_output(0.51)).await;
    assert!(flow.is_model_ready());
    assert!(!flow.is_model_loading());

    assert!(flow.select_image(png_upload("daun.png")).await);
    assert_eq!(flow.predict().await, Step::Chart);
    assert_eq!(flow.error_message(), None);
    assert!(!flow.is_prediction_pending());

    let prediction = flow.prediction().unwrap();
    assert_eq!(prediction.class(), "Healthy");
    assert_eq!(prediction.all_predictions().len(), 3);
    assert_eq!(flow.completed_steps(), vec![Step::Upload]);
}

#[tokio::test]
async fn test_probability_at_threshold_stays_on_upload() {
    let mut flow = flow_with_output(healthy_output(0.5)).await;

    assert!(flow.select_image(png_upload("daun.png")).await);
    assert_eq!(flow.predict().await, Step::Upload);

    let message = flow.error_message().unwrap();
    assert!(message.contains("Probabilitas prediksi rendah (50%)"), "{}", message);
    assert!(!flow.is_prediction_pending());

    // 用户可以换图重试
    assert!(flow.select_image(png_upload("daun2.png")).await);
    assert_eq!(flow.error_message(), None);
}

#[tokio::test]
async fn test_full_session_and_reset() {
    let mut flow = flow_with_output(vec![
        ClassProbability::new("Healthy", 0.15),
        ClassProbability::new("Brown Spot", 0.85),
    ])
    .await;

    assert!(flow.select_image(png_upload("daun.png")).await);
    assert_eq!(flow.predict().await, Step::Chart);
    assert_eq!(flow.proceed_to_validation(), Step::Validation);
    assert_eq!(
        flow.submit_answers(AnswerSet::new(90, 90, 90).unwrap()),
        Step::Result
    );

    let result = flow.result().unwrap();
    assert_eq!(result.disease_class(), "Brown Spot");
    assert_eq!(result.disease_name(), "Bercak Coklat");
    assert_eq!(result.user_score(), 90);
    assert_eq!(result.final_score(), 27.6);
    assert_eq!(
        flow.completed_steps(),
        vec![Step::Upload, Step::Chart, Step::Validation]
    );

    assert_eq!(flow.reset(), Step::Upload);
    assert!(flow.prediction().is_none());
    assert!(flow.result().is_none());
    assert!(flow.selected_image().is_none());
    assert!(flow.error_message().is_none());
    // 模型保留
    assert!(flow.is_model_ready());
}

#[tokio::test]
async fn test_upload_guards() {
    let mut flow = flow_with_output(healthy_output(0.9)).await;

    let pdf = UploadedImage::new("laporan.pdf", "application/pdf", vec![1, 2, 3]);
    assert!(!flow.select_image(pdf).await);
    assert_eq!(
        flow.error_message(),
        Some("Silakan pilih file gambar yang valid (JPG, PNG, dll)")
    );

    let huge = UploadedImage::new("besar.jpg", "image/jpeg", vec![0; 10 * 1024 * 1024 + 1]);
    assert!(!flow.select_image(huge).await);
    assert_eq!(
        flow.error_message(),
        Some("Ukuran file terlalu besar. Maksimal 10 MB.")
    );

    let broken = UploadedImage::new("rusak.png", "image/png", b"\x89PNG broken".to_vec());
    assert!(!flow.select_image(broken).await);
    assert_eq!(
        flow.error_message(),
        Some("Gagal memproses gambar. Silakan coba lagi.")
    );
    assert!(flow.selected_image().is_none());
}

#[tokio::test]
async fn test_predict_requires_image() {
    let mut flow = flow_with_output(healthy_output(0.9)).await;

    assert_eq!(flow.predict().await, Step::Upload);
    assert_eq!(
        flow.error_message(),
        Some("Silakan pilih gambar terlebih dahulu.")
    );
}

#[tokio::test]
async fn test_single_prediction_in_flight() {
    let mut flow = flow_with_output(healthy_output(0.9)).await;
    assert!(flow.select_image(png_upload("daun.png")).await);

    let job = flow.start_prediction().unwrap();
    assert!(flow.is_prediction_pending());

    // 预测进行中：拒绝新图片与新预测
    assert!(!flow.select_image(png_upload("lain.png")).await);
    assert_eq!(
        flow.error_message(),
        Some("Tunggu hingga analisis selesai sebelum mengunggah gambar baru.")
    );
    assert!(flow.start_prediction().is_none());
    assert_eq!(flow.selected_image().unwrap().file_name, "daun.png");

    let outcome = job.run().await;
    assert_eq!(flow.finish_prediction(job, outcome), Step::Chart);
    assert!(!flow.is_prediction_pending());
}

#[tokio::test]
async fn test_prediction_started_before_reset_is_discarded() {
    let mut flow = flow_with_output(healthy_output(0.9)).await;
    assert!(flow.select_image(png_upload("daun.png")).await);

    let job = flow.start_prediction().unwrap();
    flow.reset();
    // 旧预测仍在进行，新图片依然被拒绝
    assert!(!flow.select_image(png_upload("baru.png")).await);

    let outcome = job.run().await;
    assert_eq!(flow.finish_prediction(job, outcome), Step::Upload);
    assert!(flow.prediction().is_none());
    assert!(!flow.is_prediction_pending());
    assert!(flow.select_image(png_upload("baru.png")).await);
}

#[tokio::test]
async fn test_dropped_job_releases_prediction_slot() {
    let mut flow = flow_with_output(healthy_output(0.9)).await;
    assert!(flow.select_image(png_upload("daun.png")).await);

    let job = flow.start_prediction().unwrap();
    assert!(flow.is_prediction_pending());
    drop(job);
    assert!(!flow.is_prediction_pending());

    flow.reset();
    assert!(flow.select_image(png_upload("baru.png")).await);
    assert_eq!(flow.error_message(), None);
    assert_eq!(flow.predict().await, Step::Chart);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_predict_releases_prediction_slot() {
    let provider = FakeProvider::new(FakeLibrary {
        hang_predict: true,
        ..FakeLibrary::new(healthy_output(0.9))
    });
    let mut flow = DiagnosisFlow::initialize(loader(provider), FlowSettings::default()).await;
    assert!(flow.select_image(png_upload("daun.png")).await);

    let cancelled = tokio::time::timeout(Duration::from_secs(5), flow.predict()).await;
    assert!(cancelled.is_err());

    assert!(!flow.is_prediction_pending());
    assert_eq!(flow.step(), Step::Upload);
    assert!(flow.select_image(png_upload("baru.png")).await);
}

#[tokio::test]
async fn test_inference_failure_stays_on_upload() {
    let provider = FakeProvider::new(FakeLibrary {
        fail_predict: true,
        ..FakeLibrary::new(healthy_output(0.9))
    });
    let mut flow = DiagnosisFlow::initialize(loader(provider), FlowSettings::default()).await;

    assert!(flow.select_image(png_upload("daun.png")).await);
    assert_eq!(flow.predict().await, Step::Upload);
    assert_eq!(
        flow.error_message(),
        Some("Terjadi kesalahan saat memprediksi gambar. Silakan coba lagi.")
    );
    assert!(!flow.is_prediction_pending());
    assert!(flow.prediction().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_model_load_failure_blocks_prediction() {
    let provider = FakeProvider::new(FakeLibrary::failing(3));
    let mut flow = DiagnosisFlow::initialize(loader(provider), FlowSettings::default()).await;

    assert!(!flow.is_model_ready());
    let message = flow.error_message().unwrap().to_string();
    assert!(message.starts_with("Gagal memuat model AI (Model failed to load after 3 attempts"));

    assert!(flow.select_image(png_upload("daun.png")).await);
    assert_eq!(flow.predict().await, Step::Upload);
    assert_eq!(
        flow.error_message(),
        Some("Model AI belum sepenuhnya dimuat. Silakan tunggu beberapa saat.")
    );
}

#[tokio::test]
async fn test_transitions_only_move_forward() {
    let mut flow = flow_with_output(healthy_output(0.9)).await;

    // upload 阶段不能直接进入问卷或提交答案
    assert_eq!(flow.proceed_to_validation(), Step::Upload);
    assert_eq!(
        flow.submit_answers(AnswerSet::new(10, 10, 10).unwrap()),
        Step::Upload
    );

    assert!(flow.select_image(png_upload("daun.png")).await);
    assert_eq!(flow.predict().await, Step::Chart);
    // chart 阶段不能再上传图片
    assert!(!flow.select_image(png_upload("lain.png")).await);
    assert_eq!(flow.proceed_to_validation(), Step::Validation);

    // 缺项不推进
    assert_eq!(
        flow.submit_partial_answers(Some(80), None, Some(60)),
        Step::Validation
    );
    assert_eq!(
        flow.error_message(),
        Some("Silakan jawab semua pertanyaan terlebih dahulu.")
    );
    assert_eq!(
        flow.submit_partial_answers(Some(80), Some(70), Some(60)),
        Step::Result
    );
    assert_eq!(flow.result().unwrap().user_score(), 70);
    assert_eq!(flow.error_message(), None);
}

#[tokio::test]
async fn test_reset_from_every_step() {
    let mut flow = flow_with_output(healthy_output(0.9)).await;

    // chart
    assert!(flow.select_image(png_upload("daun.png")).await);
    assert_eq!(flow.predict().await, Step::Chart);
    assert_eq!(flow.reset(), Step::Upload);
    assert!(flow.prediction().is_none());
    assert!(flow.selected_image().is_none());
    assert!(flow.completed_steps().is_empty());

    // validation
    assert!(flow.select_image(png_upload("daun.png")).await);
    assert_eq!(flow.predict().await, Step::Chart);
    assert_eq!(flow.proceed_to_validation(), Step::Validation);
    assert_eq!(
        flow.submit_partial_answers(None, Some(50), Some(50)),
        Step::Validation
    );
    assert!(flow.error_message().is_some());
    assert_eq!(flow.reset(), Step::Upload);
    assert!(flow.prediction().is_none());
    assert!(flow.error_message().is_none());

    // 重置后可以走完整流程
    assert!(flow.select_image(png_upload("daun.png")).await);
    assert_eq!(flow.predict().await, Step::Chart);
    assert_eq!(flow.proceed_to_validation(), Step::Validation);
    assert_eq!(
        flow.submit_answers(AnswerSet::new(50, 50, 50).unwrap()),
        Step::Result
    );
}

#[tokio::test]
async fn test_reset_after_low_confidence_prediction() {
    let mut flow = flow_with_output(healthy_output(0.4)).await;

    assert!(flow.select_image(png_upload("buram.png")).await);
    assert_eq!(flow.predict().await, Step::Upload);
    assert!(flow.prediction().is_some());
    assert!(flow.error_message().unwrap().contains("(40%)"));

    assert_eq!(flow.reset(), Step::Upload);
    assert!(flow.prediction().is_none());
    assert!(flow.selected_image().is_none());
    assert!(flow.error_message().is_none());
    assert!(!flow.is_prediction_pending());
    assert!(flow.select_image(png_upload("jelas.png")).await);
}
