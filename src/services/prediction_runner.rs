//! 预测服务 - 业务能力层
//!
//! 把解码后的图片交给模型，整理输出。失败不重试，由用户重新触发。

use tracing::{debug, error};

use crate::error::Result;
use crate::inference::ImageClassifier;
use crate::models::{PreparedImage, Prediction};

/// 对一张图片做预测
///
/// # 返回
/// 按概率降序排列的完整预测，首项为主预测
pub async fn predict(model: &dyn ImageClassifier, image: &PreparedImage) -> Result<Prediction> {
    let (width, height) = image.dimensions();
    debug!("开始预测，图片尺寸: {}x{}", width, height);

    let raw = model.predict(image).await.map_err(|e| {
        error!("图片预测出错: {}", e);
        e
    })?;
    debug!("模型返回 {} 个类别", raw.len());

    Prediction::from_raw(raw)
}
