//! 图片服务 - 业务能力层
//!
//! 上传校验（类型、大小）与解码

use image::imageops::FilterType;
use tracing::{debug, warn};

use crate::error::{DiagnosisError, InputError, Result};
use crate::models::{PreparedImage, UploadedImage};

/// 校验上传文件
///
/// MIME 必须是 `image/*`，大小不超过 `max_bytes`
pub fn validate_upload(upload: &UploadedImage, max_bytes: u64) -> std::result::Result<(), InputError> {
    if !upload.mime_type.starts_with("image/") {
        return Err(InputError::NotAnImage {
            mime_type: upload.mime_type.clone(),
        });
    }
    if upload.size() > max_bytes {
        return Err(InputError::FileTooLarge {
            size: upload.size(),
            max_bytes,
        });
    }
    Ok(())
}

/// 解码图片，最长边超过 `max_edge` 时等比缩放
///
/// 解码在阻塞线程池中执行
pub async fn decode(upload: &UploadedImage, max_edge: u32) -> Result<PreparedImage> {
    let bytes = upload.bytes.clone();
    let file_name = upload.file_name.clone();

    let prepared = tokio::task::spawn_blocking(move || -> Result<PreparedImage> {
        let decoded = image::load_from_memory(&bytes).map_err(|e| {
            warn!("图片解码失败 ({}): {}", file_name, e);
            InputError::UndecodableImage {
                reason: e.to_string(),
            }
        })?;

        let (width, height) = (decoded.width(), decoded.height());
        let decoded = if width.max(height) > max_edge {
            debug!("缩放图片 {}x{} -> 最长边 {}", width, height, max_edge);
            decoded.resize(max_edge, max_edge, FilterType::Triangle)
        } else {
            decoded
        };

        Ok(PreparedImage::from_rgb(decoded.to_rgb8()))
    })
    .await
    .map_err(|e| DiagnosisError::Inference(format!("图片解码任务异常: {}", e)))??;

    Ok(prepared)
}
