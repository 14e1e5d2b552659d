use std::io::Cursor;
use std::path::Path;

use base64::Engine;
use image::{DynamicImage, ImageFormat, RgbImage};

use crate::error::{DiagnosisError, Result};

/// 用户上传的原始文件
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    /// MIME 类型，如 `image/jpeg`
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// 从磁盘读取，MIME 类型按扩展名推断
    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let mime_type = ImageFormat::from_path(path)
            .map(|format| format.to_mime_type().to_string())
            .unwrap_or_else(|_| "application/octet-stream".to_string());
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(Self {
            file_name,
            mime_type,
            bytes,
        })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// 解码后的图片，可直接送入模型
#[derive(Debug, Clone)]
pub struct PreparedImage {
    rgb: RgbImage,
}

impl PreparedImage {
    pub fn from_rgb(rgb: RgbImage) -> Self {
        Self { rgb }
    }

    pub fn rgb(&self) -> &RgbImage {
        &self.rgb
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.rgb.dimensions()
    }

    /// 编码为 PNG data URL，供浏览器端 `<img>` 使用
    pub fn to_png_data_url(&self) -> Result<String> {
        let mut buffer = Vec::new();
        DynamicImage::ImageRgb8(self.rgb.clone())
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .map_err(|e| DiagnosisError::Inference(format!("PNG 编码失败: {}", e)))?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&buffer);
        Ok(format!("data:image/png;base64,{}", encoded))
    }
}
