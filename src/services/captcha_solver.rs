//! 验证码识别服务 - 业务能力层
//!
//! 只负责"图片 -> 文本"，不重试、不判断结果是否可用
//!
//! ## 技术栈
//! - 通过 HTTP 调用 ddddocr 兼容的 OCR 服务（`POST /ocr/b64/text`）
//! - 请求体为 base64 编码的图片，响应体为识别出的纯文本

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::debug;

use crate::error::{AppError, AppResult, OcrError};

/// 识别结果少于该长度视为无法识别
pub const MIN_CAPTCHA_LEN: usize = 4;

/// 识别结果是否可以提交
pub fn is_plausible_captcha(text: &str) -> bool {
    text.chars().count() >= MIN_CAPTCHA_LEN
}

/// 验证码识别能力
#[async_trait]
pub trait CaptchaSolver: Send + Sync {
    /// 识别验证码图片，返回尽力而为的文本（可能为空）
    async fn classify(&self, image: &[u8]) -> AppResult<String>;
}

/// ddddocr 兼容 OCR 服务客户端
pub struct HttpOcrSolver {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpOcrSolver {
    /// 创建 OCR 客户端
    ///
    /// # 参数
    /// - `base_url`: OCR 服务地址，例如 `http://127.0.0.1:9898`
    /// - `timeout`: 单次请求超时
    pub fn new(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let endpoint = format!("{}/ocr/b64/text", base_url.trim_end_matches('/'));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::ocr_request_failed(&endpoint, e))?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl CaptchaSolver for HttpOcrSolver {
    async fn classify(&self, image: &[u8]) -> AppResult<String> {
        debug!("发送验证码图片到 OCR 服务，大小: {} 字节", image.len());

        let response = self
            .client
            .post(&self.endpoint)
            .body(STANDARD.encode(image))
            .send()
            .await
            .map_err(|e| AppError::ocr_request_failed(&self.endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OcrError::BadStatus {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
            }
            .into());
        }

        let raw = response
            .text()
            .await
            .map_err(|e| AppError::ocr_request_failed(&self.endpoint, e))?;
        Ok(normalize_ocr_text(&raw))
    }
}

/// 只保留 ASCII 字母和数字
///
/// 服务有时会带回换行、引号或识别噪声。
pub fn normalize_ocr_text(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}
