use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::models::AddressFamily;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 网卡上没有可用的全局单播地址
    #[error("未找到有效的公网 {family} 地址 (Global Unicast Address)")]
    NoAddressFound { family: AddressFamily },

    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),

    /// OCR 服务错误
    #[error("OCR错误: {0}")]
    Ocr(#[from] OcrError),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 会话状态机收到非法的状态转换
    #[error("非法的会话状态转换: {from} -> {to}")]
    InvalidTransition {
        from: crate::models::SessionStatus,
        to: crate::models::SessionStatus,
    },
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {source}")]
    ConnectionFailed {
        port: u16,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 启动浏览器失败
    #[error("启动无头浏览器失败: {0}")]
    LaunchFailed(String),
    /// 导航失败
    #[error("导航到 {url} 失败: {source}")]
    NavigationFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 元素定位失败
    #[error("未找到页面元素: {locator}")]
    ElementNotFound { locator: String },
    /// 页面操作失败
    #[error("页面操作 '{action}' 失败: {source}")]
    ActionFailed {
        action: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 浏览器资源已释放
    #[error("浏览器资源已释放，无法执行 '{action}'")]
    Released { action: String },
}

/// OCR 服务错误
#[derive(Debug, Error)]
pub enum OcrError {
    /// 请求 OCR 服务失败
    #[error("请求 OCR 服务失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// OCR 服务返回错误状态
    #[error("OCR 服务返回错误状态 ({endpoint}): {status}")]
    BadStatus { endpoint: String, status: u16 },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置项取值非法
    #[error("配置项 {field} 非法: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 单次登录尝试的失败原因
///
/// 两者都在会话内部恢复：计入重试次数、刷新验证码，不向上传播。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptFailure {
    /// OCR 结果为空或长度不足
    #[error("识别结果异常 (长度不足): '{decoded}'")]
    CaptchaEmptyOrShort { decoded: String },
    /// 在等待窗口内未出现登录成功标志
    #[error("登录验证失败: {waited:?} 内未检测到成功标志")]
    LoginTimeout { waited: Duration },
}

/// 登录重试次数耗尽
///
/// 这是会话的终态报告，不是致命错误。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaxAttemptsExceeded {
    pub attempts: u32,
    pub last_failure: Option<AttemptFailure>,
}

impl fmt::Display for MaxAttemptsExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "已达到最大重试次数 ({})，登录失败", self.attempts)?;
        if let Some(last) = &self.last_failure {
            write!(f, "；最后一次失败: {}", last)?;
        }
        Ok(())
    }
}

impl std::error::Error for MaxAttemptsExceeded {}

impl From<chromiumoxide::error::CdpError> for BrowserError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        BrowserError::ActionFailed {
            action: "cdp".to_string(),
            source: Box::new(err),
        }
    }
}

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(err.into())
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建页面操作错误
    pub fn browser_action_failed(
        action: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Browser(BrowserError::ActionFailed {
            action: action.into(),
            source: Box::new(source),
        })
    }

    /// 创建元素未找到错误
    pub fn element_not_found(locator: impl fmt::Display) -> Self {
        AppError::Browser(BrowserError::ElementNotFound {
            locator: locator.to_string(),
        })
    }

    /// 创建 OCR 请求错误
    pub fn ocr_request_failed(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        AppError::Ocr(OcrError::RequestFailed {
            endpoint: endpoint.into(),
            source,
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
