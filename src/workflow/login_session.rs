//! 登录会话 - 流程层
//!
//! 核心职责：验证码识别 + 登录的有限次重试状态机
//!
//! 状态：`Init -> AwaitingCaptcha <-> Submitting -> Authenticated | Failed`
//!
//! 每次尝试：
//! 1. 等待验证码图片就绪并截图
//! 2. OCR 识别；结果过短则不提交，直接刷新验证码进入下一次尝试
//! 3. 填入验证码并点击登录
//! 4. 在 `success_timeout` 内等待"准入代认证"链接出现；超时则刷新验证码重试
//!
//! 无论识别无效还是提交被拒，都消耗一次尝试并配合一次刷新，
//! 保证同一张验证码不会被提交两次。

use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::PortalLocators;
use crate::error::{AppError, AppResult, AttemptFailure, MaxAttemptsExceeded};
use crate::infrastructure::{PageDriver, WaitOutcome};
use crate::models::{AttemptOutcome, CaptchaAttempt, Credentials, SessionStatus};
use crate::services::captcha_solver::{is_plausible_captcha, CaptchaSolver};

/// 会话配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// 最大尝试次数
    pub max_attempts: u32,
    /// 提交后等待成功标志的时间
    pub success_timeout: Duration,
    /// 刷新验证码后的冷却时间
    pub refresh_cooldown: Duration,
    /// 等待验证码图片等元素就绪的时间
    pub element_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            success_timeout: Duration::from_secs(2),
            refresh_cooldown: Duration::from_secs(1),
            element_timeout: Duration::from_secs(10),
        }
    }
}

/// 登录结果
pub enum LoginOutcome<D: PageDriver> {
    /// 登录成功，浏览器资源移交给后续流程
    Authenticated(AuthenticatedSession<D>),
    /// 重试次数耗尽，浏览器资源已释放
    Failed(LoginReport),
}

/// 登录失败报告
#[derive(Debug, Clone)]
pub struct LoginReport {
    pub failure: MaxAttemptsExceeded,
    pub attempts: Vec<CaptchaAttempt>,
}

/// 登录会话
pub struct LoginSession<D: PageDriver, S: CaptchaSolver> {
    driver: D,
    solver: S,
    credentials: Credentials,
    locators: PortalLocators,
    config: SessionConfig,
    portal_url: String,
    status: SessionStatus,
    attempt_index: u32,
    attempts: Vec<CaptchaAttempt>,
    released: bool,
}

impl<D: PageDriver, S: CaptchaSolver> LoginSession<D, S> {
    /// 创建登录会话，会话从此独占 `driver`
    pub fn new(
        driver: D,
        solver: S,
        credentials: Credentials,
        locators: PortalLocators,
        config: SessionConfig,
        portal_url: impl Into<String>,
    ) -> Self {
        Self {
            driver,
            solver,
            credentials,
            locators,
            config,
            portal_url: portal_url.into(),
            status: SessionStatus::Init,
            attempt_index: 0,
            attempts: Vec::new(),
            released: false,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// 当前尝试序号（从 1 开始，未开始时为 0）
    pub fn attempt_index(&self) -> u32 {
        self.attempt_index
    }

    pub fn attempts(&self) -> &[CaptchaAttempt] {
        &self.attempts
    }

    /// 执行登录
    ///
    /// 重试耗尽返回 `Ok(LoginOutcome::Failed)`，不是错误；
    /// 浏览器或 OCR 出错返回 `Err`。两种情况下浏览器资源都已释放。
    pub async fn authenticate(mut self) -> AppResult<LoginOutcome<D>> {
        match self.run().await {
            Ok(true) => {
                let attempts_used = self.attempt_index;
                Ok(LoginOutcome::Authenticated(AuthenticatedSession {
                    driver: self.driver,
                    credentials: self.credentials,
                    attempts_used,
                }))
            }
            Ok(false) => {
                error!("❌ 已达到最大重试次数 ({})，登录失败", self.config.max_attempts);
                self.release().await;
                let last_failure = self.attempts.last().and_then(|a| a.failure.clone());
                Ok(LoginOutcome::Failed(LoginReport {
                    failure: MaxAttemptsExceeded {
                        attempts: self.attempt_index,
                        last_failure,
                    },
                    attempts: self.attempts,
                }))
            }
            Err(e) => {
                error!("❌ 登录过程出错: {}", e);
                if self.status.can_transition_to(SessionStatus::Failed) {
                    self.status = SessionStatus::Failed;
                }
                self.release().await;
                Err(e)
            }
        }
    }

    /// 状态机主循环，返回是否登录成功
    async fn run(&mut self) -> AppResult<bool> {
        info!("🌐 正在访问用户注册管理系统: {}", self.portal_url);
        self.driver.navigate(&self.portal_url).await?;

        // 预填固定的账号密码
        self.driver
            .fill(&self.locators.username_field, &self.credentials.username)
            .await?;
        self.driver
            .fill(&self.locators.password_field, &self.credentials.password)
            .await?;
        self.transition(SessionStatus::AwaitingCaptcha)?;

        for attempt_index in 1..=self.config.max_attempts {
            self.attempt_index = attempt_index;
            info!(
                "🔄 [尝试 {}/{}] 正在进行登录...",
                attempt_index, self.config.max_attempts
            );

            if self.attempt().await? == AttemptOutcome::Accepted {
                return Ok(true);
            }
            self.refresh_captcha().await?;
        }

        self.transition(SessionStatus::Failed)?;
        Ok(false)
    }

    /// 单次尝试
    async fn attempt(&mut self) -> AppResult<AttemptOutcome> {
        let captcha = &self.locators.captcha_image;
        if self.driver.wait_for(captcha, self.config.element_timeout).await? == WaitOutcome::TimedOut
        {
            return Err(AppError::element_not_found(captcha));
        }
        let image = self.driver.screenshot(captcha).await?;

        let decoded = self.solver.classify(&image).await?;
        info!("🔤 OCR 识别结果: {}", decoded);

        if !is_plausible_captcha(&decoded) {
            let failure = AttemptFailure::CaptchaEmptyOrShort {
                decoded: decoded.clone(),
            };
            warn!("⚠️ {}，自动刷新验证码...", failure);
            self.record(image, decoded, AttemptOutcome::Invalid, Some(failure));
            return Ok(AttemptOutcome::Invalid);
        }

        self.driver
            .fill(&self.locators.captcha_field, &decoded)
            .await?;
        self.driver.click(&self.locators.login_button).await?;
        self.transition(SessionStatus::Submitting)?;

        let marker = self
            .driver
            .wait_for(&self.locators.success_marker, self.config.success_timeout)
            .await?;
        match marker {
            WaitOutcome::Found => {
                self.transition(SessionStatus::Authenticated)?;
                self.record(image, decoded, AttemptOutcome::Accepted, None);
                info!("✅ 登录成功！");
                Ok(AttemptOutcome::Accepted)
            }
            WaitOutcome::TimedOut => {
                let failure = AttemptFailure::LoginTimeout {
                    waited: self.config.success_timeout,
                };
                warn!("⚠️ {}，准备重试...", failure);
                self.record(image, decoded, AttemptOutcome::Rejected, Some(failure));
                Ok(AttemptOutcome::Rejected)
            }
        }
    }

    /// 点击验证码图片触发刷新，并等待冷却
    ///
    /// 提交被拒后页面可能正在重新加载，先等验证码图片重新出现再点击。
    async fn refresh_captcha(&mut self) -> AppResult<()> {
        let captcha = &self.locators.captcha_image;
        if self.driver.wait_for(captcha, self.config.element_timeout).await? == WaitOutcome::TimedOut
        {
            return Err(AppError::element_not_found(captcha));
        }
        self.driver.click(captcha).await?;
        sleep(self.config.refresh_cooldown).await;
        self.transition(SessionStatus::AwaitingCaptcha)
    }

    fn record(
        &mut self,
        image_bytes: Vec<u8>,
        decoded_text: String,
        outcome: AttemptOutcome,
        failure: Option<AttemptFailure>,
    ) {
        self.attempts.push(CaptchaAttempt {
            attempt_index: self.attempt_index,
            image_bytes,
            decoded_text,
            outcome,
            failure,
        });
    }

    fn transition(&mut self, next: SessionStatus) -> AppResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    async fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.driver.release().await {
            warn!("释放浏览器资源失败: {}", e);
        }
    }
}

/// 已登录的会话
///
/// 只能由 `LoginSession::authenticate` 产生，持有浏览器资源直到 `release`。
pub struct AuthenticatedSession<D: PageDriver> {
    driver: D,
    credentials: Credentials,
    attempts_used: u32,
}

impl<D: PageDriver> AuthenticatedSession<D> {
    /// 登录成功时用掉的尝试次数
    pub fn attempts_used(&self) -> u32 {
        self.attempts_used
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub(crate) fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// 释放浏览器资源
    pub async fn release(mut self) -> AppResult<()> {
        self.driver.release().await
    }
}
