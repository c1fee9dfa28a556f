#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use usereg_auth::config::PortalLocators;
use usereg_auth::error::{AppError, AppResult, BrowserError};
use usereg_auth::infrastructure::{Locator, PageDriver, WaitOutcome};
use usereg_auth::models::Credentials;
use usereg_auth::services::CaptchaSolver;
use usereg_auth::workflow::SessionConfig;
use usereg_auth::Config;

pub const PORTAL_URL: &str = "https://usereg.example.edu.cn";

/// 驱动收到的一次页面操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Navigate(String),
    WaitFor(Locator),
    Fill(Locator, String),
    Click(Locator),
    Check(Locator),
    Screenshot(Locator),
    Release,
}

/// 共享的操作记录，驱动被会话拿走后仍可查看
#[derive(Clone, Default)]
pub struct ActionLog(Arc<Mutex<Vec<Action>>>);

impl ActionLog {
    pub fn push(&self, action: Action) {
        self.0.lock().unwrap().push(action);
    }

    pub fn actions(&self) -> Vec<Action> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, action: &Action) -> usize {
        self.actions().iter().filter(|a| *a == action).count()
    }

    pub fn count_where(&self, pred: impl Fn(&Action) -> bool) -> usize {
        self.actions().iter().filter(|a| pred(a)).count()
    }
}

/// 按脚本回应的页面驱动
///
/// - 等待成功标志时依次弹出 `marker_results`，用完后一律超时
/// - `missing` 中的元素永远等不到
/// - `reload_on_submit` 中的元素在点击登录后暂时不可点击，等到一次后恢复
/// - 其他元素立即可见
pub struct ScriptedDriver {
    log: ActionLog,
    success_marker: Locator,
    login_button: Locator,
    marker_results: VecDeque<WaitOutcome>,
    missing: Vec<Locator>,
    reload_on_submit: Vec<Locator>,
    reloading: Vec<Locator>,
    fail_navigation: bool,
    released: bool,
}

impl ScriptedDriver {
    pub fn new(log: ActionLog, marker_results: impl IntoIterator<Item = WaitOutcome>) -> Self {
        Self {
            log,
            success_marker: PortalLocators::default().success_marker,
            login_button: PortalLocators::default().login_button,
            marker_results: marker_results.into_iter().collect(),
            missing: Vec::new(),
            reload_on_submit: Vec::new(),
            reloading: Vec::new(),
            fail_navigation: false,
            released: false,
        }
    }

    pub fn with_missing(mut self, locator: Locator) -> Self {
        self.missing.push(locator);
        self
    }

    pub fn with_reload_on_submit(mut self, locator: Locator) -> Self {
        self.reload_on_submit.push(locator);
        self
    }

    pub fn failing_navigation(mut self) -> Self {
        self.fail_navigation = true;
        self
    }

    fn live(&self, action: &str) -> AppResult<()> {
        if self.released {
            return Err(BrowserError::Released {
                action: action.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl PageDriver for ScriptedDriver {
    async fn navigate(&mut self, url: &str) -> AppResult<()> {
        self.live("navigate")?;
        self.log.push(Action::Navigate(url.to_string()));
        if self.fail_navigation {
            return Err(AppError::browser_action_failed(
                "navigate",
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "portal down"),
            ));
        }
        Ok(())
    }

    async fn wait_for(&mut self, locator: &Locator, _timeout: Duration) -> AppResult<WaitOutcome> {
        self.live("wait_for")?;
        self.log.push(Action::WaitFor(locator.clone()));
        if *locator == self.success_marker {
            return Ok(self.marker_results.pop_front().unwrap_or(WaitOutcome::TimedOut));
        }
        if self.missing.contains(locator) {
            return Ok(WaitOutcome::TimedOut);
        }
        // 等待期间页面加载完成
        self.reloading.retain(|l| l != locator);
        Ok(WaitOutcome::Found)
    }

    async fn fill(&mut self, locator: &Locator, value: &str) -> AppResult<()> {
        self.live("fill")?;
        self.log.push(Action::Fill(locator.clone(), value.to_string()));
        Ok(())
    }

    async fn click(&mut self, locator: &Locator) -> AppResult<()> {
        self.live("click")?;
        if self.reloading.contains(locator) {
            return Err(AppError::element_not_found(locator));
        }
        self.log.push(Action::Click(locator.clone()));
        if *locator == self.login_button {
            self.reloading = self.reload_on_submit.clone();
        }
        Ok(())
    }

    async fn check(&mut self, locator: &Locator) -> AppResult<()> {
        self.live("check")?;
        self.log.push(Action::Check(locator.clone()));
        Ok(())
    }

    async fn screenshot(&mut self, locator: &Locator) -> AppResult<Vec<u8>> {
        self.live("screenshot")?;
        self.log.push(Action::Screenshot(locator.clone()));
        Ok(vec![0x89, b'P', b'N', b'G'])
    }

    async fn release(&mut self) -> AppResult<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.log.push(Action::Release);
        Ok(())
    }
}

/// 按顺序返回识别结果，用完后重复最后一个
pub struct ScriptedSolver {
    answers: Mutex<VecDeque<String>>,
    last: Mutex<String>,
}

impl ScriptedSolver {
    pub fn new<I, T>(answers: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            last: Mutex::new(String::new()),
        }
    }

    pub fn always(answer: &str) -> Self {
        Self::new([answer])
    }
}

#[async_trait]
impl CaptchaSolver for ScriptedSolver {
    async fn classify(&self, _image: &[u8]) -> AppResult<String> {
        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.answers.lock().unwrap().pop_front() {
            *last = next;
        }
        Ok(last.clone())
    }
}

pub fn credentials() -> Credentials {
    Credentials::new("alice", "s3cret")
}

pub fn fast_session_config(max_attempts: u32) -> SessionConfig {
    SessionConfig {
        max_attempts,
        success_timeout: Duration::ZERO,
        refresh_cooldown: Duration::ZERO,
        element_timeout: Duration::ZERO,
    }
}

pub fn fast_config(max_attempts: u32) -> Config {
    Config {
        portal_url: PORTAL_URL.to_string(),
        username: "alice".to_string(),
        password: "s3cret".to_string(),
        max_attempts,
        success_timeout_ms: 0,
        refresh_cooldown_ms: 0,
        element_timeout_ms: 0,
        settle_delay_ms: 0,
        ..Config::default()
    }
}

pub fn locators() -> PortalLocators {
    PortalLocators::default()
}
