//! 基于 chromiumoxide 的页面驱动
//!
//! 元素按 `Locator` 用一段 JS 在页面内查找，命中后打上标记属性，
//! 再通过 CDP 对标记元素做点击、截图等原生操作。

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::Element;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use crate::browser::BrowserSession;
use crate::error::{AppError, AppResult, BrowserError};
use crate::infrastructure::page_driver::{Locator, PageDriver, WaitOutcome};
use crate::infrastructure::JsExecutor;

const MARK_ATTR: &str = "data-usereg-auth";
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Chromium 页面驱动
pub struct ChromiumDriver {
    browser: Option<chromiumoxide::Browser>,
    executor: JsExecutor,
    handler: Option<JoinHandle<()>>,
    attached: bool,
}

impl ChromiumDriver {
    pub fn new(session: BrowserSession) -> Self {
        Self {
            browser: Some(session.browser),
            executor: JsExecutor::new(session.page),
            handler: Some(session.handler),
            attached: session.attached,
        }
    }

    fn ensure_live(&self, action: &str) -> AppResult<()> {
        if self.browser.is_none() {
            return Err(BrowserError::Released {
                action: action.to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// 在页面中查找并标记第一个可见的匹配元素
    async fn mark(&self, locator: &Locator) -> AppResult<bool> {
        let js = locate_script(locator)?;
        self.executor.eval_as::<bool>(js).await
    }

    async fn marked_element(&self, locator: &Locator) -> AppResult<Element> {
        if !self.mark(locator).await? {
            return Err(AppError::element_not_found(locator));
        }
        self.executor
            .page()
            .find_element(format!("[{}]", MARK_ATTR))
            .await
            .map_err(|_| AppError::element_not_found(locator))
    }
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn navigate(&mut self, url: &str) -> AppResult<()> {
        self.ensure_live("navigate")?;
        self.executor
            .page()
            .goto(url)
            .await
            .map_err(|e| BrowserError::NavigationFailed {
                url: url.to_string(),
                source: Box::new(e),
            })?;
        debug!("已导航到: {}", url);
        Ok(())
    }

    async fn wait_for(&mut self, locator: &Locator, limit: Duration) -> AppResult<WaitOutcome> {
        self.ensure_live("wait_for")?;
        let outcome = poll_until(Instant::now() + limit, || self.mark(locator)).await;
        if outcome == WaitOutcome::TimedOut {
            debug!("等待 {} 超时 ({:?})", locator, limit);
        }
        Ok(outcome)
    }

    async fn fill(&mut self, locator: &Locator, value: &str) -> AppResult<()> {
        self.ensure_live("fill")?;
        if !self.mark(locator).await? {
            return Err(AppError::element_not_found(locator));
        }
        let js = format!(
            r#"
            (() => {{
                const el = document.querySelector('[{attr}]');
                if (!el) return false;
                el.focus();
                el.value = {value};
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()
            "#,
            attr = MARK_ATTR,
            value = js_string(value)?,
        );
        if !self.executor.eval_as::<bool>(js).await? {
            return Err(AppError::element_not_found(locator));
        }
        Ok(())
    }

    async fn click(&mut self, locator: &Locator) -> AppResult<()> {
        self.ensure_live("click")?;
        let element = self.marked_element(locator).await?;
        element
            .click()
            .await
            .map_err(|e| AppError::browser_action_failed(format!("click {}", locator), e))?;
        Ok(())
    }

    async fn check(&mut self, locator: &Locator) -> AppResult<()> {
        self.ensure_live("check")?;
        let element = self.marked_element(locator).await?;
        let checked = self
            .executor
            .eval_as::<bool>(format!(
                "(() => {{ const el = document.querySelector('[{}]'); return !!(el && el.checked); }})()",
                MARK_ATTR
            ))
            .await?;
        if !checked {
            element
                .click()
                .await
                .map_err(|e| AppError::browser_action_failed(format!("check {}", locator), e))?;
        }
        Ok(())
    }

    async fn screenshot(&mut self, locator: &Locator) -> AppResult<Vec<u8>> {
        self.ensure_live("screenshot")?;
        let element = self.marked_element(locator).await?;
        let bytes = element
            .screenshot(CaptureScreenshotFormat::Png)
            .await
            .map_err(|e| AppError::browser_action_failed(format!("screenshot {}", locator), e))?;
        Ok(bytes)
    }

    async fn release(&mut self) -> AppResult<()> {
        let Some(mut browser) = self.browser.take() else {
            return Ok(());
        };

        let result = if self.attached {
            // 连接的是用户自己的浏览器，只关闭本程序打开的页面
            self.executor
                .page()
                .clone()
                .close()
                .await
                .map_err(|e| AppError::browser_action_failed("close page", e))
        } else {
            match browser.close().await {
                Ok(_) => {
                    if let Err(e) = browser.wait().await {
                        warn!("等待浏览器进程退出失败: {}", e);
                    }
                    Ok(())
                }
                Err(e) => Err(AppError::browser_action_failed("close browser", e)),
            }
        };

        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        info!("🧹 浏览器资源已释放");
        result
    }
}

/// 按固定间隔轮询直到命中或到达截止时间
///
/// 单次查找也受截止时间约束：页面跳转中 eval 可能一直挂起到 CDP 请求超时。
async fn poll_until<F, Fut>(deadline: Instant, mut probe: F) -> WaitOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<bool>>,
{
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match timeout(remaining, probe()).await {
            Ok(Ok(true)) => return WaitOutcome::Found,
            Ok(Ok(false)) => {}
            // 页面跳转过程中 eval 可能失败，视为暂未找到
            Ok(Err(e)) => debug!("查找元素时出错，继续等待: {}", e),
            Err(_) => return WaitOutcome::TimedOut,
        }
        if Instant::now() >= deadline {
            return WaitOutcome::TimedOut;
        }
        sleep(POLL_INTERVAL).await;
    }
}

fn js_string(value: &str) -> AppResult<String> {
    serde_json::to_string(value).map_err(|e| AppError::browser_action_failed("encode js string", e))
}

/// 生成定位脚本：清除旧标记，按定位方式找到第一个可见元素并打上标记
fn locate_script(locator: &Locator) -> AppResult<String> {
    Ok(format!(
        r#"
        (() => {{
            const ATTR = '{attr}';
            const kind = {kind};
            const text = {text};
            document.querySelectorAll('[' + ATTR + ']').forEach(e => e.removeAttribute(ATTR));

            const norm = (s) => (s || '').replace(/\s+/g, ' ').trim();
            const visible = (el) => !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length);
            const labelsOf = (el) => {{
                const parts = [el.getAttribute('aria-label'), el.getAttribute('placeholder'), el.getAttribute('title')];
                if (el.labels) for (const l of el.labels) parts.push(l.textContent);
                const wrap = el.closest('label');
                if (wrap) parts.push(wrap.textContent);
                return parts.map(norm).filter(Boolean);
            }};
            const textOf = (el) => [norm(el.textContent), norm(el.value), norm(el.getAttribute('aria-label'))].filter(Boolean);
            const pick = (els, names) => {{
                const live = els.filter(visible);
                return live.find(el => names(el).some(n => n === text))
                    || live.find(el => names(el).some(n => n.includes(text)));
            }};
            const all = (sel) => Array.from(document.querySelectorAll(sel));

            let found = null;
            if (kind === 'css') {{
                found = all(text).find(visible);
            }} else if (kind === 'textbox') {{
                found = pick(all('input:not([type=hidden]):not([type=radio]):not([type=checkbox]):not([type=submit]):not([type=button]), textarea, [role=textbox]'), labelsOf);
            }} else if (kind === 'button') {{
                found = pick(all('button, input[type=submit], input[type=button], [role=button]'), textOf);
            }} else if (kind === 'link') {{
                found = pick(all('a, [role=link]'), textOf);
            }} else if (kind === 'radio') {{
                found = pick(all('input[type=radio], [role=radio]'), (el) => labelsOf(el).concat(textOf(el)));
            }}
            if (!found) return false;
            found.setAttribute(ATTR, '1');
            return true;
        }})()
        "#,
        attr = MARK_ATTR,
        kind = js_string(locator.kind())?,
        text = js_string(locator.text())?,
    ))
}
