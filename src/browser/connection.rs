use chromiumoxide::Browser;
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::browser::BrowserSession;
use crate::error::{AppError, AppResult, BrowserError};

/// 连接到已运行的浏览器（需以 `--remote-debugging-port` 启动），并新建工作页面
pub async fn connect_to_browser(port: u16) -> AppResult<BrowserSession> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);

    let (browser, mut handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        BrowserError::ConnectionFailed {
            port,
            source: Box::new(e),
        }
    })?;
    debug!("浏览器连接成功");

    // 在后台处理浏览器事件
    let handler = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    // 总是新建页面，避免干扰用户已打开的标签
    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建新页面失败: {}", e);
        AppError::browser_action_failed("new_page", e)
    })?;

    Ok(BrowserSession {
        browser,
        page,
        handler,
        attached: true,
    })
}
