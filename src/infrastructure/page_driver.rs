//! 页面驱动能力 - 基础设施层
//!
//! 会话和表单提交只通过这个 trait 操作页面，不直接接触浏览器。

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::AppResult;

/// 页面元素定位方式
///
/// 除 `Css` 外都按可见文本或标签匹配：先精确匹配，再退化为包含匹配。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locator {
    /// CSS 选择器
    Css(String),
    /// 按 label / placeholder / aria-label 匹配的输入框
    Textbox(String),
    /// 按文本匹配的按钮
    Button(String),
    /// 按文本匹配的链接
    Link(String),
    /// 按 label 匹配的单选框
    Radio(String),
}

impl Locator {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Locator::Css(_) => "css",
            Locator::Textbox(_) => "textbox",
            Locator::Button(_) => "button",
            Locator::Link(_) => "link",
            Locator::Radio(_) => "radio",
        }
    }

    pub(crate) fn text(&self) -> &str {
        match self {
            Locator::Css(s)
            | Locator::Textbox(s)
            | Locator::Button(s)
            | Locator::Link(s)
            | Locator::Radio(s) => s,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(\"{}\")", self.kind(), self.text())
    }
}

/// 有界等待的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// 截止时间内元素已可见
    Found,
    /// 超时
    TimedOut,
}

/// UI 自动化能力
///
/// 实现者独占浏览器资源；`release` 之后的任何操作都应返回错误，
/// 重复调用 `release` 不做任何事。
#[async_trait]
pub trait PageDriver: Send {
    /// 打开页面
    async fn navigate(&mut self, url: &str) -> AppResult<()>;

    /// 等待元素可见，最长 `timeout`
    async fn wait_for(&mut self, locator: &Locator, timeout: Duration) -> AppResult<WaitOutcome>;

    /// 清空并填写输入框
    async fn fill(&mut self, locator: &Locator, value: &str) -> AppResult<()>;

    async fn click(&mut self, locator: &Locator) -> AppResult<()>;

    /// 勾选单选框/复选框（已勾选则不动）
    async fn check(&mut self, locator: &Locator) -> AppResult<()>;

    /// 对元素截图，返回 PNG 字节
    async fn screenshot(&mut self, locator: &Locator) -> AppResult<Vec<u8>>;

    /// 释放浏览器资源
    async fn release(&mut self) -> AppResult<()>;
}
