//! 编排层（Orchestration Layer）
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::App (一次完整运行)
//!     ↓
//! workflow::LoginSession → workflow::FormSubmitter
//!     ↓
//! services (能力层：地址发现 / 验证码识别)
//!     ↓
//! infrastructure (基础设施：PageDriver / ChromiumDriver)
//! ```
//!
//! 只有编排层决定何时获取浏览器资源；获取之后所有权交给登录会话。

pub mod app;

pub use app::{App, RunOutcome};
