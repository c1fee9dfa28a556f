//! # Usereg Auth
//!
//! 自动登录用户注册管理系统并完成准入代认证
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Browser / Page），只暴露能力
//! - `PageDriver` - 导航、填写、点击、截图、有界等待
//! - `ChromiumDriver` - 基于 chromiumoxide 的实现
//!
//! ### ② 业务能力层（Services）
//! - `NetworkAddressResolver` - 从网卡找到可登记的全局单播地址
//! - `CaptchaSolver` - 验证码图片 -> 文本
//!
//! ### ③ 流程层（Workflow）
//! - `LoginSession` - 验证码识别与登录的有限次重试状态机
//! - `FormSubmitter` - 登录成功后一次性提交准入代认证表单
//!
//! ### ④ 编排层（Orchestration）
//! - `App` - 地址发现 → 登录 → 准入认证 → 释放资源，汇总为 `RunOutcome`

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use orchestrator::{App, RunOutcome};
