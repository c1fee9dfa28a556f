//! 日志工具模块
//!
//! 提供日志初始化和运行横幅的辅助函数

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::orchestrator::RunOutcome;

/// 初始化日志，`RUST_LOG` 可覆盖默认的 info 级别
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // 测试中可能重复初始化，忽略错误
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 用户注册管理系统自动认证");
    info!("🌐 门户地址: {}", config.portal_url);
    info!("👤 账号: {}", config.username);
    info!("🔁 最大重试次数: {}", config.max_attempts);
    info!("{}", "=".repeat(60));
}

/// 打印最终结果
pub fn log_final_outcome(outcome: &RunOutcome) {
    info!("\n{}", "=".repeat(60));
    info!(
        "📊 运行结束 - {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    match outcome {
        RunOutcome::Completed { address, attempts } => {
            info!("✅ 已完成准入代认证: {} (登录用了 {} 次尝试)", address, attempts);
        }
        RunOutcome::AddressUnavailable { family } => {
            error!("❌ 未找到可用的 {} 地址，未进行登录", family);
        }
        RunOutcome::LoginFailed(report) => {
            error!("❌ {}", report);
        }
    }
    info!("{}", "=".repeat(60));
}
