use std::process::ExitCode;

use anyhow::Result;
use usereg_auth::utils::logging;
use usereg_auth::{App, Config};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::load()?;

    // 运行；所有终态都映射为退出码
    let outcome = App::new(config).run().await?;
    logging::log_final_outcome(&outcome);

    Ok(ExitCode::from(outcome.exit_code()))
}
