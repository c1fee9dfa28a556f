//! 应用编排 - 编排层
//!
//! ## 职责
//!
//! 1. **地址发现**：先读网卡，找不到地址直接结束，此时尚未启动浏览器
//! 2. **资源获取**：启动或连接浏览器，交给登录会话独占
//! 3. **登录**：委托 `LoginSession` 完成验证码重试
//! 4. **准入认证**：登录成功后委托 `FormSubmitter` 提交一次
//! 5. **结果汇总**：任何结局都归结为一个 `RunOutcome`，由 main 映射为退出码

use std::future::Future;

use tracing::error;

use crate::browser::{self, BrowserSession};
use crate::config::Config;
use crate::error::{AppError, AppResult, MaxAttemptsExceeded};
use crate::infrastructure::{ChromiumDriver, PageDriver};
use crate::models::{AddressFamily, NetworkAddress};
use crate::services::{CaptchaSolver, HttpOcrSolver, InterfaceSource, NetworkAddressResolver};
use crate::utils::logging;
use crate::workflow::{FormSubmitter, LoginOutcome, LoginSession};

/// 一次运行的终态
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// 登录成功并已提交准入认证
    Completed {
        address: NetworkAddress,
        attempts: u32,
    },
    /// 网卡上没有可用地址，未启动浏览器
    AddressUnavailable { family: AddressFamily },
    /// 登录重试次数耗尽
    LoginFailed(MaxAttemptsExceeded),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Completed { .. })
    }

    /// 进程退出码
    ///
    /// `1` 留给配置、浏览器、OCR 等基础设施错误。
    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::Completed { .. } => 0,
            RunOutcome::AddressUnavailable { .. } => 2,
            RunOutcome::LoginFailed(_) => 3,
        }
    }
}

/// 应用主结构
pub struct App {
    config: Config,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// 使用真实网卡、OCR 服务和 Chromium 运行
    pub async fn run(&self) -> AppResult<RunOutcome> {
        logging::log_startup(&self.config);

        let resolver = NetworkAddressResolver::system(self.config.address_family)
            .with_preferred_interface(self.config.preferred_interface.clone());
        let solver = HttpOcrSolver::new(&self.config.ocr_endpoint, self.config.ocr_timeout())?;

        let debug_port = self.config.browser_debug_port;
        let chrome_executable = self.config.chrome_executable.clone();
        self.run_with(&resolver, solver, move || async move {
            let session: BrowserSession = match debug_port {
                Some(port) => browser::connect_to_browser(port).await?,
                None => browser::launch_headless_browser(chrome_executable.as_deref()).await?,
            };
            Ok::<_, AppError>(ChromiumDriver::new(session))
        })
        .await
    }

    /// 按给定的能力运行完整流程
    ///
    /// `open_driver` 只在地址发现成功后才会被调用。
    pub async fn run_with<S, C, D, F, Fut>(
        &self,
        resolver: &NetworkAddressResolver<S>,
        solver: C,
        open_driver: F,
    ) -> AppResult<RunOutcome>
    where
        S: InterfaceSource,
        C: CaptchaSolver,
        D: PageDriver,
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<D>>,
    {
        // 阶段 0: 环境检查
        let address = match resolver.discover() {
            Ok(address) => address,
            Err(AppError::NoAddressFound { family }) => {
                error!("❌ 未找到有效的公网 {} 地址，请检查网线连接或地址分配", family);
                return Ok(RunOutcome::AddressUnavailable { family });
            }
            Err(e) => return Err(e),
        };

        // 阶段 1: 初始化浏览器与会话
        let driver = open_driver().await?;
        let session = LoginSession::new(
            driver,
            solver,
            self.config.credentials(),
            self.config.locators.clone(),
            self.config.session_config(),
            self.config.portal_url.clone(),
        );

        // 阶段 2-3: 登录
        let authenticated = match session.authenticate().await? {
            LoginOutcome::Authenticated(authenticated) => authenticated,
            LoginOutcome::Failed(report) => return Ok(RunOutcome::LoginFailed(report.failure)),
        };
        let attempts = authenticated.attempts_used();

        // 阶段 4: 准入代认证
        let submitter = FormSubmitter::new(
            self.config.locators.clone(),
            self.config.location,
            self.config.session_config().element_timeout,
            self.config.settle_delay(),
        );
        submitter.submit(authenticated, &address).await?;

        Ok(RunOutcome::Completed { address, attempts })
    }
}
