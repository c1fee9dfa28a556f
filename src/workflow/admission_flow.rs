//! 准入代认证表单提交 - 流程层
//!
//! 登录成功后一次性提交设备地址，不重试，也不确认门户是否接受。

use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::PortalLocators;
use crate::error::{AppError, AppResult};
use crate::infrastructure::{PageDriver, WaitOutcome};
use crate::models::{AdmissionForm, Location, NetworkAddress};
use crate::workflow::login_session::AuthenticatedSession;

/// 准入代认证表单提交器
pub struct FormSubmitter {
    locators: PortalLocators,
    location: Location,
    element_timeout: Duration,
    settle_delay: Duration,
}

impl FormSubmitter {
    pub fn new(
        locators: PortalLocators,
        location: Location,
        element_timeout: Duration,
        settle_delay: Duration,
    ) -> Self {
        Self {
            locators,
            location,
            element_timeout,
            settle_delay,
        }
    }

    /// 填写并提交表单，结束后释放浏览器资源
    ///
    /// 返回已提交的表单内容。出错时同样会释放资源。
    pub async fn submit<D: PageDriver>(
        &self,
        mut session: AuthenticatedSession<D>,
        address: &NetworkAddress,
    ) -> AppResult<AdmissionForm> {
        let form = AdmissionForm::new(
            address.clone(),
            session.credentials().password.clone(),
            self.location,
        );

        let result = self.fill_and_submit(session.driver_mut(), &form).await;

        if let Err(e) = session.release().await {
            warn!("释放浏览器资源失败: {}", e);
        }
        result.map(|()| form)
    }

    async fn fill_and_submit<D: PageDriver>(&self, driver: &mut D, form: &AdmissionForm) -> AppResult<()> {
        info!("📝 进入准入代认证页面...");
        driver.click(&self.locators.success_marker).await?;

        let address_field = &self.locators.device_address_field;
        if driver.wait_for(address_field, self.element_timeout).await? == WaitOutcome::TimedOut {
            return Err(AppError::element_not_found(address_field));
        }

        info!("📝 正在填写认证表单...");
        driver
            .fill(address_field, form.device_address.value())
            .await?;
        driver
            .fill(&self.locators.admission_password_field, &form.password)
            .await?;

        let radio = match form.location {
            Location::OnCampus => &self.locators.on_campus_radio,
            Location::OffCampus => &self.locators.off_campus_radio,
        };
        driver.check(radio).await?;

        info!("📤 提交最终认证请求...");
        driver.click(&self.locators.admission_submit_button).await?;
        info!("✅ 操作完成！({} 已提交)", form.device_address);

        // 留时间让最后的页面跳转完成
        sleep(self.settle_delay).await;
        Ok(())
    }
}
