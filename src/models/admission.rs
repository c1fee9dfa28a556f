use serde::{Deserialize, Serialize};

use crate::models::NetworkAddress;

/// 认证位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// 校内
    OnCampus,
    /// 校外
    OffCampus,
}

/// 准入代认证表单
///
/// 只能在会话登录成功后构造，提交一次，不重试。
#[derive(Debug, Clone)]
pub struct AdmissionForm {
    pub device_address: NetworkAddress,
    pub password: String,
    pub location: Location,
}

impl AdmissionForm {
    pub(crate) fn new(device_address: NetworkAddress, password: String, location: Location) -> Self {
        Self {
            device_address,
            password,
            location,
        }
    }
}
