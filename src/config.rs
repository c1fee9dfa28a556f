use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::infrastructure::Locator;
use crate::models::{AddressFamily, Credentials, Location};
use crate::workflow::SessionConfig;

/// 指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "PORTAL_AUTH_CONFIG";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 用户注册管理系统地址
    pub portal_url: String,
    /// 账号用户名
    pub username: String,
    /// 账号密码
    pub password: String,
    /// 登录最大重试次数
    pub max_attempts: u32,
    /// 提交后等待成功标志的时间（毫秒）
    pub success_timeout_ms: u64,
    /// 刷新验证码后的冷却时间（毫秒）
    pub refresh_cooldown_ms: u64,
    /// 等待页面元素出现的时间（毫秒）
    pub element_timeout_ms: u64,
    /// 最终提交后的停留时间（毫秒）
    pub settle_delay_ms: u64,
    /// 需要登记的地址族
    pub address_family: AddressFamily,
    /// 优先选择的网卡名称
    pub preferred_interface: Option<String>,
    /// 准入认证位置
    pub location: Location,
    /// ddddocr 兼容 OCR 服务地址
    pub ocr_endpoint: String,
    /// OCR 请求超时（毫秒）
    pub ocr_timeout_ms: u64,
    /// 已运行浏览器的调试端口；为空时启动无头浏览器
    pub browser_debug_port: Option<u16>,
    /// Chromium 可执行文件路径
    pub chrome_executable: Option<String>,
    /// 页面元素定位
    pub locators: PortalLocators,
}

/// 门户页面上各元素的定位方式
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PortalLocators {
    pub username_field: Locator,
    pub password_field: Locator,
    pub captcha_image: Locator,
    pub captcha_field: Locator,
    pub login_button: Locator,
    /// 登录成功后出现的"准入代认证"链接
    pub success_marker: Locator,
    pub device_address_field: Locator,
    pub admission_password_field: Locator,
    pub on_campus_radio: Locator,
    pub off_campus_radio: Locator,
    pub admission_submit_button: Locator,
}

impl Default for PortalLocators {
    fn default() -> Self {
        Self {
            username_field: Locator::Textbox("用户名".to_string()),
            password_field: Locator::Textbox("密码".to_string()),
            captcha_image: Locator::Css("#loginform-verifycode-image".to_string()),
            captcha_field: Locator::Textbox("验证码".to_string()),
            login_button: Locator::Button("登录".to_string()),
            success_marker: Locator::Link("准入代认证".to_string()),
            device_address_field: Locator::Textbox("哑终端IP地址".to_string()),
            admission_password_field: Locator::Textbox("密码".to_string()),
            on_campus_radio: Locator::Radio("校内".to_string()),
            off_campus_radio: Locator::Radio("校外".to_string()),
            admission_submit_button: Locator::Button("登录".to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            portal_url: "https://usereg.tsinghua.edu.cn".to_string(),
            username: String::new(),
            password: String::new(),
            max_attempts: 5,
            success_timeout_ms: 2000,
            refresh_cooldown_ms: 1000,
            element_timeout_ms: 10_000,
            settle_delay_ms: 1000,
            address_family: AddressFamily::V6,
            preferred_interface: None,
            location: Location::OffCampus,
            ocr_endpoint: "http://127.0.0.1:9898".to_string(),
            ocr_timeout_ms: 5000,
            browser_debug_port: None,
            chrome_executable: None,
            locators: PortalLocators::default(),
        }
    }
}

impl Config {
    /// 加载配置：默认值 → 配置文件（若设置了 `PORTAL_AUTH_CONFIG`）→ 环境变量
    pub fn load() -> Result<Self> {
        let base = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_toml_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        let config = base.with_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// 默认值叠加环境变量
    pub fn from_env() -> Result<Self> {
        Ok(Self::default().with_env_overrides()?)
    }

    /// 从 TOML 文件读取配置，缺省字段使用默认值
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(v) = std::env::var("PORTAL_URL") {
            self.portal_url = v;
        }
        if let Ok(v) = std::env::var("PORTAL_USERNAME") {
            self.username = v;
        }
        if let Ok(v) = std::env::var("PORTAL_PASSWORD") {
            self.password = v;
        }
        if let Ok(v) = std::env::var("OCR_ENDPOINT") {
            self.ocr_endpoint = v;
        }
        if let Ok(v) = std::env::var("PREFERRED_INTERFACE") {
            self.preferred_interface = Some(v);
        }
        if let Ok(v) = std::env::var("CHROME_EXECUTABLE") {
            self.chrome_executable = Some(v);
        }
        if let Some(v) = env_parse::<u32>("MAX_ATTEMPTS", "u32")? {
            self.max_attempts = v;
        }
        if let Some(v) = env_parse::<u64>("SUCCESS_TIMEOUT_MS", "u64")? {
            self.success_timeout_ms = v;
        }
        if let Some(v) = env_parse::<u64>("REFRESH_COOLDOWN_MS", "u64")? {
            self.refresh_cooldown_ms = v;
        }
        if let Some(v) = env_parse::<u16>("BROWSER_DEBUG_PORT", "u16")? {
            self.browser_debug_port = Some(v);
        }
        Ok(self)
    }

    /// 校验配置取值
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_attempts".to_string(),
                reason: "至少需要 1 次尝试".to_string(),
            });
        }
        if self.username.is_empty() || self.password.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "username/password".to_string(),
                reason: "账号或密码为空".to_string(),
            });
        }
        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.username, &self.password)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            max_attempts: self.max_attempts,
            success_timeout: Duration::from_millis(self.success_timeout_ms),
            refresh_cooldown: Duration::from_millis(self.refresh_cooldown_ms),
            element_timeout: Duration::from_millis(self.element_timeout_ms),
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn ocr_timeout(&self) -> Duration {
        Duration::from_millis(self.ocr_timeout_ms)
    }
}

fn env_parse<T: FromStr>(var_name: &str, expected_type: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_portal_policy() {
        let config = Config::default();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.location, Location::OffCampus);
        assert_eq!(config.address_family, AddressFamily::V6);
        let session = config.session_config();
        assert_eq!(session.success_timeout, Duration::from_secs(2));
        assert_eq!(session.refresh_cooldown, Duration::from_secs(1));
    }

    #[test]
    fn test_toml_partial_overrides() {
        let config = Config::from_toml_str(
            r#"
            username = "alice"
            password = "pw"
            max_attempts = 3
            address_family = "ipv4"
            preferred_interface = "eth1"

            [locators]
            captcha_image = { css = "img.captcha" }
            "#,
        )
        .unwrap();

        assert_eq!(config.username, "alice");
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.address_family, AddressFamily::V4);
        assert_eq!(config.preferred_interface.as_deref(), Some("eth1"));
        assert_eq!(
            config.locators.captcha_image,
            Locator::Css("img.captcha".to_string())
        );
        // 未指定的字段保持默认
        assert_eq!(
            config.locators.success_marker,
            Locator::Link("准入代认证".to_string())
        );
        assert_eq!(config.success_timeout_ms, 2000);
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let config = Config {
            username: "alice".to_string(),
            password: "pw".to_string(),
            max_attempts: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_missing_credentials() {
        assert!(Config::default().validate().is_err());
    }
}
