use std::fmt;

use crate::error::AttemptFailure;

/// 登录凭据
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// 密码不进日志
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// 登录会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Init,
    AwaitingCaptcha,
    Submitting,
    Authenticated,
    Failed,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Authenticated | SessionStatus::Failed)
    }

    /// 状态转换是否合法
    ///
    /// 除 `AwaitingCaptcha <-> Submitting` 的重试循环外，状态只能前进。
    /// `AwaitingCaptcha -> AwaitingCaptcha` 对应验证码识别无效直接刷新的情况。
    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        use SessionStatus::*;
        match (self, next) {
            (Init, AwaitingCaptcha) | (Init, Failed) => true,
            (AwaitingCaptcha, AwaitingCaptcha | Submitting | Failed) => true,
            (Submitting, AwaitingCaptcha | Authenticated | Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionStatus::Init => "Init",
            SessionStatus::AwaitingCaptcha => "AwaitingCaptcha",
            SessionStatus::Submitting => "Submitting",
            SessionStatus::Authenticated => "Authenticated",
            SessionStatus::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// 单次验证码尝试的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// 识别结果不可用，未提交
    Invalid,
    /// 已提交但未检测到登录成功
    Rejected,
    /// 登录成功
    Accepted,
}

/// 一次验证码尝试的记录
#[derive(Clone)]
pub struct CaptchaAttempt {
    pub attempt_index: u32,
    pub image_bytes: Vec<u8>,
    pub decoded_text: String,
    pub outcome: AttemptOutcome,
    pub failure: Option<AttemptFailure>,
}

impl fmt::Debug for CaptchaAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptchaAttempt")
            .field("attempt_index", &self.attempt_index)
            .field("image_len", &self.image_bytes.len())
            .field("decoded_text", &self.decoded_text)
            .field("outcome", &self.outcome)
            .field("failure", &self.failure)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SessionStatus::*;

    #[test]
    fn test_retry_cycle_is_allowed() {
        assert!(Init.can_transition_to(AwaitingCaptcha));
        assert!(AwaitingCaptcha.can_transition_to(Submitting));
        assert!(Submitting.can_transition_to(AwaitingCaptcha));
        assert!(AwaitingCaptcha.can_transition_to(AwaitingCaptcha));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for next in [Init, AwaitingCaptcha, Submitting, Authenticated, Failed] {
            assert!(!Authenticated.can_transition_to(next));
            assert!(!Failed.can_transition_to(next));
        }
        assert!(Authenticated.is_terminal());
        assert!(Failed.is_terminal());
    }

    #[test]
    fn test_cannot_skip_submission() {
        assert!(!AwaitingCaptcha.can_transition_to(Authenticated));
        assert!(!Init.can_transition_to(Submitting));
        assert!(!Submitting.can_transition_to(Init));
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials::new("alice", "s3cret");
        let text = format!("{:?}", creds);
        assert!(text.contains("alice"));
        assert!(!text.contains("s3cret"));
    }
}
