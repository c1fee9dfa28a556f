pub mod admission_flow;
pub mod login_session;

pub use admission_flow::FormSubmitter;
pub use login_session::{
    AuthenticatedSession, LoginOutcome, LoginReport, LoginSession, SessionConfig,
};
