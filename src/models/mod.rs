pub mod address;
pub mod admission;
pub mod session;

pub use address::{AddressFamily, AddressScope, NetworkAddress};
pub use admission::{AdmissionForm, Location};
pub use session::{AttemptOutcome, CaptchaAttempt, Credentials, SessionStatus};
