pub mod address_resolver;
pub mod captcha_solver;

pub use address_resolver::{
    InterfaceAddress, InterfaceSource, NetworkAddressResolver, StaticInterfaces, SystemInterfaces,
};
pub use captcha_solver::{CaptchaSolver, HttpOcrSolver};
