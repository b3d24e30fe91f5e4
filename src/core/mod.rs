pub mod clock;
pub mod config;
pub mod seek;
pub mod session;

#[cfg(test)]
mod config_test;

pub use clock::*;
pub use config::*;
pub use seek::*;
pub use session::*;
