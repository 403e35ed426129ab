pub mod codec;
pub mod config;
pub mod encoder;
pub mod error;
pub mod exec;
pub mod files;
pub mod filter;
pub mod gateway;
pub mod protocol;
pub mod resolver;

#[cfg(all(test, unix))]
mod testing;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use gateway::Gateway;
pub use protocol::{Request, Response};
