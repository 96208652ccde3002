pub mod message;
pub mod model;
pub mod config;
pub mod error;
pub mod session;

#[cfg(test)]
mod tests;

pub use error::EngineError;
pub type Result<T> = std::result::Result<T, EngineError>;
