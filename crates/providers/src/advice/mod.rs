pub mod client;
pub mod config;

pub use client::AdviceClient;
pub use config::AdviceConfig;
