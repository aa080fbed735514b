pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod limit;
pub mod retry;
pub mod transport;

pub use client::{Client, ClientConfig};
pub use error::Error;
