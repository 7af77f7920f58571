pub mod client;
pub mod keys;
pub mod service;

pub use client::create_client;
pub use service::CacheService;
