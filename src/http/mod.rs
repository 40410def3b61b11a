pub mod client;
pub mod pool;
pub mod rate_limiter;

pub use client::HttpTransport;
pub use rate_limiter::PermitGate;
