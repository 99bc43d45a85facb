pub mod backoff;
pub mod client;
pub mod events;
pub mod session;

pub use client::GatewayClient;
pub use session::GatewayEvent;
