pub mod admin_auth;
pub mod client_ip;

pub use admin_auth::*;
pub use client_ip::*;
