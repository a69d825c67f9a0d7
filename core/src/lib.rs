pub mod chain;
pub mod error;
pub mod nonce;
pub mod retry;
pub mod submit;
