//! 中间件模块

pub mod internal_token;

pub use internal_token::{INTERNAL_TOKEN_HEADER, internal_token_auth};
