//! Principal resolvers.

pub mod static_token;

pub use static_token::StaticTokenResolver;
