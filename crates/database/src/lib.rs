pub mod common;
pub mod config;
pub mod error;
pub mod impls;
#[cfg(feature = "postgres")]
mod schema;
pub mod utils;
