pub mod config;
pub mod error;
pub mod extract;
pub mod matching;
pub mod pdf;
pub mod pipeline;
pub mod removal;

#[cfg(feature = "render")]
pub mod render;
