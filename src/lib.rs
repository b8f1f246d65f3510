pub mod config;
pub mod connector;
pub mod error;
pub mod logging;
pub mod memory;
pub mod normalize;
pub mod pipeline;
pub mod types;
