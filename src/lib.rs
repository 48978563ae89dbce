pub mod config;
pub mod fetch;
pub mod load;
pub mod pipeline;
pub mod process;
pub mod progress;
