// src/process/mod.rs
pub mod convert;
pub mod reader;
pub mod schema;
pub mod source;

pub use reader::BatchReader;
pub use schema::ResolvedSchema;
