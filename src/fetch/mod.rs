// src/fetch/mod.rs
pub mod download;
pub mod urls;

pub use download::download_to_tempfile;
pub use urls::build_url;
