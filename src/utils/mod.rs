pub mod download;
pub mod mime;
