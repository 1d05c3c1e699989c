//! Data transfer objects for the Web API.

pub mod response;

pub use response::{MetadataResponse, UploadResponse};
