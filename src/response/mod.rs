//! Response module - uniform media results and media persistence

pub mod media;
pub mod store;

pub use media::{MediaResponse, ProviderInfo};
pub use store::{is_media_content_type, FileMediaStore, MediaStore};
