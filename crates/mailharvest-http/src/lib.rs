mod client;
mod error;
mod mock;

pub use client::HttpArchive;
pub use error::{HttpError, HttpResult};
pub use mock::MockArchive;
