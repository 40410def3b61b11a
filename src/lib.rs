pub mod config;
pub mod error;
pub mod http;
pub mod transport;
pub mod document;
pub mod submitter;
pub mod analytics;
pub mod utils;

pub use document::{Description, DocType, Document, Product};
pub use error::{AppError, Result};
pub use http::PermitGate;
pub use submitter::{DocumentSubmitter, DOCUMENT_CREATE_URI};
pub use utils::time::TimeUnit;
