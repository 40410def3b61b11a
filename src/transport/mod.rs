mod r#trait;

#[cfg(test)]
pub(crate) mod mock;

pub use r#trait::{ApiRequest, Transport};
