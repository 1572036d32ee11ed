pub mod collection;
pub mod record;

// Re-export handler functions for use in routing
pub use collection::create as collection_post;
pub use collection::list as collection_get;
pub use record::delete as record_delete;
pub use record::get as record_get;
pub use record::put as record_put;

use uuid::Uuid;

use crate::database::models::Resource;
use crate::error::ApiError;

/// A path id that is not a UUID cannot name an owned record.
pub(crate) fn parse_id<R: Resource>(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found(format!("{} not found", R::LABEL)))
}
