use uuid::Uuid;

use scribe_db::models::PostRow;

use crate::error::ApiError;
use crate::middleware::AuthUser;

/// A stored resource with a single owning account.
pub trait Owned {
    /// Name used in the not-found message.
    const KIND: &'static str;

    fn owner_id(&self) -> &str;
}

impl Owned for PostRow {
    const KIND: &'static str = "post";

    fn owner_id(&self) -> &str {
        &self.author_id
    }
}

/// Gate for update/delete. Existence is checked before ownership, so a
/// missing resource is a 404 for every caller and someone else's resource
/// is a 403. Never writes.
pub fn authorize_mutation<R: Owned>(found: Option<R>, caller: &AuthUser) -> Result<R, ApiError> {
    let resource = found.ok_or(ApiError::NotFound(R::KIND))?;

    let is_owner = resource
        .owner_id()
        .parse::<Uuid>()
        .is_ok_and(|owner| owner == caller.id);
    if !is_owner {
        return Err(ApiError::Forbidden);
    }

    Ok(resource)
}
