//! HTTP handlers, one module per resource.

pub mod auth;
pub mod downloads;
pub mod events;
pub mod photos;
pub mod profile;
pub mod selections;

use proofroom_core::error::CoreError;
use proofroom_db::models::event::Event;

use crate::error::AppError;
use crate::middleware::AuthUser;

/// Check that `user` may see `event`: the owning photographer or the client
/// the event is addressed to. Everyone else gets 403 with no state change.
pub(crate) fn ensure_event_access(event: &Event, user: &AuthUser) -> Result<(), AppError> {
    let is_owner = event.photographer_id == user.user_id;
    let is_client = event.client_email.eq_ignore_ascii_case(&user.email);
    if is_owner || is_client {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Forbidden(
            "You do not have access to this event".into(),
        )))
    }
}

/// Check that `user` is the photographer who owns `event`.
pub(crate) fn ensure_event_owner(event: &Event, user: &AuthUser) -> Result<(), AppError> {
    if event.photographer_id == user.user_id {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Forbidden(
            "Only the event's photographer may do this".into(),
        )))
    }
}
