//! Validation of incoming event data.
//!
//! All checks run before any write; a failed validation leaves no partial
//! state anywhere. Field-level rules use `validator` derives, the
//! cross-field rules (date ordering, selection cap) are explicit.

use chrono::NaiveDate;
use validator::Validate;

use crate::error::CoreError;

/// Validated input for creating an event.
#[derive(Debug, Clone, Validate)]
pub struct NewEvent {
    /// Display name shown to both parties.
    #[validate(length(min = 1, max = 200, message = "Event name is required"))]
    pub name: String,
    /// The client who will pick and download photos.
    #[validate(email(message = "Client email must be a valid address"))]
    pub client_email: String,
    /// When the shoot happens.
    pub event_date: NaiveDate,
    /// Deadline for delivering finals. Must not precede the event itself.
    pub delivery_date: NaiveDate,
    /// Selection budget, fixed for the lifetime of the event.
    pub max_selections: i32,
}

impl NewEvent {
    /// Run all creation-time checks.
    ///
    /// New events must carry a positive selection cap; the `0 = no cap`
    /// reading only applies to rows that predate the cap field.
    pub fn check(&self) -> Result<(), CoreError> {
        if let Err(errors) = self.validate() {
            return Err(CoreError::Validation(flatten_errors(&errors)));
        }
        if self.max_selections <= 0 {
            return Err(CoreError::Validation(
                "Maximum selections must be greater than zero".into(),
            ));
        }
        if self.delivery_date < self.event_date {
            return Err(CoreError::Validation(
                "Delivery date cannot be before the event date".into(),
            ));
        }
        Ok(())
    }
}

/// Collapse `validator` errors into one human-readable line.
fn flatten_errors(errors: &validator::ValidationErrors) -> String {
    errors.to_string().replace('\n', "; ")
}
