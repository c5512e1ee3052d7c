pub mod admin;
pub mod chats;
pub mod enroll_codes;
pub mod lti;
pub mod messages;

use anyhow::anyhow;
use validator::Validate;

use crate::error::AppError;

/// Runs payload validation, flattening field errors into one message.
pub fn validate_payload<T: Validate>(payload: &T) -> Result<(), AppError> {
    payload.validate().map_err(|e| {
        let mut error_messages = String::new();
        for (field, errors) in e.field_errors() {
            for error in errors {
                error_messages.push_str(&format!(
                    "{}: {} ",
                    field,
                    error
                        .message
                        .as_ref()
                        .map_or("invalid value", |m| m.as_ref())
                ));
            }
        }
        AppError::BadRequest(anyhow!(error_messages.trim().to_string()))
    })
}
