//! Client-side validation errors and Sentry helpers.
//!
//! Validation errors never reach the network: a controller checks its form,
//! and on failure shows the error's `Display` text inline without sending a
//! request. Transport-level failures are captured to Sentry from the API
//! client.

use thiserror::Error;

/// A form that failed client-side validation.
///
/// The `Display` text is exactly what the page shows to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter both email and password.")]
    MissingCredentials,
    #[error("Please fill in all fields.")]
    MissingFields,
    #[error("Please enter a valid email address.")]
    InvalidEmail,
    #[error("Please enter your email address.")]
    MissingEmail,
    #[error("Passwords do not match.")]
    PasswordMismatch,
    #[error("Password must be at least 8 characters long.")]
    PasswordTooShort,
    #[error("Please fill in all shipping information fields.")]
    MissingShipping,
    #[error("Please fill in all payment information fields.")]
    MissingPayment,
    #[error("Please enter your name.")]
    MissingName,
    #[error("Please enter a valid price.")]
    InvalidPrice,
}

/// Minimum password length for registration and password reset.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Removed cart item", Some(&[("item_id", "42")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

/// Capture an error to Sentry tagged with the request id that produced it.
pub fn capture_request_error<E>(error: &E, request_id: &str)
where
    E: std::error::Error + ?Sized,
{
    let event_id = sentry::with_scope(
        |scope| scope.set_tag("request_id", request_id),
        || sentry::capture_error(error),
    );
    tracing::error!(
        error = %error,
        request_id,
        sentry_event_id = %event_id,
        "API request failed"
    );
}
