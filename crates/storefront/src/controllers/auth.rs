//! Login, registration, forgot-password and reset-password pages.
//!
//! Each form moves `Idle -> Submitting -> Success | Failed`. Validation
//! failures go straight to `Failed` without a request; the submit button is
//! enabled again in every state but `Submitting`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use shopfront_core::Email;
use tokio::task::AbortHandle;
use tracing::instrument;

use crate::api::{ApiError, AuthGrant, DEFAULT_ACCOUNT_TYPE, Registration};
use crate::error::{MIN_PASSWORD_LENGTH, ValidationError, add_breadcrumb};
use crate::render::{AlertKind, AlertView, alert};

use super::shared::{Effect, PageContext, sanitize_redirect};

/// How long the forgot-password modal stays open after a link was sent.
pub const FORGOT_PASSWORD_DISMISS_AFTER: Duration = Duration::from_secs(3);

const RESET_LINK_SENT: &str = "A password reset link has been sent to your email address.";
const PASSWORD_RESET: &str = "Your password has been reset. Please log in.";
const SESSION_NOT_SAVED: &str = "Could not save your session. Please try again.";

// =============================================================================
// Form state
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FormState {
    #[default]
    Idle,
    Submitting,
    Success(String),
    Failed(String),
}

impl FormState {
    /// Whether the submit button is disabled.
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        matches!(self, Self::Submitting)
    }

    /// Inline message under the form.
    #[must_use]
    pub fn message(&self) -> Option<AlertView> {
        match self {
            Self::Success(message) => Some(alert(AlertKind::Success, message.clone())),
            Self::Failed(message) => Some(alert(AlertKind::Danger, message.clone())),
            Self::Idle | Self::Submitting => None,
        }
    }

    fn failed(error: impl ToString) -> Self {
        Self::Failed(error.to_string())
    }
}

// =============================================================================
// Forms
// =============================================================================

#[derive(Debug, Clone)]
pub struct LoginForm {
    pub email: String,
    pub password: SecretString,
}

#[derive(Debug, Clone)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
    /// Defaults to "customer" when absent.
    pub account_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResetPasswordForm {
    pub token: SecretString,
    pub password: SecretString,
    pub confirm_password: SecretString,
}

fn is_blank(secret: &SecretString) -> bool {
    secret.expose_secret().trim().is_empty()
}

/// Shared rules for choosing a new password.
fn check_new_password(
    password: &SecretString,
    confirm: &SecretString,
) -> Result<(), ValidationError> {
    if password.expose_secret() != confirm.expose_secret() {
        return Err(ValidationError::PasswordMismatch);
    }
    if password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

impl LoginForm {
    fn validate(&self) -> Result<Email, ValidationError> {
        if self.email.trim().is_empty() || is_blank(&self.password) {
            return Err(ValidationError::MissingCredentials);
        }
        Email::parse(&self.email).map_err(|_| ValidationError::InvalidEmail)
    }
}

impl RegisterForm {
    fn validate(&self) -> Result<Registration, ValidationError> {
        if self.name.trim().is_empty()
            || self.email.trim().is_empty()
            || is_blank(&self.password)
            || is_blank(&self.confirm_password)
        {
            return Err(ValidationError::MissingFields);
        }
        let email = Email::parse(&self.email).map_err(|_| ValidationError::InvalidEmail)?;
        check_new_password(&self.password, &self.confirm_password)?;

        Ok(Registration {
            name: self.name.trim().to_owned(),
            email,
            password: self.password.clone(),
            account_type: self
                .account_type
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or(DEFAULT_ACCOUNT_TYPE)
                .to_owned(),
        })
    }
}

impl ResetPasswordForm {
    fn validate(&self) -> Result<(), ValidationError> {
        if is_blank(&self.password) || is_blank(&self.confirm_password) {
            return Err(ValidationError::MissingFields);
        }
        check_new_password(&self.password, &self.confirm_password)
    }
}

// =============================================================================
// Error messages
// =============================================================================

fn login_failure(error: &ApiError) -> String {
    match error {
        ApiError::Unauthorized => "Invalid email or password.".to_owned(),
        ApiError::NotFound { .. } => "User not found.".to_owned(),
        _ => server_message_or(error, "Failed to log in. Please try again."),
    }
}

fn register_failure(error: &ApiError) -> String {
    match error {
        ApiError::Conflict { .. } => {
            "Email already in use. Please use a different email.".to_owned()
        }
        _ => server_message_or(error, "Failed to register. Please try again."),
    }
}

fn forgot_password_failure(error: &ApiError) -> String {
    match error {
        ApiError::NotFound { .. } => "This email address is not registered.".to_owned(),
        _ => server_message_or(
            error,
            "Failed to send password reset link. Please try again.",
        ),
    }
}

fn reset_password_failure(error: &ApiError) -> String {
    match error.status() {
        Some(StatusCode::BAD_REQUEST) => "Invalid or expired reset token.".to_owned(),
        _ => server_message_or(error, "Failed to reset password. Please try again."),
    }
}

fn server_message_or(error: &ApiError, default: &str) -> String {
    error.server_message().unwrap_or(default).to_owned()
}

// =============================================================================
// Forgot-password modal
// =============================================================================

/// The forgot-password modal on the login page.
///
/// After a link was sent the modal closes itself once
/// [`FORGOT_PASSWORD_DISMISS_AFTER`] has passed.
#[derive(Debug, Default)]
pub struct ForgotPasswordModal {
    open: Arc<AtomicBool>,
    state: FormState,
    dismiss: Option<AbortHandle>,
}

impl ForgotPasswordModal {
    pub fn open(&mut self) {
        self.cancel_dismiss();
        self.state = FormState::Idle;
        self.open.store(true, Ordering::SeqCst);
    }

    pub fn close(&mut self) {
        self.cancel_dismiss();
        self.open.store(false, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    #[must_use]
    pub const fn state(&self) -> &FormState {
        &self.state
    }

    fn schedule_dismiss(&mut self) {
        self.cancel_dismiss();
        let open = Arc::clone(&self.open);
        let task = tokio::spawn(async move {
            tokio::time::sleep(FORGOT_PASSWORD_DISMISS_AFTER).await;
            open.store(false, Ordering::SeqCst);
        });
        self.dismiss = Some(task.abort_handle());
    }

    fn cancel_dismiss(&mut self) {
        if let Some(handle) = self.dismiss.take() {
            handle.abort();
        }
    }
}

impl Drop for ForgotPasswordModal {
    fn drop(&mut self) {
        self.cancel_dismiss();
    }
}

// =============================================================================
// AuthPage
// =============================================================================

/// The login and registration pages.
///
/// `redirect` is the page to return to after signing in.
#[derive(Debug)]
pub struct AuthPage {
    redirect: String,
    state: FormState,
    forgot_password: ForgotPasswordModal,
}

impl AuthPage {
    #[must_use]
    pub fn new(redirect: Option<&str>) -> Self {
        Self {
            redirect: sanitize_redirect(redirect),
            state: FormState::Idle,
            forgot_password: ForgotPasswordModal::default(),
        }
    }

    #[must_use]
    pub fn redirect(&self) -> &str {
        &self.redirect
    }

    #[must_use]
    pub const fn state(&self) -> &FormState {
        &self.state
    }

    #[must_use]
    pub const fn forgot_password(&self) -> &ForgotPasswordModal {
        &self.forgot_password
    }

    pub fn forgot_password_mut(&mut self) -> &mut ForgotPasswordModal {
        &mut self.forgot_password
    }

    /// A signed-in user is sent on without contacting the server.
    #[must_use]
    pub fn on_load(&self, ctx: &PageContext) -> Vec<Effect> {
        if ctx.session.is_authenticated() {
            vec![Effect::navigate(self.redirect.as_str())]
        } else {
            Vec::new()
        }
    }

    #[instrument(skip_all, fields(redirect = %self.redirect))]
    pub async fn login(&mut self, ctx: &PageContext, form: &LoginForm) -> Vec<Effect> {
        let email = match form.validate() {
            Ok(email) => email,
            Err(e) => {
                self.state = FormState::failed(e);
                return Vec::new();
            }
        };

        self.state = FormState::Submitting;
        match ctx.api.login(&email, &form.password).await {
            Ok(grant) => self.signed_in(ctx, &grant),
            Err(e) => {
                tracing::info!(error = %e, "Login failed");
                self.state = FormState::Failed(login_failure(&e));
                Vec::new()
            }
        }
    }

    #[instrument(skip_all, fields(redirect = %self.redirect))]
    pub async fn register(&mut self, ctx: &PageContext, form: &RegisterForm) -> Vec<Effect> {
        let registration = match form.validate() {
            Ok(registration) => registration,
            Err(e) => {
                self.state = FormState::failed(e);
                return Vec::new();
            }
        };

        self.state = FormState::Submitting;
        match ctx.api.register(&registration).await {
            Ok(grant) => self.signed_in(ctx, &grant),
            Err(e) => {
                tracing::info!(error = %e, "Registration failed");
                self.state = FormState::Failed(register_failure(&e));
                Vec::new()
            }
        }
    }

    fn signed_in(&mut self, ctx: &PageContext, grant: &AuthGrant) -> Vec<Effect> {
        if let Err(e) = ctx.session.sign_in(&grant.token, &grant.user) {
            tracing::error!(error = %e, "Failed to store session");
            self.state = FormState::Failed(SESSION_NOT_SAVED.to_owned());
            return Vec::new();
        }
        add_breadcrumb("auth", "Signed in", None);
        self.state = FormState::Success(String::new());
        vec![Effect::navigate(self.redirect.as_str())]
    }

    /// Send a reset link from the forgot-password modal.
    #[instrument(skip_all)]
    pub async fn send_reset_link(&mut self, ctx: &PageContext, email: &str) {
        let modal = &mut self.forgot_password;
        if email.trim().is_empty() {
            modal.state = FormState::failed(ValidationError::MissingEmail);
            return;
        }
        let email = match Email::parse(email) {
            Ok(email) => email,
            Err(_) => {
                modal.state = FormState::failed(ValidationError::InvalidEmail);
                return;
            }
        };

        modal.state = FormState::Submitting;
        match ctx.api.forgot_password(&email).await {
            Ok(()) => {
                modal.state = FormState::Success(RESET_LINK_SENT.to_owned());
                modal.schedule_dismiss();
            }
            Err(e) => {
                tracing::info!(error = %e, "Reset link request failed");
                modal.state = FormState::Failed(forgot_password_failure(&e));
            }
        }
    }

    /// Choose a new password with a token from a reset link.
    #[instrument(skip_all)]
    pub async fn reset_password(
        &mut self,
        ctx: &PageContext,
        form: &ResetPasswordForm,
    ) -> Vec<Effect> {
        if is_blank(&form.token) {
            self.state = FormState::Failed("Invalid or expired reset token.".to_owned());
            return Vec::new();
        }
        if let Err(e) = form.validate() {
            self.state = FormState::failed(e);
            return Vec::new();
        }

        self.state = FormState::Submitting;
        match ctx.api.reset_password(&form.token, &form.password).await {
            Ok(()) => {
                self.state = FormState::Success(PASSWORD_RESET.to_owned());
                vec![
                    Effect::alert(AlertKind::Success, PASSWORD_RESET),
                    Effect::navigate("/login"),
                ]
            }
            Err(e) => {
                tracing::info!(error = %e, "Password reset failed");
                self.state = FormState::Failed(reset_password_failure(&e));
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use shopfront_core::UserInfo;

    use super::*;
    use crate::controllers::testing::offline_context;
    use crate::session::MemorySessionStore;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s)
    }

    fn register_form(password: &str, confirm: &str) -> RegisterForm {
        RegisterForm {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: secret(password),
            confirm_password: secret(confirm),
            account_type: None,
        }
    }

    #[test]
    fn test_on_load_redirects_signed_in_user() {
        let ctx = offline_context(MemorySessionStore::signed_in("tok", UserInfo::default()));
        let page = AuthPage::new(Some("/cart"));
        assert_eq!(page.on_load(&ctx), vec![Effect::navigate("/cart")]);

        let ctx = offline_context(MemorySessionStore::default());
        assert!(page.on_load(&ctx).is_empty());
    }

    #[test]
    fn test_blank_token_grant_does_not_navigate() {
        let ctx = offline_context(MemorySessionStore::default());
        let mut page = AuthPage::new(Some("/cart"));
        let grant = AuthGrant {
            token: secret("   "),
            user: UserInfo::default(),
        };

        assert!(page.signed_in(&ctx, &grant).is_empty());
        assert_eq!(page.state(), &FormState::Failed(SESSION_NOT_SAVED.to_string()));
        assert!(!ctx.session.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let ctx = offline_context(MemorySessionStore::default());
        let mut page = AuthPage::new(None);
        let effects = page
            .login(
                &ctx,
                &LoginForm {
                    email: "ada@example.com".to_string(),
                    password: secret(""),
                },
            )
            .await;

        assert!(effects.is_empty());
        assert_eq!(
            page.state(),
            &FormState::Failed("Please enter both email and password.".to_string())
        );
    }

    #[test]
    fn test_register_validation_order() {
        let mut form = register_form("longenough", "longenough");
        form.name = "  ".to_string();
        assert_eq!(form.validate().unwrap_err(), ValidationError::MissingFields);

        let mut form = register_form("longenough", "longenough");
        form.email = "not-an-email".to_string();
        assert_eq!(form.validate().unwrap_err(), ValidationError::InvalidEmail);

        let form = register_form("longenough", "different");
        assert_eq!(form.validate().unwrap_err(), ValidationError::PasswordMismatch);

        let form = register_form("short", "short");
        assert_eq!(form.validate().unwrap_err(), ValidationError::PasswordTooShort);
    }

    #[test]
    fn test_register_defaults_account_type() {
        let registration = register_form("longenough", "longenough").validate().unwrap();
        assert_eq!(registration.account_type, "customer");

        let mut form = register_form("longenough", "longenough");
        form.account_type = Some("seller".to_string());
        assert_eq!(form.validate().unwrap().account_type, "seller");
    }

    #[test]
    fn test_failure_messages() {
        assert_eq!(login_failure(&ApiError::Unauthorized), "Invalid email or password.");
        assert_eq!(
            login_failure(&ApiError::NotFound { message: None }),
            "User not found."
        );
        assert_eq!(
            login_failure(&ApiError::from_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &json!({"message": "Database offline"})
            )),
            "Database offline"
        );
        assert_eq!(
            login_failure(&ApiError::Cancelled),
            "Failed to log in. Please try again."
        );
        assert_eq!(
            register_failure(&ApiError::Conflict { message: None }),
            "Email already in use. Please use a different email."
        );
        assert_eq!(
            forgot_password_failure(&ApiError::NotFound { message: None }),
            "This email address is not registered."
        );
        assert_eq!(
            reset_password_failure(&ApiError::from_response(
                StatusCode::BAD_REQUEST,
                &json!({"message": "whatever"})
            )),
            "Invalid or expired reset token."
        );
    }

    #[tokio::test]
    async fn test_send_reset_link_requires_email() {
        let ctx = offline_context(MemorySessionStore::default());
        let mut page = AuthPage::new(None);
        page.forgot_password_mut().open();
        page.send_reset_link(&ctx, "   ").await;

        assert_eq!(
            page.forgot_password().state(),
            &FormState::Failed("Please enter your email address.".to_string())
        );
        assert!(page.forgot_password().is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_modal_dismisses_itself() {
        let mut modal = ForgotPasswordModal::default();
        modal.open();
        modal.schedule_dismiss();

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(modal.is_open());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!modal.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reopening_cancels_pending_dismiss() {
        let mut modal = ForgotPasswordModal::default();
        modal.open();
        modal.schedule_dismiss();
        modal.open();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(modal.is_open());
    }

    #[tokio::test]
    async fn test_reset_requires_token() {
        let ctx = offline_context(MemorySessionStore::default());
        let mut page = AuthPage::new(None);
        let effects = page
            .reset_password(
                &ctx,
                &ResetPasswordForm {
                    token: secret(" "),
                    password: secret("longenough"),
                    confirm_password: secret("longenough"),
                },
            )
            .await;
        assert!(effects.is_empty());
        assert_eq!(
            page.state(),
            &FormState::Failed("Invalid or expired reset token.".to_string())
        );
    }
}
