//! Login, registration and password commands.

use secrecy::SecretString;
use shopfront_storefront::controllers::{
    AuthPage, Effect, LoginForm, Navigation, PageContext, RegisterForm, ResetPasswordForm,
};

use crate::output;

/// Print the form's inline message and the page's effects.
fn finish(page: &AuthPage, effects: &[Effect]) {
    output::alert(page.state().message());
    output::effects(effects);
}

pub async fn login(ctx: &PageContext, email: String, password: String, redirect: Option<&str>) {
    let mut page = AuthPage::new(redirect);
    let effects = page.on_load(ctx);
    if !effects.is_empty() {
        output::effects(&effects);
        return;
    }

    let form = LoginForm {
        email,
        password: SecretString::from(password),
    };
    let effects = page.login(ctx, &form).await;
    finish(&page, &effects);
}

pub fn register_form(
    name: String,
    email: String,
    password: String,
    confirm_password: String,
    account_type: Option<String>,
) -> RegisterForm {
    RegisterForm {
        name,
        email,
        password: SecretString::from(password),
        confirm_password: SecretString::from(confirm_password),
        account_type,
    }
}

pub async fn register(ctx: &PageContext, form: &RegisterForm, redirect: Option<&str>) {
    let mut page = AuthPage::new(redirect);
    let effects = page.on_load(ctx);
    if !effects.is_empty() {
        output::effects(&effects);
        return;
    }

    let effects = page.register(ctx, form).await;
    finish(&page, &effects);
}

pub async fn forgot_password(ctx: &PageContext, email: &str) {
    let mut page = AuthPage::new(None);
    page.forgot_password_mut().open();
    page.send_reset_link(ctx, email).await;
    output::alert(page.forgot_password().state().message());
}

pub async fn reset_password(
    ctx: &PageContext,
    token: String,
    password: String,
    confirm_password: String,
) {
    let mut page = AuthPage::new(None);
    let form = ResetPasswordForm {
        token: SecretString::from(token),
        password: SecretString::from(password),
        confirm_password: SecretString::from(confirm_password),
    };
    let effects = page.reset_password(ctx, &form).await;
    finish(&page, &effects);
}

pub fn logout(ctx: &PageContext) {
    let mut navigation = Navigation::default();
    let effects = navigation.logout(ctx);
    output::nav(&navigation);
    output::effects(&effects);
}
