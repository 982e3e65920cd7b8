//! Profile page: account details, profile editing and order history.

use secrecy::{ExposeSecret, SecretString};
use shopfront_core::text::split_full_name;
use shopfront_core::{OrderId, UserInfo};
use tracing::instrument;

use crate::api::authed::login_url;
use crate::api::{AuthedError, ProfileUpdate, UnauthorizedPolicy};
use crate::error::ValidationError;
use crate::render::{
    AlertKind, AlertView, OrderDetail, OrderRow, ProfileCard, alert, order_detail, order_row,
    profile_card,
};

use super::shared::{Effect, PageContext, Panel, login_effects, push_unique};

const PATH: &str = "/profile";
const LIMITED_SESSION: &str = "Your session has expired. Some features may be limited. \
                               Please log in again for full access.";
const PROFILE_FAILED: &str = "Error loading profile data. Please try again later.";
const PROFILE_MISSING: &str = "Profile data not found. Please refresh the page.";
const PROFILE_UPDATED: &str = "Profile updated successfully.";
const UPDATE_FAILED: &str = "Failed to update profile. Please try again.";
const NO_ORDERS: &str = "You haven't placed any orders yet.";
const ORDERS_FAILED: &str = "Error loading orders. Please try again later.";
const ORDER_DETAIL_FAILED: &str = "Error loading order details. Please try again later.";

/// Input of the edit-profile modal.
#[derive(Debug, Clone)]
pub struct ProfileEdit {
    pub name: String,
    /// Blank keeps the current password.
    pub password: SecretString,
    pub confirm_password: SecretString,
}

impl ProfileEdit {
    fn to_update(&self) -> Result<ProfileUpdate, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingName);
        }
        let password = self.password.expose_secret();
        if !password.is_empty() && password != self.confirm_password.expose_secret() {
            return Err(ValidationError::PasswordMismatch);
        }

        let (first_name, last_name) = split_full_name(name);
        Ok(ProfileUpdate {
            first_name,
            last_name,
            password: (!password.is_empty()).then(|| self.password.clone()),
        })
    }
}

/// Edit-profile modal, pre-filled from the cached user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditProfileModal {
    pub name: String,
    pub email: String,
    pub error: Option<String>,
}

/// How the profile refresh ended.
enum Refresh {
    Fresh(UserInfo),
    /// Token rejected, but the user-info lookup found the user.
    Fallback(UserInfo),
    Leave(Vec<Effect>),
    Failed,
}

#[derive(Debug, Default)]
pub struct ProfilePage {
    user: Option<UserInfo>,
    profile: Panel<ProfileCard>,
    warning: Option<AlertView>,
    orders: Panel<Vec<OrderRow>>,
    edit: Option<EditProfileModal>,
    order_detail: Option<Panel<OrderDetail>>,
}

impl ProfilePage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn user(&self) -> Option<&UserInfo> {
        self.user.as_ref()
    }

    #[must_use]
    pub const fn profile(&self) -> &Panel<ProfileCard> {
        &self.profile
    }

    /// Shown under the profile when it came from the fallback lookup.
    #[must_use]
    pub const fn warning(&self) -> Option<&AlertView> {
        self.warning.as_ref()
    }

    #[must_use]
    pub const fn orders(&self) -> &Panel<Vec<OrderRow>> {
        &self.orders
    }

    #[must_use]
    pub const fn edit_modal(&self) -> Option<&EditProfileModal> {
        self.edit.as_ref()
    }

    #[must_use]
    pub const fn order_detail(&self) -> Option<&Panel<OrderDetail>> {
        self.order_detail.as_ref()
    }

    fn show_user(&mut self, user: UserInfo) {
        self.profile = Panel::Loaded(profile_card(&user));
        self.user = Some(user);
    }

    /// Page load: show the cached user at once, then refresh it and fetch
    /// the order history side by side.
    #[instrument(skip_all)]
    pub async fn load(&mut self, ctx: &PageContext) -> Vec<Effect> {
        if !ctx.session.is_authenticated() {
            return vec![Effect::navigate(login_url(PATH))];
        }

        let cached = ctx.session.user();
        if let Some(user) = &cached {
            self.show_user(user.clone());
        }

        let policy = if ctx.profile_fallback {
            UnauthorizedPolicy::ProfileFallback
        } else {
            UnauthorizedPolicy::ForceLogout
        };
        let (refresh, orders) = tokio::join!(
            refresh_profile(ctx, policy, cached.as_ref()),
            fetch_orders(ctx, policy)
        );

        let mut effects = Vec::new();
        match refresh {
            Refresh::Fresh(user) => {
                ctx.session.update_user(&user);
                self.show_user(user);
            }
            Refresh::Fallback(user) => {
                ctx.session.update_user(&user);
                self.show_user(user);
                self.warning = Some(alert(AlertKind::Warning, LIMITED_SESSION));
            }
            Refresh::Leave(more) => push_unique(&mut effects, more),
            Refresh::Failed => {
                if self.user.is_none() {
                    self.profile = Panel::Failed(PROFILE_FAILED.to_owned());
                }
            }
        }
        match orders {
            Ok(panel) => self.orders = panel,
            Err(more) => push_unique(&mut effects, more),
        }
        effects
    }

    // =========================================================================
    // Edit profile
    // =========================================================================

    pub fn open_edit_profile(&mut self, ctx: &PageContext) -> Vec<Effect> {
        let Some(user) = ctx.session.user().or_else(|| self.user.clone()) else {
            return vec![Effect::alert(AlertKind::Danger, PROFILE_MISSING)];
        };
        self.edit = Some(EditProfileModal {
            name: user.display_name(),
            email: user.email.unwrap_or_default(),
            error: None,
        });
        Vec::new()
    }

    pub fn close_edit_profile(&mut self) {
        self.edit = None;
    }

    fn set_edit_error(&mut self, message: String) {
        self.edit.get_or_insert_with(EditProfileModal::default).error = Some(message);
    }

    /// Save the edit-profile modal. On success the cached user is patched in
    /// place; the profile is not fetched again.
    #[instrument(skip_all, fields(password_change = !form.password.expose_secret().is_empty()))]
    pub async fn save_profile(&mut self, ctx: &PageContext, form: &ProfileEdit) -> Vec<Effect> {
        let update = match form.to_update() {
            Ok(update) => update,
            Err(e) => {
                self.set_edit_error(e.to_string());
                return Vec::new();
            }
        };

        let api = &ctx.api;
        let body = &update;
        let result = ctx
            .authed(PATH)
            .run(|token| async move { api.update_profile(&token, body).await })
            .await;

        match result {
            Ok(()) => {
                let mut user = ctx
                    .session
                    .user()
                    .or_else(|| self.user.clone())
                    .unwrap_or_default();
                user.apply_name_change(form.name.trim(), &update.first_name, &update.last_name);
                ctx.session.update_user(&user);
                self.show_user(user);
                self.edit = None;
                tracing::info!("Profile updated");
                vec![Effect::alert(AlertKind::Success, PROFILE_UPDATED)]
            }
            Err(e) => login_effects(&e).unwrap_or_else(|| {
                tracing::warn!(error = %e, "Failed to update profile");
                let message = match &e {
                    AuthedError::Api(api_error) => api_error.server_message(),
                    _ => None,
                };
                self.set_edit_error(message.unwrap_or(UPDATE_FAILED).to_owned());
                Vec::new()
            }),
        }
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Open the order detail modal.
    #[instrument(skip_all, fields(order_id = %id))]
    pub async fn view_order(&mut self, ctx: &PageContext, id: &OrderId) -> Vec<Effect> {
        self.order_detail = Some(Panel::Loading);
        let api = &ctx.api;
        let result = ctx
            .authed(PATH)
            .run(|token| async move { api.order(&token, id).await })
            .await;

        match result {
            Ok(order) => {
                self.order_detail = Some(Panel::Loaded(order_detail(&order)));
                Vec::new()
            }
            Err(e) => {
                if let Some(effects) = login_effects(&e) {
                    self.order_detail = None;
                    return effects;
                }
                tracing::warn!(error = %e, "Failed to load order");
                self.order_detail = Some(Panel::Failed(ORDER_DETAIL_FAILED.to_owned()));
                Vec::new()
            }
        }
    }

    pub fn close_order_detail(&mut self) {
        self.order_detail = None;
    }
}

async fn refresh_profile(
    ctx: &PageContext,
    policy: UnauthorizedPolicy,
    cached: Option<&UserInfo>,
) -> Refresh {
    let api = &ctx.api;
    let authed = ctx.authed(PATH).with_policy(policy);
    match authed
        .run(|token| async move { api.profile(&token).await })
        .await
    {
        Ok(user) => Refresh::Fresh(user.with_id_from(cached)),
        Err(AuthedError::Unauthorized) => match fallback_user(ctx, cached).await {
            Some(user) => Refresh::Fallback(user.with_id_from(cached)),
            None => Refresh::Leave(login_effects(&authed.expire()).unwrap_or_default()),
        },
        Err(e) => login_effects(&e).map_or_else(
            || {
                tracing::warn!(error = %e, "Failed to refresh profile");
                Refresh::Failed
            },
            Refresh::Leave,
        ),
    }
}

/// The user-info lookup for a rejected token, by the cached user's id.
async fn fallback_user(ctx: &PageContext, cached: Option<&UserInfo>) -> Option<UserInfo> {
    let id = cached?.id.as_ref()?;
    tracing::info!(user_id = %id, "Token rejected, trying user-info lookup");
    match ctx.api.user_info(id).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "User-info lookup failed");
            None
        }
    }
}

/// Order history. Under the fallback policy a rejected token only fails the
/// order panel.
async fn fetch_orders(
    ctx: &PageContext,
    policy: UnauthorizedPolicy,
) -> Result<Panel<Vec<OrderRow>>, Vec<Effect>> {
    let api = &ctx.api;
    let result = ctx
        .authed(PATH)
        .with_policy(policy)
        .run(|token| async move { api.orders(&token).await })
        .await;

    match result {
        Ok(orders) if orders.is_empty() => Ok(Panel::Empty(NO_ORDERS)),
        Ok(orders) => Ok(Panel::Loaded(orders.iter().map(order_row).collect())),
        Err(e) => login_effects(&e).map_or_else(
            || {
                tracing::warn!(error = %e, "Failed to load orders");
                Ok(Panel::Failed(ORDERS_FAILED.to_owned()))
            },
            Err,
        ),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shopfront_core::UserId;

    use super::*;
    use crate::controllers::testing::offline_context;
    use crate::session::MemorySessionStore;

    fn edit(name: &str, password: &str, confirm: &str) -> ProfileEdit {
        ProfileEdit {
            name: name.to_string(),
            password: SecretString::from(password),
            confirm_password: SecretString::from(confirm),
        }
    }

    fn cached_user() -> UserInfo {
        UserInfo {
            id: Some(UserId::new("7")),
            name: Some("Ada Lovelace".to_string()),
            email: Some("ada@example.com".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_edit_splits_name() {
        let update = edit("Ada Lovelace", "", "").to_update().unwrap();
        assert_eq!(update.first_name, "Ada");
        assert_eq!(update.last_name, "Lovelace");
        assert!(update.password.is_none());

        let update = edit("Madonna", "newsecret", "newsecret").to_update().unwrap();
        assert_eq!(update.first_name, "Madonna");
        assert_eq!(update.last_name, "");
        assert!(update.password.is_some());
    }

    #[test]
    fn test_edit_validation() {
        assert_eq!(
            edit("  ", "", "").to_update().unwrap_err(),
            ValidationError::MissingName
        );
        assert_eq!(
            edit("Ada", "one", "two").to_update().unwrap_err(),
            ValidationError::PasswordMismatch
        );
    }

    #[tokio::test]
    async fn test_load_without_session_goes_to_login() {
        let ctx = offline_context(MemorySessionStore::default());
        let effects = ProfilePage::new().load(&ctx).await;
        assert_eq!(effects, vec![Effect::navigate("/login?redirect=/profile")]);
    }

    #[tokio::test]
    async fn test_load_failure_keeps_cached_user() {
        let ctx = offline_context(MemorySessionStore::signed_in("tok", cached_user()));
        let mut page = ProfilePage::new();

        let effects = page.load(&ctx).await;

        assert!(effects.is_empty());
        assert_eq!(page.profile().loaded().unwrap().name, "Ada Lovelace");
        assert_eq!(page.orders().message(), Some(ORDERS_FAILED));
        assert!(ctx.session.is_authenticated());
    }

    #[test]
    fn test_open_edit_without_user() {
        let ctx = offline_context(MemorySessionStore::default());
        let mut page = ProfilePage::new();
        let effects = page.open_edit_profile(&ctx);
        assert_eq!(effects[0].alert_message(), Some(PROFILE_MISSING));
        assert!(page.edit_modal().is_none());
    }

    #[test]
    fn test_open_edit_prefills() {
        let ctx = offline_context(MemorySessionStore::signed_in("tok", cached_user()));
        let mut page = ProfilePage::new();
        assert!(page.open_edit_profile(&ctx).is_empty());
        let modal = page.edit_modal().unwrap();
        assert_eq!(modal.name, "Ada Lovelace");
        assert_eq!(modal.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_save_failure_shows_inline_error() {
        let ctx = offline_context(MemorySessionStore::signed_in("tok", cached_user()));
        let mut page = ProfilePage::new();
        page.open_edit_profile(&ctx);

        let effects = page.save_profile(&ctx, &edit("Ada King", "", "")).await;

        assert!(effects.is_empty());
        assert_eq!(
            page.edit_modal().unwrap().error.as_deref(),
            Some(UPDATE_FAILED)
        );
        assert_eq!(ctx.session.user().unwrap().name.as_deref(), Some("Ada Lovelace"));
    }
}
