//! Profile page and order history commands.

use secrecy::SecretString;
use shopfront_core::OrderId;
use shopfront_storefront::controllers::{PageContext, ProfileEdit, ProfilePage};
use shopfront_storefront::render::{AlertKind, alert};

use crate::output;

/// Load the profile page. `None` means the load navigated away.
async fn open(ctx: &PageContext) -> Option<ProfilePage> {
    let mut page = ProfilePage::new();
    let effects = page.load(ctx).await;
    output::effects(&effects);
    effects
        .iter()
        .all(|e| e.destination().is_none())
        .then_some(page)
}

fn print_profile(page: &ProfilePage) {
    output::panel(page.profile(), |card| output::fragment(card));
    output::alert(page.warning().cloned());
}

pub async fn profile(ctx: &PageContext) {
    if let Some(page) = open(ctx).await {
        print_profile(&page);
    }
}

pub async fn edit_profile(
    ctx: &PageContext,
    name: String,
    password: String,
    confirm_password: String,
) {
    let Some(mut page) = open(ctx).await else {
        return;
    };
    let effects = page.open_edit_profile(ctx);
    if !effects.is_empty() {
        output::effects(&effects);
        return;
    }

    let form = ProfileEdit {
        name,
        password: SecretString::from(password),
        confirm_password: SecretString::from(confirm_password),
    };
    let effects = page.save_profile(ctx, &form).await;
    if let Some(error) = page.edit_modal().and_then(|modal| modal.error.clone()) {
        output::alert(Some(alert(AlertKind::Danger, error)));
    }
    output::effects(&effects);
    print_profile(&page);
}

pub async fn orders(ctx: &PageContext) {
    if let Some(page) = open(ctx).await {
        output::panel(page.orders(), |rows| output::fragments(rows));
    }
}

pub async fn order(ctx: &PageContext, order_id: &str) {
    let Some(mut page) = open(ctx).await else {
        return;
    };
    let effects = page.view_order(ctx, &OrderId::new(order_id)).await;
    output::effects(&effects);
    if let Some(detail) = page.order_detail() {
        output::panel(detail, |detail| output::fragment(detail));
    }
}
