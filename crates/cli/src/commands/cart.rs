//! Cart page and checkout commands.

use clap::Args;
use secrecy::SecretString;
use shopfront_core::CartItemId;
use shopfront_storefront::controllers::{
    CartPage, Effect, PageContext, PaymentDetails, ShippingDetails,
};

use crate::output;

/// Shipping and payment fields of the checkout form.
#[derive(Debug, Args)]
pub struct CheckoutArgs {
    #[arg(long)]
    full_name: String,

    #[arg(long)]
    address: String,

    #[arg(long)]
    city: String,

    #[arg(long)]
    zip: String,

    #[arg(long)]
    country: String,

    #[arg(long)]
    card_name: String,

    #[arg(long)]
    card_number: String,

    /// MM/YY
    #[arg(long)]
    expiry: String,

    #[arg(long)]
    cvv: String,
}

impl CheckoutArgs {
    fn into_details(self) -> (ShippingDetails, PaymentDetails) {
        let shipping = ShippingDetails {
            full_name: self.full_name,
            address: self.address,
            city: self.city,
            zip: self.zip,
            country: self.country,
        };
        let payment = PaymentDetails {
            card_name: self.card_name,
            card_number: SecretString::from(self.card_number),
            expiry: SecretString::from(self.expiry),
            cvv: SecretString::from(self.cvv),
        };
        (shipping, payment)
    }
}

fn print_cart(page: &CartPage) {
    output::panel(&page.panel(), |_| {
        output::fragments(&page.rows());
        if let Some(summary) = page.summary() {
            output::fragment(&summary);
        }
    });
}

/// Load the page. `None` means the load navigated away.
async fn open(ctx: &PageContext) -> Option<CartPage> {
    let page = CartPage::new();
    let effects = page.load(ctx).await;
    output::effects(&effects);
    effects
        .iter()
        .all(|e| e.destination().is_none())
        .then_some(page)
}

async fn mutate<F, Fut>(ctx: &PageContext, action: F)
where
    F: FnOnce(CartPage) -> Fut,
    Fut: Future<Output = (CartPage, Vec<Effect>)>,
{
    let Some(page) = open(ctx).await else {
        return;
    };
    let (page, effects) = action(page).await;
    output::effects(&effects);
    print_cart(&page);
}

pub async fn show(ctx: &PageContext) {
    if let Some(page) = open(ctx).await {
        print_cart(&page);
    }
}

pub async fn increment(ctx: &PageContext, item_id: &str) {
    let id = CartItemId::new(item_id);
    mutate(ctx, |page| async move {
        let effects = page.increment(ctx, &id).await;
        (page, effects)
    })
    .await;
}

pub async fn decrement(ctx: &PageContext, item_id: &str) {
    let id = CartItemId::new(item_id);
    mutate(ctx, |page| async move {
        let effects = page.decrement(ctx, &id).await;
        (page, effects)
    })
    .await;
}

pub async fn remove(ctx: &PageContext, item_id: &str) {
    let id = CartItemId::new(item_id);
    mutate(ctx, |page| async move {
        let effects = page.remove(ctx, &id).await;
        (page, effects)
    })
    .await;
}

pub async fn checkout(ctx: &PageContext, args: CheckoutArgs) {
    let Some(page) = open(ctx).await else {
        return;
    };
    if !page.open_checkout() {
        print_cart(&page);
        return;
    }

    let (shipping, payment) = args.into_details();
    let effects = page.checkout(ctx, &shipping, &payment).await;
    output::effects(&effects);
}
