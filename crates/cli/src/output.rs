//! Terminal output: rendered fragments and page effects.

#![allow(clippy::print_stdout)]

use askama::Template;
use shopfront_storefront::controllers::{Effect, Navigation, Panel};
use shopfront_storefront::render::{AlertView, cart_count_badge};

/// Print a rendered fragment.
pub fn fragment(template: &impl Template) {
    match template.render() {
        Ok(html) => println!("{html}"),
        Err(e) => tracing::error!(error = %e, "Failed to render fragment"),
    }
}

pub fn fragments<T: Template>(templates: &[T]) {
    for template in templates {
        fragment(template);
    }
}

/// Print the alerts, navigation and badge updates a page produced.
pub fn effects(effects: &[Effect]) {
    for effect in effects {
        match effect {
            Effect::Alert(view) => fragment(view),
            Effect::Navigate(to) => println!("-> {to}"),
            Effect::CartCount(count) => fragment(&cart_count_badge(*count)),
        }
    }
}

/// Print a fetched region: its contents, or its placeholder.
pub fn panel<T>(panel: &Panel<T>, loaded: impl FnOnce(&T)) {
    match panel {
        Panel::Loaded(value) => loaded(value),
        Panel::Loading => println!("Loading..."),
        Panel::Empty(_) | Panel::Failed(_) => {
            if let Some(view) = panel.placeholder() {
                fragment(&view);
            }
        }
    }
}

pub fn alert(view: Option<AlertView>) {
    if let Some(view) = view {
        fragment(&view);
    }
}

pub fn nav(navigation: &Navigation) {
    fragment(&navigation.view());
}
