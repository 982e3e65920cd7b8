//! Shopfront Core - Shared domain types.
//!
//! This crate provides the types every Shopfront component works with:
//! - `storefront` - Page controllers, API client and render helpers
//! - `cli` - Command-line shell that drives the page controllers
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no session storage. Everything here mirrors server state that the
//! client fetched; nothing is authoritative.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails and order statuses
//! - [`user`] - Cached user record
//! - [`cart`] - Cart lines and cart totals
//! - [`product`] - Products, product pages and listing queries
//! - [`order`] - Orders and order items
//! - [`pagination`] - Page-link computation for listings
//! - [`text`] - Name splitting, name de-duplication and date labels

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod order;
pub mod pagination;
pub mod product;
pub mod text;
pub mod types;
pub mod user;

pub use cart::{Cart, CartLine, SHIPPING_FEE};
pub use order::{Order, OrderItem};
pub use pagination::{PageLink, Pagination};
pub use product::{Product, ProductPage, ProductQuery};
pub use types::*;
pub use user::UserInfo;
