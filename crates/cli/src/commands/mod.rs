//! One module per group of pages.

pub mod account;
pub mod auth;
pub mod cart;
pub mod shop;
