//! Shopfront storefront library.
//!
//! Page controllers for the storefront: each page (home, auth, catalog,
//! cart, profile) is a controller that talks to the REST API, keeps its view
//! state, and reports what the host should do next as [`controllers::Effect`]s.
//!
//! # Layers
//!
//! - [`session`] - bearer token and cached user
//! - [`api`] - typed REST client and the session-expiry policy
//! - [`render`] - askama view models for every page fragment
//! - [`controllers`] - page event handlers
//! - [`sequencer`] - latest-wins request ordering

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod controllers;
pub mod error;
pub mod render;
pub mod sequencer;
pub mod session;
