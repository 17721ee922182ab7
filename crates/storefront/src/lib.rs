//! Vitrine Storefront library.
//!
//! The engine behind a headless product-listing page: a server-backed
//! catalog with composable sort and filter criteria, a cart quantity
//! ledger, and a persisted sign-in session. Rendering is out of scope;
//! UI surfaces subscribe to immutable snapshots through watch channels
//! and call the mutators on [`state::Storefront`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod models;
pub mod session;
pub mod state;
