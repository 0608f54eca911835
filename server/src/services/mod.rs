//! Business rules that sit between handlers and the store.

pub mod accounts;
pub mod activity;
pub mod blog;
pub mod dashboard;
pub mod events;
pub mod permissions;
pub mod tickets;
