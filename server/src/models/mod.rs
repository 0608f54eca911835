pub mod account;
pub mod activity;
pub mod blog;
pub mod dashboard;
pub mod event;
pub mod member;
pub mod permission;
pub mod place;
pub mod ticket;
pub mod vehicle;
