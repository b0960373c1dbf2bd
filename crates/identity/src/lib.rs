//! Identity store: accounts, credentials, and field validation.

pub mod store;

pub use store::{AccountStore, NewAccount};
