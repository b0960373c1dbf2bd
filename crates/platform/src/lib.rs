//! Authentication and authorization: salted password hashing, bearer-token
//! sessions, and the single ordered-rule `authorize` decision function.

pub mod auth;
pub mod policy;

pub use auth::{AuthManager, AuthToken};
pub use policy::{authorize, Action, Decision, Target};
