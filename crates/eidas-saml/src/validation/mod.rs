//! Validation stages of the response pipeline.
//!
//! Each stage is a plain function over immutable input that either passes or
//! fails with a classified [`SamlError`](crate::SamlError). The time checks
//! take `now` as an argument; none of them read the clock.

mod conditions;
mod temporal;
mod transport;

pub use conditions::validate_conditions;
pub use temporal::validate_authentication_age;
pub use transport::{validate_destination, validate_issue_instant, validate_transport};
