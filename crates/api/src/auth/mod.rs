//! Authentication primitives.
//!
//! - [`password`] -- bcrypt credential hashing with a configurable cost.
//! - [`identity`] -- bearer-token verification against the external identity provider.

pub mod identity;
pub mod password;
