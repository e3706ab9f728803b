//! Request extractors.
//!
//! - [`session::Session`] -- Requires a signed-in identity-provider session.

pub mod session;
