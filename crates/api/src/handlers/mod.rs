pub mod auth;
pub mod session;
pub mod speech;
pub mod voice_talent;
