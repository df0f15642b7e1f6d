//! Authentication module
//!
//! AgencyZoom uses a username/password login that returns a short-lived
//! bearer token. The [`Session`] owns the credentials and the current token
//! and is passed explicitly to every call that needs it.

mod session;

pub use session::{extract_token, Credentials, Session};

#[cfg(test)]
mod tests;
