//! bennu: credential and session authentication service.
//!
//! Accounts carry Argon2id password hashes and an email-verified flag.
//! Sessions are refresh-token families that rotate on every use and collapse
//! when a rotated-out token is replayed. Short-lived signed access tokens and
//! single-use verification tokens round out the flows.

pub mod api;
pub mod cli;
pub mod email;
pub mod store;
