//! Conversation memory
//!
//! Holds the session transcript. It lives in process memory only and grows
//! for the whole session.

pub mod store;

pub use store::Transcript;
