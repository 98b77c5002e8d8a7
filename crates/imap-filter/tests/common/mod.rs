//! Shared test utilities for imap-filter integration tests.
//!
//! This module provides:
//! - `InMemoryMailbox`, a scriptable [`Mailbox`](imap_filter::Mailbox) that
//!   records every call the engine makes
//! - Builder patterns for rules and raw message headers

pub mod builders;
pub mod mailbox;

pub use builders::*;
pub use mailbox::{Call, InMemoryMailbox};
