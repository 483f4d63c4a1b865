//! Mechanic Shop Core - punch-out session types and state machine.
//!
//! This crate holds everything about the supplier punch-out flow that does
//! not touch the network:
//! - `site` - the server-rendered marketing page that embeds the catalog
//! - `integration-tests` - end-to-end tests of the flow
//!
//! # Architecture
//!
//! The core crate contains only types, the controller state machine and the
//! page-level message channel - no HTTP clients, no templates. The site crate
//! performs the login request and feeds the result back in.
//!
//! # Modules
//!
//! - [`types`] - Credentials, cart items and the session/view enums
//! - [`punchout`] - Login protocol, frame messages, message channel and controller

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod punchout;
pub mod types;

pub use punchout::*;
pub use types::*;
