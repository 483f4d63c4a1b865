//! Punch-out flow: login protocol, frame messages and the session controller.
//!
//! The site crate drives this module: it performs the login request and
//! reports a [`LoginOutcome`], and it publishes relayed browser messages on
//! the page's [`MessageChannel`], where a mounted [`PunchOutController`]
//! picks them up.

pub mod channel;
pub mod controller;
pub mod login;
pub mod message;

pub use channel::{MessageChannel, Subscription};
pub use controller::{LoginAttempt, PunchOutController, PunchOutState};
pub use login::{GENERIC_LOGIN_FAILURE, LOGIN_PATH, LoginOutcome, LoginRequest};
pub use message::{
    CLOSE_IFRAME_TYPE, FrameMessage, OriginAllowList, PUNCH_OUT_TYPE, PunchOutMessage,
};
