//! Core types for the punch-out flow.

pub mod cart;
pub mod credentials;
pub mod state;

pub use cart::{CartItem, CartProduct, CartRow, summary_rows};
pub use credentials::{Credentials, CredentialsError};
pub use state::{SessionState, ViewState};
