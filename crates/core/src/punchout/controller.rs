//! Punch-out session controller.
//!
//! Owns the state of one page: login status, which surface is visible, the
//! punched-out cart and the last login error.
//!
//! ```text
//! LoggedOut --(login success)--> LoggedIn
//! LoggedIn  --(show)--> ShowingEmbeddedCatalog
//! ShowingEmbeddedCatalog --(PUNCH_OUT)--> ShowingCartSummary
//! ShowingEmbeddedCatalog --(CLOSE_IFRAME | close control)--> Hidden
//! ShowingCartSummary --(close control)--> Hidden
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use super::channel::{MessageChannel, Subscription};
use super::login::LoginOutcome;
use super::message::{FrameMessage, OriginAllowList, PunchOutMessage};
use crate::types::{CartItem, CredentialsError, SessionState, ViewState};

/// Snapshot of a page's punch-out state.
///
/// Every transition below happens in one `&mut self` call, so a reader can
/// never observe the catalog closed without the cart summary open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PunchOutState {
    pub session: SessionState,
    pub view: ViewState,
    pub cart_items: Vec<CartItem>,
    pub error: Option<String>,
    pub login_in_flight: bool,
    /// Bumped on every change, so callers can tell whether an event did anything.
    pub revision: u64,
}

impl PunchOutState {
    /// Initial state: logged out, nothing shown.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    /// Start a login attempt. Returns false if one is already in flight.
    ///
    /// Clears the previous error.
    pub fn begin_login(&mut self) -> bool {
        if self.login_in_flight {
            return false;
        }
        self.login_in_flight = true;
        self.error = None;
        self.touch();
        true
    }

    /// Apply the result of the in-flight login attempt.
    pub fn finish_login(&mut self, outcome: &LoginOutcome) {
        self.login_in_flight = false;
        match outcome {
            LoginOutcome::Accepted => {
                self.session = SessionState::LoggedIn;
                self.error = None;
            }
            LoginOutcome::Rejected(message) | LoginOutcome::Failed(message) => {
                self.error = Some(message.clone());
            }
        }
        self.touch();
    }

    /// Abandon the in-flight attempt without a result.
    pub fn abandon_login(&mut self) {
        if self.login_in_flight {
            self.login_in_flight = false;
            self.touch();
        }
    }

    /// Record a form validation failure; no request is made for it.
    pub fn reject_credentials(&mut self, error: &CredentialsError) {
        self.error = Some(error.to_string());
        self.touch();
    }

    /// Open the embedded catalog. No-op unless logged in.
    pub fn show_catalog(&mut self) -> bool {
        if !self.session.is_logged_in() || self.view == ViewState::ShowingEmbeddedCatalog {
            return false;
        }
        self.view = ViewState::ShowingEmbeddedCatalog;
        self.touch();
        true
    }

    /// Close the embedded catalog overlay.
    pub fn close_catalog(&mut self) -> bool {
        if self.view != ViewState::ShowingEmbeddedCatalog {
            return false;
        }
        self.view = ViewState::Hidden;
        self.touch();
        true
    }

    /// Close the cart summary. The cart items are kept.
    pub fn close_cart_summary(&mut self) -> bool {
        if self.view != ViewState::ShowingCartSummary {
            return false;
        }
        self.view = ViewState::Hidden;
        self.touch();
        true
    }

    /// Apply a recognized frame message.
    pub fn apply_message(&mut self, message: PunchOutMessage) -> bool {
        match message {
            PunchOutMessage::PunchOut { cart_items } => {
                self.cart_items = cart_items;
                self.view = ViewState::ShowingCartSummary;
            }
            PunchOutMessage::CloseIframe => {
                if self.view == ViewState::Hidden {
                    return false;
                }
                self.view = ViewState::Hidden;
            }
        }
        self.touch();
        true
    }
}

/// Thread-safe controller for one page.
///
/// Wraps a [`PunchOutState`] behind a mutex and filters frame messages by
/// sender origin before applying them.
#[derive(Debug)]
pub struct PunchOutController {
    state: Mutex<PunchOutState>,
    trusted_origins: OriginAllowList,
}

impl PunchOutController {
    /// Create a controller trusting messages from `trusted_origins`.
    #[must_use]
    pub fn new(trusted_origins: OriginAllowList) -> Self {
        Self {
            state: Mutex::new(PunchOutState::new()),
            trusted_origins,
        }
    }

    fn lock(&self) -> MutexGuard<'_, PunchOutState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> PunchOutState {
        self.lock().clone()
    }

    /// Current revision counter.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.lock().revision
    }

    /// Start a login attempt.
    ///
    /// Returns `None` while another attempt is in flight. The returned guard
    /// clears the in-flight flag when dropped without a result, e.g. when the
    /// request future is cancelled.
    #[must_use]
    pub fn begin_login(&self) -> Option<LoginAttempt<'_>> {
        if self.lock().begin_login() {
            Some(LoginAttempt {
                controller: self,
                finished: false,
            })
        } else {
            None
        }
    }

    /// Record a form validation failure.
    pub fn reject_credentials(&self, error: &CredentialsError) {
        self.lock().reject_credentials(error);
    }

    /// Open the embedded catalog. No-op unless logged in.
    pub fn show_catalog(&self) -> bool {
        self.lock().show_catalog()
    }

    /// Close the embedded catalog overlay.
    pub fn close_catalog(&self) -> bool {
        self.lock().close_catalog()
    }

    /// Close the cart summary.
    pub fn close_cart_summary(&self) -> bool {
        self.lock().close_cart_summary()
    }

    /// Handle a message from the page-level channel.
    ///
    /// Messages from untrusted origins and unrecognized shapes are dropped.
    /// Returns true if the state changed.
    pub fn handle_frame_message(&self, message: &FrameMessage) -> bool {
        if !self.trusted_origins.allows(&message.origin) {
            tracing::warn!(
                origin = %message.origin,
                "Ignoring frame message from untrusted origin"
            );
            return false;
        }

        let Some(parsed) = PunchOutMessage::parse(&message.data) else {
            tracing::debug!(origin = %message.origin, "Ignoring unrecognized frame message");
            return false;
        };

        let mut state = self.lock();
        let changed = state.apply_message(parsed);
        if changed {
            tracing::info!(
                view = %state.view,
                cart_items = state.cart_items.len(),
                "Applied punch-out message"
            );
        }
        changed
    }

    /// Register this controller as a listener on `channel`.
    ///
    /// The listener holds a weak reference, so it never keeps the controller
    /// alive. Drop the returned subscription to deregister.
    #[must_use = "dropping the subscription immediately unmounts the controller"]
    pub fn mount(
        self: &Arc<Self>,
        channel: &MessageChannel<FrameMessage>,
    ) -> Subscription<FrameMessage> {
        let controller = Arc::downgrade(self);
        channel.subscribe(move |message| {
            if let Some(controller) = controller.upgrade() {
                controller.handle_frame_message(message);
            }
        })
    }
}

/// An in-flight login attempt.
#[derive(Debug)]
pub struct LoginAttempt<'a> {
    controller: &'a PunchOutController,
    finished: bool,
}

impl LoginAttempt<'_> {
    /// Apply the outcome and end the attempt.
    pub fn finish(mut self, outcome: &LoginOutcome) {
        self.finished = true;
        self.controller.lock().finish_login(outcome);
    }
}

impl Drop for LoginAttempt<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.controller.lock().abandon_login();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use url::Url;

    use super::*;
    use crate::types::CartProduct;

    const CATALOG: &str = "http://localhost:3001";

    fn controller() -> Arc<PunchOutController> {
        let url = Url::parse(CATALOG).unwrap();
        Arc::new(PunchOutController::new(OriginAllowList::new([&url])))
    }

    fn logged_in() -> Arc<PunchOutController> {
        let c = controller();
        c.begin_login().unwrap().finish(&LoginOutcome::Accepted);
        c
    }

    fn item(name: &str, quantity: i64) -> serde_json::Value {
        json!({
            "product": { "name": name, "imageUrl": format!("/img/{name}.png") },
            "quantity": quantity,
            "fulfillmentMethod": "STORE_PICKUP"
        })
    }

    fn punch_out(items: &[serde_json::Value]) -> FrameMessage {
        FrameMessage::new(CATALOG, json!({ "type": "PUNCH_OUT", "cartItems": items }))
    }

    #[test]
    fn test_initial_state() {
        let state = controller().snapshot();
        assert_eq!(state.session, SessionState::LoggedOut);
        assert_eq!(state.view, ViewState::Hidden);
        assert!(state.cart_items.is_empty());
        assert_eq!(state.error, None);
    }

    #[test]
    fn test_rejected_login_keeps_logged_out() {
        let c = controller();
        c.begin_login()
            .unwrap()
            .finish(&LoginOutcome::Rejected("Invalid credentials".to_string()));

        let state = c.snapshot();
        assert_eq!(state.session, SessionState::LoggedOut);
        assert_eq!(state.error.as_deref(), Some("Invalid credentials"));
        assert!(!state.login_in_flight);
    }

    #[test]
    fn test_accepted_login_clears_error() {
        let c = controller();
        c.begin_login()
            .unwrap()
            .finish(&LoginOutcome::Failed("connection refused".to_string()));
        assert!(c.snapshot().error.is_some());

        c.begin_login().unwrap().finish(&LoginOutcome::Accepted);
        let state = c.snapshot();
        assert_eq!(state.session, SessionState::LoggedIn);
        assert_eq!(state.error, None);
    }

    #[test]
    fn test_begin_login_clears_previous_error() {
        let c = controller();
        c.reject_credentials(&CredentialsError::MissingEmail);
        let attempt = c.begin_login().unwrap();
        assert_eq!(c.snapshot().error, None);
        drop(attempt);
    }

    #[test]
    fn test_second_login_while_in_flight_is_refused() {
        let c = controller();
        let attempt = c.begin_login().unwrap();
        assert!(c.begin_login().is_none());
        attempt.finish(&LoginOutcome::Accepted);
        assert!(c.begin_login().is_some());
    }

    #[test]
    fn test_dropped_attempt_clears_in_flight() {
        let c = controller();
        let attempt = c.begin_login().unwrap();
        assert!(c.snapshot().login_in_flight);
        drop(attempt);

        let state = c.snapshot();
        assert!(!state.login_in_flight);
        assert_eq!(state.session, SessionState::LoggedOut);
    }

    #[test]
    fn test_show_catalog_requires_login() {
        let c = controller();
        let before = c.snapshot();
        assert!(!c.show_catalog());
        assert_eq!(c.snapshot(), before);

        let c = logged_in();
        assert!(c.show_catalog());
        assert_eq!(c.snapshot().view, ViewState::ShowingEmbeddedCatalog);
    }

    #[test]
    fn test_close_control_hides_catalog() {
        let c = logged_in();
        c.show_catalog();
        assert!(c.close_catalog());
        assert_eq!(c.snapshot().view, ViewState::Hidden);
        assert!(!c.close_catalog());
    }

    #[test]
    fn test_punch_out_swaps_catalog_for_summary() {
        let c = logged_in();
        c.show_catalog();
        let before = c.revision();

        assert!(c.handle_frame_message(&punch_out(&[item("rotor", 2), item("pads", 1)])));

        let state = c.snapshot();
        assert_eq!(state.view, ViewState::ShowingCartSummary);
        assert_eq!(state.cart_items.len(), 2);
        assert_eq!(
            state.cart_items.first().and_then(|i| i.product.clone()),
            Some(CartProduct {
                image_url: Some("/img/rotor.png".to_string()),
                name: Some("rotor".to_string()),
            })
        );
        // One transition covers the cart, the overlay and the summary.
        assert_eq!(state.revision, before + 1);
    }

    #[test]
    fn test_punch_out_replaces_cart() {
        let c = logged_in();
        c.show_catalog();
        c.handle_frame_message(&punch_out(&[item("rotor", 2), item("pads", 1)]));
        c.handle_frame_message(&punch_out(&[item("wipers", 0)]));

        let state = c.snapshot();
        assert_eq!(state.cart_items.len(), 1);
        assert_eq!(state.cart_items.first().and_then(CartItem::quantity_as_i64), Some(0));
    }

    #[test]
    fn test_punch_out_with_null_fields_still_shows_summary() {
        let c = logged_in();
        c.show_catalog();

        let sparse = json!({ "product": null, "quantity": 1, "fulfillmentMethod": null });
        assert!(c.handle_frame_message(&punch_out(&[item("rotor", 2), sparse])));

        let state = c.snapshot();
        assert_eq!(state.view, ViewState::ShowingCartSummary);
        assert_eq!(state.cart_items.len(), 2);
    }

    #[test]
    fn test_close_iframe_hides_any_view() {
        let close = FrameMessage::new(CATALOG, json!({ "type": "CLOSE_IFRAME" }));

        let c = logged_in();
        c.show_catalog();
        assert!(c.handle_frame_message(&close));
        assert_eq!(c.snapshot().view, ViewState::Hidden);

        c.show_catalog();
        c.handle_frame_message(&punch_out(&[item("rotor", 1)]));
        assert!(c.handle_frame_message(&close));
        let state = c.snapshot();
        assert_eq!(state.view, ViewState::Hidden);
        assert_eq!(state.cart_items.len(), 1);
    }

    #[test]
    fn test_unknown_message_changes_nothing() {
        let c = logged_in();
        c.show_catalog();
        let before = c.snapshot();

        let message = FrameMessage::new(CATALOG, json!({ "type": "UNKNOWN" }));
        assert!(!c.handle_frame_message(&message));
        assert_eq!(c.snapshot(), before);
    }

    #[test]
    fn test_untrusted_origin_changes_nothing() {
        let c = logged_in();
        c.show_catalog();
        let before = c.snapshot();

        let message = FrameMessage::new(
            "https://evil.example",
            json!({ "type": "PUNCH_OUT", "cartItems": [item("rotor", 9)] }),
        );
        assert!(!c.handle_frame_message(&message));
        assert_eq!(c.snapshot(), before);
    }

    #[test]
    fn test_mount_and_unmount() {
        let c = logged_in();
        c.show_catalog();
        let channel = MessageChannel::new();

        let subscription = c.mount(&channel);
        assert_eq!(channel.listener_count(), 1);
        channel.publish(&punch_out(&[item("rotor", 1)]));
        assert_eq!(c.snapshot().view, ViewState::ShowingCartSummary);

        drop(subscription);
        assert_eq!(channel.listener_count(), 0);
        channel.publish(&FrameMessage::new(CATALOG, json!({ "type": "CLOSE_IFRAME" })));
        assert_eq!(c.snapshot().view, ViewState::ShowingCartSummary);
    }

    #[test]
    fn test_listener_does_not_keep_controller_alive() {
        let c = controller();
        let channel = MessageChannel::new();
        let _subscription = c.mount(&channel);
        drop(c);
        // The listener is still registered but has nothing to deliver to.
        assert_eq!(channel.publish(&punch_out(&[])), 1);
    }
}
