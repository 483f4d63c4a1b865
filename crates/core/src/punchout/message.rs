//! Cross-frame message protocol.
//!
//! The embedded storefront talks to the parent page with plain data objects
//! carrying a `type` discriminator:
//!
//! ```text
//! { "type": "PUNCH_OUT", "cartItems": [ ... ] }
//! { "type": "CLOSE_IFRAME" }
//! ```
//!
//! Every other shape is dropped without error.

use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::types::CartItem;

/// Discriminator of the checkout-complete message.
pub const PUNCH_OUT_TYPE: &str = "PUNCH_OUT";

/// Discriminator of the close-request message.
pub const CLOSE_IFRAME_TYPE: &str = "CLOSE_IFRAME";

/// A message as delivered on the page-level channel.
///
/// The channel carries messages from any frame on the page, so the sender's
/// origin travels with the payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FrameMessage {
    /// Origin of the sending browsing context (`event.origin`).
    pub origin: String,
    /// The posted data, untouched.
    #[serde(default)]
    pub data: Value,
}

impl FrameMessage {
    /// Create a new frame message.
    #[must_use]
    pub fn new(origin: impl Into<String>, data: Value) -> Self {
        Self {
            origin: origin.into(),
            data,
        }
    }
}

/// A recognized punch-out message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PunchOutMessage {
    /// Checkout finished in the storefront; carries the full cart.
    PunchOut { cart_items: Vec<CartItem> },
    /// The storefront asks the parent to close the frame.
    CloseIframe,
}

impl PunchOutMessage {
    /// Recognize a posted payload.
    ///
    /// Returns `None` for a missing or unknown `type` and for a `PUNCH_OUT`
    /// whose `cartItems` is not an array. Cart items are decoded one by one;
    /// an item that is not an object is skipped, the rest are kept.
    #[must_use]
    pub fn parse(data: &Value) -> Option<Self> {
        match data.get("type").and_then(Value::as_str)? {
            PUNCH_OUT_TYPE => {
                let items = data.get("cartItems")?.as_array()?;
                let cart_items = items
                    .iter()
                    .filter_map(|item| match CartItem::deserialize(item) {
                        Ok(item) => Some(item),
                        Err(e) => {
                            tracing::warn!(error = %e, "Skipping undecodable cart item");
                            None
                        }
                    })
                    .collect();
                Some(Self::PunchOut { cart_items })
            }
            CLOSE_IFRAME_TYPE => Some(Self::CloseIframe),
            _ => None,
        }
    }
}

/// The set of origins whose messages are trusted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginAllowList {
    origins: Vec<String>,
}

impl OriginAllowList {
    /// Build an allow-list from URLs; only their origins are kept.
    #[must_use]
    pub fn new<'a>(urls: impl IntoIterator<Item = &'a Url>) -> Self {
        let mut origins: Vec<String> = urls
            .into_iter()
            .map(|url| url.origin().ascii_serialization())
            .filter(|origin| origin != "null")
            .collect();
        origins.sort();
        origins.dedup();
        Self { origins }
    }

    /// Returns true if `origin` (as reported by the browser) is trusted.
    #[must_use]
    pub fn allows(&self, origin: &str) -> bool {
        let Ok(url) = Url::parse(origin) else {
            return false;
        };
        let origin = url.origin().ascii_serialization();
        self.origins.iter().any(|trusted| *trusted == origin)
    }

    /// The trusted origins, serialized.
    #[must_use]
    pub fn origins(&self) -> &[String] {
        &self.origins
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_punch_out() {
        let message = PunchOutMessage::parse(&json!({
            "type": "PUNCH_OUT",
            "cartItems": [{ "quantity": 4, "fulfillmentMethod": "DELIVERY" }]
        }))
        .unwrap();

        let PunchOutMessage::PunchOut { cart_items } = message else {
            panic!("expected punch-out message");
        };
        assert_eq!(cart_items.len(), 1);
    }

    #[test]
    fn test_parse_punch_out_requires_cart_items() {
        assert_eq!(PunchOutMessage::parse(&json!({ "type": "PUNCH_OUT" })), None);
        assert_eq!(
            PunchOutMessage::parse(&json!({ "type": "PUNCH_OUT", "cartItems": null })),
            None
        );
        assert_eq!(
            PunchOutMessage::parse(&json!({ "type": "PUNCH_OUT", "cartItems": "nope" })),
            None
        );
    }

    #[test]
    fn test_parse_punch_out_tolerates_null_fields() {
        let message = PunchOutMessage::parse(&json!({
            "type": "PUNCH_OUT",
            "cartItems": [
                {
                    "product": { "imageUrl": "/img/rotor.png", "name": "Brake Rotor" },
                    "quantity": 2,
                    "fulfillmentMethod": "STORE_PICKUP"
                },
                { "product": null, "quantity": 1, "fulfillmentMethod": null },
                { "quantity": 1.0, "fulfillmentMethod": "DELIVERY" }
            ]
        }))
        .unwrap();

        let PunchOutMessage::PunchOut { cart_items } = message else {
            panic!("expected punch-out message");
        };
        assert_eq!(cart_items.len(), 3);
        assert_eq!(cart_items[1].product, None);
        assert_eq!(cart_items[1].fulfillment_method, None);
        let quantity = cart_items[2].quantity.as_ref().map(ToString::to_string);
        assert_eq!(quantity.as_deref(), Some("1.0"));
    }

    #[test]
    fn test_parse_punch_out_skips_only_bad_items() {
        let message = PunchOutMessage::parse(&json!({
            "type": "PUNCH_OUT",
            "cartItems": ["oops", 7, null, { "quantity": 3, "fulfillmentMethod": "DELIVERY" }]
        }))
        .unwrap();

        let PunchOutMessage::PunchOut { cart_items } = message else {
            panic!("expected punch-out message");
        };
        assert_eq!(cart_items.len(), 1);
        assert_eq!(cart_items[0].quantity_as_i64(), Some(3));
    }

    #[test]
    fn test_parse_close_iframe() {
        assert_eq!(
            PunchOutMessage::parse(&json!({ "type": "CLOSE_IFRAME" })),
            Some(PunchOutMessage::CloseIframe)
        );
    }

    #[test]
    fn test_parse_ignores_other_shapes() {
        assert_eq!(PunchOutMessage::parse(&json!({ "type": "UNKNOWN" })), None);
        assert_eq!(PunchOutMessage::parse(&json!({ "cartItems": [] })), None);
        assert_eq!(PunchOutMessage::parse(&json!("PUNCH_OUT")), None);
        assert_eq!(PunchOutMessage::parse(&json!({ "type": 7 })), None);
    }

    #[test]
    fn test_allow_list_matches_origin_only() {
        let catalog = Url::parse("http://localhost:3001/catalog/").unwrap();
        let list = OriginAllowList::new([&catalog]);

        assert!(list.allows("http://localhost:3001"));
        assert!(list.allows("http://localhost:3001/"));
        assert!(!list.allows("http://localhost:3002"));
        assert!(!list.allows("https://localhost:3001"));
        assert!(!list.allows("null"));
        assert!(!list.allows(""));
    }

    #[test]
    fn test_allow_list_dedups() {
        let a = Url::parse("https://parts.example.com/a").unwrap();
        let b = Url::parse("https://parts.example.com/b").unwrap();
        let list = OriginAllowList::new([&a, &b]);
        assert_eq!(list.origins(), ["https://parts.example.com".to_string()]);
    }
}
