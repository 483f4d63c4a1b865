//! Cart items posted back by the supplier storefront.
//!
//! Items are taken as sent. Missing, `null` or off-type fields decode to
//! `None` instead of failing the item.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

/// Product details attached to a cart item.
///
/// Every field is optional; the storefront sends whatever it has.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartProduct {
    /// Image path relative to the storefront origin.
    #[serde(default, deserialize_with = "lenient_string")]
    pub image_url: Option<String>,
    /// Display name.
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
}

/// A single line of the punched-out cart.
///
/// Stored verbatim; no validation or normalization is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(default, deserialize_with = "lenient_product")]
    pub product: Option<CartProduct>,
    /// The quantity as sent: integer or not.
    #[serde(default, deserialize_with = "lenient_number")]
    pub quantity: Option<Number>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub fulfillment_method: Option<String>,
}

impl CartItem {
    /// Quantity as an integer, when it is one.
    #[must_use]
    pub fn quantity_as_i64(&self) -> Option<i64> {
        self.quantity.as_ref().and_then(Number::as_i64)
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Number>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => Some(n),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_product<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<CartProduct>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    if value.is_object() {
        Ok(CartProduct::deserialize(&value).ok())
    } else {
        Ok(None)
    }
}

/// One row of the cart summary table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartRow {
    /// Absolute image URL, present only when the item has an image.
    pub image_url: Option<String>,
    /// Product name, present only when the item has one.
    pub name: Option<String>,
    /// Quantity as sent, empty when missing.
    pub quantity: String,
    /// Fulfillment method as sent, empty when missing.
    pub fulfillment_method: String,
}

impl CartRow {
    /// Project a cart item into a summary row.
    ///
    /// `image_base` is prepended to the item's image path.
    #[must_use]
    pub fn from_item(item: &CartItem, image_base: &str) -> Self {
        let product = item.product.as_ref();
        Self {
            image_url: product
                .and_then(|p| p.image_url.as_deref())
                .map(|path| join_image_url(image_base, path)),
            name: product.and_then(|p| p.name.clone()),
            quantity: item
                .quantity
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            fulfillment_method: item.fulfillment_method.clone().unwrap_or_default(),
        }
    }
}

/// Project a cart into summary rows, one per item, in order.
///
/// Nothing is filtered or totalled.
#[must_use]
pub fn summary_rows(items: &[CartItem], image_base: &str) -> Vec<CartRow> {
    items
        .iter()
        .map(|item| CartRow::from_item(item, image_base))
        .collect()
}

fn join_image_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const BASE: &str = "http://localhost:3001/";

    #[test]
    fn test_deserialize_wire_shape() {
        let item: CartItem = serde_json::from_value(serde_json::json!({
            "product": { "imageUrl": "/img/brake-pad.png", "name": "Brake Pad Set" },
            "quantity": 2,
            "fulfillmentMethod": "STORE_PICKUP"
        }))
        .unwrap();

        assert_eq!(item.quantity_as_i64(), Some(2));
        assert_eq!(item.fulfillment_method.as_deref(), Some("STORE_PICKUP"));
        let product = item.product.unwrap();
        assert_eq!(product.name.as_deref(), Some("Brake Pad Set"));
        assert_eq!(product.image_url.as_deref(), Some("/img/brake-pad.png"));
    }

    #[test]
    fn test_row_without_product() {
        let item = CartItem {
            product: None,
            quantity: Some(1.into()),
            fulfillment_method: Some("DELIVERY".to_string()),
        };
        let row = CartRow::from_item(&item, BASE);
        assert_eq!(row.image_url, None);
        assert_eq!(row.name, None);
        assert_eq!(row.quantity, "1");
    }

    #[test]
    fn test_row_prefixes_image_origin() {
        let item = CartItem {
            product: Some(CartProduct {
                image_url: Some("/img/filter.png".to_string()),
                name: None,
            }),
            quantity: Some(3.into()),
            fulfillment_method: Some("DELIVERY".to_string()),
        };
        let row = CartRow::from_item(&item, BASE);
        assert_eq!(
            row.image_url.as_deref(),
            Some("http://localhost:3001/img/filter.png")
        );
        assert_eq!(row.name, None);
    }

    #[test]
    fn test_join_image_url_without_leading_slash() {
        assert_eq!(
            join_image_url("https://cdn.test", "a/b.png"),
            "https://cdn.test/a/b.png"
        );
    }

    #[test]
    fn test_zero_quantity_rows_are_kept() {
        let items = vec![
            CartItem {
                product: None,
                quantity: Some(0.into()),
                fulfillment_method: Some("DELIVERY".to_string()),
            },
            CartItem {
                product: None,
                quantity: Some(5.into()),
                fulfillment_method: Some("STORE_PICKUP".to_string()),
            },
        ];
        let rows = summary_rows(&items, BASE);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].quantity, "0");
        assert_eq!(rows[1].fulfillment_method, "STORE_PICKUP");
    }

    #[test]
    fn test_null_fields_decode_as_missing() {
        let item: CartItem = serde_json::from_value(serde_json::json!({
            "product": null,
            "quantity": null,
            "fulfillmentMethod": null
        }))
        .unwrap();
        assert_eq!(item, CartItem::default());

        let row = CartRow::from_item(&item, BASE);
        assert_eq!(row.quantity, "");
        assert_eq!(row.fulfillment_method, "");
    }

    #[test]
    fn test_off_type_fields_decode_as_missing() {
        let item: CartItem = serde_json::from_value(serde_json::json!({
            "product": { "imageUrl": 7, "name": ["Rotor"] },
            "quantity": true,
            "fulfillmentMethod": 3
        }))
        .unwrap();

        assert_eq!(item.product, Some(CartProduct::default()));
        assert_eq!(item.quantity, None);
        assert_eq!(item.fulfillment_method, None);

        let item: CartItem =
            serde_json::from_value(serde_json::json!({ "product": "rotor" })).unwrap();
        assert_eq!(item.product, None);
    }

    #[test]
    fn test_non_integer_quantity_is_kept_verbatim() {
        let item: CartItem = serde_json::from_value(serde_json::json!({
            "quantity": 1.5,
            "fulfillmentMethod": "DELIVERY"
        }))
        .unwrap();
        assert_eq!(item.quantity_as_i64(), None);
        assert_eq!(CartRow::from_item(&item, BASE).quantity, "1.5");

        let item: CartItem =
            serde_json::from_value(serde_json::json!({ "quantity": "4" })).unwrap();
        assert_eq!(item.quantity_as_i64(), Some(4));
    }
}
