//! Typed payloads for every event the collection service accepts.
//!
//! Each struct serializes to exactly the field set the service expects for that event kind.
//! Builders are pure: they take an [`EventContext`] and the kind-specific arguments and never
//! perform I/O.

use derive_more::From;
use serde::{Deserialize, Serialize};

/// Integration domain reported in the `type` field of every event.
pub const EVENT_TYPE: &str = "ecommerce";

/// Device type reported by score updates, regardless of the configured platform label.
pub const SCORE_DEVICE_TYPE: &str = "a2";

/// Values shared by every event of one action.
#[derive(Debug, Clone, PartialEq)]
pub struct EventContext {
    /// Visitor id. Sent as both `visitorID` and `id`.
    pub visitor_id: String,
    /// Caller account token. Sent as `userID`.
    pub user_id: String,
    /// Platform type label. Sent as `deviceType` on listing and product views.
    pub device_type: String,
}

/// Action type discriminator carried by product, basket and purchase events.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    /// Product page view.
    Product,
    /// Product added to the basket.
    Basket,
    /// Completed purchase.
    Purchase,
}

/// A listing (category) page view, sent to the listings endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListingView {
    /// Integration domain, always [`EVENT_TYPE`].
    #[serde(rename = "type")]
    pub event_type: String,
    /// Visitor id.
    #[serde(rename = "visitorID")]
    pub visitor_id: String,
    /// Top-level listing category.
    #[serde(rename = "productCategory1")]
    pub product_category1: String,
    /// Second-level category.
    #[serde(rename = "productCategory2")]
    pub product_category2: String,
    /// Platform type label.
    #[serde(rename = "deviceType")]
    pub device_type: String,
    /// Traffic source. Always empty.
    pub source: String,
    /// Caller account token.
    #[serde(rename = "userID")]
    pub user_id: String,
    /// Visitor id, repeated.
    pub id: String,
}

impl ListingView {
    /// Build a listing view for the two category levels of the page.
    pub fn new(ctx: &EventContext, category1: &str, category2: &str) -> Self {
        ListingView {
            event_type: EVENT_TYPE.to_owned(),
            visitor_id: ctx.visitor_id.clone(),
            product_category1: category1.to_owned(),
            product_category2: category2.to_owned(),
            device_type: ctx.device_type.clone(),
            source: String::new(),
            user_id: ctx.user_id.clone(),
            id: ctx.visitor_id.clone(),
        }
    }
}

/// A product page view, sent to the products endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductView {
    /// Integration domain, always [`EVENT_TYPE`].
    #[serde(rename = "type")]
    pub event_type: String,
    /// Visitor id.
    #[serde(rename = "visitorID")]
    pub visitor_id: String,
    /// Product id.
    #[serde(rename = "productID")]
    pub product_id: String,
    /// Second-level category.
    #[serde(rename = "productCategory2")]
    pub product_category2: String,
    /// Product price.
    pub price: i64,
    /// Platform type label.
    #[serde(rename = "deviceType")]
    pub device_type: String,
    /// Always `1`.
    #[serde(rename = "productViewer")]
    pub product_viewer: u8,
    /// Traffic source. Always empty.
    pub source: String,
    /// Action discriminator.
    #[serde(rename = "actionType")]
    pub action_type: ActionType,
    /// Caller account token.
    #[serde(rename = "userID")]
    pub user_id: String,
    /// Visitor id, repeated.
    pub id: String,
}

impl ProductView {
    /// Build a product view. `category` is reported as `productCategory2`.
    pub fn new(ctx: &EventContext, category: &str, product_id: &str, price: i64) -> Self {
        ProductView {
            event_type: EVENT_TYPE.to_owned(),
            visitor_id: ctx.visitor_id.clone(),
            product_id: product_id.to_owned(),
            product_category2: category.to_owned(),
            price,
            device_type: ctx.device_type.clone(),
            product_viewer: 1,
            source: String::new(),
            action_type: ActionType::Product,
            user_id: ctx.user_id.clone(),
            id: ctx.visitor_id.clone(),
        }
    }
}

/// A product added to the basket, sent to the purchases endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BasketAdd {
    /// Integration domain, always [`EVENT_TYPE`].
    #[serde(rename = "type")]
    pub event_type: String,
    /// Visitor id.
    #[serde(rename = "visitorID")]
    pub visitor_id: String,
    /// Product id.
    #[serde(rename = "productID")]
    pub product_id: String,
    /// Action discriminator.
    #[serde(rename = "actionType")]
    pub action_type: ActionType,
    /// Caller account token.
    #[serde(rename = "userID")]
    pub user_id: String,
    /// Visitor id, repeated.
    pub id: String,
}

impl BasketAdd {
    /// Build a basket addition.
    pub fn new(ctx: &EventContext, product_id: &str) -> Self {
        BasketAdd {
            event_type: EVENT_TYPE.to_owned(),
            visitor_id: ctx.visitor_id.clone(),
            product_id: product_id.to_owned(),
            action_type: ActionType::Basket,
            user_id: ctx.user_id.clone(),
            id: ctx.visitor_id.clone(),
        }
    }
}

/// One purchased line item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    /// Product id.
    pub id: String,
    /// Number of units purchased.
    pub quantity: u32,
    /// Unit price. Sent as a JSON float, so the placeholder's price is `1.0`.
    pub price: f64,
}

impl Product {
    /// Line item sent when the host does not report basket contents.
    pub fn placeholder() -> Self {
        Product {
            id: "no-id".to_owned(),
            quantity: 1,
            price: 1.0,
        }
    }
}

/// A completed purchase, sent to the purchases endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Purchase {
    /// Integration domain, always [`EVENT_TYPE`].
    #[serde(rename = "type")]
    pub event_type: String,
    /// Visitor id.
    #[serde(rename = "visitorID")]
    pub visitor_id: String,
    /// Basket id.
    #[serde(rename = "basketID")]
    pub basket_id: i64,
    /// Purchased line items.
    pub products: Vec<Product>,
    /// Action discriminator.
    #[serde(rename = "actionType")]
    pub action_type: ActionType,
    /// Caller account token.
    #[serde(rename = "userID")]
    pub user_id: String,
    /// Visitor id, repeated.
    pub id: String,
}

impl Purchase {
    /// Build a purchase of `products` in basket `basket_id`.
    pub fn new(ctx: &EventContext, basket_id: i64, products: Vec<Product>) -> Self {
        Purchase {
            event_type: EVENT_TYPE.to_owned(),
            visitor_id: ctx.visitor_id.clone(),
            basket_id,
            products,
            action_type: ActionType::Purchase,
            user_id: ctx.user_id.clone(),
            id: ctx.visitor_id.clone(),
        }
    }
}

/// Request to re-score a visitor, sent with `PUT` to the visitor's customer record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreUpdate {
    /// Integration domain, always [`EVENT_TYPE`].
    #[serde(rename = "type")]
    pub event_type: String,
    /// Visitor id.
    #[serde(rename = "visitorID")]
    pub visitor_id: String,
    /// Always [`SCORE_DEVICE_TYPE`].
    #[serde(rename = "deviceType")]
    pub device_type: String,
    /// Platform OS version.
    #[serde(rename = "deviceOsVersion")]
    pub device_os_version: String,
    /// Traffic source. Always empty.
    pub source: String,
    /// Caller account token.
    #[serde(rename = "userID")]
    pub user_id: String,
    /// Visitor id, repeated.
    pub id: String,
}

impl ScoreUpdate {
    /// Score updates always report [`SCORE_DEVICE_TYPE`], ignoring `ctx.device_type`.
    pub fn new(ctx: &EventContext, os_version: &str) -> Self {
        ScoreUpdate {
            event_type: EVENT_TYPE.to_owned(),
            visitor_id: ctx.visitor_id.clone(),
            device_type: SCORE_DEVICE_TYPE.to_owned(),
            device_os_version: os_version.to_owned(),
            source: String::new(),
            user_id: ctx.user_id.clone(),
            id: ctx.visitor_id.clone(),
        }
    }
}

/// Any event the client can send.
#[derive(Debug, Clone, Serialize, PartialEq, From)]
#[serde(untagged)]
pub enum EventPayload {
    /// See [`ListingView`].
    ListingView(ListingView),
    /// See [`ProductView`].
    ProductView(ProductView),
    /// See [`BasketAdd`].
    BasketAdd(BasketAdd),
    /// See [`Purchase`].
    Purchase(Purchase),
    /// See [`ScoreUpdate`].
    ScoreUpdate(ScoreUpdate),
}

impl EventPayload {
    /// Short name of the event kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            EventPayload::ListingView(_) => "listing-view",
            EventPayload::ProductView(_) => "product-view",
            EventPayload::BasketAdd(_) => "basket-add",
            EventPayload::Purchase(_) => "purchase",
            EventPayload::ScoreUpdate(_) => "score-update",
        }
    }

    /// Serialize the payload to compact JSON text.
    pub fn to_json(&self) -> String {
        // Every field is a string, an integer, a float or a list of those, none of which can fail
        // to serialize.
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use serde_json::{json, Value};

    use super::{
        BasketAdd, EventContext, EventPayload, ListingView, Product, ProductView, Purchase,
        ScoreUpdate,
    };

    fn ctx() -> EventContext {
        EventContext {
            visitor_id: "421700000000042".to_owned(),
            user_id: "account-token".to_owned(),
            device_type: "Android".to_owned(),
        }
    }

    fn keys(payload: impl Into<EventPayload>) -> (BTreeSet<String>, Value) {
        let value: Value = serde_json::from_str(&payload.into().to_json()).unwrap();
        let keys = value.as_object().unwrap().keys().cloned().collect();
        (keys, value)
    }

    fn set(fields: &[&str]) -> BTreeSet<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    fn assert_identity(value: &Value) {
        assert_eq!(value["visitorID"], value["id"]);
        assert_eq!(value["visitorID"], "421700000000042");
        assert_eq!(value["userID"], "account-token");
        assert_eq!(value["type"], "ecommerce");
    }

    #[test]
    fn listing_view_fields() {
        let (keys, value) = keys(ListingView::new(&ctx(), "shoes", "sneakers"));
        assert_eq!(
            keys,
            set(&[
                "type",
                "visitorID",
                "productCategory1",
                "productCategory2",
                "deviceType",
                "source",
                "userID",
                "id"
            ])
        );
        assert_identity(&value);
        assert_eq!(value["productCategory1"], "shoes");
        assert_eq!(value["productCategory2"], "sneakers");
        assert_eq!(value["deviceType"], "Android");
        assert_eq!(value["source"], "");
    }

    #[test]
    fn product_view_fields() {
        let (keys, value) = keys(ProductView::new(&ctx(), "shoes", "p1", 100));
        assert_eq!(
            keys,
            set(&[
                "type",
                "visitorID",
                "productID",
                "productCategory2",
                "price",
                "deviceType",
                "productViewer",
                "source",
                "actionType",
                "userID",
                "id"
            ])
        );
        assert_identity(&value);
        assert_eq!(value["price"], 100);
        assert_eq!(value["productViewer"], 1);
        assert_eq!(value["actionType"], "product");
        assert_eq!(value["productID"], "p1");
        assert_eq!(value["productCategory2"], "shoes");
    }

    #[test]
    fn basket_add_fields() {
        let (keys, value) = keys(BasketAdd::new(&ctx(), "p1"));
        assert_eq!(
            keys,
            set(&["type", "visitorID", "productID", "actionType", "userID", "id"])
        );
        assert_identity(&value);
        assert_eq!(value["actionType"], "basket");
    }

    #[test]
    fn purchase_fields() {
        let (keys, value) = keys(Purchase::new(
            &ctx(),
            1_700_000_000_000,
            vec![Product::placeholder()],
        ));
        assert_eq!(
            keys,
            set(&[
                "type",
                "visitorID",
                "basketID",
                "products",
                "actionType",
                "userID",
                "id"
            ])
        );
        assert_identity(&value);
        assert_eq!(value["actionType"], "purchase");
        assert_eq!(value["basketID"], 1_700_000_000_000_i64);
        assert_eq!(
            value["products"],
            json!([{"id": "no-id", "quantity": 1, "price": 1.0}])
        );
    }

    #[test]
    fn score_update_fields() {
        let (keys, value) = keys(ScoreUpdate::new(&ctx(), "14"));
        assert_eq!(
            keys,
            set(&[
                "type",
                "visitorID",
                "deviceType",
                "deviceOsVersion",
                "source",
                "userID",
                "id"
            ])
        );
        assert_identity(&value);
        assert_eq!(value["deviceType"], "a2");
        assert_eq!(value["deviceOsVersion"], "14");
    }
}
