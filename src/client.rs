use chrono::Utc;
use url::Url;

use crate::{
    audience::forward_audiences,
    events::{
        BasketAdd, EventContext, EventPayload, ListingView, Product, ProductView, Purchase,
        ScoreUpdate,
    },
    transport::{HttpTransport, Method, Transport},
    visitor::VisitorIdStore,
    AudienceLogger, InMemorySettingsStore, ClientConfig, Error, Result,
};

/// URLs of the collection service endpoints, derived from the base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Listing views.
    pub listings: String,
    /// Product views.
    pub products: String,
    /// Basket additions and purchases.
    pub purchases: String,
    /// Customer records. Every action posts here; score updates `PUT` to `{customers}{id}`.
    pub customers: String,
}

impl Endpoints {
    /// Derive endpoint URLs from `base_url`.
    pub fn from_base_url(base_url: &str) -> Result<Endpoints> {
        Url::parse(base_url).map_err(Error::InvalidBaseUrl)?;

        let base = base_url.trim_end_matches('/');
        Ok(Endpoints {
            listings: format!("{}/listings/", base),
            products: format!("{}/products/", base),
            purchases: format!("{}/purchases/", base),
            customers: format!("{}/customers/", base),
        })
    }

    /// URL of the customer record for `visitor_id`.
    pub fn customer(&self, visitor_id: &str) -> String {
        format!("{}{}", self.customers, visitor_id)
    }
}

/// A client for the Enhencer collection service.
///
/// Every action blocks the calling thread while it resolves the visitor id, posts the event to its
/// endpoint and to the customer endpoint, and then re-scores the visitor. Audiences returned by
/// the score update are passed to the configured [`AudienceLogger`].
///
/// Create one client per process and share it; the visitor id is resolved once and reused.
///
/// # Visitor id persistence
///
/// The visitor id outlives the process only if a persistent store is configured with
/// [`ClientConfig::settings_store`]. Without one the id is kept in memory, every launch is
/// reported as a new visitor, and a warning is logged when the client is created.
///
/// # Examples
/// ```no_run
/// # use enhencer::ClientConfig;
/// let client = ClientConfig::from_token("account-token").to_client().unwrap();
/// client.product_page("shoes", "p1", 100).unwrap();
/// ```
pub struct Client<'a> {
    token: String,
    device_type: String,
    os_version: String,
    endpoints: Endpoints,
    visitor_ids: VisitorIdStore<'a>,
    transport: Box<dyn Transport + Send + Sync + 'a>,
    audience_logger: Box<dyn AudienceLogger + Send + Sync + 'a>,
}

impl<'a> Client<'a> {
    /// Create a new `Client` using the specified configuration.
    ///
    /// ```
    /// # use enhencer::{ClientConfig, Client};
    /// let client = Client::new(ClientConfig::from_token("account-token")).unwrap();
    /// ```
    pub fn new(config: ClientConfig<'a>) -> Result<Self> {
        let endpoints = Endpoints::from_base_url(&config.base_url)?;
        let transport = match config.transport {
            Some(transport) => transport,
            None => Box::new(HttpTransport::new(config.timeout)?),
        };
        let settings_store = match config.settings_store {
            Some(settings_store) => settings_store,
            None => {
                log::warn!(target: "enhencer", "no settings store configured, visitor id will not persist across launches");
                Box::new(InMemorySettingsStore::new())
            }
        };

        Ok(Client {
            token: config.token,
            device_type: config.device_type,
            os_version: config.os_version,
            endpoints,
            visitor_ids: VisitorIdStore::new(settings_store),
            transport,
            audience_logger: config.audience_logger,
        })
    }

    /// Endpoint URLs used by this client.
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Get the visitor id for this installation, creating and persisting it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persistence`] if the settings store cannot read or persist the id. This
    /// covers every store failure, including I/O errors and poisoned locks.
    pub fn visitor_id(&self) -> Result<String> {
        self.visitor_ids.get_or_create()
    }

    /// Track a view of a listing page.
    pub fn listing_page(&self, category1: &str, category2: &str) -> Result<()> {
        let ctx = self.context()?;
        let payload = ListingView::new(&ctx, category1, category2);
        self.track(&ctx, payload.into(), &self.endpoints.listings)
    }

    /// Track a view of a product page.
    pub fn product_page(&self, category: &str, product_id: &str, price: i64) -> Result<()> {
        let ctx = self.context()?;
        let payload = ProductView::new(&ctx, category, product_id, price);
        self.track(&ctx, payload.into(), &self.endpoints.products)
    }

    /// Track a product being added to the basket.
    pub fn add_to_basket(&self, product_id: &str) -> Result<()> {
        let ctx = self.context()?;
        let payload = BasketAdd::new(&ctx, product_id);
        self.track(&ctx, payload.into(), &self.endpoints.purchases)
    }

    /// Track a completed purchase without reporting basket contents.
    ///
    /// A single placeholder product is sent; see [`Product::placeholder`].
    pub fn purchase(&self) -> Result<()> {
        self.purchase_products(vec![Product::placeholder()])
    }

    /// Track a completed purchase of `products`.
    ///
    /// The basket id is the current epoch-millisecond timestamp.
    pub fn purchase_products(&self, products: Vec<Product>) -> Result<()> {
        let ctx = self.context()?;
        let payload = Purchase::new(&ctx, Utc::now().timestamp_millis(), products);
        self.track(&ctx, payload.into(), &self.endpoints.purchases)
    }

    /// Re-score the current visitor and forward the returned audiences.
    ///
    /// Every tracking action ends with this call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the response cannot be parsed into audiences. A failed request
    /// is not an error: forwarding is skipped and `Ok(())` is returned.
    pub fn score(&self) -> Result<()> {
        let ctx = self.context()?;
        self.score_visitor(&ctx)
    }

    fn context(&self) -> Result<EventContext> {
        Ok(EventContext {
            visitor_id: self.visitor_ids.get_or_create()?,
            user_id: self.token.clone(),
            device_type: self.device_type.clone(),
        })
    }

    /// Post the event to its endpoint and to the customer endpoint, then re-score the visitor.
    ///
    /// Responses of the two posts are not used; a failed post does not stop the sequence.
    fn track(&self, ctx: &EventContext, payload: EventPayload, endpoint: &str) -> Result<()> {
        let body = payload.to_json();
        log::debug!(target: "enhencer",
                    kind = payload.kind(),
                    visitor_id = ctx.visitor_id.as_str();
                    "tracking event");

        self.transport.send(&body, endpoint, Method::POST);
        self.transport
            .send(&body, &self.endpoints.customers, Method::POST);

        self.score_visitor(ctx)
    }

    fn score_visitor(&self, ctx: &EventContext) -> Result<()> {
        let body = EventPayload::from(ScoreUpdate::new(ctx, &self.os_version)).to_json();
        let response = self.transport.send(
            &body,
            &self.endpoints.customer(&ctx.visitor_id),
            Method::PUT,
        );

        if response.is_empty() {
            // The transport has already logged why the request failed.
            log::debug!(target: "enhencer",
                        visitor_id = ctx.visitor_id.as_str();
                        "no score response, skipping audience forwarding");
            return Ok(());
        }

        forward_audiences(&response, &*self.audience_logger).inspect_err(|err| {
            log::warn!(target: "enhencer",
                       visitor_id = ctx.visitor_id.as_str();
                       "unable to forward audiences: {:?}", err);
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::Endpoints;
    use crate::{
        transport::Method, ClientConfig, Error, FileSettingsStore, InMemorySettingsStore,
        SettingsStore,
    };

    type Calls = Arc<Mutex<Vec<(Method, String, String)>>>;

    fn recording_transport(
        calls: Calls,
        score_response: &'static str,
    ) -> impl Fn(&str, &str, Method) -> String {
        move |body: &str, url: &str, method: Method| {
            let is_score = method == Method::PUT;
            calls
                .lock()
                .unwrap()
                .push((method, url.to_owned(), body.to_owned()));
            if is_score {
                score_response.to_owned()
            } else {
                String::new()
            }
        }
    }

    #[test]
    fn endpoints_are_derived_from_base_url() {
        let endpoints = Endpoints::from_base_url("https://collect.example.com/api/").unwrap();

        assert_eq!(endpoints.listings, "https://collect.example.com/api/listings/");
        assert_eq!(endpoints.products, "https://collect.example.com/api/products/");
        assert_eq!(endpoints.purchases, "https://collect.example.com/api/purchases/");
        assert_eq!(endpoints.customers, "https://collect.example.com/api/customers/");
        assert_eq!(
            endpoints.customer("42"),
            "https://collect.example.com/api/customers/42"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = ClientConfig::from_token("token")
            .base_url("not a url")
            .to_client();

        assert!(matches!(result, Err(Error::InvalidBaseUrl(_))));
    }

    #[test]
    fn persisted_visitor_id_is_used_by_every_call() {
        let calls = Calls::default();
        let settings = InMemorySettingsStore::new();
        settings.put("enh_visitor_id", "777").unwrap();
        let client = ClientConfig::from_token("token")
            .settings_store(settings)
            .transport(recording_transport(calls.clone(), r#"{"audiences":[]}"#))
            .to_client()
            .unwrap();

        client.add_to_basket("p1").unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[2].1, client.endpoints().customer("777"));
        for (_, _, body) in calls.iter() {
            let value: serde_json::Value = serde_json::from_str(body).unwrap();
            assert_eq!(value["visitorID"], "777");
            assert_eq!(value["id"], "777");
            assert_eq!(value["userID"], "token");
        }
    }

    #[test]
    fn score_uses_configured_os_version() {
        let calls = Calls::default();
        let client = ClientConfig::from_token("token")
            .os_version("14")
            .transport(recording_transport(calls.clone(), r#"{"audiences":[]}"#))
            .to_client()
            .unwrap();

        client.score().unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let value: serde_json::Value = serde_json::from_str(&calls[0].2).unwrap();
        assert_eq!(value["deviceOsVersion"], "14");
        assert_eq!(value["deviceType"], "a2");
    }

    #[test]
    fn unwritable_settings_file_is_a_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let settings =
            FileSettingsStore::open(dir.path().join("missing-dir").join("settings.json")).unwrap();

        let calls = Calls::default();
        let client = ClientConfig::from_token("token")
            .settings_store(settings)
            .transport(recording_transport(calls.clone(), r#"{"audiences":[]}"#))
            .to_client()
            .unwrap();

        assert!(matches!(
            client.listing_page("a", "b"),
            Err(Error::Persistence(_))
        ));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn store_failure_aborts_before_any_request() {
        struct BrokenStore;
        impl SettingsStore for BrokenStore {
            fn get(&self, _key: &str) -> crate::Result<Option<String>> {
                Err(Error::Persistence("unavailable".to_owned()))
            }
            fn put(&self, _key: &str, _value: &str) -> crate::Result<()> {
                Err(Error::Persistence("unavailable".to_owned()))
            }
            fn commit(&self) -> crate::Result<()> {
                Err(Error::Persistence("unavailable".to_owned()))
            }
        }

        let calls = Calls::default();
        let client = ClientConfig::from_token("token")
            .settings_store(BrokenStore)
            .transport(recording_transport(calls.clone(), r#"{"audiences":[]}"#))
            .to_client()
            .unwrap();

        assert!(matches!(
            client.listing_page("a", "b"),
            Err(Error::Persistence(_))
        ));
        assert!(calls.lock().unwrap().is_empty());
    }
}
