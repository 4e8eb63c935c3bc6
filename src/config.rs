use std::time::Duration;

use crate::{
    audience::NoopAudienceLogger,
    settings_store::SettingsStore,
    transport::Transport,
    AudienceLogger, Client, Result,
};

/// Configuration for [`Client`].
///
/// # Examples
/// ```
/// # use enhencer::ClientConfig;
/// let client = ClientConfig::from_token("account-token")
///     .audience_logger(|name: &str, value: f64| {
///         println!("{} {}", name, value);
///     })
///     .to_client();
/// ```
pub struct ClientConfig<'a> {
    pub(crate) token: String,
    pub(crate) base_url: String,
    pub(crate) device_type: String,
    pub(crate) os_version: String,
    pub(crate) timeout: Option<Duration>,
    pub(crate) audience_logger: Box<dyn AudienceLogger + Send + Sync + 'a>,
    pub(crate) settings_store: Option<Box<dyn SettingsStore + 'a>>,
    pub(crate) transport: Option<Box<dyn Transport + Send + Sync + 'a>>,
}

impl<'a> ClientConfig<'a> {
    /// Create a default configuration using the specified account token.
    ///
    /// ```
    /// # use enhencer::ClientConfig;
    /// ClientConfig::from_token("account-token");
    /// ```
    pub fn from_token(token: impl Into<String>) -> Self {
        ClientConfig {
            token: token.into(),
            base_url: ClientConfig::DEFAULT_BASE_URL.to_owned(),
            device_type: ClientConfig::DEFAULT_DEVICE_TYPE.to_owned(),
            os_version: String::new(),
            timeout: None,
            audience_logger: Box::new(NoopAudienceLogger),
            settings_store: None,
            transport: None,
        }
    }

    /// Default base URL for API calls.
    pub const DEFAULT_BASE_URL: &'static str = "https://collect-app.enhencer.com/api";

    /// Default platform label reported as `deviceType`.
    pub const DEFAULT_DEVICE_TYPE: &'static str = "Android";

    /// Override base URL for API calls. Clients should use the default setting in most cases.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the logger that receives audiences returned by the collection service.
    ///
    /// ```
    /// # use enhencer::ClientConfig;
    /// let config = ClientConfig::from_token("account-token").audience_logger(|name: &str, _value: f64| {
    ///   println!("visitor joined {}", name);
    /// });
    /// ```
    pub fn audience_logger(
        mut self,
        audience_logger: impl AudienceLogger + Send + Sync + 'a,
    ) -> Self {
        self.audience_logger = Box::new(audience_logger);
        self
    }

    /// Set the store that persists the visitor id.
    ///
    /// Without it the client keeps the id in memory, so every process gets a fresh visitor id. Use
    /// [`FileSettingsStore`](crate::FileSettingsStore) or your own [`SettingsStore`] to keep the
    /// id across launches.
    pub fn settings_store(mut self, settings_store: impl SettingsStore + 'a) -> Self {
        self.settings_store = Some(Box::new(settings_store));
        self
    }

    /// Platform label sent as `deviceType` with listing and product views.
    pub fn device_type(mut self, device_type: impl Into<String>) -> Self {
        self.device_type = device_type.into();
        self
    }

    /// Platform OS version sent as `deviceOsVersion` with score updates.
    pub fn os_version(mut self, os_version: impl Into<String>) -> Self {
        self.os_version = os_version.into();
        self
    }

    /// Bound every request to `timeout`. Without it, requests use the HTTP client's defaults.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Replace the HTTP transport.
    pub fn transport(mut self, transport: impl Transport + Send + Sync + 'a) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    /// Create a new [`Client`] using the specified configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBaseUrl`](crate::Error::InvalidBaseUrl) if `base_url` is not a
    /// valid URL.
    ///
    /// ```
    /// # use enhencer::{ClientConfig, Client};
    /// let client: Client = ClientConfig::from_token("account-token").to_client().unwrap();
    /// ```
    pub fn to_client(self) -> Result<Client<'a>> {
        Client::new(self)
    }
}
