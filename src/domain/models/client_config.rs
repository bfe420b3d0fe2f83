/// Region used when neither the configuration nor the environment names one
pub const DEFAULT_REGION: &str = "us-east-1";

/// One endpoint/credential pair a storage client can be built from
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub region: String,
}

impl ClientConfig {
    /// A config with no endpoint or keys: the client falls back to ambient credentials
    pub fn ambient(region: impl Into<String>) -> Self {
        Self {
            endpoint: None,
            access_key: None,
            secret_key: None,
            region: region.into(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_key = Some(secret_key.into());
        self
    }

    /// Human-readable label for logs; never includes credentials
    pub fn label(&self) -> &str {
        self.endpoint.as_deref().unwrap_or("default")
    }

    pub fn uses_ambient_credentials(&self) -> bool {
        self.access_key.is_none() && self.secret_key.is_none()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::ambient(DEFAULT_REGION)
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("region", &self.region)
            .finish()
    }
}
