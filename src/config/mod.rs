use std::collections::BTreeMap;

use serde::Deserialize;

/// Environment variable prefix for every client setting.
pub const ENV_PREFIX: &str = "DIGITIZE_";

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Digitization endpoint (e.g., "https://digitizer.example.com/digitize")
    pub endpoint: String,

    /// Filename reported in the image part's Content-Disposition
    #[serde(default = "default_filename")]
    pub filename: String,

    /// Model folder forwarded to the server as the `model_folder` form field
    #[serde(default)]
    pub model_folder: Option<String>,

    /// JPEG quality used when a non-JPEG capture has to be re-encoded
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// User-Agent header sent with every upload
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_filename() -> String {
    "ecg.jpg".to_string()
}

fn default_jpeg_quality() -> u8 {
    80
}

fn default_user_agent() -> String {
    concat!("ecg-digitize/", env!("CARGO_PKG_VERSION")).to_string()
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        Self::from_env_with(std::iter::empty())
    }

    /// Load from the environment, letting `overrides` (unprefixed keys such
    /// as `"ENDPOINT"`) take precedence over the process environment.
    pub fn from_env_with<I>(overrides: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (&'static str, String)>,
    {
        dotenvy::dotenv().ok();
        let mut vars: BTreeMap<String, String> = std::env::vars().collect();
        for (key, value) in overrides {
            vars.insert(format!("{ENV_PREFIX}{key}"), value);
        }
        envy::prefixed(ENV_PREFIX).from_iter(vars)
    }

    /// Extra multipart fields derived from configuration.
    pub fn extra_fields(&self) -> BTreeMap<String, String> {
        let mut fields = BTreeMap::new();
        if let Some(folder) = &self.model_folder {
            fields.insert("model_folder".to_string(), folder.clone());
        }
        fields
    }
}
