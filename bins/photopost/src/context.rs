//! Shared state for one CLI invocation

use crate::{CredentialArgs, DeviceArgs};
use photopost_api_client::endpoints::WordPressApi;
use photopost_api_client::{ClientConfig, PhotopostClient};
use photopost_cli::GlobalArgs;
use photopost_core::config::{Config, ConfigSchema};
use photopost_core::{Error, ResultExt};
use photopost_image::RawAsset;
use photopost_location::{FixedPositionProvider, PositionProvider, UnavailableProvider};
use photopost_session::Collaborators;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub struct AppContext {
    pub global: GlobalArgs,
    pub config: ConfigSchema,
    pub client: PhotopostClient,
}

impl AppContext {
    pub fn load(global: GlobalArgs) -> anyhow::Result<Self> {
        let config = Config::load(global.config.as_deref())?;
        if let Some(path) = &config.path {
            debug!(path = %path.display(), "Loaded configuration");
        }
        let client = PhotopostClient::with_config(ClientConfig::from_schema(&config.schema.http).with_env_overrides())
            .map_err(Error::from)?;

        Ok(Self {
            global,
            config: config.schema,
            client,
        })
    }

    /// Whether spinners and colours are wanted
    pub fn interactive(&self) -> bool {
        self.global.interactive()
    }

    pub fn position_provider(device: &DeviceArgs) -> Arc<dyn PositionProvider> {
        match (device.device_lat, device.device_lon) {
            (Some(lat), Some(lon)) => Arc::new(FixedPositionProvider::new(lat, lon, device.device_accuracy)),
            _ => Arc::new(UnavailableProvider),
        }
    }

    pub fn collaborators(&self, device: &DeviceArgs, with_weather: bool) -> Collaborators {
        let collaborators = Collaborators::new(Self::position_provider(device));
        if with_weather {
            collaborators.with_weather(self.client.weather(&self.config.weather))
        } else {
            collaborators
        }
    }

    /// Read the selected photo from disk
    pub fn read_photo(path: &Path) -> photopost_core::Result<RawAsset> {
        if !path.is_file() {
            return Err(Error::file_not_found(path));
        }
        RawAsset::from_path(path)
            .map_err(Error::from)
            .context(format!("While reading {}", path.display()))
    }

    /// WordPress access with the password supplied on this run
    pub fn wordpress(&self, credentials: &CredentialArgs) -> photopost_core::Result<WordPressApi> {
        let mut publish = self.config.publish.clone();
        if let Some(password) = &credentials.password {
            publish = publish.with_password(password.clone());
        }
        self.client.wordpress(&publish).map_err(|e| {
            Error::from(e).with_suggestion(
                "Set [publish] site_url and username in photopost.toml and pass --password or PHOTOPOST_WP_PASSWORD",
            )
        })
    }
}
