use crate::config::CloudinaryConfig;
use crate::services::relay::CloudinaryRelay;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Build the media relay client from `CLOUDINARY_*` environment variables.
pub fn setup_relay() -> Arc<CloudinaryRelay> {
    let config = CloudinaryConfig::from_env();

    info!(
        "☁️  Media relay: cloud '{}' via {}",
        config.cloud_name, config.upload_prefix
    );

    let http = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()
        .expect("failed to build HTTP client");

    Arc::new(CloudinaryRelay::new(http, config))
}
