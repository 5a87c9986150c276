use std::env;
use std::path::PathBuf;

/// Configuration for the upload pipeline
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Maximum accepted request body in bytes (default: 100 MiB)
    pub max_upload_size: usize,

    /// Scratch directory for locally staged uploads (default: "uploads")
    pub scratch_dir: PathBuf,

    /// Chunk size for ranged video relays in bytes (default: 6 MB)
    pub video_chunk_size: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_upload_size: 100 * 1024 * 1024, // 100 MiB
            scratch_dir: PathBuf::from("uploads"),
            video_chunk_size: 6_000_000,
        }
    }
}

impl UploadConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),

            scratch_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.scratch_dir),

            video_chunk_size: env::var("VIDEO_CHUNK_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.video_chunk_size),
        }
    }
}

/// Credentials for the remote media service
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    /// Account identifier (cloud name)
    pub cloud_name: String,

    /// API access key
    pub api_key: String,

    /// API access secret, used to sign upload requests
    pub api_secret: String,

    /// API base URL (default: "https://api.cloudinary.com")
    pub upload_prefix: String,
}

impl CloudinaryConfig {
    pub fn from_env() -> Self {
        Self {
            cloud_name: env::var("CLOUDINARY_CLOUD_NAME")
                .expect("CLOUDINARY_CLOUD_NAME must be set"),
            api_key: env::var("CLOUDINARY_API_KEY").expect("CLOUDINARY_API_KEY must be set"),
            api_secret: env::var("CLOUDINARY_API_SECRET")
                .expect("CLOUDINARY_API_SECRET must be set"),
            upload_prefix: env::var("CLOUDINARY_UPLOAD_PREFIX")
                .unwrap_or_else(|_| "https://api.cloudinary.com".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = UploadConfig::default();
        assert_eq!(config.max_upload_size, 100 * 1024 * 1024);
        assert_eq!(config.scratch_dir, PathBuf::from("uploads"));
        assert_eq!(config.video_chunk_size, 6_000_000);
    }
}
