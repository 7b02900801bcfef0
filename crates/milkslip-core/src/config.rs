//! Configuration module
//!
//! Environment-driven configuration for the ingestion pipeline and its
//! collaborators (database, object storage, vision API).

use std::env;

use crate::error::AppError;

// Pipeline defaults
const DEFAULT_MAX_IMAGE_DIMENSION: u32 = 1600;
const DEFAULT_JPEG_QUALITY: u8 = 85;
const DEFAULT_VISION_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_VISION_MAX_TOKENS: u32 = 1024;

/// Application configuration loaded from the environment.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    // Object storage
    pub storage_path: String,
    pub storage_base_url: String,
    // Vision API
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub anthropic_max_tokens: u32,
    // Image normalization
    pub max_image_dimension: u32,
    pub jpeg_quality: u8,
}

impl AppConfig {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| AppError::Configuration("DATABASE_URL is required".to_string()))?;

        let storage_path =
            env::var("STORAGE_PATH").unwrap_or_else(|_| "./data/receipts".to_string());
        let storage_base_url = env::var("STORAGE_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000/receipts".to_string());

        let anthropic_api_key = env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
        let anthropic_model =
            env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| DEFAULT_VISION_MODEL.to_string());
        let anthropic_max_tokens = parse_env_or("ANTHROPIC_MAX_TOKENS", DEFAULT_VISION_MAX_TOKENS)?;

        let max_image_dimension = parse_env_or("MAX_IMAGE_DIMENSION", DEFAULT_MAX_IMAGE_DIMENSION)?;
        let jpeg_quality = parse_env_or("JPEG_QUALITY", DEFAULT_JPEG_QUALITY)?;

        let config = Self {
            database_url,
            storage_path,
            storage_base_url,
            anthropic_api_key,
            anthropic_model,
            anthropic_max_tokens,
            max_image_dimension,
            jpeg_quality,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate numeric knobs. The API key is deliberately not required here:
    /// its absence blocks extraction at client construction, not process start.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.max_image_dimension == 0 {
            return Err(AppError::Configuration(
                "MAX_IMAGE_DIMENSION must be greater than zero".to_string(),
            ));
        }
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(AppError::Configuration(
                "JPEG_QUALITY must be between 1 and 100".to_string(),
            ));
        }
        if self.anthropic_max_tokens == 0 {
            return Err(AppError::Configuration(
                "ANTHROPIC_MAX_TOKENS must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::Configuration(format!("{} has an invalid value: {}", key, raw))),
        Err(_) => Ok(default),
    }
}
