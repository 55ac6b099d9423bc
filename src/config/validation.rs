use crate::config::types::{CacheConfig, Config, CrawlConfig, SimilarityConfig, WatchConfig};
use crate::url::UrlPattern;
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawler)?;
    validate_cache_config(&config.cache)?;
    validate_similarity_config(&config.similarity)?;
    validate_watch_config(&config.watch)?;
    Ok(())
}

/// Validates crawl behavior settings
///
/// Also applied to every effective config a crawler builds from call-site
/// overrides.
pub fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "timeout-ms must be greater than 0".to_string(),
        ));
    }

    if config.retries < 1 {
        return Err(ConfigError::Validation(format!(
            "retries must be >= 1, got {}",
            config.retries
        )));
    }

    if config.concurrency < 1 || config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            config.concurrency
        )));
    }

    validate_user_agent(&config.user_agent)?;

    if encoding_rs::Encoding::for_label(config.default_encoding.trim().as_bytes()).is_none() {
        return Err(ConfigError::Validation(format!(
            "default-encoding '{}' is not a known encoding label",
            config.default_encoding
        )));
    }

    if let Some(pattern) = &config.url_pattern {
        UrlPattern::new(pattern).map_err(|e| ConfigError::InvalidPattern(e.to_string()))?;
    }

    Ok(())
}

/// Validates the user agent string
fn validate_user_agent(user_agent: &str) -> Result<(), ConfigError> {
    if user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    // Header values must be visible ASCII
    if !user_agent.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) {
        return Err(ConfigError::Validation(format!(
            "user-agent must contain printable ASCII only, got '{}'",
            user_agent
        )));
    }

    Ok(())
}

fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.ttl_secs == 0 {
        return Err(ConfigError::Validation(
            "cache ttl-secs must be greater than 0".to_string(),
        ));
    }

    if config.capacity == 0 {
        return Err(ConfigError::Validation(
            "cache capacity must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_similarity_config(config: &SimilarityConfig) -> Result<(), ConfigError> {
    if !config.threshold.is_finite() || config.threshold < 0.0 {
        return Err(ConfigError::Validation(format!(
            "similarity threshold must be a non-negative number, got {}",
            config.threshold
        )));
    }

    Ok(())
}

/// Validates the change watch settings
pub fn validate_watch_config(config: &WatchConfig) -> Result<(), ConfigError> {
    if config.interval_secs == 0 {
        return Err(ConfigError::Validation(
            "watch interval-secs must be greater than 0".to_string(),
        ));
    }

    Ok(())
}
