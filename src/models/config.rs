use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::quota::DEFAULT_DAILY_LIMIT;

/// Where session state is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Json,
    Sqlite,
    Memory,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageBackend::Json => "json",
            StorageBackend::Sqlite => "sqlite",
            StorageBackend::Memory => "memory",
        };
        f.write_str(name)
    }
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(StorageBackend::Json),
            "sqlite" => Ok(StorageBackend::Sqlite),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("Unknown storage backend: {}", other)),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_daily_generation_limit")]
    pub daily_generation_limit: u32,
    #[serde(default = "default_max_image_size")]
    pub max_image_size: usize, // Bytes
    #[serde(default = "default_max_file_count")]
    pub max_file_count: usize,
    #[serde(default = "default_max_prompt_length")]
    pub max_prompt_length: usize, // Characters
    #[serde(default = "default_max_description_length")]
    pub max_description_length: usize,
    #[serde(default)]
    pub storage_backend: StorageBackend,
    /// Usage fraction above which the quota badge turns to warning
    #[serde(default = "default_usage_warning_threshold")]
    pub usage_warning_threshold: f64,
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            daily_generation_limit: default_daily_generation_limit(),
            max_image_size: default_max_image_size(),
            max_file_count: default_max_file_count(),
            max_prompt_length: default_max_prompt_length(),
            max_description_length: default_max_description_length(),
            storage_backend: StorageBackend::default(),
            usage_warning_threshold: default_usage_warning_threshold(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_daily_generation_limit() -> u32 {
    DEFAULT_DAILY_LIMIT
}

fn default_max_image_size() -> usize {
    20_000_000 // 20MB
}

fn default_max_file_count() -> usize {
    5
}

fn default_max_prompt_length() -> usize {
    500
}

fn default_max_description_length() -> usize {
    200
}

fn default_usage_warning_threshold() -> f64 {
    0.8
}
