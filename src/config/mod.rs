use crate::utils::validation::DEFAULT_ALLOWED_EXTENSIONS;
use std::env;

/// Application configuration for the file manager front-end.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Permitted upload extensions (lowercase, no dot)
    pub allowed_extensions: Vec<String>,

    /// Maximum upload size in bytes (default: 100 MB)
    pub max_file_size: usize,

    /// Provider-side folder every asset lives under (default: "file_manager")
    pub storage_folder: String,

    /// Port the HTTP server binds to (default: 3000)
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            max_file_size: 100 * 1024 * 1024, // 100 MB
            storage_folder: "file_manager".to_string(),
            port: 3000,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            allowed_extensions: env::var("ALLOWED_EXTENSIONS")
                .ok()
                .map(|v| {
                    v.split(',')
                        .map(|e| e.trim().trim_start_matches('.').to_lowercase())
                        .filter(|e| !e.is_empty())
                        .collect()
                })
                .unwrap_or(default.allowed_extensions),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            storage_folder: env::var("STORAGE_FOLDER").unwrap_or(default.storage_folder),

            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),
        }
    }

    /// Config for tests and local development (small size cap)
    pub fn development() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            ..Self::default()
        }
    }
}
