//! Cache configuration.
//!
//! Plain structs with builder-style setters. `apply_env_defaults` fills
//! whatever the caller left empty, so precedence is: explicit field, then
//! environment variable, then built-in default. The defaults point at a
//! local MinIO, which is how the cache is run in development.

/// Default block granularity in tokens.
pub const DEFAULT_BLOCK_SIZE_TOKENS: u32 = 256;

/// Default soft capacity: 10 GiB.
pub const DEFAULT_CAPACITY_BYTES: u64 = 10 * 1024 * 1024 * 1024;

/// S3 connection defaults (local MinIO).
pub mod s3_defaults {
    pub const ENDPOINT: &str = "http://127.0.0.1:9000";
    pub const REGION: &str = "us-east-1";
    pub const BUCKET: &str = "kv-cache";
    pub const ACCESS_KEY_ID: &str = "minioadmin";
    pub const SECRET_ACCESS_KEY: &str = "minioadmin";
    /// Path-style addressing is the explicit default: custom endpoints
    /// (MinIO, LocalStack) generally do not resolve virtual-hosted names.
    pub const USE_PATH_STYLE: bool = true;
}

/// Object store connection settings.
#[derive(Debug, Clone, Default)]
pub struct S3Config {
    /// Custom endpoint URL; empty means the provider's default endpoint.
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Path-style addressing. `None` defers to the environment, then to
    /// [`s3_defaults::USE_PATH_STYLE`]; an explicit `Some` always wins.
    pub path_style: Option<bool>,
}

impl S3Config {
    #[must_use]
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    #[must_use]
    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = access_key_id.into();
        self.secret_access_key = secret_access_key.into();
        self
    }

    #[must_use]
    pub fn with_path_style(mut self, path_style: bool) -> Self {
        self.path_style = Some(path_style);
        self
    }

    /// Resolved path-style flag.
    #[must_use]
    pub fn path_style(&self) -> bool {
        self.path_style.unwrap_or(s3_defaults::USE_PATH_STYLE)
    }
}

/// Cache engine configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Included in every prefix digest; segregates namespaces across
    /// models sharing a bucket.
    pub model_id: String,
    /// Block granularity in tokens; must be at least 1.
    pub block_size_tokens: u32,
    /// Soft upper bound on resident bytes; eviction drains above this.
    pub capacity_bytes: u64,
    /// Object store connection.
    pub s3: S3Config,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            model_id: "demo-model".to_string(),
            block_size_tokens: DEFAULT_BLOCK_SIZE_TOKENS,
            capacity_bytes: DEFAULT_CAPACITY_BYTES,
            s3: S3Config::default(),
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_block_size(mut self, block_size_tokens: u32) -> Self {
        self.block_size_tokens = block_size_tokens;
        self
    }

    #[must_use]
    pub fn with_capacity_bytes(mut self, capacity_bytes: u64) -> Self {
        self.capacity_bytes = capacity_bytes;
        self
    }

    #[must_use]
    pub fn with_s3(mut self, s3: S3Config) -> Self {
        self.s3 = s3;
        self
    }

    /// Fill empty S3 fields from `WARMSTART_*` environment variables,
    /// falling back to the built-in MinIO defaults. Fields the caller set
    /// explicitly are never overridden.
    pub fn apply_env_defaults(&mut self) {
        if self.s3.endpoint.is_empty() {
            self.s3.endpoint = env_or("WARMSTART_S3_ENDPOINT", s3_defaults::ENDPOINT);
        }
        if self.s3.region.is_empty() {
            self.s3.region = env_or("WARMSTART_S3_REGION", s3_defaults::REGION);
        }
        if self.s3.bucket.is_empty() {
            self.s3.bucket = env_or("WARMSTART_S3_BUCKET", s3_defaults::BUCKET);
        }
        if self.s3.access_key_id.is_empty() {
            self.s3.access_key_id =
                env_or("WARMSTART_AWS_ACCESS_KEY_ID", s3_defaults::ACCESS_KEY_ID);
        }
        if self.s3.secret_access_key.is_empty() {
            self.s3.secret_access_key = env_or(
                "WARMSTART_AWS_SECRET_ACCESS_KEY",
                s3_defaults::SECRET_ACCESS_KEY,
            );
        }
        if self.s3.path_style.is_none() {
            self.s3.path_style = Some(
                std::env::var("WARMSTART_S3_PATH_STYLE")
                    .map(|v| parse_bool(&v))
                    .unwrap_or(s3_defaults::USE_PATH_STYLE),
            );
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_bool(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::default();

        assert_eq!(config.model_id, "demo-model");
        assert_eq!(config.block_size_tokens, 256);
        assert_eq!(config.capacity_bytes, 10 * 1024 * 1024 * 1024);
        assert!(config.s3.path_style.is_none());
        assert!(config.s3.path_style());
    }

    #[test]
    fn test_builder() {
        let config = CacheConfig::new("llama")
            .with_block_size(128)
            .with_capacity_bytes(1 << 20)
            .with_s3(
                S3Config::new("my-bucket")
                    .with_endpoint("http://minio:9000")
                    .with_region("eu-west-1")
                    .with_credentials("ak", "sk")
                    .with_path_style(false),
            );

        assert_eq!(config.model_id, "llama");
        assert_eq!(config.block_size_tokens, 128);
        assert_eq!(config.capacity_bytes, 1 << 20);
        assert_eq!(config.s3.bucket, "my-bucket");
        assert!(!config.s3.path_style());
    }

    #[test]
    fn test_env_defaulting() {
        // Env mutation is process-global, so the fill-empty and override
        // cases share one test; no other test touches this variable.
        let mut config = CacheConfig::new("m");
        config.apply_env_defaults();

        assert_eq!(config.s3.endpoint, s3_defaults::ENDPOINT);
        assert_eq!(config.s3.region, s3_defaults::REGION);
        assert_eq!(config.s3.bucket, s3_defaults::BUCKET);
        assert_eq!(config.s3.path_style, Some(true));

        std::env::set_var("WARMSTART_S3_ENDPOINT", "http://test-endpoint:9999");
        let mut config = CacheConfig::new("m");
        config.apply_env_defaults();
        std::env::remove_var("WARMSTART_S3_ENDPOINT");

        assert_eq!(config.s3.endpoint, "http://test-endpoint:9999");
    }

    #[test]
    fn test_env_defaults_keep_explicit_fields() {
        let mut config =
            CacheConfig::new("m").with_s3(S3Config::new("explicit").with_path_style(false));
        config.apply_env_defaults();

        assert_eq!(config.s3.bucket, "explicit");
        // An explicit false must survive defaulting.
        assert_eq!(config.s3.path_style, Some(false));
        // Untouched fields are still filled.
        assert_eq!(config.s3.region, s3_defaults::REGION);
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("1"));
        assert!(parse_bool("true"));
        assert!(parse_bool("TRUE"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("yes"));
    }
}
