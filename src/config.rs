use anyhow::{Context, Result};
use clap::Parser;
use std::{env, fmt};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub downloads_dir: String,
    pub max_upload_bytes: usize,
    pub s3: S3Settings,
}

/// Connection settings for the S3-compatible backend.
#[derive(Clone, PartialEq, Eq)]
pub struct S3Settings {
    /// Custom endpoint; `None` means the SDK resolves the AWS endpoint itself.
    pub endpoint: Option<String>,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    /// Path-style addressing (required for LocalStack and MinIO).
    pub force_path_style: bool,
}

impl fmt::Debug for S3Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Settings")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("force_path_style", &self.force_path_style)
            .finish()
    }
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "HTTP facade over an S3-compatible object store")]
pub struct Args {
    /// Host to bind to (overrides BUCKET_RELAY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides BUCKET_RELAY_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory downloaded objects are written under (overrides BUCKET_RELAY_DOWNLOADS_DIR)
    #[arg(long)]
    pub downloads_dir: Option<String>,

    /// Largest accepted upload request body (overrides BUCKET_RELAY_MAX_UPLOAD_BYTES)
    #[arg(long)]
    pub max_upload_bytes: Option<usize>,

    /// Backend endpoint URL, empty for AWS defaults (overrides BUCKET_RELAY_S3_ENDPOINT)
    #[arg(long)]
    pub s3_endpoint: Option<String>,

    /// Backend region (overrides BUCKET_RELAY_S3_REGION)
    #[arg(long)]
    pub s3_region: Option<String>,

    /// Backend access key (overrides BUCKET_RELAY_S3_ACCESS_KEY)
    #[arg(long)]
    pub s3_access_key: Option<String>,

    /// Backend secret key (overrides BUCKET_RELAY_S3_SECRET_KEY)
    #[arg(long)]
    pub s3_secret_key: Option<String>,

    /// Use virtual-hosted-style bucket addressing instead of path-style
    #[arg(long)]
    pub s3_virtual_host_style: bool,
}

const DEFAULT_PORT: u16 = 8773;
const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024 * 1024;

/// The default upload limit, clamped to what the target can address.
fn default_max_upload_bytes() -> usize {
    usize::try_from(DEFAULT_MAX_UPLOAD_BYTES).unwrap_or(usize::MAX)
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::merge(Args::parse(), |name| env::var(name).ok())
    }

    /// Merge parsed CLI args over values looked up through `env`.
    pub fn merge(args: Args, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        // --- Environment fallback ---
        let env_or = |name: &str, default: &str| env(name).unwrap_or_else(|| default.into());

        let env_port = parse_env(&env, "BUCKET_RELAY_PORT")?.unwrap_or(DEFAULT_PORT);
        let env_max_upload = parse_env(&env, "BUCKET_RELAY_MAX_UPLOAD_BYTES")?
            .unwrap_or_else(default_max_upload_bytes);
        let env_path_style =
            parse_env::<bool>(&env, "BUCKET_RELAY_S3_FORCE_PATH_STYLE")?.unwrap_or(true);

        let endpoint = args
            .s3_endpoint
            .unwrap_or_else(|| env_or("BUCKET_RELAY_S3_ENDPOINT", "http://localstack:4566"));

        // --- Merge ---
        Ok(Self {
            host: args
                .host
                .unwrap_or_else(|| env_or("BUCKET_RELAY_HOST", "0.0.0.0")),
            port: args.port.unwrap_or(env_port),
            downloads_dir: args
                .downloads_dir
                .unwrap_or_else(|| env_or("BUCKET_RELAY_DOWNLOADS_DIR", "s3_downloads")),
            max_upload_bytes: args.max_upload_bytes.unwrap_or(env_max_upload),
            s3: S3Settings {
                endpoint: Some(endpoint).filter(|e| !e.trim().is_empty()),
                region: args
                    .s3_region
                    .unwrap_or_else(|| env_or("BUCKET_RELAY_S3_REGION", "us-east-1")),
                access_key: args
                    .s3_access_key
                    .unwrap_or_else(|| env_or("BUCKET_RELAY_S3_ACCESS_KEY", "test")),
                secret_key: args
                    .s3_secret_key
                    .unwrap_or_else(|| env_or("BUCKET_RELAY_S3_SECRET_KEY", "test")),
                force_path_style: !args.s3_virtual_host_style && env_path_style,
            },
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_env<T>(env: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env(name)
        .map(|value| {
            value
                .parse::<T>()
                .with_context(|| format!("parsing {} value `{}`", name, value))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn defaults_target_localstack() {
        let cfg = AppConfig::merge(Args::default(), lookup(&[])).unwrap();
        assert_eq!(cfg.addr(), "0.0.0.0:8773");
        assert_eq!(cfg.downloads_dir, "s3_downloads");
        assert_eq!(cfg.s3.endpoint.as_deref(), Some("http://localstack:4566"));
        assert_eq!(cfg.s3.region, "us-east-1");
        assert_eq!(cfg.s3.access_key, "test");
        assert!(cfg.s3.force_path_style);
    }

    #[test]
    fn cli_overrides_env() {
        let args = Args {
            port: Some(9000),
            s3_region: Some("eu-west-1".into()),
            ..Args::default()
        };
        let env = lookup(&[
            ("BUCKET_RELAY_PORT", "7000"),
            ("BUCKET_RELAY_HOST", "127.0.0.1"),
            ("BUCKET_RELAY_S3_REGION", "us-west-2"),
        ]);
        let cfg = AppConfig::merge(args, env).unwrap();
        assert_eq!(cfg.addr(), "127.0.0.1:9000");
        assert_eq!(cfg.s3.region, "eu-west-1");
    }

    #[test]
    fn empty_endpoint_falls_back_to_sdk_resolution() {
        let cfg =
            AppConfig::merge(Args::default(), lookup(&[("BUCKET_RELAY_S3_ENDPOINT", "")])).unwrap();
        assert_eq!(cfg.s3.endpoint, None);
    }

    #[test]
    fn virtual_host_flag_disables_path_style() {
        let args = Args {
            s3_virtual_host_style: true,
            ..Args::default()
        };
        let cfg = AppConfig::merge(args, lookup(&[])).unwrap();
        assert!(!cfg.s3.force_path_style);
    }

    #[test]
    fn bad_port_names_the_variable() {
        let err = AppConfig::merge(Args::default(), lookup(&[("BUCKET_RELAY_PORT", "http")]))
            .unwrap_err();
        assert!(err.to_string().contains("BUCKET_RELAY_PORT"));
    }

    #[test]
    fn upload_limit_defaults_to_five_gib_or_address_space() {
        let cfg = AppConfig::merge(Args::default(), lookup(&[])).unwrap();
        let expected = DEFAULT_MAX_UPLOAD_BYTES.min(usize::MAX as u64);
        assert_eq!(cfg.max_upload_bytes as u64, expected);

        let cfg = AppConfig::merge(
            Args::default(),
            lookup(&[("BUCKET_RELAY_MAX_UPLOAD_BYTES", "1024")]),
        )
        .unwrap();
        assert_eq!(cfg.max_upload_bytes, 1024);
    }

    #[test]
    fn secret_is_redacted_in_debug() {
        let args = Args {
            s3_secret_key: Some("hunter2".into()),
            ..Args::default()
        };
        let cfg = AppConfig::merge(args, lookup(&[])).unwrap();
        let rendered = format!("{:?}", cfg);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
