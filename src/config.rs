use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use std::env;

/// Default upper bound on a single thumbnail, in bytes (10 MiB).
pub const DEFAULT_MAX_THUMBNAIL_BYTES: usize = 10 << 20;

/// Where uploaded thumbnails end up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThumbnailStorage {
    /// Base64 `data:` URL stored directly on the video record.
    Inline,
    /// File under the assets root, referenced by HTTP URL.
    File,
}

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub assets_root: String,
    /// Host name placed in thumbnail URLs handed back to clients.
    pub public_host: String,
    pub jwt_secret: String,
    pub thumbnail_storage: ThumbnailStorage,
    pub max_thumbnail_bytes: usize,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Video thumbnail upload API")]
pub struct Args {
    /// Host to bind to (overrides VIDEO_THUMBNAILS_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides VIDEO_THUMBNAILS_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (overrides VIDEO_THUMBNAILS_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Directory thumbnails are written to and served from (overrides VIDEO_THUMBNAILS_ASSETS_ROOT)
    #[arg(long)]
    pub assets_root: Option<String>,

    /// Host name used in thumbnail URLs (overrides VIDEO_THUMBNAILS_PUBLIC_HOST)
    #[arg(long)]
    pub public_host: Option<String>,

    /// Secret used to verify bearer tokens (overrides VIDEO_THUMBNAILS_JWT_SECRET)
    #[arg(long)]
    pub jwt_secret: Option<String>,

    /// Thumbnail storage strategy (overrides VIDEO_THUMBNAILS_STORAGE)
    #[arg(long, value_enum)]
    pub thumbnail_storage: Option<ThumbnailStorage>,

    /// Maximum thumbnail size in bytes (overrides VIDEO_THUMBNAILS_MAX_BYTES)
    #[arg(long)]
    pub max_thumbnail_bytes: Option<usize>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let migrate = args.migrate;
        let cfg = Self::merge(args, |key| env::var(key))?;
        Ok((cfg, migrate))
    }

    /// Merge CLI args over values obtained from `lookup` (normally `env::var`).
    pub fn merge<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let var = |key: &str| -> Result<Option<String>> {
            match lookup(key) {
                Ok(value) => Ok(Some(value)),
                Err(env::VarError::NotPresent) => Ok(None),
                Err(err) => Err(err).with_context(|| format!("reading {}", key)),
            }
        };

        // --- Environment fallback ---
        let env_host = var("VIDEO_THUMBNAILS_HOST")?.unwrap_or_else(|| "0.0.0.0".into());
        let env_port = match var("VIDEO_THUMBNAILS_PORT")? {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing VIDEO_THUMBNAILS_PORT value `{}`", value))?,
            None => 8091,
        };
        let env_db = var("VIDEO_THUMBNAILS_DATABASE_URL")?
            .unwrap_or_else(|| "sqlite://./data/videos.db".into());
        let env_assets =
            var("VIDEO_THUMBNAILS_ASSETS_ROOT")?.unwrap_or_else(|| "./assets".into());
        let env_public_host =
            var("VIDEO_THUMBNAILS_PUBLIC_HOST")?.unwrap_or_else(|| "localhost".into());
        let env_storage = match var("VIDEO_THUMBNAILS_STORAGE")? {
            Some(value) => ThumbnailStorage::from_str(&value, true).map_err(|err| {
                anyhow!("parsing VIDEO_THUMBNAILS_STORAGE value `{}`: {}", value, err)
            })?,
            None => ThumbnailStorage::Inline,
        };
        let env_max_bytes = match var("VIDEO_THUMBNAILS_MAX_BYTES")? {
            Some(value) => value
                .parse::<usize>()
                .with_context(|| format!("parsing VIDEO_THUMBNAILS_MAX_BYTES value `{}`", value))?,
            None => DEFAULT_MAX_THUMBNAIL_BYTES,
        };

        let jwt_secret = match args.jwt_secret {
            Some(secret) => secret,
            None => var("VIDEO_THUMBNAILS_JWT_SECRET")?
                .context("VIDEO_THUMBNAILS_JWT_SECRET or --jwt-secret must be set")?,
        };
        if jwt_secret.is_empty() {
            anyhow::bail!("JWT secret must not be empty");
        }

        // --- Merge ---
        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            database_url: args.database_url.unwrap_or(env_db),
            assets_root: args.assets_root.unwrap_or(env_assets),
            public_host: args.public_host.unwrap_or(env_public_host),
            jwt_secret,
            thumbnail_storage: args.thumbnail_storage.unwrap_or(env_storage),
            max_thumbnail_bytes: args.max_thumbnail_bytes.unwrap_or(env_max_bytes),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL clients use to fetch file-backed thumbnails.
    pub fn public_base_url(&self) -> String {
        format!("http://{}:{}", self.public_host, self.port)
    }
}
