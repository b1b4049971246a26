use std::{env, time::Duration};

use anyhow::{Context, anyhow};

const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60 * 24 * 14;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageBackend {
    /// Files served from the local media root.
    Local { media_url: String },
    /// Cloudinary-hosted images with on-the-fly transformations.
    Cloudinary { cloud_name: String, folder: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub session_ttl: Duration,
    pub image_backend: ImageBackend,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET is not set")?;
        let host = lookup("APP_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = lookup("APP_PORT")
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let session_ttl = lookup("SESSION_TTL_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_SESSION_TTL_SECS));

        let use_cloudinary = is_truthy(lookup("USE_CLOUDINARY")) || is_truthy(lookup("VERCEL"));
        let image_backend = if use_cloudinary {
            let cloud_name = lookup("CLOUDINARY_CLOUD_NAME")
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow!("CLOUDINARY_CLOUD_NAME is required when Cloudinary is enabled"))?;
            ImageBackend::Cloudinary {
                cloud_name,
                folder: lookup("CLOUDINARY_FOLDER").unwrap_or_else(|| "products".to_string()),
            }
        } else {
            ImageBackend::Local {
                media_url: lookup("MEDIA_URL").unwrap_or_else(|| "/media/".to_string()),
            }
        };

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            session_ttl,
            image_backend,
        })
    }
}

fn is_truthy(value: Option<String>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_local_images() {
        let config = config_from(&[("DATABASE_URL", "postgres://db"), ("JWT_SECRET", "s")]).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3000);
        assert_eq!(config.session_ttl, Duration::from_secs(DEFAULT_SESSION_TTL_SECS));
        assert_eq!(
            config.image_backend,
            ImageBackend::Local {
                media_url: "/media/".into()
            }
        );
    }

    #[test]
    fn vercel_flag_selects_cloudinary() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://db"),
            ("JWT_SECRET", "s"),
            ("VERCEL", "True"),
            ("CLOUDINARY_CLOUD_NAME", "demo"),
        ])
        .unwrap();
        assert_eq!(
            config.image_backend,
            ImageBackend::Cloudinary {
                cloud_name: "demo".into(),
                folder: "products".into()
            }
        );
    }

    #[test]
    fn cloudinary_without_cloud_name_is_rejected() {
        let result = config_from(&[
            ("DATABASE_URL", "postgres://db"),
            ("JWT_SECRET", "s"),
            ("USE_CLOUDINARY", "true"),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn missing_secret_is_rejected() {
        assert!(config_from(&[("DATABASE_URL", "postgres://db")]).is_err());
    }
}
