use core_config::{ConfigError, FromEnv, env_or_default, env_required};

/// JWT signing configuration
#[derive(Clone, Debug)]
pub struct JwtConfig {
    /// HS256 signing secret
    pub secret: String,
    /// Token lifetime in seconds
    pub ttl_seconds: i64,
}

impl FromEnv for JwtConfig {
    /// Reads from environment variables:
    /// - JWT_SECRET: required
    /// - JWT_TTL_SECONDS: defaults to 86400 (24 hours)
    fn from_env() -> Result<Self, ConfigError> {
        let secret = env_required("JWT_SECRET")?;
        let ttl_seconds = env_or_default("JWT_TTL_SECONDS", "86400")
            .parse()
            .map_err(|e| ConfigError::ParseError {
                key: "JWT_TTL_SECONDS".to_string(),
                details: format!("{}", e),
            })?;

        Ok(Self {
            secret,
            ttl_seconds,
        })
    }
}
