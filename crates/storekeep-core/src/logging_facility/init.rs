//! Logging initialization module
//!
//! Provides a single initialization point for the logging facility.

use std::str::FromStr;
use std::sync::Once;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Logging profile configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output for development
    Development,
    /// JSON structured output for production
    Production,
    /// Test capture mode for deterministic testing
    Test,
}

impl Profile {
    /// Map an `APP_ENV` style environment name onto a profile.
    ///
    /// `release` and `production` select JSON output; anything else is
    /// treated as development.
    pub fn from_app_env(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "release" | "production" | "prod" => Profile::Production,
            "test" => Profile::Test,
            _ => Profile::Development,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Development => "development",
            Profile::Production => "production",
            Profile::Test => "test",
        }
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Profile::Development),
            "production" | "release" => Ok(Profile::Production),
            "test" => Ok(Profile::Test),
            other => Err(format!("unknown logging profile '{}'", other)),
        }
    }
}

static INIT_ONCE: Once = Once::new();

/// Initialize the logging facility
///
/// Call once at process startup. Later calls are ignored.
///
/// - **Development**: Human-readable logs, `storekeep=debug`
/// - **Production**: JSON structured logs, `storekeep=info`
/// - **Test**: No output; see `init_test_capture()`
///
/// Output goes to stderr. `RUST_LOG` overrides the default filter in every
/// profile.
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| match profile {
        Profile::Development => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new("storekeep=debug")),
                )
                .init();
        }
        Profile::Production => {
            tracing_subscriber::fmt()
                .json()
                .with_writer(std::io::stderr)
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new("storekeep=info")),
                )
                .init();
        }
        Profile::Test => {
            tracing_subscriber::registry().init();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_app_env() {
        assert_eq!(Profile::from_app_env("release"), Profile::Production);
        assert_eq!(Profile::from_app_env("Production"), Profile::Production);
        assert_eq!(Profile::from_app_env("development"), Profile::Development);
        assert_eq!(Profile::from_app_env(""), Profile::Development);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("dev".parse::<Profile>(), Ok(Profile::Development));
        assert_eq!("release".parse::<Profile>(), Ok(Profile::Production));
        assert!("verbose".parse::<Profile>().is_err());
    }

    #[test]
    fn test_as_str_parses_back() {
        for profile in [Profile::Development, Profile::Production, Profile::Test] {
            assert_eq!(profile.as_str().parse::<Profile>(), Ok(profile));
        }
    }
}
