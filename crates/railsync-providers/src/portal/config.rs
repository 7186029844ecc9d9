//! Portal configuration and credential loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ProviderError, ProviderResult};

/// Default login page of the booking portal.
pub const DEFAULT_LOGIN_URL: &str = "https://www.smooz.jp/Smooz/login.xhtml";

/// Login credentials for the portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Loads credentials from a two-line file: username then password.
    pub fn load(path: &Path) -> ProviderResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProviderError::configuration(format!(
                "cannot read credentials file {}",
                path.display()
            ))
            .with_source(e)
        })?;

        let mut lines = content.lines();
        let username = lines.next().unwrap_or("").trim().to_string();
        let password = lines.next().unwrap_or("").trim().to_string();

        if username.is_empty() || password.is_empty() {
            return Err(ProviderError::configuration(format!(
                "credentials file {} must hold username and password on two lines",
                path.display()
            )));
        }

        Ok(Self { username, password })
    }
}

/// Settings for the purchase-history crawl.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Login page URL.
    pub login_url: String,
    /// Path to the two-line credentials file.
    pub credentials_path: PathBuf,
    /// Base delay for pages to settle after navigation.
    pub page_settle: Duration,
    /// Bound on waits for expected UI affordances.
    pub wait_timeout: Duration,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            login_url: DEFAULT_LOGIN_URL.to_string(),
            credentials_path: PathBuf::from("login.txt"),
            page_settle: Duration::from_secs(2),
            wait_timeout: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_two_line_credentials() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "rider@example.com").unwrap();
        writeln!(file, "hunter2").unwrap();

        let creds = Credentials::load(file.path()).unwrap();
        assert_eq!(creds.username, "rider@example.com");
        assert_eq!(creds.password, "hunter2");
    }

    #[test]
    fn rejects_missing_password_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "rider@example.com").unwrap();

        let err = Credentials::load(file.path()).unwrap_err();
        assert_eq!(
            err.code(),
            crate::error::ProviderErrorCode::ConfigurationError
        );
    }

    #[test]
    fn rejects_absent_file() {
        let err = Credentials::load(Path::new("/nonexistent/login.txt")).unwrap_err();
        assert_eq!(
            err.code(),
            crate::error::ProviderErrorCode::ConfigurationError
        );
    }
}
