//! Credential resolution
//!
//! Credentials are looked up in a fixed order: the environment, then
//! `config.json` in the per-user config directory, then a `.env` file beside it.
//! Resolution runs on every tool call so a token written after startup is picked
//! up without a restart.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Production API endpoint used when no tier supplies a URL
pub const DEFAULT_URL: &str = "https://app.fizzy.do";

pub const TOKEN_ENV: &str = "FIZZY_TOKEN";
pub const URL_ENV: &str = "FIZZY_URL";
pub const DEV_ENV: &str = "FIZZY_DEV";
pub const CONFIG_DIR_ENV: &str = "FIZZY_CONFIG_DIR";

pub const CONFIG_FILE: &str = "config.json";
pub const DOTENV_FILE: &str = ".env";

lazy_static! {
    static ref DOTENV_TOKEN: Regex =
        Regex::new(r#"(?m)^\s*FIZZY_TOKEN=["']?([^"'\r\n]+)["']?"#).unwrap();
    static ref DOTENV_URL: Regex =
        Regex::new(r#"(?m)^\s*FIZZY_URL=["']?([^"'\r\n]+)["']?"#).unwrap();
}

/// Where a resolved token came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialOrigin {
    Environment,
    ConfigFile(PathBuf),
    DotEnv(PathBuf),
    Unconfigured,
}

impl fmt::Display for CredentialOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialOrigin::Environment => write!(f, "environment ({})", TOKEN_ENV),
            CredentialOrigin::ConfigFile(path) => write!(f, "{}", path.display()),
            CredentialOrigin::DotEnv(path) => write!(f, "{}", path.display()),
            CredentialOrigin::Unconfigured => write!(f, "not configured"),
        }
    }
}

/// The outcome of one credential lookup
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: Option<String>,
    pub url: String,
    pub dev_mode: bool,
    pub origin: CredentialOrigin,
}

impl Credentials {
    pub fn unconfigured() -> Self {
        Self {
            token: None,
            url: DEFAULT_URL.to_string(),
            dev_mode: false,
            origin: CredentialOrigin::Unconfigured,
        }
    }

    /// Token with all but the last four characters hidden, for display
    pub fn masked_token(&self) -> Option<String> {
        self.token.as_ref().map(|token| {
            let visible: String = token
                .chars()
                .rev()
                .take(4)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            format!("****{}", visible)
        })
    }
}

// Hand-written so the token never ends up in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &self.masked_token())
            .field("url", &self.url)
            .field("dev_mode", &self.dev_mode)
            .field("origin", &self.origin)
            .finish()
    }
}

/// Anything that can produce credentials on demand
pub trait CredentialSource: Send + Sync {
    fn resolve(&self) -> Credentials;
}

/// Contents of `config.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Resolves credentials from the environment and the per-user config directory
pub struct ConfigResolver {
    config_dir: Option<PathBuf>,
    env: EnvLookup,
}

impl ConfigResolver {
    /// Resolver reading the real process environment. `config_dir` overrides
    /// `FIZZY_CONFIG_DIR` and the home-directory default.
    pub fn from_process(config_dir: Option<PathBuf>) -> Self {
        let config_dir = config_dir
            .or_else(|| non_empty(std::env::var(CONFIG_DIR_ENV).ok()).map(PathBuf::from))
            .or_else(default_config_dir);
        Self {
            config_dir,
            env: Box::new(|key: &str| std::env::var(key).ok()),
        }
    }

    /// Resolver over a fixed set of variables, used by tests and embedders
    pub fn with_env(config_dir: Option<PathBuf>, vars: HashMap<String, String>) -> Self {
        Self {
            config_dir,
            env: Box::new(move |key: &str| vars.get(key).cloned()),
        }
    }

    pub fn config_dir(&self) -> Option<&Path> {
        self.config_dir.as_deref()
    }

    fn var(&self, key: &str) -> Option<String> {
        non_empty((self.env)(key))
    }

    fn dev_mode(&self) -> bool {
        matches!(
            self.var(DEV_ENV).map(|v| v.to_ascii_lowercase()).as_deref(),
            Some("1") | Some("true") | Some("yes") | Some("development")
        )
    }

    fn from_config_file(&self, path: &Path) -> Option<(String, Option<String>)> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Skipping unreadable config file {}: {}", path.display(), e);
                return None;
            }
        };
        match serde_json::from_str::<ConfigFile>(&raw) {
            Ok(config) => non_empty(config.token).map(|token| (token, non_empty(config.url))),
            Err(e) => {
                tracing::warn!("Skipping malformed config file {}: {}", path.display(), e);
                None
            }
        }
    }

    fn from_dotenv(&self, path: &Path) -> Option<(String, Option<String>)> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Skipping unreadable env file {}: {}", path.display(), e);
                return None;
            }
        };
        parse_dotenv(&raw)
    }
}

impl CredentialSource for ConfigResolver {
    fn resolve(&self) -> Credentials {
        let dev_mode = self.dev_mode();

        if let Some(token) = self.var(TOKEN_ENV) {
            return Credentials {
                token: Some(token),
                url: self.var(URL_ENV).unwrap_or_else(|| DEFAULT_URL.to_string()),
                dev_mode,
                origin: CredentialOrigin::Environment,
            };
        }

        if let Some(dir) = &self.config_dir {
            let json_path = dir.join(CONFIG_FILE);
            if let Some((token, url)) = self.from_config_file(&json_path) {
                return Credentials {
                    token: Some(token),
                    url: url.unwrap_or_else(|| DEFAULT_URL.to_string()),
                    dev_mode,
                    origin: CredentialOrigin::ConfigFile(json_path),
                };
            }

            let env_path = dir.join(DOTENV_FILE);
            if let Some((token, url)) = self.from_dotenv(&env_path) {
                return Credentials {
                    token: Some(token),
                    url: url.unwrap_or_else(|| DEFAULT_URL.to_string()),
                    dev_mode,
                    origin: CredentialOrigin::DotEnv(env_path),
                };
            }
        }

        Credentials {
            dev_mode,
            ..Credentials::unconfigured()
        }
    }
}

/// Default per-user config directory, `~/.claude/plugins/fizzy`
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".claude").join("plugins").join("fizzy"))
}

/// Extract token and optional URL from `KEY=value` lines
pub fn parse_dotenv(content: &str) -> Option<(String, Option<String>)> {
    let token = DOTENV_TOKEN
        .captures(content)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())?;
    let url = DOTENV_URL
        .captures(content)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string());
    Some((token, non_empty(url)))
}

/// Write `config.json` into `dir`, creating the directory when needed
pub fn write_config_file(dir: &Path, config: &ConfigFile) -> std::io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(config)?;
    fs::write(&path, json)?;
    restrict_to_owner(&path)?;
    Ok(path)
}

#[cfg(unix)]
fn restrict_to_owner(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_environment_wins_over_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), r#"{"token":"from-file"}"#).unwrap();

        let resolver = ConfigResolver::with_env(
            Some(dir.path().to_path_buf()),
            vars(&[(TOKEN_ENV, "from-env"), (URL_ENV, "http://localhost:3000")]),
        );
        let creds = resolver.resolve();

        assert_eq!(creds.token.as_deref(), Some("from-env"));
        assert_eq!(creds.url, "http://localhost:3000");
        assert_eq!(creds.origin, CredentialOrigin::Environment);
    }

    #[test]
    fn test_empty_env_token_falls_through_to_config_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{"token":"from-file","url":"https://fizzy.example.com"}"#,
        )
        .unwrap();

        let resolver =
            ConfigResolver::with_env(Some(dir.path().to_path_buf()), vars(&[(TOKEN_ENV, "")]));
        let creds = resolver.resolve();

        assert_eq!(creds.token.as_deref(), Some("from-file"));
        assert_eq!(creds.url, "https://fizzy.example.com");
        assert_eq!(
            creds.origin,
            CredentialOrigin::ConfigFile(dir.path().join(CONFIG_FILE))
        );
    }

    #[test]
    fn test_dotenv_used_when_json_has_no_token() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), r#"{"url":"https://ignored"}"#).unwrap();
        fs::write(
            dir.path().join(DOTENV_FILE),
            "# fizzy\nFIZZY_TOKEN=\"abc123\"\nFIZZY_URL='https://self-hosted.example'\n",
        )
        .unwrap();

        let creds = ConfigResolver::with_env(Some(dir.path().to_path_buf()), HashMap::new())
            .resolve();

        assert_eq!(creds.token.as_deref(), Some("abc123"));
        assert_eq!(creds.url, "https://self-hosted.example");
        assert_eq!(creds.origin, CredentialOrigin::DotEnv(dir.path().join(DOTENV_FILE)));
    }

    #[test]
    fn test_malformed_json_is_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "{ not json").unwrap();
        fs::write(dir.path().join(DOTENV_FILE), "FIZZY_TOKEN=fallback\n").unwrap();

        let creds = ConfigResolver::with_env(Some(dir.path().to_path_buf()), HashMap::new())
            .resolve();

        assert_eq!(creds.token.as_deref(), Some("fallback"));
        assert_eq!(creds.url, DEFAULT_URL);
    }

    #[test]
    fn test_nothing_configured() {
        let dir = TempDir::new().unwrap();
        let creds = ConfigResolver::with_env(Some(dir.path().to_path_buf()), HashMap::new())
            .resolve();

        assert_eq!(creds.token, None);
        assert_eq!(creds.url, DEFAULT_URL);
        assert_eq!(creds.origin, CredentialOrigin::Unconfigured);
    }

    #[test]
    fn test_dev_mode_flag() {
        let resolver = ConfigResolver::with_env(None, vars(&[(DEV_ENV, "true")]));
        assert!(resolver.resolve().dev_mode);

        let resolver = ConfigResolver::with_env(None, vars(&[(DEV_ENV, "0")]));
        assert!(!resolver.resolve().dev_mode);
    }

    #[test]
    fn test_write_config_then_resolve() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("plugins").join("fizzy");
        let config = ConfigFile {
            token: Some("written".to_string()),
            url: None,
        };

        let path = write_config_file(&nested, &config).unwrap();
        assert_eq!(path, nested.join(CONFIG_FILE));

        let creds = ConfigResolver::with_env(Some(nested), HashMap::new()).resolve();
        assert_eq!(creds.token.as_deref(), Some("written"));
        assert_eq!(creds.url, DEFAULT_URL);
    }

    #[cfg(unix)]
    #[test]
    fn test_config_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let config = ConfigFile {
            token: Some("secret".to_string()),
            url: None,
        };

        let path = write_config_file(dir.path(), &config).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_parse_dotenv_requires_token() {
        assert_eq!(parse_dotenv("FIZZY_URL=https://x\n"), None);
        assert_eq!(
            parse_dotenv("FIZZY_TOKEN=t\n"),
            Some(("t".to_string(), None))
        );
    }

    #[test]
    fn test_masked_token_and_debug_hide_secret() {
        let creds = Credentials {
            token: Some("supersecret1234".to_string()),
            ..Credentials::unconfigured()
        };
        assert_eq!(creds.masked_token().as_deref(), Some("****1234"));
        assert!(!format!("{:?}", creds).contains("supersecret"));
    }
}
