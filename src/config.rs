use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PROJECT_ID: &str = "wz-rockville-cg-app";
pub const DEFAULT_DATABASE_ID: &str = "(default)";
pub const DEFAULT_SERVICE_ACCOUNT_KEY: &str = "scripts/serviceAccountKey.json";
pub const DEFAULT_ALLOWED_USERS_FILE: &str = "scripts/allowedUsers.json";
pub const DEFAULT_LEADERS_FILE: &str = "scripts/leaders.json";
pub const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";

/// Configuration shared by every admin binary, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub project_id: String,
    pub database_id: String,
    pub emulator_host: Option<String>,
    pub service_account_key_path: PathBuf,
    /// `GOOGLE_APPLICATION_CREDENTIALS`
    pub application_credentials: Option<PathBuf>,
    /// Diretório do gcloud, onde fica `application_default_credentials.json`
    pub gcloud_config_dir: Option<PathBuf>,
    pub metadata_host: String,
    pub allowed_users_file: PathBuf,
    pub leaders_file: PathBuf,
    pub test_user_email: String,
    pub test_user_display_name: String,
    pub request_timeout: Duration,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            project_id: DEFAULT_PROJECT_ID.to_string(),
            database_id: DEFAULT_DATABASE_ID.to_string(),
            emulator_host: None,
            service_account_key_path: PathBuf::from(DEFAULT_SERVICE_ACCOUNT_KEY),
            application_credentials: None,
            gcloud_config_dir: None,
            metadata_host: DEFAULT_METADATA_HOST.to_string(),
            allowed_users_file: PathBuf::from(DEFAULT_ALLOWED_USERS_FILE),
            leaders_file: PathBuf::from(DEFAULT_LEADERS_FILE),
            test_user_email: String::new(),
            test_user_display_name: "Test".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl AdminConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; blank values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let request_timeout = match get("FIRESTORE_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    log::warn!("⚠️  Invalid FIRESTORE_TIMEOUT_SECS '{}', using default", raw);
                    defaults.request_timeout
                }
            },
            None => defaults.request_timeout,
        };

        // gcloud: CLOUDSDK_CONFIG, senão o diretório padrão do usuário
        let gcloud_config_dir = get("CLOUDSDK_CONFIG").map(PathBuf::from).or_else(|| {
            if cfg!(windows) {
                get("APPDATA").map(|dir| PathBuf::from(dir).join("gcloud"))
            } else {
                get("HOME").map(|dir| PathBuf::from(dir).join(".config").join("gcloud"))
            }
        });

        Self {
            project_id: get("FIRESTORE_PROJECT_ID")
                .or_else(|| get("GOOGLE_CLOUD_PROJECT"))
                .unwrap_or(defaults.project_id),
            database_id: get("FIRESTORE_DATABASE").unwrap_or(defaults.database_id),
            emulator_host: get("FIRESTORE_EMULATOR_HOST"),
            service_account_key_path: get("SERVICE_ACCOUNT_KEY")
                .map(PathBuf::from)
                .unwrap_or(defaults.service_account_key_path),
            application_credentials: get("GOOGLE_APPLICATION_CREDENTIALS").map(PathBuf::from),
            gcloud_config_dir,
            metadata_host: get("GCE_METADATA_HOST").unwrap_or(defaults.metadata_host),
            allowed_users_file: get("ALLOWED_USERS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.allowed_users_file),
            leaders_file: get("LEADERS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.leaders_file),
            // Email vazio é válido para o usuário de teste
            test_user_email: lookup("TEST_USER_EMAIL").unwrap_or(defaults.test_user_email),
            test_user_display_name: get("TEST_USER_DISPLAY_NAME")
                .unwrap_or(defaults.test_user_display_name),
            request_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AdminConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AdminConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.project_id, DEFAULT_PROJECT_ID);
        assert_eq!(config.database_id, "(default)");
        assert!(config.emulator_host.is_none());
        assert_eq!(config.service_account_key_path, PathBuf::from("scripts/serviceAccountKey.json"));
        assert_eq!(config.test_user_email, "");
        assert_eq!(config.test_user_display_name, "Test");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.application_credentials.is_none());
        assert!(config.gcloud_config_dir.is_none());
        assert_eq!(config.metadata_host, DEFAULT_METADATA_HOST);
    }

    #[test]
    fn test_credential_discovery_variables() {
        let config = config_from(&[
            ("GOOGLE_APPLICATION_CREDENTIALS", "/secrets/adc.json"),
            ("HOME", "/home/admin"),
            ("GCE_METADATA_HOST", "127.0.0.1:8081"),
        ]);
        assert_eq!(config.application_credentials, Some(PathBuf::from("/secrets/adc.json")));
        if !cfg!(windows) {
            assert_eq!(
                config.gcloud_config_dir,
                Some(PathBuf::from("/home/admin/.config/gcloud"))
            );
        }
        assert_eq!(config.metadata_host, "127.0.0.1:8081");

        let config = config_from(&[("CLOUDSDK_CONFIG", "/opt/gcloud"), ("HOME", "/home/admin")]);
        assert_eq!(config.gcloud_config_dir, Some(PathBuf::from("/opt/gcloud")));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("GOOGLE_CLOUD_PROJECT", "fallback-project"),
            ("FIRESTORE_EMULATOR_HOST", "localhost:8080"),
            ("LEADERS_FILE", "/tmp/leaders.json"),
            ("TEST_USER_EMAIL", "Tester@Example.com"),
            ("FIRESTORE_TIMEOUT_SECS", "5"),
        ]);
        assert_eq!(config.project_id, "fallback-project");
        assert_eq!(config.emulator_host.as_deref(), Some("localhost:8080"));
        assert_eq!(config.leaders_file, PathBuf::from("/tmp/leaders.json"));
        assert_eq!(config.test_user_email, "Tester@Example.com");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_explicit_project_wins_and_bad_timeout_falls_back() {
        let config = config_from(&[
            ("FIRESTORE_PROJECT_ID", "explicit"),
            ("GOOGLE_CLOUD_PROJECT", "fallback-project"),
            ("FIRESTORE_TIMEOUT_SECS", "soon"),
            ("FIRESTORE_EMULATOR_HOST", "   "),
        ]);
        assert_eq!(config.project_id, "explicit");
        assert!(config.emulator_host.is_none());
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }
}
