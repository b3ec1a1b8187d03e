// ==================== CREDENTIALS & SESSION BOOTSTRAP ====================
// Obtém uma sessão autenticada no Firestore: primeiro tenta as Application
// Default Credentials, depois a chave de service account local.

use crate::{
    config::AdminConfig,
    database::FirestoreDB,
    utils::error::{AdminError, Result},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const EMULATOR_TOKEN: &str = "owner";
/// Renova o token 60s antes de expirar
const EXPIRY_MARGIN_SECS: i64 = 60;
const JWT_LIFETIME_SECS: i64 = 3600;

pub const REMEDIATION: &str = "\
To fix this, use one of these methods:
1. Set up Application Default Credentials:
   gcloud auth application-default login

2. Or download a service account key:
   - Go to Firebase Console > Project Settings > Service Accounts
   - Generate new private key
   - Save as scripts/serviceAccountKey.json (or point SERVICE_ACCOUNT_KEY at it)";

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

// ==================== CREDENTIAL FILES ====================

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub private_key_id: Option<String>,
    pub private_key: String,
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizedUser {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone)]
pub enum CredentialSource {
    ServiceAccount(ServiceAccountKey),
    AuthorizedUser(AuthorizedUser),
    /// GCE metadata server at `host`.
    MetadataServer { host: String },
    Emulator,
}

impl CredentialSource {
    /// Parses a Google credentials JSON file (`service_account` or `authorized_user`).
    pub fn from_json(raw: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        match value.get("type").and_then(|t| t.as_str()) {
            Some("service_account") => Ok(Self::ServiceAccount(serde_json::from_value(value)?)),
            Some("authorized_user") => Ok(Self::AuthorizedUser(serde_json::from_value(value)?)),
            Some(other) => Err(AdminError::CredentialsError(format!(
                "Unsupported credential type '{}'",
                other
            ))),
            None => Err(AdminError::CredentialsError(
                "Credential file has no 'type' field".to_string(),
            )),
        }
    }

    pub async fn from_file(path: &Path) -> Result<Self> {
        log::debug!("Reading credentials from {}", path.display());
        let raw = tokio::fs::read_to_string(path).await?;
        Self::from_json(&raw)
    }

    pub fn project_id(&self) -> Option<&str> {
        match self {
            Self::ServiceAccount(key) => key.project_id.as_deref(),
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::ServiceAccount(key) => format!("service account {}", key.client_email),
            Self::AuthorizedUser(_) => "gcloud user credentials".to_string(),
            Self::MetadataServer { host } => format!("GCE metadata server ({})", host),
            Self::Emulator => "Firestore emulator".to_string(),
        }
    }
}

// ==================== ACCESS TOKENS ====================

#[derive(Debug, Serialize, Deserialize)]
struct ServiceAccountClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn from_response(response: TokenResponse, now: DateTime<Utc>) -> Self {
        let lifetime = response.expires_in.unwrap_or(JWT_LIFETIME_SECS);
        Self {
            value: response.access_token,
            expires_at: now + Duration::seconds(lifetime),
        }
    }

    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

/// Signs the OAuth2 JWT-bearer assertion for a service account key.
pub fn sign_service_account_jwt(key: &ServiceAccountKey, now: DateTime<Utc>) -> Result<String> {
    let claims = ServiceAccountClaims {
        iss: key.client_email.clone(),
        scope: DATASTORE_SCOPE.to_string(),
        aud: key.token_uri.clone(),
        iat: now.timestamp(),
        exp: (now + Duration::seconds(JWT_LIFETIME_SECS)).timestamp(),
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
    Ok(encode(&header, &claims, &signing_key)?)
}

/// Mints and caches bearer tokens for one credential source.
pub struct TokenProvider {
    source: CredentialSource,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(source: CredentialSource, timeout: std::time::Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            source,
            http,
            cached: Mutex::new(None),
        })
    }

    pub fn source(&self) -> &CredentialSource {
        &self.source
    }

    pub async fn access_token(&self) -> Result<String> {
        if matches!(self.source, CredentialSource::Emulator) {
            return Ok(EMULATOR_TOKEN.to_string());
        }

        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.is_fresh(Utc::now()) {
                return Ok(token.value.clone());
            }
        }

        log::debug!("🔑 Requesting access token from {}", self.source.describe());
        let fresh = self.fetch_token().await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    async fn fetch_token(&self) -> Result<CachedToken> {
        let now = Utc::now();
        let request = match &self.source {
            CredentialSource::ServiceAccount(key) => {
                let assertion = sign_service_account_jwt(key, now)?;
                self.http.post(&key.token_uri).form(&[
                    ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                    ("assertion", assertion.as_str()),
                ])
            }
            CredentialSource::AuthorizedUser(user) => self.http.post(GOOGLE_TOKEN_URI).form(&[
                ("grant_type", "refresh_token"),
                ("client_id", user.client_id.as_str()),
                ("client_secret", user.client_secret.as_str()),
                ("refresh_token", user.refresh_token.as_str()),
            ]),
            CredentialSource::MetadataServer { host } => self
                .http
                .get(format!(
                    "http://{}/computeMetadata/v1/instance/service-accounts/default/token",
                    host
                ))
                .header("Metadata-Flavor", "Google"),
            CredentialSource::Emulator => {
                return Ok(CachedToken {
                    value: EMULATOR_TOKEN.to_string(),
                    expires_at: DateTime::<Utc>::MAX_UTC,
                })
            }
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdminError::CredentialsError(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response.json().await?;
        Ok(CachedToken::from_response(token, now))
    }
}

// ==================== APPLICATION DEFAULT CREDENTIALS ====================

/// gcloud's well-known ADC file (`gcloud auth application-default login`).
fn well_known_adc_path(config: &AdminConfig) -> Option<PathBuf> {
    config
        .gcloud_config_dir
        .as_ref()
        .map(|dir| dir.join("application_default_credentials.json"))
}

async fn metadata_server_available(host: &str) -> bool {
    let client = match reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(2))
        .build()
    {
        Ok(client) => client,
        Err(_) => return false,
    };

    match client
        .get(format!("http://{}/computeMetadata/v1/", host))
        .header("Metadata-Flavor", "Google")
        .send()
        .await
    {
        Ok(response) => response
            .headers()
            .get("Metadata-Flavor")
            .map(|v| v == "Google")
            .unwrap_or(false),
        Err(_) => false,
    }
}

/// Resolves ADC: `GOOGLE_APPLICATION_CREDENTIALS`, then the gcloud file, then the metadata server.
pub async fn application_default_source(config: &AdminConfig) -> Result<CredentialSource> {
    if let Some(path) = &config.application_credentials {
        return CredentialSource::from_file(path).await;
    }

    if let Some(path) = well_known_adc_path(config).filter(|p| p.exists()) {
        return CredentialSource::from_file(&path).await;
    }

    if metadata_server_available(&config.metadata_host).await {
        return Ok(CredentialSource::MetadataServer {
            host: config.metadata_host.clone(),
        });
    }

    Err(AdminError::CredentialsError(
        "Could not find Application Default Credentials".to_string(),
    ))
}

// ==================== BOOTSTRAP ====================

async fn connect(
    config: &AdminConfig,
    source: CredentialSource,
    project_id: &str,
) -> Result<FirestoreDB> {
    let tokens = Arc::new(TokenProvider::new(source, config.request_timeout)?);
    let db = FirestoreDB::new(config, project_id, tokens)?;
    db.health_check().await?;
    Ok(db)
}

/// Opens a verified Firestore session, trying each credential method in order.
///
/// Every attempt logs its outcome. When all of them fail the caller should
/// print [`REMEDIATION`] and stop.
pub async fn initialize_firestore(config: &AdminConfig) -> Result<FirestoreDB> {
    if let Some(host) = &config.emulator_host {
        let db = connect(config, CredentialSource::Emulator, &config.project_id).await?;
        log::info!("🔧 Using Firestore emulator at {}", host);
        return Ok(db);
    }

    // Método 1: Application Default Credentials (gcloud auth)
    let adc = match application_default_source(config).await {
        Ok(source) => connect(config, source, &config.project_id).await,
        Err(e) => Err(e),
    };
    match adc {
        Ok(db) => {
            log::info!("✅ Initialized with Application Default Credentials");
            return Ok(db);
        }
        Err(e) => log::error!("❌ Failed with ADC: {}", e),
    }

    // Método 2: chave de service account, se existir
    let key_path = &config.service_account_key_path;
    if key_path.exists() {
        let attempt = match CredentialSource::from_file(key_path).await {
            Ok(source) => {
                let project_id = source
                    .project_id()
                    .unwrap_or(&config.project_id)
                    .to_string();
                connect(config, source, &project_id).await
            }
            Err(e) => Err(e),
        };
        match attempt {
            Ok(db) => {
                log::info!("✅ Initialized with Service Account Key");
                return Ok(db);
            }
            Err(e) => log::error!("❌ Failed with service account key: {}", e),
        }
    } else {
        log::debug!("No service account key at {}", key_path.display());
    }

    Err(AdminError::CredentialsError(
        "no credential method succeeded".to_string(),
    ))
}

/// Opens the session, or prints the remediation text and returns `None`.
pub async fn open_session(config: &AdminConfig) -> Option<FirestoreDB> {
    match initialize_firestore(config).await {
        Ok(db) => Some(db),
        Err(e) => {
            log::debug!("Credential bootstrap failed: {}", e);
            println!("\n❌ Failed to initialize Firebase!\n");
            println!("{}", REMEDIATION);
            None
        }
    }
}
