//! Session identity.
//!
//! Every stored collection is partitioned by the user id resolved here. The
//! identity survives restarts through `identity.yaml` in the data directory.
//! Resolution order:
//!
//! 1. the identity already persisted by a previous run
//! 2. the configured custom token, when present and well formed
//! 3. a fresh anonymous id (UUID v4)
//!
//! Any failure along the way still yields a usable session with the fixed
//! id `anonymous`, so the application never blocks on sign-in.

use anyhow::{bail, Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const IDENTITY_FILE: &str = "identity.yaml";
const FALLBACK_USER_ID: &str = "anonymous";
const MAX_TOKEN_LENGTH: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignInMethod {
    CustomToken,
    Anonymous,
}

/// How the current session was established
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSource {
    Restored(SignInMethod),
    New(SignInMethod),
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub source: SessionSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct IdentityRecord {
    user_id: String,
    method: SignInMethod,
}

#[derive(Debug, Clone)]
pub struct IdentityService {
    identity_file: PathBuf,
    custom_token: Option<String>,
}

impl IdentityService {
    pub fn new<P: AsRef<Path>>(data_directory: P, custom_token: Option<String>) -> Self {
        Self {
            identity_file: data_directory.as_ref().join(IDENTITY_FILE),
            custom_token,
        }
    }

    /// Resolve the session identity. Never fails.
    pub async fn sign_in(&self) -> Session {
        match self.resolve() {
            Ok(session) => session,
            Err(e) => {
                warn!("Sign-in failed, continuing as '{}': {:#}", FALLBACK_USER_ID, e);
                Session {
                    user_id: FALLBACK_USER_ID.to_string(),
                    source: SessionSource::Fallback,
                }
            }
        }
    }

    fn resolve(&self) -> Result<Session> {
        if let Some(record) = self.load_record()? {
            info!("Restored {:?} session for user {}", record.method, record.user_id);
            return Ok(Session {
                user_id: record.user_id,
                source: SessionSource::Restored(record.method),
            });
        }

        let record = match self.custom_token.as_deref() {
            Some(token) => {
                validate_token(token)?;
                IdentityRecord {
                    user_id: token.to_string(),
                    method: SignInMethod::CustomToken,
                }
            }
            None => IdentityRecord {
                user_id: uuid::Uuid::new_v4().to_string(),
                method: SignInMethod::Anonymous,
            },
        };

        self.save_record(&record)?;
        info!("Signed in as new {:?} user {}", record.method, record.user_id);
        Ok(Session {
            user_id: record.user_id,
            source: SessionSource::New(record.method),
        })
    }

    fn load_record(&self) -> Result<Option<IdentityRecord>> {
        if !self.identity_file.exists() {
            return Ok(None);
        }
        let yaml = std::fs::read_to_string(&self.identity_file)
            .with_context(|| format!("Failed to read {:?}", self.identity_file))?;
        let record: IdentityRecord = serde_yaml::from_str(&yaml)
            .with_context(|| format!("Failed to parse {:?}", self.identity_file))?;
        validate_token(&record.user_id)?;
        Ok(Some(record))
    }

    fn save_record(&self, record: &IdentityRecord) -> Result<()> {
        if let Some(parent) = self.identity_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(record)?;
        let temp = self.identity_file.with_extension("yaml.tmp");
        std::fs::write(&temp, yaml)?;
        std::fs::rename(&temp, &self.identity_file)
            .with_context(|| format!("Failed to write {:?}", self.identity_file))?;
        Ok(())
    }
}

/// A user id doubles as a directory name, so only `[A-Za-z0-9_-]` is allowed
fn validate_token(token: &str) -> Result<()> {
    if token.is_empty() || token.len() > MAX_TOKEN_LENGTH {
        bail!("user id must be between 1 and {} characters", MAX_TOKEN_LENGTH);
    }
    if !token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        bail!("user id '{}' contains characters outside [A-Za-z0-9_-]", token);
    }
    Ok(())
}
