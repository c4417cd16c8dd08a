use anyhow::{Context, Result};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use super::{HolidayRepository, RequestRepository, SettingsRepository};
use crate::storage::feed::LiveCollections;
use crate::storage::traits::Connection;

const USERS_DIRECTORY: &str = "users";
const REQUESTS_FILE: &str = "vacation_requests.csv";
const HOLIDAYS_FILE: &str = "holidays.csv";
const SETTINGS_FILE: &str = "settings.yaml";

/// CsvConnection manages the data directory and the per-user file paths
#[derive(Clone)]
pub struct CsvConnection {
    base_directory: PathBuf,
    collections: LiveCollections,
}

impl CsvConnection {
    /// Create a new CSV connection with a base directory, creating it if needed
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path)
                .with_context(|| format!("Failed to create data directory {:?}", base_path))?;
            info!("Created data directory {:?}", base_path);
        }

        Ok(Self {
            base_directory: base_path,
            collections: LiveCollections::default(),
        })
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    pub(crate) fn collections(&self) -> &LiveCollections {
        &self.collections
    }

    /// Directory name for a user id, distinct for distinct ids.
    ///
    /// Ids made only of `[A-Za-z0-9_-]` are used as they are. Any other id,
    /// the empty one included, becomes `~` followed by the hex of its bytes,
    /// so it can neither escape the users directory nor collide with a
    /// plain id.
    pub fn safe_directory_name(user_id: &str) -> String {
        let plain = !user_id.is_empty()
            && user_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if plain {
            return user_id.to_string();
        }
        let mut name = String::with_capacity(1 + user_id.len() * 2);
        name.push('~');
        for byte in user_id.bytes() {
            name.push_str(&format!("{:02x}", byte));
        }
        name
    }

    pub fn user_directory(&self, user_id: &str) -> PathBuf {
        self.base_directory
            .join(USERS_DIRECTORY)
            .join(Self::safe_directory_name(user_id))
    }

    /// Get the user directory, creating it on first write
    pub fn ensure_user_directory(&self, user_id: &str) -> Result<PathBuf> {
        let directory = self.user_directory(user_id);
        if !directory.exists() {
            fs::create_dir_all(&directory)
                .with_context(|| format!("Failed to create user directory {:?}", directory))?;
            debug!("Created user directory {:?}", directory);
        }
        Ok(directory)
    }

    pub fn requests_file_path(&self, user_id: &str) -> PathBuf {
        self.user_directory(user_id).join(REQUESTS_FILE)
    }

    pub fn holidays_file_path(&self, user_id: &str) -> PathBuf {
        self.user_directory(user_id).join(HOLIDAYS_FILE)
    }

    pub fn settings_file_path(&self, user_id: &str) -> PathBuf {
        self.user_directory(user_id).join(SETTINGS_FILE)
    }
}

/// Path of the temporary sibling used for atomic writes
pub(crate) fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write to a temporary file, then rename it over `path`
pub(crate) fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let temp = temp_path(path);
    fs::write(&temp, contents).with_context(|| format!("Failed to write {:?}", temp))?;
    fs::rename(&temp, path).with_context(|| format!("Failed to replace {:?}", path))?;
    Ok(())
}

impl Connection for CsvConnection {
    type RequestRepository = RequestRepository;
    type HolidayRepository = HolidayRepository;
    type SettingsRepository = SettingsRepository;

    fn create_request_repository(&self) -> Self::RequestRepository {
        RequestRepository::new(self.clone())
    }

    fn create_holiday_repository(&self) -> Self::HolidayRepository {
        HolidayRepository::new(self.clone())
    }

    fn create_settings_repository(&self) -> Self::SettingsRepository {
        SettingsRepository::new(self.clone())
    }
}
