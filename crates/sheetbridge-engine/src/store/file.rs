use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use sheetbridge_core::{Credential, ProviderKind};
use sheetbridge_providers::BoxFuture;
use tracing::debug;

use super::{TokenStore, TokenUpdate, UserTokens, apply_update};
use crate::error::StoreResult;

type TokenFile = BTreeMap<String, UserTokens>;

/// Token store backed by a single JSON file.
///
/// The file maps user ids to their credentials. Every change rewrites the
/// whole file through a temporary file and a rename, and the result is only
/// readable by the owner on Unix. Writes from this process are serialized;
/// sharing one file between processes is not supported.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn load(&self) -> StoreResult<TokenFile> {
        if !self.path.exists() {
            debug!("no token file at {:?}", self.path);
            return Ok(TokenFile::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(TokenFile::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, file: &TokenFile) -> StoreResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        // Write to temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, serde_json::to_string_pretty(file)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600))?;
        }

        fs::rename(&temp_path, &self.path)?;
        debug!("saved tokens to {:?}", self.path);
        Ok(())
    }

    /// Stores a full credential, replacing any existing one.
    pub fn replace(
        &self,
        user_id: &str,
        provider: ProviderKind,
        credential: Credential,
    ) -> StoreResult<()> {
        let _guard = self.lock();
        let mut file = self.load()?;
        file.entry(user_id.to_string())
            .or_default()
            .insert(provider, credential);
        self.save(&file)
    }

    /// Deletes a credential. Returns it if one was stored.
    pub fn remove(&self, user_id: &str, provider: ProviderKind) -> StoreResult<Option<Credential>> {
        let _guard = self.lock();
        let mut file = self.load()?;
        let Some(tokens) = file.get_mut(user_id) else {
            return Ok(None);
        };
        let removed = tokens.remove(provider);
        if removed.is_none() {
            return Ok(None);
        }
        if tokens.is_empty() {
            file.remove(user_id);
        }
        self.save(&file)?;
        Ok(removed)
    }

    /// Ids of every user with at least one stored credential.
    pub fn users(&self) -> StoreResult<Vec<String>> {
        Ok(self.load()?.into_keys().collect())
    }
}

impl TokenStore for FileTokenStore {
    fn read<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, StoreResult<Option<UserTokens>>> {
        Box::pin(async move { Ok(self.load()?.remove(user_id)) })
    }

    fn write<'a>(
        &'a self,
        user_id: &'a str,
        update: TokenUpdate,
    ) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(async move {
            let _guard = self.lock();
            let mut file = self.load()?;
            apply_update(file.get_mut(user_id), user_id, &update)?;
            self.save(&file)
        })
    }
}
