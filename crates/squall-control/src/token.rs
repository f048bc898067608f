use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::error::ControlError;

/// Token value, takes precedence over the store.
pub const TOKEN_ENV: &str = "SQUALL_TOKEN";
/// Path to a file holding the token, takes precedence over [`TOKEN_ENV`].
pub const TOKEN_FILE_ENV: &str = "SQUALL_TOKEN_FILE";

/// Persistent storage for the API token.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Result<Option<String>, ControlError>;
    fn set(&self, token: &str) -> Result<(), ControlError>;
    /// Removing a token that was never stored succeeds.
    fn delete(&self) -> Result<(), ControlError>;
    /// Where the token lives, for messages to the user.
    fn location(&self) -> String;
}

/// Token kept in a single owner-readable file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<user config dir>/squall/token`.
    pub fn default_location() -> Result<Self, ControlError> {
        let base = dirs::config_dir()
            .ok_or_else(|| ControlError::Store("no user config directory".into()))?;
        Ok(Self::new(base.join("squall").join("token")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Result<Option<String>, ControlError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ControlError::Store(format!(
                "read {}: {e}",
                self.path.display()
            ))),
        }
    }

    fn set(&self, token: &str) -> Result<(), ControlError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ControlError::Store(format!("create {}: {e}", parent.display()))
            })?;
        }
        fs::write(&self.path, token.trim())
            .map_err(|e| ControlError::Store(format!("write {}: {e}", self.path.display())))?;
        restrict(&self.path)?;
        debug!(target: "squall.control", path = %self.path.display(), "token stored");
        Ok(())
    }

    fn delete(&self) -> Result<(), ControlError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ControlError::Store(format!(
                "remove {}: {e}",
                self.path.display()
            ))),
        }
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Token kept in the OS credential store.
#[cfg(feature = "keyring")]
pub struct KeyringTokenStore {
    entry: keyring::Entry,
}

#[cfg(feature = "keyring")]
impl KeyringTokenStore {
    pub const SERVICE: &'static str = "squall";
    pub const USER: &'static str = "api-token";

    pub fn new() -> Result<Self, ControlError> {
        let entry = keyring::Entry::new(Self::SERVICE, Self::USER)
            .map_err(|e| ControlError::Store(format!("open keyring entry: {e}")))?;
        Ok(Self { entry })
    }
}

#[cfg(feature = "keyring")]
impl TokenStore for KeyringTokenStore {
    fn get(&self) -> Result<Option<String>, ControlError> {
        match self.entry.get_password() {
            Ok(raw) => {
                let token = raw.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(ControlError::Store(format!("read keyring: {e}"))),
        }
    }

    fn set(&self, token: &str) -> Result<(), ControlError> {
        self.entry
            .set_password(token.trim())
            .map_err(|e| ControlError::Store(format!("write keyring: {e}")))?;
        debug!(target: "squall.control", service = Self::SERVICE, "token stored in keyring");
        Ok(())
    }

    fn delete(&self) -> Result<(), ControlError> {
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(ControlError::Store(format!("remove from keyring: {e}"))),
        }
    }

    fn location(&self) -> String {
        format!("the OS keyring (service {:?})", Self::SERVICE)
    }
}

#[cfg(unix)]
fn restrict(path: &Path) -> Result<(), ControlError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .map_err(|e| ControlError::Store(format!("chmod {}: {e}", path.display())))
}

#[cfg(not(unix))]
fn restrict(_path: &Path) -> Result<(), ControlError> {
    Ok(())
}

/// Find the API token: token file variable, then token variable, then the store.
///
/// `lookup` reads an environment variable; empty values count as unset.
pub fn resolve_token<F>(lookup: F, store: &dyn TokenStore) -> Result<String, ControlError>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(path) = var(TOKEN_FILE_ENV) {
        let path = PathBuf::from(path);
        let raw = fs::read_to_string(&path)
            .map_err(|source| ControlError::TokenFile { path, source })?;
        return Ok(raw.trim().to_string());
    }
    if let Some(token) = var(TOKEN_ENV) {
        return Ok(token.trim().to_string());
    }
    store.get()?.ok_or(ControlError::TokenNotFound)
}

/// [`resolve_token`] against the process environment.
pub fn resolve_token_from_env(store: &dyn TokenStore) -> Result<String, ControlError> {
    resolve_token(|name| std::env::var(name).ok(), store)
}
