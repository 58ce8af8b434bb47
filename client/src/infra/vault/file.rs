//! [`File`]-backed [`Vault`] implementation.
//!
//! [`Vault`]: super::Vault

use std::{io, path::PathBuf};

use common::{
    operations::{Clear, Load, Store},
    Handler,
};
use derive_more::{Display, Error as StdError, From};
use serde::{Deserialize, Serialize};
use tracerr::Traced;

use crate::domain::user::session::{TokenPair, Tokens};

/// [`Vault`] persisting the token pair in a JSON state file.
///
/// [`Vault`]: super::Vault
#[derive(Clone, Debug)]
pub struct File {
    /// Path of the state file.
    path: PathBuf,
}

impl File {
    /// Creates a new [`File`] vault persisting into the provided `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Persisted shape of the state file.
#[derive(Debug, Default, Deserialize, Serialize)]
struct Entries {
    /// Persisted access token entry.
    access_token: Option<String>,

    /// Persisted refresh token entry.
    refresh_token: Option<String>,
}

impl Handler<Load> for File {
    type Ok = Tokens;
    type Err = Traced<super::Error>;

    async fn execute(&self, _: Load) -> Result<Self::Ok, Self::Err> {
        use Error as E;

        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(Tokens::default());
            }
            Err(e) => {
                return Err(tracerr::new!(super::Error::from(E::Io(e))));
            }
        };

        let entries: Entries = serde_json::from_slice(&raw)
            .map_err(E::from)
            .map_err(tracerr::from_and_wrap!(=> super::Error))?;

        Ok(Tokens {
            access: entries.access_token.map(Into::into),
            refresh: entries.refresh_token.map(Into::into),
        })
    }
}

impl Handler<Store<TokenPair>> for File {
    type Ok = ();
    type Err = Traced<super::Error>;

    async fn execute(
        &self,
        Store(pair): Store<TokenPair>,
    ) -> Result<Self::Ok, Self::Err> {
        use Error as E;

        let entries = Entries {
            access_token: Some(pair.access.into()),
            refresh_token: Some(pair.refresh.into()),
        };
        let raw = serde_json::to_vec(&entries)
            .map_err(E::from)
            .map_err(tracerr::from_and_wrap!(=> super::Error))?;

        tokio::fs::write(&self.path, raw)
            .await
            .map_err(E::from)
            .map_err(tracerr::from_and_wrap!(=> super::Error))
    }
}

impl Handler<Clear> for File {
    type Ok = ();
    type Err = Traced<super::Error>;

    async fn execute(&self, _: Clear) -> Result<Self::Ok, Self::Err> {
        use Error as E;

        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(tracerr::new!(super::Error::from(E::Io(e)))),
        }
    }
}

/// [`File`] vault error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// I/O operation failed.
    #[display("I/O operation failed: {_0}")]
    Io(io::Error),

    /// State file contents are malformed.
    #[display("state file is malformed: {_0}")]
    Malformed(serde_json::Error),
}

#[cfg(test)]
mod spec {
    use common::operations::{Clear, Load, Store};
    use common::Handler as _;

    use crate::domain::user::session::TokenPair;

    use super::File;

    fn vault(dir: &tempfile::TempDir) -> File {
        File::new(dir.path().join("tokens.json"))
    }

    #[tokio::test]
    async fn load_of_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();

        let tokens = vault(&dir).execute(Load).await.unwrap();
        assert!(tokens.access.is_none());
        assert!(tokens.refresh.is_none());
    }

    #[tokio::test]
    async fn stores_and_loads_both_entries() {
        let dir = tempfile::tempdir().unwrap();
        let vault = vault(&dir);

        vault
            .execute(Store(TokenPair {
                access: "access".to_owned().into(),
                refresh: "refresh".to_owned().into(),
            }))
            .await
            .unwrap();

        let tokens = vault.execute(Load).await.unwrap();
        assert_eq!(tokens.access.unwrap(), "access".to_owned().into());
        assert_eq!(tokens.refresh.unwrap(), "refresh".to_owned().into());
    }

    #[tokio::test]
    async fn clear_removes_both_entries_together() {
        let dir = tempfile::tempdir().unwrap();
        let vault = vault(&dir);

        vault
            .execute(Store(TokenPair {
                access: "access".to_owned().into(),
                refresh: "refresh".to_owned().into(),
            }))
            .await
            .unwrap();
        vault.execute(Clear).await.unwrap();

        let tokens = vault.execute(Load).await.unwrap();
        assert!(tokens.access.is_none());
        assert!(tokens.refresh.is_none());
    }

    #[tokio::test]
    async fn clear_of_missing_file_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();

        vault(&dir).execute(Clear).await.unwrap();
    }

    #[tokio::test]
    async fn load_of_malformed_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        std::fs::write(&path, b"not json").unwrap();

        assert!(File::new(path).execute(Load).await.is_err());
    }
}
