//! Token vault implementations.

#[cfg(feature = "fs")]
pub mod file;

use derive_more::{Display, Error as StdError, From};

#[cfg(feature = "fs")]
pub use self::file::File;

/// Token vault operation.
///
/// Purely storage: no token validation happens here.
pub use common::Handler as Vault;

/// [`Vault`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    #[cfg(feature = "fs")]
    /// [`File`] vault error.
    File(file::Error),
}
