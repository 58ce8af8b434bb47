//! [`Command`] for destroying the current [`Session`].

use std::convert::Infallible;

use common::operations::Clear;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::user::session::Session,
    infra::vault,
    Client,
};

use super::Command;

/// [`Command`] for destroying the current [`Session`].
///
/// Resets the [`Session`] to [`Session::Anonymous`] synchronously and clears
/// the vault. No remote call is involved, and the outcome is the same from
/// any prior state.
#[derive(Clone, Copy, Debug)]
pub struct DestroySession;

impl<A, V> Command<DestroySession> for Client<A, V>
where
    V: vault::Vault<Clear, Ok = (), Err = Traced<vault::Error>>,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        _: DestroySession,
    ) -> Result<Self::Ok, Self::Err> {
        // State is reset before the vault is touched, so readers observe
        // the anonymous session immediately.
        self.patch_session(|s| *s = Session::Anonymous);

        if let Err(e) = self.vault().execute(Clear).await {
            log::warn!("failed to clear the token vault: {e}");
        }

        Ok(())
    }
}
