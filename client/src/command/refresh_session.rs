//! [`Command`] for refreshing a [`Session`].

use std::convert::Infallible;

use common::operations::{Clear, Perform, Store};
use derive_more::{Display, Error, From};
use tokio::sync::watch;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::user::session::{
        self, AccessToken, Claims, RefreshToken, Session, TokenPair,
    },
    infra::{api, vault},
    Client,
};

use super::Command;

/// [`Command`] for refreshing a [`Session`] with a [`RefreshToken`].
///
/// Single-flight: while one refresh is in flight, concurrent executions
/// subscribe to its completion instead of issuing a duplicate remote call,
/// and resolve with the same [`Outcome`].
#[derive(Clone, Debug, From)]
pub struct RefreshSession {
    /// [`RefreshToken`] to exchange for a fresh token pair.
    pub refresh_token: RefreshToken,
}

/// Outcome of a [`RefreshSession`] [`Command`].
///
/// A failed refresh is terminal for the current [`Session`]: the vault is
/// cleared and the [`Session`] becomes [`Session::Anonymous`]. No navigation
/// is forced, though: callers decide what the UI does about it.
#[derive(Clone, Debug)]
pub enum Outcome {
    /// [`Session`] was renewed with the carried [`AccessToken`].
    Renewed(AccessToken),

    /// Refresh failed and the [`Session`] is anonymous now.
    Expired,
}

impl Outcome {
    /// Indicates whether this [`Outcome`] renewed the [`Session`].
    #[must_use]
    pub fn is_renewed(&self) -> bool {
        matches!(self, Self::Renewed(_))
    }
}

impl<A, V> Command<RefreshSession> for Client<A, V>
where
    A: api::Api<
        Perform<api::RefreshGrant>,
        Ok = api::Grant,
        Err = Traced<api::Error>,
    >,
    V: vault::Vault<Store<TokenPair>, Ok = (), Err = Traced<vault::Error>>
        + vault::Vault<Clear, Ok = (), Err = Traced<vault::Error>>,
{
    type Ok = Outcome;
    type Err = Infallible;

    async fn execute(
        &self,
        cmd: RefreshSession,
    ) -> Result<Self::Ok, Self::Err> {
        let tx = {
            let mut guard = self.state.refresh.lock().await;
            if let Some(rx) = &*guard {
                // Subscribe to the refresh already in flight instead of
                // issuing a duplicate remote call.
                let mut rx = rx.clone();
                drop(guard);
                loop {
                    if let Some(outcome) = rx.borrow().clone() {
                        return Ok(outcome);
                    }
                    if rx.changed().await.is_err() {
                        return Ok(Outcome::Expired);
                    }
                }
            }

            let (tx, rx) = watch::channel(None);
            *guard = Some(rx);
            tx
        };

        let result = self.renew(cmd.refresh_token).await;

        // The in-flight guard is released on every path, errors included.
        *self.state.refresh.lock().await = None;

        let outcome = match result {
            Ok(access_token) => Outcome::Renewed(access_token),
            Err(e) => {
                log::warn!("`Session` refresh failed: {e}");
                self.expire().await;
                Outcome::Expired
            }
        };
        _ = tx.send(Some(outcome.clone()));

        Ok(outcome)
    }
}

impl<A, V> Client<A, V>
where
    A: api::Api<
        Perform<api::RefreshGrant>,
        Ok = api::Grant,
        Err = Traced<api::Error>,
    >,
    V: vault::Vault<Store<TokenPair>, Ok = (), Err = Traced<vault::Error>>
        + vault::Vault<Clear, Ok = (), Err = Traced<vault::Error>>,
{
    /// Exchanges the `refresh_token` remotely and merges the renewed
    /// [`Session`] in.
    async fn renew(
        &self,
        refresh_token: RefreshToken,
    ) -> Result<AccessToken, Traced<ExecutionError>> {
        use ExecutionError as E;

        let grant = self
            .api()
            .execute(Perform(api::RefreshGrant {
                refresh_token: refresh_token.clone(),
            }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // The remote may omit a rotated refresh token: keep using the old
        // one then.
        let pair = TokenPair {
            access: grant.access_token,
            refresh: grant.refresh_token.unwrap_or(refresh_token),
        };

        let claims =
            Claims::decode(&pair.access).map_err(tracerr::from_and_wrap!(=> E))?;
        let role = claims.role().map_err(tracerr::from_and_wrap!(=> E))?;

        self.vault()
            .execute(Store(pair.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let access = pair.access.clone();
        self.patch_session(|s| {
            let cart_items = s.cart_items();
            *s = Session::Authenticated(session::Authenticated {
                login: claims.sub,
                role,
                cart_items,
                tokens: pair,
            });
        });

        Ok(access)
    }

    /// Clears the vault and merges the [`Session`] to anonymous.
    async fn expire(&self) {
        if let Err(e) = self.vault().execute(Clear).await {
            log::warn!("failed to clear the token vault: {e}");
        }
        self.patch_session(|s| *s = Session::Anonymous);
    }
}

/// Error of a [`RefreshSession`] renewal attempt.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Remote gateway rejected the exchange or was unreachable.
    #[display("remote refresh failed: {_0}")]
    Api(api::Error),

    /// Renewed access token failed to decode.
    #[display("failed to decode the renewed access token: {_0}")]
    Decode(session::DecodeError),

    /// Renewed token pair failed to persist.
    #[display("failed to persist the renewed token pair: {_0}")]
    Vault(vault::Error),
}
