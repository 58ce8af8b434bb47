//! [`Command`] for hydrating the [`Session`] at application start.

use std::convert::Infallible;

use common::operations::Load;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        cart,
        user::{
            session::{self, Claims, ExpirationDateTime, Session, Tokens},
            Role,
        },
    },
    infra::vault,
    Client,
};

use super::{refresh_session, Command, RefreshCartCount, RefreshSession};

/// [`Command`] for hydrating the [`Session`] from the vault, run once at
/// application start.
///
/// Until it settles, the [`Session`] stays [`Session::Loading`] and screens
/// should render a placeholder. Every failure is absorbed: the worst
/// possible outcome is an anonymous session, never an error surfaced to the
/// application shell.
#[derive(Clone, Copy, Debug)]
pub struct InitializeSession;

impl<A, V> Command<InitializeSession> for Client<A, V>
where
    V: vault::Vault<Load, Ok = Tokens, Err = Traced<vault::Error>>,
    Self: Command<
            RefreshSession,
            Ok = refresh_session::Outcome,
            Err = Infallible,
        > + Command<RefreshCartCount, Ok = cart::ItemCount, Err = Infallible>,
{
    /// Settled [`Session`] snapshot.
    type Ok = Session;
    type Err = Infallible;

    async fn execute(
        &self,
        _: InitializeSession,
    ) -> Result<Self::Ok, Self::Err> {
        let tokens = match self.vault().execute(Load).await {
            Ok(tokens) => tokens,
            Err(e) => {
                log::warn!("token vault is unreadable: {e}");
                Tokens::default()
            }
        };

        let authenticated = match tokens {
            // Without a refresh token nothing can be recovered: finalize as
            // anonymous without any remote call.
            Tokens { refresh: None, .. } => {
                self.patch_session(|s| *s = Session::Anonymous);
                false
            }

            Tokens {
                access: None,
                refresh: Some(refresh_token),
            } => {
                let Ok(outcome) =
                    self.execute(RefreshSession { refresh_token }).await;
                outcome.is_renewed()
            }

            Tokens {
                access: Some(access),
                refresh: Some(refresh_token),
            } => match Self::restore(&access) {
                Some((claims, role)) => {
                    self.patch_session(|s| {
                        let cart_items = s.cart_items();
                        *s = Session::Authenticated(session::Authenticated {
                            login: claims.sub,
                            role,
                            cart_items,
                            tokens: session::TokenPair {
                                access,
                                refresh: refresh_token,
                            },
                        });
                    });
                    true
                }
                // Expired or undecodable: both mean a refresh is due.
                None => {
                    let Ok(outcome) =
                        self.execute(RefreshSession { refresh_token }).await;
                    outcome.is_renewed()
                }
            },
        };

        if authenticated {
            _ = self.execute(RefreshCartCount).await;
        }

        Ok(self.session())
    }
}

impl<A, V> Client<A, V> {
    /// Restores usable [`Claims`] out of a persisted access token.
    ///
    /// [`None`] means the token is expired or undecodable and the session
    /// must be refreshed instead.
    fn restore(access: &session::AccessToken) -> Option<(Claims, Role)> {
        let claims = Claims::decode(access)
            .map_err(|e| log::debug!("persisted access token: {e}"))
            .ok()?;
        if claims.is_expired_at(ExpirationDateTime::now()) {
            return None;
        }
        let role = claims
            .role()
            .map_err(|e| log::debug!("persisted access token: {e}"))
            .ok()?;
        Some((claims, role))
    }
}
