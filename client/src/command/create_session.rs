//! [`Command`] for creating a [`Session`].

use std::convert::Infallible;

use common::operations::{Perform, Store};
use derive_more::{Display, Error, From};
use secrecy::SecretBox;
use tracerr::Traced;

use crate::{
    domain::{
        cart,
        user::{
            self,
            session::{self, Claims, Session, TokenPair},
        },
    },
    infra::{api, vault},
    Client,
};

use super::{Command, RefreshCartCount};

/// [`Command`] for creating a [`Session`] by user credentials.
#[derive(Clone, Debug)]
pub struct CreateSession {
    /// [`user::Login`] to sign in with.
    pub login: user::Login,

    /// [`user::Password`] to sign in with.
    pub password: SecretBox<user::Password>,
}

impl<A, V> Command<CreateSession> for Client<A, V>
where
    A: api::Api<
        Perform<api::SignIn>,
        Ok = api::Grant,
        Err = Traced<api::Error>,
    >,
    V: vault::Vault<Store<TokenPair>, Ok = (), Err = Traced<vault::Error>>,
    Self: Command<RefreshCartCount, Ok = cart::ItemCount, Err = Infallible>,
{
    /// Resolved [`user::Role`], for the caller's routing decision.
    type Ok = user::Role;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let grant = self
            .api()
            .execute(Perform(api::SignIn {
                login: cmd.login,
                password: cmd.password,
            }))
            .await
            .map_err(|e| {
                if e.as_ref().is_auth_rejection() {
                    tracerr::new!(E::WrongCredentials)
                } else {
                    tracerr::map_from_and_wrap!(=> E)(e)
                }
            })?;

        let refresh = grant
            .refresh_token
            .ok_or_else(|| tracerr::new!(E::MissingRefreshToken))?;
        let pair = TokenPair {
            access: grant.access_token,
            refresh,
        };

        let claims = Claims::decode(&pair.access)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        let role = claims.role().map_err(tracerr::from_and_wrap!(=> E))?;

        self.vault()
            .execute(Store(pair.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        self.patch_session(|s| {
            *s = Session::Authenticated(session::Authenticated {
                login: claims.sub,
                role,
                tokens: pair,
                cart_items: cart::ItemCount::default(),
            });
        });

        // Cart count failures never fail a sign-in.
        _ = self.execute(RefreshCartCount).await;

        Ok(role)
    }
}

/// Error of [`CreateSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Remote gateway failed the sign-in for a non-credential reason.
    #[display("remote sign-in failed: {_0}")]
    Api(api::Error),

    /// Granted access token failed to decode.
    #[display("failed to decode the granted access token: {_0}")]
    Decode(session::DecodeError),

    /// Remote granted no refresh token on sign-in.
    #[display("remote granted no refresh token")]
    MissingRefreshToken,

    /// Granted token pair failed to persist.
    #[display("failed to persist the granted token pair: {_0}")]
    Vault(vault::Error),

    /// Provided credentials are wrong.
    #[display("wrong user credentials")]
    WrongCredentials,
}
