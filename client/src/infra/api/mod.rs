//! Remote gateway implementations.

pub mod http;

use derive_more::{Display, Error as StdError, From};
use secrecy::SecretBox;

use crate::domain::user::{
    self,
    session::{AccessToken, RefreshToken},
};

pub use self::http::Http;

/// Remote gateway operation.
pub use common::Handler as Api;

/// Operation payload signing a user in by credentials.
#[derive(Clone, Debug)]
pub struct SignIn {
    /// [`user::Login`] to sign in with.
    pub login: user::Login,

    /// [`user::Password`] to sign in with.
    pub password: SecretBox<user::Password>,
}

/// Operation payload exchanging a [`RefreshToken`] for a fresh [`Grant`].
#[derive(Clone, Debug)]
pub struct RefreshGrant {
    /// [`RefreshToken`] to exchange.
    pub refresh_token: RefreshToken,
}

/// Token grant returned by the authentication endpoints.
#[derive(Clone, Debug)]
pub struct Grant {
    /// Granted [`AccessToken`].
    pub access_token: AccessToken,

    /// Granted [`RefreshToken`].
    ///
    /// The remote may omit it when the previous one stays valid.
    pub refresh_token: Option<RefreshToken>,
}

/// Wrapper attaching a bearer [`AccessToken`] to an operation.
#[derive(Clone, Debug)]
pub struct Bearing<Op> {
    /// [`AccessToken`] to authorize the operation with, if any.
    pub token: Option<AccessToken>,

    /// Wrapped operation.
    pub op: Op,
}

/// [`Api`] gateway error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// Transport-level failure: the remote was unreachable or the
    /// connection broke down.
    #[display("transport failed: {_0}")]
    Transport(reqwest::Error),

    /// Remote replied with a non-success status.
    #[display("remote replied with `{_0}` status")]
    #[from(ignore)]
    Status(#[error(not(source))] reqwest::StatusCode),

    /// Remote payload failed to map onto the domain.
    #[display("malformed remote payload: {_0}")]
    #[from(ignore)]
    MalformedPayload(#[error(not(source))] String),
}

impl Error {
    /// Indicates whether this [`Error`] is an authentication rejection,
    /// i.e. the remote refused the presented credentials or token.
    #[must_use]
    pub fn is_auth_rejection(&self) -> bool {
        match self {
            Self::Status(status) => {
                *status == reqwest::StatusCode::UNAUTHORIZED
                    || *status == reqwest::StatusCode::FORBIDDEN
            }
            Self::Transport(_) | Self::MalformedPayload(_) => false,
        }
    }
}
