//! [`Command`] definition.

pub mod authorized;
pub mod create_session;
pub mod destroy_session;
pub mod initialize_session;
pub mod refresh_cart_count;
pub mod refresh_session;

/// [`Command`] of the [`Client`].
///
/// [`Client`]: crate::Client
pub use common::Handler as Command;

pub use self::{
    authorized::Authorized, create_session::CreateSession,
    destroy_session::DestroySession, initialize_session::InitializeSession,
    refresh_cart_count::RefreshCartCount, refresh_session::RefreshSession,
};
