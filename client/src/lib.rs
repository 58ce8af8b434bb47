//! Client contains the session and gateway logic of the marketplace
//! front-end.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod infra;
pub mod query;
pub mod read;
pub mod task;

use std::{
    sync::{Arc, PoisonError, RwLock},
    time,
};

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use serde::Deserialize;
use smart_default::SmartDefault;
use tokio::sync::{watch, Mutex};

use crate::{command::refresh_session, domain::user::session::Session};

pub use self::{command::Command, query::Query, task::Task};

/// [`Client`] configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote gateway configuration.
    pub gateway: Gateway,

    /// [`task::AwaitPaymentReview`] configuration.
    pub review_poll: task::await_payment_review::Config,

    /// Token vault configuration.
    pub vault: Vault,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Remote gateway configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Gateway {
    /// Base URL the gateway endpoints are resolved against.
    #[default("http://127.0.0.1:8080/api".to_owned())]
    pub base_url: String,

    /// Timeout of a single gateway request.
    #[default(time::Duration::from_secs(30))]
    #[serde(with = "humantime_serde")]
    pub request_timeout: time::Duration,
}

/// Token vault configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Vault {
    /// Path of the vault state file.
    #[default("tokens.json".to_owned())]
    pub path: String,
}

/// Marketplace client.
///
/// Owns the single [`Session`] state of the application: screens read it
/// through [`Client::session()`], but only [`Command`]s of this [`Client`]
/// ever mutate it.
#[derive(Clone, Debug)]
pub struct Client<Api, Vault> {
    /// Configuration of this [`Client`].
    config: Config,

    /// Remote gateway of this [`Client`].
    api: Api,

    /// Token vault of this [`Client`].
    vault: Vault,

    /// State shared between clones of this [`Client`].
    state: Arc<State>,
}

impl<Api, Vault> Client<Api, Vault> {
    /// Creates a new [`Client`] with the provided parameters.
    ///
    /// The [`Session`] starts out as [`Session::Loading`] until hydrated by
    /// [`command::InitializeSession`].
    pub fn new(config: Config, api: Api, vault: Vault) -> Self {
        Self {
            config,
            api,
            vault,
            state: Arc::new(State::default()),
        }
    }

    /// Returns [`Config`] of this [`Client`].
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the remote gateway of this [`Client`].
    #[must_use]
    pub fn api(&self) -> &Api {
        &self.api
    }

    /// Returns the token vault of this [`Client`].
    #[must_use]
    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    /// Returns a snapshot of the current [`Session`].
    #[must_use]
    pub fn session(&self) -> Session {
        self.state
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Applies the provided `patch` to the current [`Session`] state.
    ///
    /// Updates are merges against the current state rather than whole-state
    /// overwrites, so a slow suspended operation cannot clobber fields
    /// already updated by a faster concurrent one.
    fn patch_session(&self, patch: impl FnOnce(&mut Session)) {
        patch(
            &mut self
                .state
                .session
                .write()
                .unwrap_or_else(PoisonError::into_inner),
        );
    }
}

/// State shared between clones of a [`Client`].
#[derive(Debug, Default)]
struct State {
    /// Current [`Session`].
    session: RwLock<Session>,

    /// Subscription to the token refresh being in flight, if any.
    ///
    /// Guards the single-flight discipline: while this is [`Some`], no new
    /// refresh may be started, and concurrent triggers subscribe to the
    /// in-flight one instead.
    refresh: Mutex<Option<watch::Receiver<Option<refresh_session::Outcome>>>>,
}
