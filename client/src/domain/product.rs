//! [`Product`] definitions.

use std::{str::FromStr, sync::LazyLock};

use common::Money;
use derive_more::{AsRef, Display, From, Into};
use regex::Regex;
use uuid::Uuid;

use crate::domain::user;

/// Digital design asset sold on the marketplace.
#[derive(Clone, Debug)]
pub struct Product {
    /// ID of this [`Product`].
    pub id: Id,

    /// [`Title`] of this [`Product`].
    pub title: Title,

    /// Price of this [`Product`].
    pub price: Money,

    /// [`user::Login`] of the creator selling this [`Product`].
    pub seller: user::Login,
}

/// ID of a [`Product`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Display,
    Eq,
    From,
    derive_more::FromStr,
    Hash,
    Into,
    PartialEq,
)]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Title of a [`Product`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
pub struct Title(String);

impl Title {
    /// Creates a new [`Title`] if the given `title` is valid.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Option<Self> {
        let title = title.into();
        Self::check(&title).then_some(Self(title))
    }

    /// Checks whether the given `title` is a valid [`Title`].
    fn check(title: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Title`] invariants:
        /// - Must not be empty or whitespace-padded;
        /// - Must be between 1 and 256 characters long.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^\S(.{0,254}\S)?$").expect("valid regex")
        });

        REGEX.is_match(title.as_ref())
    }
}

impl FromStr for Title {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Title`")
    }
}
