//! [`Session`] definitions.

use base64::Engine as _;
#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, Error, From, FromStr, Into};
use serde::Deserialize;

use crate::domain::{cart, user};

/// State of the client session.
///
/// Exclusively owned by the client: screens read snapshots of it, but never
/// mutate it directly.
#[derive(Clone, Debug, Default)]
pub enum Session {
    /// Initial hydration has not settled yet.
    ///
    /// Screens should render a placeholder until it does.
    #[default]
    Loading,

    /// No user is signed in.
    Anonymous,

    /// A user is signed in.
    Authenticated(Authenticated),
}

impl Session {
    /// Indicates whether this [`Session`] is still hydrating.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Indicates whether this [`Session`] belongs to a signed-in user.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// Returns the [`user::Role`] of this [`Session`], if signed in.
    #[must_use]
    pub fn role(&self) -> Option<user::Role> {
        match self {
            Self::Authenticated(auth) => Some(auth.role),
            Self::Loading | Self::Anonymous => None,
        }
    }

    /// Returns the [`user::Login`] of this [`Session`], if signed in.
    #[must_use]
    pub fn login(&self) -> Option<&user::Login> {
        match self {
            Self::Authenticated(auth) => Some(&auth.login),
            Self::Loading | Self::Anonymous => None,
        }
    }

    /// Returns the [`AccessToken`] of this [`Session`], if signed in.
    #[must_use]
    pub fn access_token(&self) -> Option<&AccessToken> {
        match self {
            Self::Authenticated(auth) => Some(&auth.tokens.access),
            Self::Loading | Self::Anonymous => None,
        }
    }

    /// Returns the [`RefreshToken`] of this [`Session`], if signed in.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&RefreshToken> {
        match self {
            Self::Authenticated(auth) => Some(&auth.tokens.refresh),
            Self::Loading | Self::Anonymous => None,
        }
    }

    /// Returns the [`cart::ItemCount`] of this [`Session`].
    ///
    /// Zero unless a user is signed in. Only meaningful for the
    /// [`user::Role::Client`] role, and only trusted right after an explicit
    /// refresh.
    #[must_use]
    pub fn cart_items(&self) -> cart::ItemCount {
        match self {
            Self::Authenticated(auth) => auth.cart_items,
            Self::Loading | Self::Anonymous => cart::ItemCount::default(),
        }
    }
}

/// Data of a signed-in [`Session`].
#[derive(Clone, Debug)]
pub struct Authenticated {
    /// [`user::Login`] derived from the access token subject.
    pub login: user::Login,

    /// [`user::Role`] derived from the access token role claim.
    pub role: user::Role,

    /// Token pair the session is authorized with.
    pub tokens: TokenPair,

    /// Count of items in the user's cart.
    pub cart_items: cart::ItemCount,
}

/// Access token of a [`Session`].
///
/// Short-lived opaque bearer credential authorizing gateway calls.
#[derive(AsRef, Clone, Debug, Display, Eq, From, FromStr, Into, PartialEq)]
#[as_ref(str, String)]
pub struct AccessToken(String);

/// Refresh token of a [`Session`].
///
/// Longer-lived opaque credential used solely to obtain a new
/// [`AccessToken`].
#[derive(AsRef, Clone, Debug, Display, Eq, From, FromStr, Into, PartialEq)]
#[as_ref(str, String)]
pub struct RefreshToken(String);

/// Complete token pair of a [`Session`].
#[derive(Clone, Debug)]
pub struct TokenPair {
    /// [`AccessToken`] of the pair.
    pub access: AccessToken,

    /// [`RefreshToken`] of the pair.
    pub refresh: RefreshToken,
}

/// Possibly partial tokens loaded from a vault.
#[derive(Clone, Debug, Default)]
pub struct Tokens {
    /// Persisted [`AccessToken`], if any.
    pub access: Option<AccessToken>,

    /// Persisted [`RefreshToken`], if any.
    pub refresh: Option<RefreshToken>,
}

/// Claims carried in an [`AccessToken`] payload.
#[derive(Clone, Debug, Deserialize)]
pub struct Claims {
    /// Subject claim: [`user::Login`] the token was issued to.
    pub sub: user::Login,

    /// [`DateTime`] when the token expires.
    #[serde(
        rename = "exp",
        with = "common::datetime::serde::unix_timestamp"
    )]
    pub expires_at: ExpirationDateTime,

    /// Singular `role` claim.
    #[serde(default)]
    role: Option<String>,

    /// Singular `rol` claim.
    #[serde(default)]
    rol: Option<String>,

    /// `roles` list claim.
    #[serde(default)]
    roles: Option<Vec<String>>,
}

impl Claims {
    /// Decodes [`Claims`] out of the provided [`AccessToken`].
    ///
    /// The token signature is not verified: the client holds no verification
    /// keys, and the gateway re-checks every call anyway.
    ///
    /// # Errors
    ///
    /// Errors if the token is not a structurally valid [JWT]. Callers should
    /// treat this the same as an expired token: the session must be
    /// refreshed.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    pub fn decode(token: &AccessToken) -> Result<Self, DecodeError> {
        use DecodeError as E;

        let mut segments = AsRef::<str>::as_ref(token).split('.');
        let (Some(_), Some(payload), Some(_), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(E::NotCompactJws);
        };

        let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(payload)?;

        Ok(serde_json::from_slice(&payload)?)
    }

    /// Returns the [`user::Role`] claimed by these [`Claims`].
    ///
    /// The claim shapes are tried in a fixed priority order: `role`, then
    /// `rol`, then the first element of `roles`. The matched tag is
    /// normalized to ASCII uppercase before being resolved.
    ///
    /// # Errors
    ///
    /// Errors if no claim shape is present, or the claimed tag is not a
    /// known [`user::Role`]. Never defaults to an ambiguous role.
    pub fn role(&self) -> Result<user::Role, DecodeError> {
        use DecodeError as E;

        let tag = self
            .role
            .as_deref()
            .or(self.rol.as_deref())
            .or_else(|| self.roles.as_ref()?.first().map(String::as_str))
            .ok_or(E::MissingRole)?;

        tag.to_ascii_uppercase()
            .parse()
            .map_err(|_| E::UnknownRole(tag.to_owned()))
    }

    /// Indicates whether these [`Claims`] are expired at the provided
    /// moment.
    #[must_use]
    pub fn is_expired_at(&self, at: ExpirationDateTime) -> bool {
        self.expires_at <= at
    }
}

/// Error of decoding [`Claims`] out of an [`AccessToken`].
#[derive(Debug, Display, Error, From)]
pub enum DecodeError {
    /// Token is not a three-segment compact [JWS].
    ///
    /// [JWS]: https://datatracker.ietf.org/doc/html/rfc7515
    #[display("token is not a compact JWS")]
    NotCompactJws,

    /// Token payload is not valid base64url.
    #[display("token payload is not valid base64url: {_0}")]
    Base64(base64::DecodeError),

    /// Token payload is not a valid claims object.
    #[display("token payload is not a valid claims object: {_0}")]
    Json(serde_json::Error),

    /// No role claim is present in any recognized shape.
    #[display("no role claim in any recognized shape")]
    MissingRole,

    /// Role claim tag is not a known role.
    #[display("unknown role claim: {_0}")]
    #[from(ignore)]
    UnknownRole(#[error(not(source))] String),
}

/// [`DateTime`] of an [`AccessToken`] expiration.
pub type ExpirationDateTime = DateTimeOf<(AccessToken, unit::Expiration)>;

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use base64::Engine as _;
    use serde_json::json;

    use crate::domain::user::Role;

    use super::{AccessToken, Claims, DecodeError, ExpirationDateTime};

    fn forge(payload: &serde_json::Value) -> AccessToken {
        let encode = |bytes: &[u8]| {
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
        };
        AccessToken::from(format!(
            "{}.{}.{}",
            encode(br#"{"alg":"HS256","typ":"JWT"}"#),
            encode(payload.to_string().as_bytes()),
            encode(b"signature"),
        ))
    }

    #[test]
    fn decodes_subject_and_expiry() {
        let token = forge(&json!({
            "sub": "maria",
            "exp": 1_700_000_000,
            "role": "ROL_CLIENT",
        }));

        let claims = Claims::decode(&token).unwrap();
        assert_eq!(claims.sub.to_string(), "maria");
        assert_eq!(claims.expires_at.unix_timestamp(), 1_700_000_000);
    }

    #[test]
    fn normalizes_role_across_claim_shapes() {
        for payload in [
            json!({"sub": "a", "exp": 1, "role": "rol_admin"}),
            json!({"sub": "a", "exp": 1, "role": "ROL_ADMIN"}),
            json!({"sub": "a", "exp": 1, "rol": "Rol_Admin"}),
            json!({"sub": "a", "exp": 1, "roles": ["ROL_ADMIN", "ROL_CLIENT"]}),
        ] {
            let claims = Claims::decode(&forge(&payload)).unwrap();
            assert_eq!(claims.role().unwrap(), Role::Admin, "{payload}");
        }
    }

    #[test]
    fn prefers_singular_role_claim_over_list() {
        let claims = Claims::decode(&forge(&json!({
            "sub": "a",
            "exp": 1,
            "role": "ROL_CLIENT",
            "roles": ["ROL_ADMIN"],
        })))
        .unwrap();

        assert_eq!(claims.role().unwrap(), Role::Client);
    }

    #[test]
    fn rejects_missing_and_unknown_roles() {
        let claims =
            Claims::decode(&forge(&json!({"sub": "a", "exp": 1}))).unwrap();
        assert!(matches!(claims.role(), Err(DecodeError::MissingRole)));

        let claims = Claims::decode(&forge(
            &json!({"sub": "a", "exp": 1, "role": "ROL_SUPERUSER"}),
        ))
        .unwrap();
        assert!(matches!(
            claims.role(),
            Err(DecodeError::UnknownRole(tag)) if tag == "ROL_SUPERUSER",
        ));
    }

    #[test]
    fn rejects_structurally_invalid_tokens() {
        assert!(matches!(
            Claims::decode(&AccessToken::from("not-a-jwt".to_owned())),
            Err(DecodeError::NotCompactJws),
        ));
        assert!(matches!(
            Claims::decode(&AccessToken::from("a.b!!!.c".to_owned())),
            Err(DecodeError::Base64(_)),
        ));
        assert!(matches!(
            Claims::decode(&forge(&json!({"sub": "a"}))),
            Err(DecodeError::Json(_)),
        ));
    }

    #[test]
    fn expiry_is_inclusive() {
        let claims = Claims::decode(&forge(
            &json!({"sub": "a", "exp": 1_000, "role": "ROL_CLIENT"}),
        ))
        .unwrap();

        let exp = ExpirationDateTime::from_unix_timestamp(1_000).unwrap();
        assert!(claims.is_expired_at(exp));
        assert!(claims.is_expired_at(exp + Duration::from_secs(1)));
        assert!(!claims.is_expired_at(exp - Duration::from_secs(1)));
    }
}
