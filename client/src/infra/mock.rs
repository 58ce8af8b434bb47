//! Mock infrastructure for tests.

use std::{
    collections::VecDeque,
    io,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use base64::Engine as _;
use common::{
    operations::{By, Clear, Load, Perform, Select, Store},
    Handler,
};
use serde_json::json;
use tracerr::Traced;

use crate::{
    domain::{
        cart, order,
        user::session::{AccessToken, TokenPair, Tokens},
    },
    read,
};

use super::{api, vault};

/// Forges an unsigned access token with the provided claims.
///
/// `ttl` is relative to now; negative values forge an expired token.
pub(crate) fn forge_token(login: &str, role: &str, ttl: i64) -> AccessToken {
    let encode = |bytes: &[u8]| {
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
    };
    let exp = common::DateTime::now().unix_timestamp() + ttl;
    let payload = json!({"sub": login, "exp": exp, "role": role});
    AccessToken::from(format!(
        "{}.{}.{}",
        encode(br#"{"alg":"HS256","typ":"JWT"}"#),
        encode(payload.to_string().as_bytes()),
        encode(b"signature"),
    ))
}

/// Creates a [`api::Grant`] of a freshly forged token pair.
pub(crate) fn grant_for(login: &str, role: &str) -> api::Grant {
    api::Grant {
        access_token: forge_token(login, role, 30 * 60),
        refresh_token: Some("granted-refresh".to_owned().into()),
    }
}

/// Queue of canned results for a single gateway operation.
#[derive(Debug)]
struct Canned<T> {
    /// Canned results, popped in order.
    results: Mutex<VecDeque<Result<T, api::Error>>>,

    /// Count of executions of the operation.
    calls: AtomicUsize,
}

// Not derived, as `T` itself needs no `Default` here.
impl<T> Default for Canned<T> {
    fn default() -> Self {
        Self {
            results: Mutex::default(),
            calls: AtomicUsize::default(),
        }
    }
}

impl<T> Canned<T> {
    fn push(&self, result: Result<T, api::Error>) {
        self.results.lock().unwrap().push_back(result);
    }

    fn pop(&self, op: &str) -> Result<T, Traced<api::Error>> {
        _ = self.calls.fetch_add(1, Ordering::SeqCst);
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("no canned result left for `{op}`"))
            .map_err(|e| tracerr::new!(e))
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Programmable mock gateway.
#[derive(Clone, Debug, Default)]
pub(crate) struct Api {
    /// State shared between clones.
    inner: Arc<ApiInner>,
}

/// State of a mock [`Api`].
#[derive(Debug, Default)]
struct ApiInner {
    /// Canned sign-in results.
    sign_in: Canned<api::Grant>,

    /// Canned refresh results.
    refresh: Canned<api::Grant>,

    /// Artificial delay of every refresh execution.
    refresh_delay: Mutex<Duration>,

    /// Canned cart summary results.
    summary: Canned<cart::Summary>,

    /// Canned cart contents results.
    contents: Canned<cart::Contents>,

    /// Canned review status results.
    review: Canned<order::ReviewStatus>,

    /// Canned products page results.
    products: Canned<read::product::list::Page>,

    /// Bearer tokens observed on authorized operations, in order.
    bearers: Mutex<Vec<Option<String>>>,
}

impl Api {
    pub(crate) fn expect_sign_in(
        &self,
        result: Result<api::Grant, api::Error>,
    ) {
        self.inner.sign_in.push(result);
    }

    pub(crate) fn sign_in_calls(&self) -> usize {
        self.inner.sign_in.calls()
    }

    pub(crate) fn expect_refresh(
        &self,
        result: Result<api::Grant, api::Error>,
    ) {
        self.inner.refresh.push(result);
    }

    pub(crate) fn refresh_calls(&self) -> usize {
        self.inner.refresh.calls()
    }

    pub(crate) fn set_refresh_delay(&self, delay: Duration) {
        *self.inner.refresh_delay.lock().unwrap() = delay;
    }

    pub(crate) fn expect_summary(
        &self,
        result: Result<cart::Summary, api::Error>,
    ) {
        self.inner.summary.push(result);
    }

    pub(crate) fn summary_calls(&self) -> usize {
        self.inner.summary.calls()
    }

    pub(crate) fn expect_contents(
        &self,
        result: Result<cart::Contents, api::Error>,
    ) {
        self.inner.contents.push(result);
    }

    pub(crate) fn expect_review(
        &self,
        result: Result<order::ReviewStatus, api::Error>,
    ) {
        self.inner.review.push(result);
    }

    pub(crate) fn review_calls(&self) -> usize {
        self.inner.review.calls()
    }

    pub(crate) fn expect_products(
        &self,
        result: Result<read::product::list::Page, api::Error>,
    ) {
        self.inner.products.push(result);
    }

    /// Returns the bearer tokens observed on authorized operations.
    pub(crate) fn bearers(&self) -> Vec<Option<String>> {
        self.inner.bearers.lock().unwrap().clone()
    }

    fn observe_bearer(&self, token: Option<&AccessToken>) {
        self.inner
            .bearers
            .lock()
            .unwrap()
            .push(token.map(ToString::to_string));
    }
}

impl Handler<Perform<api::SignIn>> for Api {
    type Ok = api::Grant;
    type Err = Traced<api::Error>;

    async fn execute(
        &self,
        _: Perform<api::SignIn>,
    ) -> Result<Self::Ok, Self::Err> {
        self.inner.sign_in.pop("SignIn")
    }
}

impl Handler<Perform<api::RefreshGrant>> for Api {
    type Ok = api::Grant;
    type Err = Traced<api::Error>;

    async fn execute(
        &self,
        _: Perform<api::RefreshGrant>,
    ) -> Result<Self::Ok, Self::Err> {
        let delay = *self.inner.refresh_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.inner.refresh.pop("RefreshGrant")
    }
}

impl Handler<api::Bearing<Select<By<cart::Summary, ()>>>> for Api {
    type Ok = cart::Summary;
    type Err = Traced<api::Error>;

    async fn execute(
        &self,
        op: api::Bearing<Select<By<cart::Summary, ()>>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.observe_bearer(op.token.as_ref());
        self.inner.summary.pop("cart::Summary")
    }
}

impl Handler<api::Bearing<Select<By<cart::Contents, ()>>>> for Api {
    type Ok = cart::Contents;
    type Err = Traced<api::Error>;

    async fn execute(
        &self,
        op: api::Bearing<Select<By<cart::Contents, ()>>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.observe_bearer(op.token.as_ref());
        self.inner.contents.pop("cart::Contents")
    }
}

impl Handler<api::Bearing<Select<By<order::ReviewStatus, order::Id>>>>
    for Api
{
    type Ok = order::ReviewStatus;
    type Err = Traced<api::Error>;

    async fn execute(
        &self,
        op: api::Bearing<Select<By<order::ReviewStatus, order::Id>>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.observe_bearer(op.token.as_ref());
        self.inner.review.pop("order::ReviewStatus")
    }
}

impl
    Handler<
        Select<By<read::product::list::Page, read::product::list::Selector>>,
    > for Api
{
    type Ok = read::product::list::Page;
    type Err = Traced<api::Error>;

    async fn execute(
        &self,
        _: Select<
            By<read::product::list::Page, read::product::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        self.inner.products.pop("product::list::Page")
    }
}

/// In-memory mock vault.
#[derive(Clone, Debug, Default)]
pub(crate) struct Vault {
    /// State shared between clones.
    inner: Arc<VaultInner>,
}

/// State of a mock [`Vault`].
#[derive(Debug, Default)]
struct VaultInner {
    /// Currently persisted tokens.
    tokens: Mutex<Tokens>,

    /// Indicator whether every operation should fail.
    fail: AtomicBool,
}

impl Vault {
    pub(crate) fn seeded(tokens: Tokens) -> Self {
        let this = Self::default();
        *this.inner.tokens.lock().unwrap() = tokens;
        this
    }

    pub(crate) fn tokens(&self) -> Tokens {
        self.inner.tokens.lock().unwrap().clone()
    }

    pub(crate) fn set_fail(&self, fail: bool) {
        self.inner.fail.store(fail, Ordering::SeqCst);
    }

    fn guard(&self) -> Result<(), Traced<vault::Error>> {
        if self.inner.fail.load(Ordering::SeqCst) {
            return Err(tracerr::new!(vault::Error::File(
                vault::file::Error::Io(io::Error::other("mock failure")),
            )));
        }
        Ok(())
    }
}

impl Handler<Load> for Vault {
    type Ok = Tokens;
    type Err = Traced<vault::Error>;

    async fn execute(&self, _: Load) -> Result<Self::Ok, Self::Err> {
        self.guard()?;
        Ok(self.tokens())
    }
}

impl Handler<Store<TokenPair>> for Vault {
    type Ok = ();
    type Err = Traced<vault::Error>;

    async fn execute(
        &self,
        Store(pair): Store<TokenPair>,
    ) -> Result<Self::Ok, Self::Err> {
        self.guard()?;
        *self.inner.tokens.lock().unwrap() = Tokens {
            access: Some(pair.access),
            refresh: Some(pair.refresh),
        };
        Ok(())
    }
}

impl Handler<Clear> for Vault {
    type Ok = ();
    type Err = Traced<vault::Error>;

    async fn execute(&self, _: Clear) -> Result<Self::Ok, Self::Err> {
        self.guard()?;
        *self.inner.tokens.lock().unwrap() = Tokens::default();
        Ok(())
    }
}
