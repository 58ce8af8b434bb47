//! [`Command`] for refreshing the cart item count of the current
//! [`Session`].
//!
//! [`Session`]: crate::domain::user::session::Session

use std::convert::Infallible;

use common::operations::{By, Select};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{cart, user::session::Session},
    infra::api,
    Client,
};

use super::{Authorized, Command};

/// [`Command`] for refreshing the cart item count of the current
/// [`Session`].
///
/// Prefers the direct count endpoint; when the remote provides no count
/// field, falls back to the full cart contents and sums the per-item
/// quantities. Any failure degrades the count to zero rather than leaving a
/// stale value, and is never surfaced to the caller.
#[derive(Clone, Copy, Debug)]
pub struct RefreshCartCount;

impl<A, V> Command<RefreshCartCount> for Client<A, V>
where
    Self: Command<
            Authorized<Select<By<cart::Summary, ()>>>,
            Ok = cart::Summary,
            Err = Traced<api::Error>,
        > + Command<
            Authorized<Select<By<cart::Contents, ()>>>,
            Ok = cart::Contents,
            Err = Traced<api::Error>,
        >,
{
    type Ok = cart::ItemCount;
    type Err = Infallible;

    async fn execute(
        &self,
        _: RefreshCartCount,
    ) -> Result<Self::Ok, Self::Err> {
        let count = match self.count().await {
            Ok(count) => count,
            Err(e) => {
                log::warn!("cart count refresh failed: {e}");
                cart::ItemCount::default()
            }
        };

        self.patch_session(|s| {
            if let Session::Authenticated(auth) = s {
                auth.cart_items = count;
            }
        });

        Ok(count)
    }
}

impl<A, V> Client<A, V>
where
    Self: Command<
            Authorized<Select<By<cart::Summary, ()>>>,
            Ok = cart::Summary,
            Err = Traced<api::Error>,
        > + Command<
            Authorized<Select<By<cart::Contents, ()>>>,
            Ok = cart::Contents,
            Err = Traced<api::Error>,
        >,
{
    /// Fetches the current cart item count from the remote.
    async fn count(&self) -> Result<cart::ItemCount, Traced<api::Error>> {
        let summary: cart::Summary = self
            .execute(Authorized(Select(By::<cart::Summary, ()>::new(()))))
            .await?;
        if let Some(count) = summary.count {
            return Ok(count);
        }

        // No direct count field: derive it from the full contents.
        let contents: cart::Contents = self
            .execute(Authorized(Select(By::<cart::Contents, ()>::new(()))))
            .await?;
        Ok(contents.total_items())
    }
}

#[cfg(test)]
mod spec {
    use common::Handler as _;

    use crate::{
        domain::{
            cart,
            user::{
                session::{Authenticated, Session, TokenPair},
                Role,
            },
        },
        infra::{api, mock},
        Client, Config,
    };

    use super::RefreshCartCount;

    fn authenticated_client(
        api: mock::Api,
        cart_items: u32,
    ) -> Client<mock::Api, mock::Vault> {
        let client =
            Client::new(Config::default(), api, mock::Vault::default());
        client.patch_session(|s| {
            *s = Session::Authenticated(Authenticated {
                login: "maria".parse().unwrap(),
                role: Role::Client,
                tokens: TokenPair {
                    access: mock::forge_token("maria", "ROL_CLIENT", 60),
                    refresh: "refresh".to_owned().into(),
                },
                cart_items: cart_items.into(),
            });
        });
        client
    }

    fn item(quantity: Option<u32>) -> cart::Item {
        cart::Item {
            product: crate::domain::product::Id::new(),
            quantity: quantity.map(Into::into),
        }
    }

    #[tokio::test]
    async fn prefers_the_direct_count_field() {
        let api = mock::Api::default();
        api.expect_summary(Ok(cart::Summary { count: Some(4.into()) }));
        let client = authenticated_client(api.clone(), 0);

        let count = client.execute(RefreshCartCount).await.unwrap();

        assert_eq!(count, 4.into());
        assert_eq!(client.session().cart_items(), 4.into());
        assert_eq!(api.summary_calls(), 1);
    }

    #[tokio::test]
    async fn falls_back_to_summing_the_contents() {
        let api = mock::Api::default();
        api.expect_summary(Ok(cart::Summary { count: None }));
        api.expect_contents(Ok(cart::Contents {
            items: vec![item(Some(2)), item(None)],
        }));
        let client = authenticated_client(api, 0);

        let count = client.execute(RefreshCartCount).await.unwrap();

        assert_eq!(count, 3.into());
        assert_eq!(client.session().cart_items(), 3.into());
    }

    #[tokio::test]
    async fn failure_degrades_the_count_to_zero() {
        let api = mock::Api::default();
        api.expect_summary(Err(api::Error::Status(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        )));
        let client = authenticated_client(api, 9);

        let count = client.execute(RefreshCartCount).await.unwrap();

        assert_eq!(count, 0.into());
        assert_eq!(client.session().cart_items(), 0.into());
    }

    #[tokio::test]
    async fn anonymous_session_stays_anonymous() {
        let api = mock::Api::default();
        api.expect_summary(Ok(cart::Summary { count: Some(2.into()) }));
        let client =
            Client::new(Config::default(), api, mock::Vault::default());
        client.patch_session(|s| *s = Session::Anonymous);

        let count = client.execute(RefreshCartCount).await.unwrap();

        assert_eq!(count, 2.into());
        assert!(matches!(client.session(), Session::Anonymous));
    }
}
