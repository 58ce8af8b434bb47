//! [`Command`] for authorized execution of gateway operations.

use std::convert::Infallible;

use common::Handler;
use tracerr::Traced;

use crate::{
    infra::api::{self, Bearing},
    Client,
};

use super::{refresh_session, Command, RefreshSession};

/// [`Command`] executing a gateway operation with the current access token
/// attached.
///
/// When the remote rejects the token, the [`Session`] is refreshed through
/// the single-flight [`RefreshSession`] [`Command`] and the operation is
/// replayed exactly once with the renewed token. A failed refresh surfaces
/// the rejection of the original attempt; a failed replay surfaces the
/// replay's own error. At most one replay happens per execution.
///
/// [`Session`]: crate::domain::user::session::Session
#[derive(Clone, Copy, Debug)]
pub struct Authorized<Op>(pub Op);

impl<A, V, Op> Command<Authorized<Op>> for Client<A, V>
where
    Op: Clone,
    A: api::Api<Bearing<Op>, Err = Traced<api::Error>>,
    Self: Command<
        RefreshSession,
        Ok = refresh_session::Outcome,
        Err = Infallible,
    >,
{
    type Ok = <A as Handler<Bearing<Op>>>::Ok;
    type Err = Traced<api::Error>;

    async fn execute(
        &self,
        Authorized(op): Authorized<Op>,
    ) -> Result<Self::Ok, Self::Err> {
        let token = {
            let session = self.session();
            session.access_token().cloned()
        };

        let rejection = match self
            .api()
            .execute(Bearing {
                token,
                op: op.clone(),
            })
            .await
        {
            Ok(ok) => return Ok(ok),
            Err(e) if e.as_ref().is_auth_rejection() => e,
            Err(e) => return Err(e),
        };

        let Some(refresh_token) = self.session().refresh_token().cloned()
        else {
            return Err(rejection);
        };

        let Ok(outcome) = self.execute(RefreshSession { refresh_token }).await;
        match outcome {
            refresh_session::Outcome::Renewed(access_token) => {
                self.api()
                    .execute(Bearing {
                        token: Some(access_token),
                        op,
                    })
                    .await
            }
            refresh_session::Outcome::Expired => Err(rejection),
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{
        operations::{By, Select},
        Handler as _,
    };

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

    use super::Authorized;

    fn summary() -> Authorized<Select<By<cart::Summary, ()>>> {
        Authorized(Select(By::new(())))
    }

    fn count(n: u32) -> Result<cart::Summary, api::Error> {
        Ok(cart::Summary {
            count: Some(n.into()),
        })
    }

    fn unauthorized<T>() -> Result<T, api::Error> {
        Err(api::Error::Status(reqwest::StatusCode::UNAUTHORIZED))
    }

    fn authenticated_client(api: mock::Api) -> Client<mock::Api, mock::Vault> {
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
                cart_items: 0.into(),
            });
        });
        client
    }

    #[tokio::test]
    async fn attaches_the_current_access_token() {
        let api = mock::Api::default();
        api.expect_summary(count(2));
        let client = authenticated_client(api.clone());

        let summary = client.execute(summary()).await.unwrap();

        assert_eq!(summary.count, Some(2.into()));
        let bearers = api.bearers();
        assert_eq!(bearers.len(), 1);
        assert!(bearers[0].is_some());
    }

    #[tokio::test]
    async fn replays_once_with_the_renewed_token() {
        let api = mock::Api::default();
        api.expect_summary(unauthorized());
        api.expect_refresh(Ok(mock::grant_for("maria", "ROL_CLIENT")));
        api.expect_summary(count(5));
        let client = authenticated_client(api.clone());

        let summary = client.execute(summary()).await.unwrap();

        assert_eq!(summary.count, Some(5.into()));
        assert_eq!(api.refresh_calls(), 1);
        assert_eq!(api.summary_calls(), 2);
    }

    #[tokio::test]
    async fn surfaces_the_original_error_when_refresh_fails() {
        let api = mock::Api::default();
        api.expect_summary(unauthorized());
        api.expect_refresh(Err(api::Error::Status(
            reqwest::StatusCode::BAD_GATEWAY,
        )));
        let client = authenticated_client(api.clone());

        let err = client.execute(summary()).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            api::Error::Status(s) if *s == reqwest::StatusCode::UNAUTHORIZED,
        ));
        assert_eq!(api.summary_calls(), 1);
    }

    #[tokio::test]
    async fn surfaces_the_replay_error_and_never_replays_twice() {
        let api = mock::Api::default();
        api.expect_summary(unauthorized());
        api.expect_refresh(Ok(mock::grant_for("maria", "ROL_CLIENT")));
        api.expect_summary(Err(api::Error::Status(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        )));
        let client = authenticated_client(api.clone());

        let err = client.execute(summary()).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            api::Error::Status(s)
                if *s == reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        ));
        assert_eq!(api.summary_calls(), 2);
        assert_eq!(api.refresh_calls(), 1);
    }

    #[tokio::test]
    async fn anonymous_rejection_is_surfaced_untouched() {
        let api = mock::Api::default();
        api.expect_summary(unauthorized());
        let client =
            Client::new(Config::default(), api.clone(), mock::Vault::default());

        let err = client.execute(summary()).await.unwrap_err();

        assert!(err.as_ref().is_auth_rejection());
        assert_eq!(api.refresh_calls(), 0);
        assert_eq!(api.bearers(), vec![None]);
    }

    #[tokio::test(start_paused = true)]
    async fn simultaneous_rejections_share_one_refresh() {
        let api = mock::Api::default();
        api.set_refresh_delay(Duration::from_millis(50));
        api.expect_summary(unauthorized());
        api.expect_contents(unauthorized::<cart::Contents>());
        api.expect_refresh(Ok(mock::grant_for("maria", "ROL_CLIENT")));
        api.expect_summary(count(1));
        api.expect_contents(Ok(cart::Contents { items: vec![] }));
        let client = authenticated_client(api.clone());

        let contents = Authorized(Select(By::<cart::Contents, ()>::new(())));
        let (summary, contents) =
            tokio::join!(client.execute(summary()), client.execute(contents));

        assert!(summary.is_ok());
        assert!(contents.is_ok());
        assert_eq!(api.refresh_calls(), 1);
        assert_eq!(api.summary_calls(), 2);
    }

    #[tokio::test]
    async fn session_is_untouched_by_a_plain_failure() {
        let api = mock::Api::default();
        api.expect_summary(Err(api::Error::Status(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        )));
        let client = authenticated_client(api.clone());

        let _unused = client.execute(summary()).await.unwrap_err();

        assert!(client.session().is_authenticated());
        assert_eq!(api.refresh_calls(), 0);
    }

}
