//! [`AwaitPaymentReview`] [`Task`].

use std::time;

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use serde::Deserialize;
use smart_default::SmartDefault;
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

use crate::{
    command::{Authorized, Command},
    domain::order,
    infra::api,
    Client,
};

use super::Task;

/// Configuration for [`AwaitPaymentReview`] [`Task`].
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Config {
    /// Interval between review status polls.
    #[default(time::Duration::from_secs(5))]
    #[serde(with = "humantime_serde")]
    pub interval: time::Duration,

    /// Maximum number of polls before the [`Task`] gives up.
    #[default(60)]
    pub max_attempts: u32,
}

/// [`Task`] polling the manual-payment review status of an [`Order`] until
/// the review settles.
///
/// Polling is bounded: after the configured number of attempts the [`Task`]
/// resolves with [`ExecutionError::Timeout`] instead of keeping a long-open
/// session polling forever.
///
/// [`Order`]: crate::domain::Order
#[derive(Clone, Copy, Debug, From)]
pub struct AwaitPaymentReview {
    /// [`Order`] whose review to await.
    ///
    /// [`Order`]: crate::domain::Order
    pub order: order::Id,
}

impl<A, V> Task<AwaitPaymentReview> for Client<A, V>
where
    Self: Command<
        Authorized<Select<By<order::ReviewStatus, order::Id>>>,
        Ok = order::ReviewStatus,
        Err = Traced<api::Error>,
    >,
{
    type Ok = order::ReviewStatus;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        task: AwaitPaymentReview,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let Config {
            interval: every,
            max_attempts,
        } = self.config().review_poll;

        let mut interval = interval(every);
        for _ in 0..max_attempts {
            _ = interval.tick().await;

            let status = self
                .execute(Authorized(Select(
                    By::<order::ReviewStatus, _>::new(task.order),
                )))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;

            if status.is_settled() {
                return Ok(status);
            }
            log::debug!("review of `Order(id: {})` is still pending", task.order);
        }

        Err(tracerr::new!(E::Timeout {
            attempts: max_attempts,
        }))
    }
}

/// Error of [`AwaitPaymentReview`] [`Task`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Remote gateway failed or rejected the poll.
    #[display("remote gateway failed: {_0}")]
    Api(api::Error),

    /// Review did not settle within the configured attempts.
    #[display("review did not settle after {attempts} polls")]
    #[from(ignore)]
    Timeout {
        /// Number of polls made.
        attempts: u32,
    },
}

#[cfg(test)]
mod spec {
    use common::Handler as _;

    use crate::{
        domain::{
            order::ReviewStatus,
            user::{
                session::{Authenticated, Session, TokenPair},
                Role,
            },
        },
        infra::{api, mock},
        Client, Config,
    };

    use super::{AwaitPaymentReview, ExecutionError};

    fn client(
        api: mock::Api,
        max_attempts: u32,
    ) -> Client<mock::Api, mock::Vault> {
        let config = Config {
            review_poll: super::Config {
                max_attempts,
                ..super::Config::default()
            },
            ..Config::default()
        };
        let client = Client::new(config, api, mock::Vault::default());
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

    #[tokio::test(start_paused = true)]
    async fn resolves_once_the_review_settles() {
        let api = mock::Api::default();
        api.expect_review(Ok(ReviewStatus::Pending));
        api.expect_review(Ok(ReviewStatus::Pending));
        api.expect_review(Ok(ReviewStatus::Approved));
        let client = client(api.clone(), 10);

        let status = client
            .execute(AwaitPaymentReview {
                order: crate::domain::order::Id::new(),
            })
            .await
            .unwrap();

        assert_eq!(status, ReviewStatus::Approved);
        assert_eq!(api.review_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn rejection_settles_the_poll_too() {
        let api = mock::Api::default();
        api.expect_review(Ok(ReviewStatus::Rejected));
        let client = client(api, 10);

        let status = client
            .execute(AwaitPaymentReview {
                order: crate::domain::order::Id::new(),
            })
            .await
            .unwrap();

        assert_eq!(status, ReviewStatus::Rejected);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_the_configured_attempts() {
        let api = mock::Api::default();
        for _ in 0..3 {
            api.expect_review(Ok(ReviewStatus::Pending));
        }
        let client = client(api.clone(), 3);

        let err = client
            .execute(AwaitPaymentReview {
                order: crate::domain::order::Id::new(),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Timeout { attempts: 3 },
        ));
        assert_eq!(api.review_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gateway_failure_aborts_the_poll() {
        let api = mock::Api::default();
        api.expect_review(Ok(ReviewStatus::Pending));
        api.expect_review(Err(api::Error::Status(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        )));
        let client = client(api.clone(), 10);

        let err = client
            .execute(AwaitPaymentReview {
                order: crate::domain::order::Id::new(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::Api(_)));
        assert_eq!(api.review_calls(), 2);
    }
}
