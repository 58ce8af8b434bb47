//! [`Query`] definition.

pub mod products;
pub mod session;

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{infra::api, Client};

/// [`Query`] of the [`Client`].
pub use common::Handler as Query;

pub use self::session::CurrentSession;

/// [`Query`] [`Select`]ing a `T`ype from the remote gateway.
#[derive(Clone, Copy, Debug)]
#[expect(clippy::module_name_repetitions, reason = "more readable")]
pub struct ApiQuery<T>(T);

impl<W, B> ApiQuery<By<W, B>> {
    /// Creates a new [`ApiQuery`] selecting a `W` by the provided `B`.
    #[must_use]
    pub fn by(by: B) -> Self {
        Self(By::new(by))
    }
}

impl<A, V, W, B> Query<ApiQuery<By<W, B>>> for Client<A, V>
where
    A: api::Api<Select<By<W, B>>, Ok = W, Err = Traced<api::Error>>,
{
    type Ok = W;
    type Err = Traced<api::Error>;

    async fn execute(
        &self,
        ApiQuery(by): ApiQuery<By<W, B>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.api()
            .execute(Select(by))
            .await
            .map_err(tracerr::wrap!())
    }
}
