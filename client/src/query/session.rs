//! [`Session`] queries.

use std::convert::Infallible;

use crate::{domain::user::session::Session, Client};

use super::Query;

/// [`Query`] returning a snapshot of the current [`Session`].
///
/// The snapshot is a plain value: it does not track later state changes.
#[derive(Clone, Copy, Debug)]
pub struct CurrentSession;

impl<A, V> Query<CurrentSession> for Client<A, V> {
    type Ok = Session;
    type Err = Infallible;

    async fn execute(
        &self,
        _: CurrentSession,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.session())
    }
}

#[cfg(test)]
mod spec {
    use common::Handler as _;

    use crate::{infra::mock, Client, Config};

    use super::CurrentSession;

    #[tokio::test]
    async fn snapshots_start_out_loading() {
        let client = Client::new(
            Config::default(),
            mock::Api::default(),
            mock::Vault::default(),
        );

        let session = client.execute(CurrentSession).await.unwrap();

        assert!(session.is_loading());
        assert!(!session.is_authenticated());
    }
}
