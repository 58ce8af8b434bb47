//! Background environment for running [`Task`]s.
//!
//! [`Task`]: super::Task

use std::{
    error::Error,
    future::{Future, IntoFuture},
};

use futures::{future::BoxFuture, FutureExt as _, TryFutureExt as _};
use tokio::task::JoinSet;

/// Background environment for running [`Task`]s.
///
/// Collects spawned [`Task`]s and drives them to completion when awaited,
/// surfacing the first failure.
///
/// [`Task`]: super::Task
#[derive(Debug, Default)]
pub struct Background {
    /// Set of spawned tasks.
    tasks: JoinSet<Result<(), Box<dyn Error + Send + 'static>>>,
}

impl Background {
    /// Spawns a new [`Task`] inside the [`Background`] environment.
    ///
    /// [`Task`]: super::Task
    pub fn spawn<F, E>(&mut self, future: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Error + Send + 'static,
    {
        _ = self.tasks.spawn(future.map_err(|e| {
            let boxed: Box<dyn Error + Send + 'static> = Box::new(e);
            boxed
        }));
    }
}

impl IntoFuture for Background {
    type Output = Result<(), Box<dyn Error + Send + 'static>>;
    type IntoFuture = BoxFuture<'static, Self::Output>;

    fn into_future(mut self) -> Self::IntoFuture {
        async move {
            while let Some(joined) = self.tasks.join_next().await {
                match joined {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => return Err(e),
                    Err(e) => {
                        let boxed: Box<dyn Error + Send + 'static> =
                            Box::new(e);
                        return Err(boxed);
                    }
                }
            }
            Ok(())
        }
        .boxed()
    }
}

#[cfg(test)]
mod spec {
    use derive_more::{Display, Error};

    use super::Background;

    /// Probe error of a failed background task.
    #[derive(Clone, Copy, Debug, Display, Error)]
    #[display("probe failure")]
    struct ProbeError;

    #[tokio::test]
    async fn drains_every_spawned_task() {
        let mut bg = Background::default();
        bg.spawn(async { Ok::<_, ProbeError>(()) });
        bg.spawn(async { Ok::<_, ProbeError>(()) });

        bg.await.unwrap();
    }

    #[tokio::test]
    async fn surfaces_a_task_failure() {
        let mut bg = Background::default();
        bg.spawn(async { Ok::<_, ProbeError>(()) });
        bg.spawn(async { Err(ProbeError) });

        assert!(bg.await.is_err());
    }
}
