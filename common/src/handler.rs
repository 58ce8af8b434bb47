//! [`Handler`] abstractions.

use std::future::Future;

/// Executable handler.
pub trait Handler<Args = ()> {
    /// Type of successful [`Handler`] result.
    type Ok;

    /// Type of this [`Handler`] error.
    type Err;

    /// Executes this [`Handler`] with the provided arguments.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}

/// Shortcut for the [`Result`] of a [`Handler`] execution.
pub type Outcome<H, Args> =
    Result<<H as Handler<Args>>::Ok, <H as Handler<Args>>::Err>;
