//! [`Task`] definition.

pub mod await_payment_review;
pub mod background;

/// [`Task`] of the [`Client`].
///
/// [`Client`]: crate::Client
pub use common::Handler as Task;

pub use self::{
    await_payment_review::AwaitPaymentReview, background::Background,
};
