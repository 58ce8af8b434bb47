//! [`Order`] definitions.

use common::{define_kind, Money};
use derive_more::{Display, From, FromStr, Into};
use uuid::Uuid;

/// Checked-out cart awaiting or past payment.
#[derive(Clone, Debug)]
pub struct Order {
    /// ID of this [`Order`].
    pub id: Id,

    /// Total price of this [`Order`].
    pub total: Money,

    /// [`PaymentMethod`] this [`Order`] is paid with.
    pub payment: PaymentMethod,

    /// [`ReviewStatus`] of this [`Order`]'s manual payment, if any.
    ///
    /// Only present for [`PaymentMethod::BankTransfer`] orders.
    pub review: Option<ReviewStatus>,
}

/// ID of an [`Order`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
)]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

define_kind! {
    #[doc = "Payment method of an [`Order`]."]
    enum PaymentMethod {
        #[doc = "Instant PayPal checkout."]
        PayPal = "PAYPAL",

        #[doc = "Manual bank transfer with an uploaded receipt."]
        BankTransfer = "BANK_TRANSFER",
    }
}

define_kind! {
    #[doc = "Review status of a manually paid [`Order`]'s receipt."]
    enum ReviewStatus {
        #[doc = "Receipt awaits review by an administrator."]
        Pending = "PENDING",

        #[doc = "Receipt was accepted and the order is paid."]
        Approved = "APPROVED",

        #[doc = "Receipt was rejected."]
        Rejected = "REJECTED",
    }
}

impl ReviewStatus {
    /// Indicates whether this [`ReviewStatus`] is settled and will not
    /// change anymore.
    #[must_use]
    pub fn is_settled(self) -> bool {
        match self {
            Self::Approved | Self::Rejected => true,
            Self::Pending => false,
        }
    }
}
