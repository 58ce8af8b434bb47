//! Shopping cart definitions.

use derive_more::{Display, From, Into};

use crate::domain::product;

/// Count of items in a cart.
#[derive(
    Clone, Copy, Debug, Default, Display, Eq, From, Into, Ord, PartialEq,
    PartialOrd,
)]
pub struct ItemCount(u32);

/// Quantity of a single [`Item`].
#[derive(Clone, Copy, Debug, Display, Eq, From, Into, PartialEq)]
pub struct Quantity(u32);

/// Single line of a cart.
#[derive(Clone, Copy, Debug)]
pub struct Item {
    /// Product this [`Item`] refers to.
    pub product: product::Id,

    /// [`Quantity`] of the product, if specified.
    pub quantity: Option<Quantity>,
}

/// Direct summary of a cart.
#[derive(Clone, Copy, Debug)]
pub struct Summary {
    /// Total [`ItemCount`], if the remote provides one.
    pub count: Option<ItemCount>,
}

/// Full contents of a cart.
#[derive(Clone, Debug)]
pub struct Contents {
    /// [`Item`]s of the cart.
    pub items: Vec<Item>,
}

impl Contents {
    /// Returns the total [`ItemCount`] of these [`Contents`].
    ///
    /// An [`Item`] without an explicit [`Quantity`] counts as one.
    #[must_use]
    pub fn total_items(&self) -> ItemCount {
        self.items
            .iter()
            .map(|i| i.quantity.map_or(1, u32::from))
            .sum::<u32>()
            .into()
    }
}
