//! [`Product`] read model definition.
//!
//! [`Product`]: crate::domain::Product

pub mod list {
    //! [`Product`]s list definitions.

    use common::define_pagination;

    use crate::domain::{product, Product};

    define_pagination!(Cursor, Node, Filter);

    /// Node in a [`Connection`].
    pub type Node = Product;

    /// Cursor pointing to a specific [`Product`] in a list.
    pub type Cursor = product::Id;

    /// Filter for [`Selector`].
    #[derive(Clone, Debug, Default)]
    pub struct Filter {
        /// [`product::Title`] (or its part) to search for.
        pub title: Option<product::Title>,
    }
}
