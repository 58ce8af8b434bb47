//! [`Product`]s list queries.
//!
//! [`Product`]: crate::domain::Product

use common::operations::By;

use crate::read;

/// [`Query`] selecting a page of the product catalogue.
///
/// The catalogue is public: no session is required.
///
/// [`Query`]: super::Query
pub type ListProducts = super::ApiQuery<
    By<read::product::list::Page, read::product::list::Selector>,
>;

#[cfg(test)]
mod spec {
    use common::{pagination, Handler as _};

    use crate::{
        domain::{product, Product},
        infra::mock,
        read, Client, Config,
    };

    use super::ListProducts;

    fn product(title: &str) -> Product {
        Product {
            id: product::Id::new(),
            title: title.parse().unwrap(),
            price: "49.99USD".parse().unwrap(),
            seller: "ateliera".parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn pages_through_the_catalogue() {
        let api = mock::Api::default();
        let selector = read::product::list::Selector {
            arguments: pagination::Arguments::Forward {
                first: 2,
                after: None,
            },
            filter: read::product::list::Filter::default(),
        };
        let nodes = [product("Facade kit"), product("Stair detail")];
        api.expect_products(Ok(read::product::list::Page::new(
            &selector.arguments,
            nodes.iter().map(|p| (p.id, p.clone())),
            true,
        )));
        let client =
            Client::new(Config::default(), api, mock::Vault::default());

        let page = client
            .execute(ListProducts::by(selector))
            .await
            .unwrap();

        assert_eq!(page.edges.len(), 2);
        let info = page.page_info();
        assert!(info.has_next_page);
        assert!(!info.has_previous_page);
        assert_eq!(info.end_cursor, Some(page.edges[1].node.id));
    }
}
