//! [`Http`] gateway implementation.

use common::{
    operations::{By, Perform, Select},
    pagination, Handler,
};
use secrecy::ExposeSecret as _;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracerr::Traced;
use uuid::Uuid;

use crate::{
    domain::{cart, order, user::session::AccessToken, Product},
    read, Gateway,
};

use super::{Bearing, Error, Grant, RefreshGrant, SignIn};

/// [`Api`] gateway talking to the remote marketplace services over HTTP.
///
/// [`Api`]: super::Api
#[derive(Clone, Debug)]
pub struct Http {
    /// Base URL the endpoints are resolved against.
    base_url: String,

    /// Underlying HTTP agent.
    agent: reqwest::Client,
}

impl Http {
    /// Creates a new [`Http`] gateway with the provided [`Gateway`]
    /// configuration.
    ///
    /// # Errors
    ///
    /// Errors if the underlying HTTP agent cannot be constructed.
    pub fn new(config: &Gateway) -> Result<Self, Traced<Error>> {
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            agent: reqwest::Client::builder()
                .timeout(config.request_timeout)
                .build()
                .map_err(tracerr::from_and_wrap!(=> Error))?,
        })
    }

    /// Resolves the provided `path` against the base URL.
    fn url(&self, path: impl AsRef<str>) -> String {
        format!("{}{}", self.base_url, path.as_ref())
    }

    /// Attaches the provided bearer `token` (if any) to the `request`.
    fn bearing(
        request: reqwest::RequestBuilder,
        token: Option<&AccessToken>,
    ) -> reqwest::RequestBuilder {
        match token {
            Some(token) => request.bearer_auth(AsRef::<str>::as_ref(token)),
            None => request,
        }
    }

    /// Sends the provided `request` and parses its JSON response.
    async fn json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, Traced<Error>> {
        let response = request
            .send()
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))?;

        if !response.status().is_success() {
            return Err(tracerr::new!(Error::Status(response.status())));
        }

        response
            .json()
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))
    }
}

impl Handler<Perform<SignIn>> for Http {
    type Ok = Grant;
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Perform(op): Perform<SignIn>,
    ) -> Result<Self::Ok, Self::Err> {
        /// Wire form of a [`SignIn`] operation.
        #[derive(Serialize)]
        struct Request<'r> {
            /// Login to sign in with.
            username: &'r str,

            /// Password to sign in with.
            password: &'r str,
        }

        let request = Request {
            username: op.login.as_ref(),
            password: op.password.expose_secret().as_ref(),
        };

        self.json::<GrantResponse>(
            self.agent.post(self.url("/login")).json(&request),
        )
        .await
        .map(Into::into)
    }
}

impl Handler<Perform<RefreshGrant>> for Http {
    type Ok = Grant;
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Perform(op): Perform<RefreshGrant>,
    ) -> Result<Self::Ok, Self::Err> {
        /// Wire form of a [`RefreshGrant`] operation.
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Request<'r> {
            /// Refresh token to exchange.
            refresh_token: &'r str,
        }

        let request = Request {
            refresh_token: op.refresh_token.as_ref(),
        };

        self.json::<GrantResponse>(
            self.agent.post(self.url("/refresh")).json(&request),
        )
        .await
        .map(Into::into)
    }
}

impl Handler<Bearing<Select<By<cart::Summary, ()>>>> for Http {
    type Ok = cart::Summary;
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Bearing { token, op: _ }: Bearing<Select<By<cart::Summary, ()>>>,
    ) -> Result<Self::Ok, Self::Err> {
        /// Wire form of a cart summary.
        #[derive(Deserialize)]
        struct Response {
            /// Total count of cart items, if provided.
            count: Option<u32>,
        }

        let response: Response = self
            .json(Self::bearing(
                self.agent.get(self.url("/cart/count")),
                token.as_ref(),
            ))
            .await?;

        Ok(cart::Summary {
            count: response.count.map(Into::into),
        })
    }
}

impl Handler<Bearing<Select<By<cart::Contents, ()>>>> for Http {
    type Ok = cart::Contents;
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Bearing { token, op: _ }: Bearing<Select<By<cart::Contents, ()>>>,
    ) -> Result<Self::Ok, Self::Err> {
        /// Wire form of cart contents.
        #[derive(Deserialize)]
        struct Response {
            /// Lines of the cart.
            items: Vec<Item>,
        }

        /// Wire form of a single cart line.
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Item {
            /// ID of the product in the line.
            product_id: Uuid,

            /// Quantity of the product, if specified.
            quantity: Option<u32>,
        }

        let response: Response = self
            .json(Self::bearing(
                self.agent.get(self.url("/cart")),
                token.as_ref(),
            ))
            .await?;

        Ok(cart::Contents {
            items: response
                .items
                .into_iter()
                .map(|i| cart::Item {
                    product: i.product_id.into(),
                    quantity: i.quantity.map(Into::into),
                })
                .collect(),
        })
    }
}

impl Handler<Bearing<Select<By<order::ReviewStatus, order::Id>>>> for Http {
    type Ok = order::ReviewStatus;
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Bearing { token, op: Select(by) }: Bearing<
            Select<By<order::ReviewStatus, order::Id>>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        /// Wire form of a review status.
        #[derive(Deserialize)]
        struct Response {
            /// Tag of the review status.
            status: String,
        }

        let id = by.into_inner();
        let response: Response = self
            .json(Self::bearing(
                self.agent.get(self.url(format!("/orders/{id}/review"))),
                token.as_ref(),
            ))
            .await?;

        response.status.parse().map_err(|_| {
            tracerr::new!(Error::MalformedPayload(format!(
                "unknown review status: {}",
                response.status,
            )))
        })
    }
}

impl
    Handler<
        Select<By<read::product::list::Page, read::product::list::Selector>>,
    > for Http
{
    type Ok = read::product::list::Page;
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::product::list::Page, read::product::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        /// Wire form of a products page.
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Response {
            /// Products of the page.
            items: Vec<Item>,

            /// Indicator whether more products exist past this page.
            has_more: bool,
        }

        /// Wire form of a single product.
        #[derive(Deserialize)]
        struct Item {
            /// ID of the product.
            id: Uuid,

            /// Title of the product.
            title: String,

            /// Price of the product in `{amount}{currency}` form.
            price: String,

            /// Login of the creator selling the product.
            seller: String,
        }

        let selector = by.into_inner();

        let mut query = vec![("limit", selector.arguments.limit().to_string())];
        match &selector.arguments {
            pagination::Arguments::Forward { after, .. } => {
                if let Some(after) = after {
                    query.push(("after", after.to_string()));
                }
            }
            pagination::Arguments::Backward { before, .. } => {
                query.push(("direction", "backward".to_owned()));
                if let Some(before) = before {
                    query.push(("before", before.to_string()));
                }
            }
        }
        if let Some(title) = &selector.filter.title {
            query.push(("title", title.to_string()));
        }

        let response: Response = self
            .json(self.agent.get(self.url("/products")).query(&query))
            .await?;

        let nodes = response
            .items
            .into_iter()
            .map(|i| {
                let malformed = |what: &str| {
                    tracerr::new!(Error::MalformedPayload(format!(
                        "invalid product {what}",
                    )))
                };
                Ok(Product {
                    id: i.id.into(),
                    title: i.title.parse().map_err(|_| malformed("title"))?,
                    price: i.price.parse().map_err(|_| malformed("price"))?,
                    seller: i.seller.parse().map_err(|_| malformed("seller"))?,
                })
            })
            .collect::<Result<Vec<_>, Traced<Error>>>()?;

        Ok(read::product::list::Page::new(
            &selector.arguments,
            nodes.into_iter().map(|p| (p.id, p)),
            response.has_more,
        ))
    }
}

/// Wire form of a token [`Grant`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GrantResponse {
    /// Granted access token.
    access_token: String,

    /// Granted refresh token, if rotated.
    refresh_token: Option<String>,
}

impl From<GrantResponse> for Grant {
    fn from(response: GrantResponse) -> Self {
        Self {
            access_token: response.access_token.into(),
            refresh_token: response.refresh_token.map(Into::into),
        }
    }
}
