use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

use crate::client::error::{ClientError, ClientResult};
use crate::entities::category;
use crate::middleware::session::SESSION_HEADER;
use crate::services::{
    cart::Cart,
    catalog::{Facets, ProductDetail, ProductFilter, ProductRow},
};

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    /// Applied to every request.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_owned(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Typed client for the storefront API. Every request carries the session id
/// in the `x-session-id` header.
#[derive(Clone, Debug)]
pub struct StorefrontClient {
    client: Client,
    base_url: String,
    session_id: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddToCart {
    product_id: i32,
    quantity: i32,
}

#[derive(Serialize)]
struct UpdateQuantity {
    quantity: i32,
}

fn decode_body<T: DeserializeOwned>(status: StatusCode, text: &str) -> ClientResult<T> {
    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(text)
            .map(|body| body.error)
            .unwrap_or_else(|_| text.to_owned());
        return match status {
            StatusCode::NOT_FOUND => Err(ClientError::NotFound(message)),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(ClientError::Validation(message))
            }
            _ => Err(ClientError::Server(message)),
        };
    }

    serde_json::from_str(text).map_err(|err| ClientError::InvalidResponse(err.to_string()))
}

impl StorefrontClient {
    pub fn new(config: &ClientConfig, session_id: impl Into<String>) -> ClientResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            session_id: session_id.into(),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header(SESSION_HEADER, &self.session_id)
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> ClientResult<T> {
        let response = request.send().await?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let status = response.status();
        let text = response.text().await?;
        decode_body(status, &text)
    }

    // ========== Catalog ==========

    pub async fn categories(&self) -> ClientResult<Vec<category::Model>> {
        Self::send(self.request(Method::GET, "/api/categories")).await
    }

    pub async fn products(&self, filter: &ProductFilter) -> ClientResult<Vec<ProductRow>> {
        Self::send(self.request(Method::GET, "/api/products").query(filter)).await
    }

    pub async fn latest_products(&self) -> ClientResult<Vec<ProductRow>> {
        Self::send(self.request(Method::GET, "/api/products/latest")).await
    }

    pub async fn facets(&self) -> ClientResult<Facets> {
        Self::send(self.request(Method::GET, "/api/products/facets")).await
    }

    pub async fn product(&self, id: i32) -> ClientResult<ProductDetail> {
        Self::send(self.request(Method::GET, &format!("/api/products/{id}"))).await
    }

    pub async fn recommendations(&self, id: i32) -> ClientResult<Vec<ProductRow>> {
        Self::send(self.request(Method::GET, &format!("/api/products/{id}/recommendations"))).await
    }

    // ========== Cart ==========

    pub async fn cart(&self) -> ClientResult<Cart> {
        Self::send(self.request(Method::GET, "/api/cart")).await
    }

    pub async fn add_to_cart(&self, product_id: i32, quantity: i32) -> ClientResult<()> {
        let body = AddToCart {
            product_id,
            quantity,
        };
        let request = self.request(Method::POST, "/api/cart").json(&body);
        Self::send::<serde_json::Value>(request).await?;
        Ok(())
    }

    pub async fn update_cart_item(&self, item_id: i32, quantity: i32) -> ClientResult<()> {
        let body = UpdateQuantity { quantity };
        let request = self
            .request(Method::PUT, &format!("/api/cart/{item_id}"))
            .json(&body);
        Self::send::<serde_json::Value>(request).await?;
        Ok(())
    }

    pub async fn remove_from_cart(&self, item_id: i32) -> ClientResult<()> {
        let request = self.request(Method::DELETE, &format!("/api/cart/{item_id}"));
        Self::send::<serde_json::Value>(request).await?;
        Ok(())
    }
}
