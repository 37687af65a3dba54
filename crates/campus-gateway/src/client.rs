//! Gateway HTTP client implementation.

use reqwest::Client;
use std::time::Duration;

use crate::error::GatewayError;
use crate::types::{
    ConnectedAccount, Customer, GatewayErrorResponse, GatewayList, GatewaySubscription, Invoice,
    OnboardingLink, PaymentIntent, PaymentMethod, SetupIntent,
};

/// Header carrying the connected account a request acts on behalf of.
const ACCOUNT_HEADER: &str = "Gateway-Account";

/// Payment gateway API client.
///
/// Built once per tenant context: [`GatewayClient::for_platform`] for
/// platform-level calls, [`GatewayClient::for_tenant`] for calls scoped to
/// a tenant's connected account. Mutating calls are never retried.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: Client,
    api_key: String,
    base_url: String,
    connected_account: Option<String>,
}

impl GatewayClient {
    /// Gateway API base URL.
    const BASE_URL: &'static str = "https://api.gateway.example.com/v1";

    /// Create a client for platform-level calls.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    pub fn for_platform(api_key: impl Into<String>) -> Self {
        Self::build(api_key.into(), None)
    }

    /// Create a client scoped to a tenant's connected account. Every call
    /// carries the account header so charges land on the tenant's account.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    pub fn for_tenant(api_key: impl Into<String>, connected_account_id: impl Into<String>) -> Self {
        Self::build(api_key.into(), Some(connected_account_id.into()))
    }

    fn build(api_key: String, connected_account: Option<String>) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key,
            base_url: Self::BASE_URL.to_string(),
            connected_account,
        }
    }

    /// Override the API base URL (test servers).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    // =========================================================================
    // Customers
    // =========================================================================

    /// Create a customer, tagging it with our tenant id in metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the gateway rejects it.
    pub async fn create_customer(
        &self,
        tenant_id: &str,
        email: Option<&str>,
        name: Option<&str>,
    ) -> Result<Customer, GatewayError> {
        let mut params = vec![("metadata[tenant_id]", tenant_id.to_string())];
        if let Some(email) = email {
            params.push(("email", email.to_string()));
        }
        if let Some(name) = name {
            params.push(("name", name.to_string()));
        }
        self.post_form("customers", &params).await
    }

    /// Get a customer by ID. Returns `None` on 404.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the gateway rejects it.
    pub async fn retrieve_customer(
        &self,
        customer_id: &str,
    ) -> Result<Option<Customer>, GatewayError> {
        let response = self.get_request(&format!("customers/{customer_id}")).await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::handle_response(response).await.map(Some)
    }

    /// Update a customer's email or name.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the gateway rejects it.
    pub async fn update_customer(
        &self,
        customer_id: &str,
        email: Option<&str>,
        name: Option<&str>,
    ) -> Result<Customer, GatewayError> {
        let mut params = Vec::new();
        if let Some(email) = email {
            params.push(("email", email.to_string()));
        }
        if let Some(name) = name {
            params.push(("name", name.to_string()));
        }
        self.post_form(&format!("customers/{customer_id}"), &params)
            .await
    }

    // =========================================================================
    // Payment methods
    // =========================================================================

    /// List a customer's card payment methods.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the gateway rejects it.
    pub async fn list_payment_methods(
        &self,
        customer_id: &str,
    ) -> Result<GatewayList<PaymentMethod>, GatewayError> {
        let response = self
            .request(reqwest::Method::GET, "payment_methods")
            .query(&[("customer", customer_id), ("type", "card")])
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Attach a payment method to a customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the gateway rejects it.
    pub async fn attach_payment_method(
        &self,
        payment_method_id: &str,
        customer_id: &str,
    ) -> Result<PaymentMethod, GatewayError> {
        self.post_form(
            &format!("payment_methods/{payment_method_id}/attach"),
            &[("customer", customer_id.to_string())],
        )
        .await
    }

    /// Detach a payment method from its customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the gateway rejects it.
    pub async fn detach_payment_method(
        &self,
        payment_method_id: &str,
    ) -> Result<PaymentMethod, GatewayError> {
        self.post_form(&format!("payment_methods/{payment_method_id}/detach"), &[])
            .await
    }

    /// Create a setup intent for collecting a payment method.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the gateway rejects it.
    pub async fn create_setup_intent(
        &self,
        customer_id: &str,
    ) -> Result<SetupIntent, GatewayError> {
        self.post_form("setup_intents", &[("customer", customer_id.to_string())])
            .await
    }

    // =========================================================================
    // Payment intents
    // =========================================================================

    /// Create a payment intent.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the gateway rejects it.
    pub async fn create_payment_intent(
        &self,
        customer_id: &str,
        amount_cents: i64,
        currency: &str,
        description: Option<&str>,
    ) -> Result<PaymentIntent, GatewayError> {
        let mut params = vec![
            ("customer", customer_id.to_string()),
            ("amount", amount_cents.to_string()),
            ("currency", currency.to_string()),
        ];
        if let Some(description) = description {
            params.push(("description", description.to_string()));
        }
        tracing::debug!(customer_id = %customer_id, amount_cents, "creating payment intent");
        self.post_form("payment_intents", &params).await
    }

    /// Confirm a payment intent with a payment method.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the gateway rejects it.
    pub async fn confirm_payment_intent(
        &self,
        payment_intent_id: &str,
        payment_method_id: &str,
    ) -> Result<PaymentIntent, GatewayError> {
        self.post_form(
            &format!("payment_intents/{payment_intent_id}/confirm"),
            &[("payment_method", payment_method_id.to_string())],
        )
        .await
    }

    /// Cancel a payment intent.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the gateway rejects it.
    pub async fn cancel_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<PaymentIntent, GatewayError> {
        self.post_form(&format!("payment_intents/{payment_intent_id}/cancel"), &[])
            .await
    }

    // =========================================================================
    // Invoices
    // =========================================================================

    /// Create an invoice for a customer's pending items.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the gateway rejects it.
    pub async fn create_invoice(&self, customer_id: &str) -> Result<Invoice, GatewayError> {
        self.post_form(
            "invoices",
            &[
                ("customer", customer_id.to_string()),
                ("auto_advance", "true".to_string()),
            ],
        )
        .await
    }

    /// Retrieve an invoice by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the gateway rejects it.
    pub async fn retrieve_invoice(&self, invoice_id: &str) -> Result<Invoice, GatewayError> {
        let response = self.get_request(&format!("invoices/{invoice_id}")).await?;
        Self::handle_response(response).await
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Create a subscription for a customer on a price, with a seat quantity.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the gateway rejects it.
    pub async fn create_subscription(
        &self,
        customer_id: &str,
        price_id: &str,
        quantity: u32,
    ) -> Result<GatewaySubscription, GatewayError> {
        self.post_form(
            "subscriptions",
            &[
                ("customer", customer_id.to_string()),
                ("items[0][price]", price_id.to_string()),
                ("items[0][quantity]", quantity.to_string()),
            ],
        )
        .await
    }

    /// Move a subscription to a different price and/or quantity. The
    /// gateway applies its own proration; ours is computed locally for
    /// display and the two are reconciled by webhook.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the gateway rejects it.
    pub async fn update_subscription(
        &self,
        subscription_id: &str,
        price_id: &str,
        quantity: u32,
    ) -> Result<GatewaySubscription, GatewayError> {
        self.post_form(
            &format!("subscriptions/{subscription_id}"),
            &[
                ("items[0][price]", price_id.to_string()),
                ("items[0][quantity]", quantity.to_string()),
            ],
        )
        .await
    }

    /// Cancel a subscription, either at period end or immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the gateway rejects it.
    pub async fn cancel_subscription(
        &self,
        subscription_id: &str,
        at_period_end: bool,
    ) -> Result<GatewaySubscription, GatewayError> {
        if at_period_end {
            self.post_form(
                &format!("subscriptions/{subscription_id}"),
                &[("cancel_at_period_end", "true".to_string())],
            )
            .await
        } else {
            let response = self
                .request(
                    reqwest::Method::DELETE,
                    &format!("subscriptions/{subscription_id}"),
                )
                .send()
                .await?;
            Self::handle_response(response).await
        }
    }

    // =========================================================================
    // Connected accounts
    // =========================================================================

    /// Create a connected account for a tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the gateway rejects it.
    pub async fn create_connected_account(
        &self,
        tenant_id: &str,
        email: &str,
    ) -> Result<ConnectedAccount, GatewayError> {
        self.post_form(
            "accounts",
            &[
                ("type", "express".to_string()),
                ("email", email.to_string()),
                ("metadata[tenant_id]", tenant_id.to_string()),
            ],
        )
        .await
    }

    /// Create a one-time onboarding link for a connected account.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the gateway rejects it.
    pub async fn create_onboarding_link(
        &self,
        account_id: &str,
        refresh_url: &str,
        return_url: &str,
    ) -> Result<OnboardingLink, GatewayError> {
        self.post_form(
            "account_links",
            &[
                ("account", account_id.to_string()),
                ("refresh_url", refresh_url.to_string()),
                ("return_url", return_url.to_string()),
                ("type", "account_onboarding".to_string()),
            ],
        )
        .await
    }

    // =========================================================================
    // Request plumbing
    // =========================================================================

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}/{path}", self.base_url))
            .basic_auth(&self.api_key, Option::<&str>::None);
        if let Some(account) = &self.connected_account {
            builder = builder.header(ACCOUNT_HEADER, account);
        }
        builder
    }

    async fn get_request(&self, path: &str) -> Result<reqwest::Response, GatewayError> {
        Ok(self.request(reqwest::Method::GET, path).send().await?)
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, GatewayError> {
        let response = self
            .request(reqwest::Method::POST, path)
            .form(params)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Decode a success body or surface the gateway's error detail.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let error_body: Result<GatewayErrorResponse, _> = response.json().await;

        match error_body {
            Ok(gateway_error) => Err(GatewayError::Api {
                error_type: gateway_error.error.error_type,
                message: gateway_error.error.message,
                code: gateway_error.error.code,
            }),
            Err(_) => Err(GatewayError::Api {
                error_type: "unknown".to_string(),
                message: format!("HTTP {status}"),
                code: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_client_has_no_account_header() {
        let client = GatewayClient::for_platform("sk_test_xxx");
        assert!(client.connected_account.is_none());
    }

    #[test]
    fn tenant_client_carries_account() {
        let client = GatewayClient::for_tenant("sk_test_xxx", "acct_123");
        assert_eq!(client.connected_account.as_deref(), Some("acct_123"));
    }

    #[test]
    fn base_url_override() {
        let client = GatewayClient::for_platform("sk_test_xxx").with_base_url("http://localhost:1");
        assert_eq!(client.base_url, "http://localhost:1");
    }
}
