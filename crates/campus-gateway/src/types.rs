//! Gateway API types.

use serde::Deserialize;

/// Gateway customer object.
#[derive(Debug, Clone, Deserialize)]
pub struct Customer {
    /// Gateway customer ID.
    pub id: String,
    /// Customer email.
    #[serde(default)]
    pub email: Option<String>,
    /// Customer name.
    #[serde(default)]
    pub name: Option<String>,
    /// Metadata attached to the customer.
    #[serde(default)]
    pub metadata: serde_json::Value,
    /// Created timestamp (Unix).
    #[serde(default)]
    pub created: i64,
}

/// A stored payment method.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentMethod {
    /// Payment method ID.
    pub id: String,
    /// Payment method type (e.g. "card").
    #[serde(rename = "type")]
    pub method_type: String,
    /// Card details, when the method is a card.
    #[serde(default)]
    pub card: Option<CardDetails>,
    /// Owning customer ID.
    #[serde(default)]
    pub customer: Option<String>,
}

/// Card details of a payment method.
#[derive(Debug, Clone, Deserialize)]
pub struct CardDetails {
    /// Card brand (e.g. "visa").
    #[serde(default)]
    pub brand: String,
    /// Last four digits.
    #[serde(default)]
    pub last4: String,
    /// Expiry month.
    #[serde(default)]
    pub exp_month: u32,
    /// Expiry year.
    #[serde(default)]
    pub exp_year: u32,
}

/// A setup intent for collecting a payment method without charging.
#[derive(Debug, Clone, Deserialize)]
pub struct SetupIntent {
    /// Setup intent ID.
    pub id: String,
    /// Client secret for the frontend confirmation flow.
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Status (`requires_payment_method`, `succeeded`, ...).
    #[serde(default)]
    pub status: String,
    /// Owning customer ID.
    #[serde(default)]
    pub customer: Option<String>,
}

/// A payment intent.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    /// Payment intent ID.
    pub id: String,
    /// Amount in cents.
    #[serde(default)]
    pub amount: i64,
    /// Currency (e.g. "usd").
    #[serde(default)]
    pub currency: String,
    /// Status (`succeeded`, `processing`, `canceled`, ...).
    #[serde(default)]
    pub status: String,
    /// Owning customer ID.
    #[serde(default)]
    pub customer: Option<String>,
    /// Client secret for the frontend confirmation flow.
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Created timestamp (Unix).
    #[serde(default)]
    pub created: i64,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
}

/// An invoice.
#[derive(Debug, Clone, Deserialize)]
pub struct Invoice {
    /// Invoice ID.
    pub id: String,
    /// Status (`draft`, `open`, `paid`, `void`, `uncollectible`).
    #[serde(default)]
    pub status: String,
    /// Amount due in cents.
    #[serde(default)]
    pub amount_due: i64,
    /// Amount paid in cents.
    #[serde(default)]
    pub amount_paid: i64,
    /// Currency.
    #[serde(default)]
    pub currency: String,
    /// Owning customer ID.
    #[serde(default)]
    pub customer: Option<String>,
    /// Hosted payment page URL.
    #[serde(default)]
    pub hosted_invoice_url: Option<String>,
}

/// A gateway-side subscription.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySubscription {
    /// Gateway subscription ID.
    pub id: String,
    /// Status (`trialing`, `active`, `past_due`, `canceled`, ...).
    #[serde(default)]
    pub status: String,
    /// Owning customer ID.
    #[serde(default)]
    pub customer: Option<String>,
    /// Current billing period start (Unix).
    #[serde(default)]
    pub current_period_start: i64,
    /// Current billing period end (Unix).
    #[serde(default)]
    pub current_period_end: i64,
    /// Whether the subscription cancels at the period end.
    #[serde(default)]
    pub cancel_at_period_end: bool,
}

/// A connected account for a tenant that collects its own payments.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectedAccount {
    /// Account ID.
    pub id: String,
    /// Whether the account can accept charges.
    #[serde(default)]
    pub charges_enabled: bool,
    /// Whether onboarding details have been submitted.
    #[serde(default)]
    pub details_submitted: bool,
    /// Account email.
    #[serde(default)]
    pub email: Option<String>,
}

/// A one-time onboarding link for a connected account.
#[derive(Debug, Clone, Deserialize)]
pub struct OnboardingLink {
    /// URL to redirect the tenant owner to.
    pub url: String,
    /// Expiry timestamp (Unix).
    #[serde(default)]
    pub expires_at: i64,
}

/// Gateway list response wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayList<T> {
    /// Object type (always "list").
    #[serde(default)]
    pub object: String,
    /// Data items.
    pub data: Vec<T>,
    /// Whether there are more items.
    #[serde(default)]
    pub has_more: bool,
}

/// Gateway API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayErrorResponse {
    /// Error details.
    pub error: GatewayErrorDetail,
}

/// Gateway error detail.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayErrorDetail {
    /// Error type.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Error message.
    pub message: String,
    /// Error code.
    #[serde(default)]
    pub code: Option<String>,
    /// Parameter that caused the error.
    #[serde(default)]
    pub param: Option<String>,
}
