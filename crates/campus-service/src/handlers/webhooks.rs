//! Payment gateway webhook handler.
//!
//! Events arrive signed with an HMAC over `"{timestamp}.{payload}"`,
//! carried in the `gateway-signature` header as `t=<unix>,v1=<hex>`.
//! Reconciliation is keyed by the gateway subscription id and guarded by
//! the event's `created` timestamp: an event strictly older than the last
//! one applied is acknowledged but skipped.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use campus_core::{SubscriptionStatus, TenantSubscription};
use campus_store::Store;

use crate::crypto::{constant_time_eq, hmac_sha256_hex};
use crate::error::ApiError;
use crate::state::AppState;

/// Signature header name.
pub const SIGNATURE_HEADER: &str = "gateway-signature";

/// Gateway event envelope.
#[derive(Debug, Deserialize)]
struct GatewayEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    /// Event creation time as a Unix timestamp.
    created: i64,
    data: GatewayEventData,
}

#[derive(Debug, Deserialize)]
struct GatewayEventData {
    object: serde_json::Value,
}

/// Webhook acknowledgement.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Always true; the gateway retries on anything but a 2xx.
    pub received: bool,
}

/// Handle a gateway webhook event.
pub async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    let payload = std::str::from_utf8(&body)
        .map_err(|_| ApiError::BadRequest("Body is not valid UTF-8".into()))?;

    verify_signature(&state, &headers, payload)?;

    let event: GatewayEvent = serde_json::from_str(payload)
        .map_err(|e| ApiError::BadRequest(format!("Malformed event: {e}")))?;

    tracing::info!(
        event_id = %event.id,
        event_type = %event.event_type,
        "Gateway event received"
    );

    match event.event_type.as_str() {
        "customer.subscription.updated" => apply_subscription_update(&state, &event)?,
        "customer.subscription.deleted" => {
            apply_status(&state, &event, SubscriptionStatus::Canceled)?;
        }
        "invoice.payment_succeeded" => {
            apply_invoice_status(&state, &event, SubscriptionStatus::Active)?;
        }
        "invoice.payment_failed" => {
            apply_invoice_status(&state, &event, SubscriptionStatus::PastDue)?;
        }
        "account.updated" | "payment_intent.succeeded" | "payment_intent.payment_failed"
        | "setup_intent.succeeded" => {
            tracing::debug!(event_type = %event.event_type, "No local state to reconcile");
        }
        other => {
            tracing::debug!(event_type = %other, "Ignoring unhandled event type");
        }
    }

    Ok(Json(WebhookResponse { received: true }))
}

/// Verify the `t=<unix>,v1=<hex>` signature header against the configured
/// webhook secret. Without a configured secret every event is rejected.
fn verify_signature(state: &AppState, headers: &HeaderMap, payload: &str) -> Result<(), ApiError> {
    let Some(secret) = &state.config.gateway_webhook_secret else {
        tracing::warn!("Webhook received but no webhook secret is configured");
        return Err(ApiError::Unauthorized);
    };

    let header = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    let mut timestamp = None;
    let mut signature = None;
    for part in header.split(',') {
        match part.split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signature = Some(value),
            _ => {}
        }
    }
    let (timestamp, signature) = match (timestamp, signature) {
        (Some(t), Some(s)) => (t, s),
        _ => return Err(ApiError::Unauthorized),
    };

    let expected = hmac_sha256_hex(secret, &format!("{timestamp}.{payload}"));
    if constant_time_eq(&expected, signature) {
        Ok(())
    } else {
        tracing::warn!("Webhook signature mismatch");
        Err(ApiError::Unauthorized)
    }
}

/// Full reconciliation from a `customer.subscription.updated` event:
/// status, billing period, and cancel-at-period-end all come from the
/// gateway's subscription object.
fn apply_subscription_update(state: &AppState, event: &GatewayEvent) -> Result<(), ApiError> {
    #[derive(Debug, Deserialize)]
    struct SubscriptionObject {
        id: String,
        status: String,
        current_period_start: Option<i64>,
        current_period_end: Option<i64>,
    }

    let object: SubscriptionObject = serde_json::from_value(event.data.object.clone())
        .map_err(|e| ApiError::BadRequest(format!("Malformed subscription object: {e}")))?;

    let Some(mut subscription) = lookup(state, event, &object.id)? else {
        return Ok(());
    };

    subscription.status = map_gateway_status(&object.status);
    if let Some(start) = object.current_period_start {
        subscription.current_period_start = DateTime::from_timestamp(start, 0);
    }
    if let Some(end) = object.current_period_end {
        subscription.current_period_end = DateTime::from_timestamp(end, 0);
    }
    finish(state, event, subscription)
}

/// Status-only transition keyed by the subscription object's own id.
fn apply_status(
    state: &AppState,
    event: &GatewayEvent,
    status: SubscriptionStatus,
) -> Result<(), ApiError> {
    #[derive(Debug, Deserialize)]
    struct SubscriptionObject {
        id: String,
    }

    let object: SubscriptionObject = serde_json::from_value(event.data.object.clone())
        .map_err(|e| ApiError::BadRequest(format!("Malformed subscription object: {e}")))?;

    let Some(mut subscription) = lookup(state, event, &object.id)? else {
        return Ok(());
    };
    subscription.status = status;
    finish(state, event, subscription)
}

/// Status transition keyed by an invoice's `subscription` reference.
fn apply_invoice_status(
    state: &AppState,
    event: &GatewayEvent,
    status: SubscriptionStatus,
) -> Result<(), ApiError> {
    #[derive(Debug, Deserialize)]
    struct InvoiceObject {
        subscription: Option<String>,
    }

    let object: InvoiceObject = serde_json::from_value(event.data.object.clone())
        .map_err(|e| ApiError::BadRequest(format!("Malformed invoice object: {e}")))?;

    let Some(external_id) = object.subscription else {
        tracing::debug!(event_id = %event.id, "Invoice carries no subscription reference");
        return Ok(());
    };

    let Some(mut subscription) = lookup(state, event, &external_id)? else {
        return Ok(());
    };
    subscription.status = status;
    finish(state, event, subscription)
}

/// Find the local row for a gateway subscription id and apply the
/// monotonic event guard. `None` means the event should be acknowledged
/// without any write.
fn lookup(
    state: &AppState,
    event: &GatewayEvent,
    external_id: &str,
) -> Result<Option<TenantSubscription>, ApiError> {
    let Some(subscription) = state.store.find_by_external_subscription_id(external_id)? else {
        tracing::warn!(
            event_id = %event.id,
            external_id = %external_id,
            "Event references an unknown subscription"
        );
        return Ok(None);
    };

    let event_time = DateTime::from_timestamp(event.created, 0).unwrap_or_else(Utc::now);
    if let Some(applied) = subscription.last_gateway_event_at {
        if event_time < applied {
            tracing::info!(
                event_id = %event.id,
                subscription_id = %subscription.id,
                "Skipping stale event"
            );
            return Ok(None);
        }
    }

    Ok(Some(subscription))
}

/// Stamp the event time and persist the reconciled row.
fn finish(
    state: &AppState,
    event: &GatewayEvent,
    mut subscription: TenantSubscription,
) -> Result<(), ApiError> {
    subscription.last_gateway_event_at =
        Some(DateTime::from_timestamp(event.created, 0).unwrap_or_else(Utc::now));
    subscription.updated_at = Utc::now();
    state.store.update_subscription(&subscription)?;

    tracing::info!(
        event_id = %event.id,
        subscription_id = %subscription.id,
        status = ?subscription.status,
        "Subscription reconciled"
    );
    Ok(())
}

fn map_gateway_status(status: &str) -> SubscriptionStatus {
    match status {
        "trialing" => SubscriptionStatus::Trial,
        "past_due" | "unpaid" => SubscriptionStatus::PastDue,
        "canceled" | "incomplete_expired" => SubscriptionStatus::Canceled,
        // "active" and anything the gateway adds later.
        _ => SubscriptionStatus::Active,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_status_mapping() {
        assert_eq!(map_gateway_status("trialing"), SubscriptionStatus::Trial);
        assert_eq!(map_gateway_status("active"), SubscriptionStatus::Active);
        assert_eq!(map_gateway_status("past_due"), SubscriptionStatus::PastDue);
        assert_eq!(
            map_gateway_status("canceled"),
            SubscriptionStatus::Canceled
        );
    }

    #[test]
    fn event_envelope_parses() {
        let event: GatewayEvent = serde_json::from_str(
            r#"{
                "id": "evt_1",
                "type": "invoice.payment_succeeded",
                "created": 1700000000,
                "data": { "object": { "subscription": "sub_ext_1" } }
            }"#,
        )
        .unwrap();
        assert_eq!(event.event_type, "invoice.payment_succeeded");
        assert_eq!(event.created, 1_700_000_000);
    }

    #[test]
    fn signature_header_format() {
        let secret = "whsec_test";
        let payload = r#"{"id":"evt_1"}"#;
        let ts = "1700000000";
        let sig = hmac_sha256_hex(secret, &format!("{ts}.{payload}"));
        let header = format!("t={ts},v1={sig}");

        let mut timestamp = None;
        let mut signature = None;
        for part in header.split(',') {
            match part.split_once('=') {
                Some(("t", value)) => timestamp = Some(value),
                Some(("v1", value)) => signature = Some(value),
                _ => {}
            }
        }
        assert_eq!(timestamp, Some(ts));
        assert_eq!(signature.unwrap(), sig);
    }
}
