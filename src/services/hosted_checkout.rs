//! Client for the hosted card-checkout processor.
//!
//! Checkout sessions carry the order id as metadata so the webhook
//! reconciler can find the order even if the session reference was never
//! written back.

use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::config::CheckoutConfig;
use crate::entities::{order, order_item};
use crate::errors::ServiceError;

#[derive(Debug, Serialize)]
struct CreateSessionRequest {
    amount: Decimal,
    currency: String,
    line_items: Vec<SessionLineItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    success_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cancel_url: Option<String>,
    metadata: SessionMetadata,
}

#[derive(Debug, Serialize)]
struct SessionLineItem {
    name: String,
    quantity: i32,
    amount: Decimal,
}

#[derive(Debug, Serialize)]
struct SessionMetadata {
    order_id: Uuid,
}

/// A created checkout session: the reference we reconcile against and the
/// URL the customer is redirected to.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub session_id: String,
    pub redirect_url: String,
}

#[derive(Debug, Deserialize)]
struct ProcessorError {
    error: ProcessorErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProcessorErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct HostedCheckoutClient {
    client: Client,
    config: CheckoutConfig,
}

impl HostedCheckoutClient {
    pub fn new(config: CheckoutConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    /// Creates a hosted checkout session for a provisional order.
    ///
    /// Failure here is a hard payment failure: the caller cancels the
    /// provisional order and surfaces the error.
    #[instrument(skip(self, order, items), fields(order_id = %order.id))]
    pub async fn create_checkout_session(
        &self,
        order: &order::Model,
        items: &[order_item::Model],
    ) -> Result<CheckoutSession, ServiceError> {
        let request = CreateSessionRequest {
            amount: order.total_amount,
            currency: order.currency.clone(),
            line_items: items
                .iter()
                .map(|item| SessionLineItem {
                    name: item.name.clone(),
                    quantity: item.quantity,
                    amount: item.total_price,
                })
                .collect(),
            success_url: self.config.success_url.clone(),
            cancel_url: self.config.cancel_url.clone(),
            metadata: SessionMetadata { order_id: order.id },
        };

        let url = format!(
            "{}/v1/checkout/sessions",
            self.config.base_url.trim_end_matches('/')
        );
        let mut http_request = self.client.post(&url).json(&request);
        if let Some(api_key) = &self.config.api_key {
            http_request = http_request.bearer_auth(api_key);
        }

        let response = http_request.send().await.map_err(|e| {
            error!("Checkout session request failed: {}", e);
            ServiceError::PaymentFailed(format!("Checkout processor unreachable: {}", e))
        })?;

        if response.status().is_success() {
            let session: CheckoutSession = response.json().await.map_err(|e| {
                ServiceError::PaymentFailed(format!("Invalid processor response: {}", e))
            })?;
            info!(session_id = %session.session_id, "Checkout session created");
            Ok(session)
        } else {
            let status = response.status();
            let message = match response.json::<ProcessorError>().await {
                Ok(err) => err.error.message,
                Err(_) => format!("processor returned {}", status),
            };
            error!(status = %status, "Checkout session creation rejected: {}", message);
            Err(ServiceError::PaymentFailed(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_order(total: Decimal) -> order::Model {
        order::Model {
            id: Uuid::new_v4(),
            order_number: "ORD-20250309-TEST01".into(),
            customer_name: "Ada".into(),
            customer_email: "ada@example.com".into(),
            customer_phone: "555-0100".into(),
            order_type: order::OrderType::Pickup,
            delivery_address: None,
            payment_method: order::PaymentMethod::Card,
            payment_status: order::PaymentStatus::Unpaid,
            status: order::OrderStatus::AwaitingPayment,
            subtotal: total,
            tax_amount: dec!(0),
            delivery_fee: dec!(0),
            total_amount: total,
            currency: "USD".into(),
            external_payment_ref: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn creates_session_and_parses_response() {
        let server = MockServer::start().await;
        let order = test_order(dec!(12.96));

        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .and(body_partial_json(
                json!({"currency": "USD", "metadata": {"order_id": order.id}}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "session_id": "cs_test_123",
                "redirect_url": "https://pay.example.com/cs_test_123"
            })))
            .mount(&server)
            .await;

        let client = HostedCheckoutClient::new(CheckoutConfig {
            base_url: server.uri(),
            ..CheckoutConfig::default()
        });

        let session = client.create_checkout_session(&order, &[]).await.unwrap();
        assert_eq!(session.session_id, "cs_test_123");
        assert_eq!(session.redirect_url, "https://pay.example.com/cs_test_123");
    }

    #[tokio::test]
    async fn processor_rejection_is_a_payment_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "error": {"message": "amount below minimum"}
            })))
            .mount(&server)
            .await;

        let client = HostedCheckoutClient::new(CheckoutConfig {
            base_url: server.uri(),
            ..CheckoutConfig::default()
        });

        let err = client
            .create_checkout_session(&test_order(dec!(0.01)), &[])
            .await
            .unwrap_err();
        match err {
            ServiceError::PaymentFailed(message) => {
                assert!(message.contains("amount below minimum"))
            }
            other => panic!("expected PaymentFailed, got {:?}", other),
        }
    }
}
