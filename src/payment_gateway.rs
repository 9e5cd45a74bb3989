use log::error;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};

use crate::env;
use crate::error::{ServiceError, ServiceResult};

/// Thin client for the external payment gateway. Keeps no local state,
/// the gateway response is passed straight back to the caller.
pub struct PaymentGateway {
    client: Client,
}

#[derive(Debug, Serialize)]
pub struct CheckoutRequest {
    pub member_number: String,
    pub amount_cents: i64,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutResponse {
    pub checkout_id: String,
    pub checkout_url: String,
}

impl PaymentGateway {
    pub fn new() -> ServiceResult<Self> {
        let client = Client::builder().build()?;
        Ok(Self { client })
    }

    pub async fn create_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> ServiceResult<CheckoutResponse> {
        let url = format!("{}/checkouts", env::PAYMENT_GATEWAY_URL.as_str());
        let response = match self
            .client
            .post(&url)
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", env::PAYMENT_GATEWAY_KEY.as_str()),
            )
            .json(request)
            .send()
            .await
        {
            Ok(v) => v,
            Err(e) => {
                error!("{:?}", e);
                return Err(e.into());
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::PaymentGateway {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}
