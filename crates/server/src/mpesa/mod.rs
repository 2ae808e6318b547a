//! M-Pesa Daraja API client for STK push payments.
//!
//! The gateway is a black box to the lifecycle core: `stk_push` submits a
//! payment prompt to the payer's device and returns a `CheckoutRequestID`;
//! the terminal result arrives later on the callback URL as an
//! [`StkCallbackEnvelope`]. Requests carry the configured timeout, and every
//! failure here is recoverable by initiating a new payment.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue};
use rust_decimal::prelude::ToPrimitive;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use duka_core::{Amount, PhoneNumber};

use crate::config::MpesaConfig;

/// OAuth token endpoint path.
const TOKEN_PATH: &str = "/oauth/v1/generate?grant_type=client_credentials";

/// STK push (Lipa na M-Pesa online) endpoint path.
const STK_PUSH_PATH: &str = "/mpesa/stkpush/v1/processrequest";

/// Errors that can occur when calling the payment gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed or timed out.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Gateway returned a non-success HTTP status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Gateway accepted the request but rejected the push.
    #[error("STK push rejected: {code} - {description}")]
    Rejected { code: String, description: String },

    /// Failed to parse a gateway response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// M-Pesa Daraja API client.
#[derive(Clone)]
pub struct MpesaClient {
    client: reqwest::Client,
    config: MpesaConfig,
}

impl MpesaClient {
    /// Create a new Daraja client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: MpesaConfig) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self { client, config })
    }

    /// Obtain an OAuth bearer token.
    ///
    /// Tokens are short-lived; one is fetched per push rather than cached.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response has no token.
    async fn access_token(&self) -> Result<String, GatewayError> {
        let url = format!("{}{TOKEN_PATH}", self.config.environment.base_url());
        let auth = basic_auth(
            &self.config.consumer_key,
            self.config.consumer_secret.expose_secret(),
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", auth)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;

        Ok(token.access_token)
    }

    /// Initiate an STK push (Lipa na M-Pesa online checkout).
    ///
    /// # Errors
    ///
    /// Returns error if the gateway is unreachable, times out, or rejects
    /// the push. All of these leave no gateway-side state worth keeping;
    /// the caller marks the payment failed and may retry with a new one.
    pub async fn stk_push(
        &self,
        phone_number: &PhoneNumber,
        amount: Amount,
        account_reference: &str,
        description: &str,
    ) -> Result<StkPushResponse, GatewayError> {
        let token = self.access_token().await?;
        let timestamp = Utc::now().format("%Y%m%d%H%M%S").to_string();
        let password = encode_password(
            &self.config.short_code,
            self.config.passkey.expose_secret(),
            &timestamp,
        );

        // Daraja wants a whole-shilling integer amount.
        let amount = amount.as_decimal().round_dp(0).to_u64().unwrap_or(0);

        let payload = serde_json::json!({
            "BusinessShortCode": self.config.short_code,
            "Password": password,
            "Timestamp": timestamp,
            "TransactionType": "CustomerPayBillOnline",
            "Amount": amount,
            "PartyA": phone_number.as_str(),
            "PartyB": self.config.short_code,
            "PhoneNumber": phone_number.as_str(),
            "CallBackURL": self.config.callback_url.as_str(),
            "AccountReference": account_reference,
            "TransactionDesc": description,
        });

        let url = format!("{}{STK_PUSH_PATH}", self.config.environment.base_url());
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let push: StkPushResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;

        if push.response_code != "0" {
            return Err(GatewayError::Rejected {
                code: push.response_code,
                description: push.response_description,
            });
        }

        Ok(push)
    }
}

/// Basic auth header value for the token endpoint.
fn basic_auth(consumer_key: &str, consumer_secret: &str) -> String {
    let credentials = BASE64.encode(format!("{consumer_key}:{consumer_secret}"));
    format!("Basic {credentials}")
}

/// Encode the STK push password: base64(short_code + passkey + timestamp).
fn encode_password(short_code: &str, passkey: &str, timestamp: &str) -> String {
    BASE64.encode(format!("{short_code}{passkey}{timestamp}"))
}

/// OAuth token response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Successful STK push acknowledgement.
#[derive(Debug, Clone, Deserialize)]
pub struct StkPushResponse {
    /// Gateway-assigned id for the merchant request.
    #[serde(rename = "MerchantRequestID")]
    pub merchant_request_id: String,
    /// Transaction reference keying the asynchronous callback.
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    /// "0" when the push was accepted.
    #[serde(rename = "ResponseCode")]
    pub response_code: String,
    #[serde(rename = "ResponseDescription")]
    pub response_description: String,
    #[serde(rename = "CustomerMessage")]
    pub customer_message: String,
}

/// Envelope delivered to the callback URL when the push resolves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StkCallbackEnvelope {
    #[serde(rename = "Body")]
    pub body: StkCallbackBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StkCallbackBody {
    #[serde(rename = "stkCallback")]
    pub stk_callback: StkCallback,
}

/// The terminal result of an STK push.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StkCallback {
    #[serde(rename = "MerchantRequestID")]
    pub merchant_request_id: String,
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    /// 0 means the payer completed the payment; anything else is a failure
    /// (cancelled, timed out, insufficient funds, ...).
    #[serde(rename = "ResultCode")]
    pub result_code: i64,
    #[serde(rename = "ResultDesc")]
    pub result_desc: String,
}

impl StkCallback {
    /// Whether the payer completed the payment.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.result_code == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_encoding_matches_daraja_recipe() {
        // Worked example from the Daraja sandbox docs.
        let password = encode_password("174379", "passkey", "20240101120000");
        assert_eq!(
            password,
            BASE64.encode("174379passkey20240101120000")
        );
    }

    #[test]
    fn basic_auth_is_base64_of_key_colon_secret() {
        let auth = basic_auth("key", "secret");
        assert_eq!(auth, format!("Basic {}", BASE64.encode("key:secret")));
    }

    #[test]
    fn parses_success_callback() {
        let raw = r#"{
            "Body": {
                "stkCallback": {
                    "MerchantRequestID": "29115-34620561-1",
                    "CheckoutRequestID": "ws_CO_191220191020363925",
                    "ResultCode": 0,
                    "ResultDesc": "The service request is processed successfully."
                }
            }
        }"#;
        let envelope: StkCallbackEnvelope = serde_json::from_str(raw).unwrap();
        let callback = envelope.body.stk_callback;
        assert!(callback.is_success());
        assert_eq!(callback.checkout_request_id, "ws_CO_191220191020363925");
    }

    #[test]
    fn parses_cancelled_callback() {
        let raw = r#"{
            "Body": {
                "stkCallback": {
                    "MerchantRequestID": "29115-34620561-1",
                    "CheckoutRequestID": "ws_CO_191220191020363925",
                    "ResultCode": 1032,
                    "ResultDesc": "Request cancelled by user."
                }
            }
        }"#;
        let envelope: StkCallbackEnvelope = serde_json::from_str(raw).unwrap();
        assert!(!envelope.body.stk_callback.is_success());
    }

    #[test]
    fn parses_push_acknowledgement() {
        let raw = r#"{
            "MerchantRequestID": "29115-34620561-1",
            "CheckoutRequestID": "ws_CO_191220191020363925",
            "ResponseCode": "0",
            "ResponseDescription": "Success. Request accepted for processing",
            "CustomerMessage": "Success. Request accepted for processing"
        }"#;
        let push: StkPushResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(push.response_code, "0");
        assert_eq!(push.checkout_request_id, "ws_CO_191220191020363925");
    }
}
