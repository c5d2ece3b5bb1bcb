//! Paystack payment routes.

use axum::{Json, extract::State};
use osun_core::{AmountError, parse_amount};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::extract::ApiJson;
use crate::response::ApiResponse;
use crate::services::paystack::{ChargeAuthorization, to_kobo};
use crate::services::upstream;
use crate::state::AppState;

/// Body of `POST /api/payments/verify-paystack`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VerifyInput {
    pub reference: Option<String>,
}

/// Verify a Paystack transaction.
///
/// POST /api/payments/verify-paystack
#[instrument(skip_all)]
pub async fn verify(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<VerifyInput>,
) -> Result<Json<ApiResponse<Value>>> {
    let reference = input
        .reference
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .ok_or_else(|| AppError::Validation("reference is required".to_string()))?;

    let transaction = state.paystack()?.verify_transaction(&reference).await?;
    Ok(ApiResponse::data(upstream::unwrap_data(transaction)))
}

/// Body of `POST /api/payments/charge-authorization`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChargeInput {
    pub email: Option<String>,
    /// Amount in naira.
    pub amount: Option<Value>,
    #[serde(alias = "authorizationCode")]
    pub authorization_code: Option<String>,
    pub reference: Option<String>,
    pub currency: Option<String>,
    pub metadata: Option<Value>,
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{field} is required")))
}

impl ChargeInput {
    fn into_charge(self) -> Result<ChargeAuthorization> {
        let email = required(self.email, "email")?;
        let authorization_code = required(self.authorization_code, "authorization_code")?;
        let amount = match self.amount.as_ref().map(parse_amount) {
            None | Some(Err(AmountError::Missing)) => {
                return Err(AppError::Validation("amount is required".to_string()));
            }
            Some(Ok(amount)) => to_kobo(amount),
            Some(Err(_)) => None,
        }
        .ok_or_else(|| AppError::Validation("amount must be a positive number".to_string()))?;

        Ok(ChargeAuthorization {
            email,
            amount,
            authorization_code,
            reference: self.reference,
            currency: self.currency,
            metadata: self.metadata,
        })
    }
}

/// Charge a saved card authorization. The amount is sent to Paystack in kobo.
///
/// POST /api/payments/charge-authorization
#[instrument(skip_all)]
pub async fn charge_authorization(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ChargeInput>,
) -> Result<Json<ApiResponse<Value>>> {
    let charge = input.into_charge()?;
    let result = state.paystack()?.charge_authorization(&charge).await?;
    Ok(ApiResponse::data(upstream::unwrap_data(result)))
}
