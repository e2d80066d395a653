use std::sync::Arc;

use chrono::NaiveDate;
use shared::protocol::{PaymentRecord, StkPushResponse};
use tracing::info;

use crate::{
    error::ClientResult,
    gate::{ApiRequest, RequestGate},
    validation::{display_msisdn, PaymentForm},
};

#[derive(Clone)]
pub struct PaymentsApi {
    gate: Arc<RequestGate>,
}

impl PaymentsApi {
    pub fn new(gate: Arc<RequestGate>) -> Self {
        Self { gate }
    }

    /// Starts an STK push. The phone number is sent in `254…` form.
    pub async fn push(&self, form: PaymentForm) -> ClientResult<StkPushResponse> {
        let body = form.into_request()?;
        let phone = display_msisdn(&body.phone_number);
        let request = ApiRequest::post("stk-new-push/").json(&body)?;
        let response: StkPushResponse = self.gate.dispatch(request).await?;
        info!(
            "payments: stk push sent phone={phone} amount={} checkout={:?}",
            body.amount, response.checkout_request_id
        );
        Ok(response)
    }

    pub async fn records(&self) -> ClientResult<Vec<PaymentRecord>> {
        self.gate.dispatch(ApiRequest::get("single-messages/")).await
    }
}

/// Local filter over fetched payment records. Empty criteria match everything.
#[derive(Debug, Clone, Default)]
pub struct PaymentFilter {
    pub phone: Option<String>,
    pub amount: Option<String>,
    pub receipt: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl PaymentFilter {
    pub fn matches(&self, record: &PaymentRecord) -> bool {
        let date = record.transaction_date.date_naive();
        non_empty(&self.phone).map_or(true, |phone| record.phone_number.contains(phone))
            && non_empty(&self.amount).map_or(true, |amount| record.amount.matches(amount))
            && non_empty(&self.receipt).map_or(true, |receipt| {
                record
                    .mpesa_receipt_number
                    .to_lowercase()
                    .contains(&receipt.to_lowercase())
            })
            && self.start.map_or(true, |start| date >= start)
            && self.end.map_or(true, |end| date <= end)
    }

    pub fn apply<'a>(&self, records: &'a [PaymentRecord]) -> Vec<&'a PaymentRecord> {
        records.iter().filter(|record| self.matches(record)).collect()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
