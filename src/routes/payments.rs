use std::collections::BTreeMap;

use actix_web::{web, HttpResponse};

use crate::{
    db_interaction::{apply_payment_notification, PaymentOutcome},
    payment::PaymentGateway,
    utils::{get_pooled_connection, DbPool},
};

use super::ApiError;

fn required<'a>(fields: &'a BTreeMap<String, String>, name: &str) -> Result<&'a str, ApiError>{
    fields.get(name)
        .map(String::as_str)
        .ok_or_else(|| ApiError::BadRequest(format!("missing field {}", name)))
}

pub fn parse_outcome(result: &str) -> Result<PaymentOutcome, ApiError>{
    match result {
        "paid" => Ok(PaymentOutcome::Paid),
        "failed" | "cancelled" => Ok(PaymentOutcome::Failed),
        other => Err(ApiError::BadRequest(format!("unknown payment result {}", other)))
    }
}

// Server to server callback of the payment provider. Every posted field
// takes part in the signature
#[tracing::instrument(
    "Receiving payment notification",
    skip(pool, gateway, form)
)]
pub async fn payment_notify(
    pool: web::Data<DbPool>,
    gateway: web::Data<PaymentGateway>,
    form: web::Form<BTreeMap<String, String>>
) -> Result<HttpResponse, ApiError>{
    let fields = form.into_inner();

    if !gateway.verify(&fields) {
        tracing::warn!("Payment notification with an invalid signature");
        return Err(ApiError::Forbidden("invalid signature".to_string()));
    }

    let reference = required(&fields, "order_ref")?.to_string();
    let amount_cents = required(&fields, "amount")?
        .parse::<i64>()
        .map_err(|_| ApiError::BadRequest("amount must be an integer".to_string()))?;
    let outcome = parse_outcome(required(&fields, "result")?)?;

    let conn = get_pooled_connection(&pool).await?;
    let order = apply_payment_notification(conn, reference, amount_cents, outcome).await?;
    tracing::info!(reference = %order.reference, payment_status = %order.payment_status, "Payment notification applied");

    Ok(HttpResponse::Ok().body("OK"))
}
