use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::extractors::IsUser,
    db_interaction::{create_order_and_reserve_seats, get_site_settings, CheckoutLine, NewOrder, OrderWithItems, SiteSettings},
    domain::{phone_number::PhoneNumberDomain, price::format_amount, status::PaymentMethod, user_email::UserEmail},
    email_client::{EmailClient, EmailMessage},
    payment::PaymentGateway,
    routes::ApiError,
    utils::{get_pooled_connection, DbPool},
};

#[derive(Deserialize, Debug)]
pub struct CheckoutRequest{
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub items: Vec<CheckoutLine>
}

// What the customer does next to pay the order
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaymentInstructions{
    Redirect{
        action_url: String,
        fields: std::collections::BTreeMap<String, String>
    },
    BankTransfer{
        reference: String,
        holder: Option<String>,
        iban: Option<String>,
        bic: Option<String>,
        amount_label: String
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CheckoutResponse{
    pub order_id: Uuid,
    pub reference: String,
    pub total_cents: i64,
    pub total_label: String,
    pub payment: PaymentInstructions
}

fn non_blank(value: Option<String>) -> Option<String>{
    value.map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// Validates the customer fields, the cart itself is checked with the seats
pub fn new_order_from_request(
    request: &CheckoutRequest,
    user_id: Option<Uuid>,
    settings: &SiteSettings
) -> Result<NewOrder, ApiError>{
    let first_name = request.first_name.trim();
    let last_name = request.last_name.trim();
    if first_name.is_empty() || last_name.is_empty() {
        return Err(ApiError::BadRequest("first and last name are required".to_string()));
    }

    let email = UserEmail::parse(request.email.clone())
        .map_err(ApiError::BadRequest)?;

    let phone = match non_blank(request.phone.clone()) {
        Some(phone) => Some(PhoneNumberDomain::parse(phone).map_err(ApiError::BadRequest)?.inner()),
        None => None
    };

    let method_enabled = match request.payment_method {
        PaymentMethod::Card => settings.card_payment_enabled,
        PaymentMethod::BankTransfer => settings.bank_transfer_enabled
    };
    if !method_enabled {
        return Err(ApiError::BadRequest(format!(
            "payment method {} is not available", request.payment_method
        )));
    }

    Ok(NewOrder{
        user_id,
        customer_first_name: first_name.to_string(),
        customer_last_name: last_name.to_string(),
        customer_email: email.inner(),
        customer_phone: phone,
        company: non_blank(request.company.clone()),
        payment_method: request.payment_method,
        notes: non_blank(request.notes.clone())
    })
}

pub fn payment_instructions(
    order: &OrderWithItems,
    method: PaymentMethod,
    settings: &SiteSettings,
    gateway: &PaymentGateway
) -> PaymentInstructions{
    match method {
        PaymentMethod::Card => {
            let form = gateway.payment_form(&order.order);
            PaymentInstructions::Redirect{
                action_url: form.action_url,
                fields: form.fields
            }
        },
        PaymentMethod::BankTransfer => PaymentInstructions::BankTransfer{
            reference: order.order.reference.clone(),
            holder: settings.bank_holder.clone(),
            iban: settings.bank_iban.clone(),
            bic: settings.bank_bic.clone(),
            amount_label: order.total_label.clone()
        }
    }
}

pub fn confirmation_text(order: &OrderWithItems, payment: &PaymentInstructions, site_name: &str) -> String{
    let mut text = format!(
        "Bonjour {},\n\nNous avons bien reçu votre commande {} sur {}.\n\n",
        order.order.customer_first_name, order.order.reference, site_name
    );

    for item in &order.items {
        text.push_str(&format!(
            "- {} ({}, {}) x{} : {}\n",
            item.formation_title,
            item.session_city,
            item.session_starts_on.format("%d/%m/%Y"),
            item.quantity,
            format_amount(item.unit_price_cents * i64::from(item.quantity))
        ));
    }
    text.push_str(&format!("\nTotal : {}\n", order.total_label));

    if let PaymentInstructions::BankTransfer{ reference, holder, iban, bic, amount_label } = payment {
        text.push_str(&format!(
            "\nMerci de régler {} par virement en indiquant la référence {}.\n",
            amount_label, reference
        ));
        if let Some(holder) = holder {
            text.push_str(&format!("Titulaire : {}\n", holder));
        }
        if let Some(iban) = iban {
            text.push_str(&format!("IBAN : {}\n", iban));
        }
        if let Some(bic) = bic {
            text.push_str(&format!("BIC : {}\n", bic));
        }
    }

    text
}

#[tracing::instrument(
    "Checking out cart",
    skip(pool, email_client, gateway, request, user),
    fields(items = request.items.len())
)]
pub async fn post_checkout(
    pool: web::Data<DbPool>,
    email_client: web::Data<EmailClient>,
    gateway: web::Data<PaymentGateway>,
    request: web::Json<CheckoutRequest>,
    user: Option<IsUser>
) -> Result<HttpResponse, ApiError>{
    let request = request.into_inner();

    let conn = get_pooled_connection(&pool).await?;
    let settings = get_site_settings(conn).await?;

    let new_order = new_order_from_request(&request, user.map(|u| u.0), &settings)?;
    let method = new_order.payment_method;

    let conn = get_pooled_connection(&pool).await?;
    let order = create_order_and_reserve_seats(conn, new_order, request.items).await?;
    tracing::info!(reference = %order.order.reference, total_cents = order.order.total_cents, "Order created");

    let payment = payment_instructions(&order, method, &settings, &gateway);

    // The order is placed whether or not the customer gets the email
    match UserEmail::parse(order.order.customer_email.clone()) {
        Ok(recipient) => {
            let text = confirmation_text(&order, &payment, &settings.site_name);
            let subject = format!("Confirmation de votre commande {}", order.order.reference);
            let message = EmailMessage::plain(&recipient, &subject, &text, "order-confirmation");
            if let Err(e) = email_client.send(&message).await {
                tracing::warn!(error = ?e, "Failed to send order confirmation email");
            }
        },
        Err(e) => tracing::warn!("Stored customer email is invalid: {}", e)
    }

    Ok(HttpResponse::Created().json(CheckoutResponse{
        order_id: order.order.order_id,
        reference: order.order.reference.clone(),
        total_cents: order.order.total_cents,
        total_label: order.total_label.clone(),
        payment
    }))
}
