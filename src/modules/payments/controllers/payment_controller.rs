use std::sync::Arc;

use actix_web::{http::StatusCode, web, HttpResponse};

use crate::core::error::AppError;
use crate::middleware::auth::Principal;
use crate::modules::payments::services::{
    CheckoutInput, CheckoutService, ReconciliationService, ReturnOutcome, ReturnQuery,
};

/// Storefront links used on the return page
#[derive(Debug, Clone)]
pub struct ReturnPageSettings {
    pub frontend_url: String,
}

/// Start a checkout
/// POST /payments/checkout
pub async fn create_checkout(
    service: web::Data<Arc<CheckoutService>>,
    principal: Principal,
    request: web::Json<CheckoutInput>,
) -> Result<HttpResponse, AppError> {
    let response = service.initiate(&principal.id, &request.item_id).await?;

    Ok(HttpResponse::Created().json(response))
}

/// Gateway redirect target
/// GET /payments/return?tracker=&status=&cancel=
pub async fn payment_return(
    service: web::Data<Arc<ReconciliationService>>,
    settings: web::Data<ReturnPageSettings>,
    query: web::Query<ReturnQuery>,
) -> Result<HttpResponse, AppError> {
    let outcome = service.handle_return(&query).await?;

    Ok(render_return_page(&outcome, &settings.frontend_url))
}

/// Current status of one payment
/// GET /payments/{id}
pub async fn get_payment(
    service: web::Data<Arc<ReconciliationService>>,
    principal: Principal,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let view = service
        .get_payment_status(&path.into_inner(), &principal.id, principal.is_admin())
        .await?;

    Ok(HttpResponse::Ok().json(view))
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render a return outcome as a standalone page
pub fn render_return_page(outcome: &ReturnOutcome, frontend_url: &str) -> HttpResponse {
    let home = frontend_url.trim_end_matches('/');
    let item_link = |item_id: &str| format!("{}/items/{}", home, item_id);

    let (status, title, message, link, link_label) = match outcome {
        ReturnOutcome::Cancelled => (
            StatusCode::OK,
            "Payment cancelled",
            "You cancelled the checkout. No charge was made.".to_string(),
            home.to_string(),
            "Back to the store",
        ),
        ReturnOutcome::MissingTracker => (
            StatusCode::BAD_REQUEST,
            "Invalid payment link",
            "This link is missing its payment reference.".to_string(),
            home.to_string(),
            "Back to the store",
        ),
        ReturnOutcome::PaymentNotFound { tracker } => (
            StatusCode::NOT_FOUND,
            "Payment not found",
            format!("We have no payment with reference {}.", tracker),
            home.to_string(),
            "Back to the store",
        ),
        ReturnOutcome::ProcessingError { payment, message } => (
            StatusCode::OK,
            "Payment is being processed",
            format!("{} Reference: {}.", message, payment.transaction_ref),
            item_link(&payment.item_id),
            "Check again",
        ),
        ReturnOutcome::AwaitingConfirmation { payment } => (
            StatusCode::OK,
            "Payment is being processed",
            format!(
                "Safepay has not confirmed your payment yet. Your item will appear in your library as soon as it does. Reference: {}.",
                payment.transaction_ref
            ),
            item_link(&payment.item_id),
            "Check again",
        ),
        ReturnOutcome::Confirmed(outcome) => (
            StatusCode::OK,
            "Payment successful",
            format!(
                "Thank you. Your payment of {} is confirmed and the item is now in your library.",
                outcome.payment.currency.format_amount(outcome.payment.amount)
            ),
            item_link(&outcome.payment.item_id),
            "Go to your item",
        ),
        ReturnOutcome::Declined(outcome) => (
            StatusCode::OK,
            "Payment failed",
            "Your payment was not completed. You have not been charged.".to_string(),
            item_link(&outcome.payment.item_id),
            "Try again",
        ),
    };

    let body = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>{title}</title></head>
<body>
<main>
<h1>{title}</h1>
<p>{message}</p>
<p><a href="{link}">{link_label}</a></p>
</main>
</body>
</html>"#,
        title = escape_html(title),
        message = escape_html(&message),
        link = escape_html(&link),
        link_label = escape_html(link_label),
    );

    HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(body)
}

/// Configure payment routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payments")
            .route("/checkout", web::post().to(create_checkout))
            .route("/return", web::get().to(payment_return))
            .route(
                "/webhook",
                web::post().to(super::webhook_controller::receive_webhook),
            )
            .route("/{id}", web::get().to(get_payment)),
    );
}
