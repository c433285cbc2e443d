use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse};

use crate::core::error::AppError;
use crate::modules::gateways::SIGNATURE_HEADER;
use crate::modules::payments::services::ReconciliationService;

/// Gateway server-to-server notification
/// POST /payments/webhook
///
/// The signature is checked against the body bytes exactly as received, so
/// the body is taken raw rather than through a JSON extractor.
pub async fn receive_webhook(
    service: web::Data<Arc<ReconciliationService>>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let signature = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok());

    let ack = service.handle_webhook(&body, signature).await?;

    Ok(HttpResponse::Ok().json(ack))
}
