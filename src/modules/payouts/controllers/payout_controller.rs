use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::core::error::AppError;
use crate::middleware::auth::{AdminPrincipal, Principal};
use crate::modules::payouts::services::PayoutService;

#[derive(Debug, Deserialize)]
pub struct ListPayoutsQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    50
}

#[derive(Debug, Deserialize)]
pub struct CompletePayoutRequest {
    pub external_reference: String,
}

#[derive(Debug, Deserialize)]
pub struct FailPayoutRequest {
    pub reason: String,
}

fn ensure_self_or_admin(principal: &Principal, seller_id: &str) -> Result<(), AppError> {
    if principal.is_admin() || principal.id == seller_id {
        Ok(())
    } else {
        Err(AppError::forbidden("Not allowed to act for this seller"))
    }
}

/// Run the fleet sweep now
/// POST /payouts/run
pub async fn run_all(
    service: web::Data<Arc<PayoutService>>,
    _admin: AdminPrincipal,
) -> Result<HttpResponse, AppError> {
    let results = service.process_all_auto_payouts().await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "results": results })))
}

/// Settle one seller now
/// POST /payouts/sellers/{id}/run
pub async fn run_for_seller(
    service: web::Data<Arc<PayoutService>>,
    principal: Principal,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let seller_id = path.into_inner();
    ensure_self_or_admin(&principal, &seller_id)?;

    let result = service.process_auto_payout_for(&seller_id).await?;

    Ok(HttpResponse::Ok().json(result))
}

/// Payout history of a seller
/// GET /payouts/sellers/{id}
pub async fn list_for_seller(
    service: web::Data<Arc<PayoutService>>,
    principal: Principal,
    path: web::Path<String>,
    query: web::Query<ListPayoutsQuery>,
) -> Result<HttpResponse, AppError> {
    let seller_id = path.into_inner();
    ensure_self_or_admin(&principal, &seller_id)?;

    let payouts = service
        .list_seller_payouts(&seller_id, query.limit.clamp(1, 200))
        .await?;

    Ok(HttpResponse::Ok().json(payouts))
}

/// GET /payouts/{id}
pub async fn get_payout(
    service: web::Data<Arc<PayoutService>>,
    principal: Principal,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let payout_id = path.into_inner();
    let payout = service.get_payout(&payout_id).await?;

    if !principal.is_admin() && principal.id != payout.seller_id {
        return Err(AppError::not_found(format!("Payout '{}' not found", payout_id)));
    }

    Ok(HttpResponse::Ok().json(payout))
}

/// Finalize a manual payout as sent
/// POST /payouts/{id}/complete
pub async fn complete_payout(
    service: web::Data<Arc<PayoutService>>,
    _admin: AdminPrincipal,
    path: web::Path<String>,
    request: web::Json<CompletePayoutRequest>,
) -> Result<HttpResponse, AppError> {
    let payout = service
        .complete_manual(&path.into_inner(), &request.external_reference)
        .await?;

    Ok(HttpResponse::Ok().json(payout))
}

/// Finalize a manual payout as failed
/// POST /payouts/{id}/fail
pub async fn fail_payout(
    service: web::Data<Arc<PayoutService>>,
    _admin: AdminPrincipal,
    path: web::Path<String>,
    request: web::Json<FailPayoutRequest>,
) -> Result<HttpResponse, AppError> {
    let payout = service
        .fail_manual(&path.into_inner(), &request.reason)
        .await?;

    Ok(HttpResponse::Ok().json(payout))
}

/// Configure payout routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payouts")
            .route("/run", web::post().to(run_all))
            .route("/sellers/{id}/run", web::post().to(run_for_seller))
            .route("/sellers/{id}", web::get().to(list_for_seller))
            .route("/{id}", web::get().to(get_payout))
            .route("/{id}/complete", web::post().to(complete_payout))
            .route("/{id}/fail", web::post().to(fail_payout)),
    );
}
