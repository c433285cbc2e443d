use crate::core::AppError;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use futures_util::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use std::rc::Rc;

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Seller,
    Admin,
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" | "buyer" => Ok(Role::User),
            "seller" | "publisher" | "individual" => Ok(Role::Seller),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Authenticated caller, as asserted by the upstream identity layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl FromRequest for Principal {
    type Error = AppError;
    type Future = Ready<std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Principal>()
                .cloned()
                .ok_or_else(|| AppError::unauthorized("Authentication required")),
        )
    }
}

/// A principal with the admin role
#[derive(Debug, Clone)]
pub struct AdminPrincipal(pub Principal);

impl FromRequest for AdminPrincipal {
    type Error = AppError;
    type Future = Ready<std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let principal = req.extensions().get::<Principal>().cloned();
        ready(match principal {
            Some(principal) if principal.is_admin() => Ok(AdminPrincipal(principal)),
            Some(_) => Err(AppError::forbidden("Admin role required")),
            None => Err(AppError::unauthorized("Authentication required")),
        })
    }
}

/// Turns identity headers set by the fronting auth proxy into a `Principal`.
///
/// Requests without them pass through unauthenticated; handlers that need a
/// caller ask for `Principal` and get a 401.
pub struct TrustedHeaderAuth;

impl<S, B> Transform<S, ServiceRequest> for TrustedHeaderAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TrustedHeaderAuthMiddleware<S>;
    type Future = Ready<std::result::Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TrustedHeaderAuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct TrustedHeaderAuthMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for TrustedHeaderAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if let Some(principal) = principal_from_headers(&req) {
            req.extensions_mut().insert(principal);
        }

        let svc = self.service.clone();
        Box::pin(async move { svc.call(req).await })
    }
}

fn principal_from_headers(req: &ServiceRequest) -> Option<Principal> {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let id = header(USER_ID_HEADER)?;
    let role = match header(USER_ROLE_HEADER) {
        Some(raw) => match raw.parse() {
            Ok(role) => role,
            Err(e) => {
                tracing::warn!(user_id = %id, error = %e, "Ignoring principal with unknown role");
                return None;
            }
        },
        None => Role::User,
    };

    Some(Principal {
        id: id.to_string(),
        role,
    })
}
