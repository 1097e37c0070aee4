//! Webhook signature middleware for Actix Web.
//!
//! The payment processor signs each notification with the endpoint's webhook secret. This middleware reads the raw
//! request body, checks it against the signature header and, if it is genuine, stores the [`VerifiedPayload`] in the
//! request extensions for the handler to pick up. Requests that fail the check never reach the handler.
//!
//! Wrap every processor webhook route with this middleware.
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::CONTENT_LENGTH,
    web,
    Error,
    HttpMessage,
};
use bean_common::Secret;
use bean_engine::helpers::{verify_signature, VerifiedPayload, SIGNATURE_HEADER};
use chrono::Utc;
use futures::future::LocalBoxFuture;
use log::{trace, warn};

use crate::{config::WebhookConfig, errors::ServerError};

/// Notifications larger than this are refused without being read in full.
pub const MAX_WEBHOOK_BODY_SIZE: usize = 64 * 1024;

pub struct SignatureMiddlewareFactory {
    secret: Secret<String>,
    tolerance_secs: Option<i64>,
}

impl SignatureMiddlewareFactory {
    pub fn new(config: &WebhookConfig) -> Self {
        SignatureMiddlewareFactory { secret: config.secret.clone(), tolerance_secs: config.tolerance_secs }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SignatureMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = SignatureMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SignatureMiddlewareService {
            secret: self.secret.clone(),
            tolerance_secs: self.tolerance_secs,
            service: Rc::new(service),
        }))
    }
}

pub struct SignatureMiddlewareService<S> {
    secret: Secret<String>,
    tolerance_secs: Option<i64>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for SignatureMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let secret = self.secret.reveal().clone();
        let tolerance = self.tolerance_secs;
        Box::pin(async move {
            trace!("🔐️ Checking webhook signature for request");
            let declared_length = req
                .headers()
                .get(CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or_default();
            if declared_length > MAX_WEBHOOK_BODY_SIZE {
                warn!("🔐️ Webhook body of {declared_length} bytes is too large. Denying access.");
                return Err(ServerError::PayloadTooLarge(MAX_WEBHOOK_BODY_SIZE).into());
            }
            let data = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Failed to extract webhook body: {e:?}");
                ServerError::InvalidRequestBody("Failed to extract request data.".into())
            })?;
            if data.len() > MAX_WEBHOOK_BODY_SIZE {
                warn!("🔐️ Webhook body of {} bytes is too large. Denying access.", data.len());
                return Err(ServerError::PayloadTooLarge(MAX_WEBHOOK_BODY_SIZE).into());
            }
            let header = req.headers().get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
            match verify_signature(data.as_ref(), header, &secret, tolerance, Utc::now().timestamp()) {
                Ok(payload) => {
                    trace!("🔐️ Webhook signature check ✅️");
                    req.extensions_mut().insert::<VerifiedPayload>(payload);
                    req.set_payload(bytes_to_payload(data));
                    service.call(req).await
                },
                Err(e) => {
                    warn!("🔐️ Webhook signature check failed. {e}. Denying access.");
                    Err(ServerError::InvalidSignature(e).into())
                },
            }
        })
    }
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
