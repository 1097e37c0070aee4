mod signature;

pub use signature::{SignatureMiddlewareFactory, SignatureMiddlewareService, MAX_WEBHOOK_BODY_SIZE};
