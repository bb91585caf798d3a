//! HTTP middleware: request ids, request logging, panic recovery, CORS.

mod cors;
mod panic_recovery;
mod request_id;
mod request_logger;

pub use cors::cors_policy;
pub use panic_recovery::PanicRecovery;
pub use request_id::{AssignRequestId, REQUEST_ID_HEADER, RequestId};
pub use request_logger::RequestLogger;
