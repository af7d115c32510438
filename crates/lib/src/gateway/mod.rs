//! Gateway: the HTTP server the SMS provider calls.
//!
//! One route receives inbound SMS notifications and answers them with model replies;
//! `GET /` is a health probe.

mod server;
mod webhook;

pub use server::{model_client, router, run_gateway, sms_client, AppState};
pub use webhook::{
    build_prompt, sms_webhook, RESPONSE_MISSING_FIELDS, RESPONSE_MODEL_ERROR, RESPONSE_PROCESSED,
    RESPONSE_SERVER_ERROR, SMS_MODEL_ERROR, SMS_SERVER_ERROR,
};
