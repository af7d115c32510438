//! SMS channel: inbound webhook parsing and outbound delivery through the gateway.

mod africastalking;
mod inbound;
mod sms;

pub use africastalking::AfricasTalkingChannel;
pub use inbound::{InboundError, InboundMessage};
pub use sms::{OutboundSms, Recipient, SendReport, SmsError, SmsGateway};
