//! smsai core library: SMS webhook parsing, reply formatting, conversation window,
//! model and SMS gateway clients, and the HTTP gateway used by the CLI.

pub mod channels;
pub mod config;
pub mod conversation;
pub mod gateway;
pub mod init;
pub mod llm;
pub mod reply;
