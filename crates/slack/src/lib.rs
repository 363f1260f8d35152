//! Slack Integration - webhook-driven task bot interface
//!
//! This crate provides the Slack surface for taskhub:
//! - **Signing** (`signing`) - inbound request signature verification
//! - **Payloads** (`payloads`) - form and interaction envelope decoding
//! - **Commands** (`commands`) - `/addtask`, `/showlist`, button dispatch
//! - **Blocks** (`blocks`) - response payload builders (text, buttons)
//! - **Web API** (`api`) - outbound `chat.postMessage` client
//!
//! # Architecture
//!
//! ```text
//! Slack Webhook → RequestAuthenticator → CommandRouter → Task Store
//!                                             ↓
//!                                     Response payload ← blocks
//! ```
//!
//! Every inbound request is verified against the signing secret before any
//! payload is parsed; verified payloads are decoded once into closed intent
//! types and dispatched exhaustively.

pub mod api;
pub mod blocks;
pub mod commands;
pub mod payloads;
pub mod signing;
