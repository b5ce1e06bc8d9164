//! Lead-Validation Pipeline Webhooks
//!
//! This library provides the webhook stages of a pub/sub-driven lead-validation
//! pipeline: an email-verification stage and a CRM campaign-trigger stage,
//! along with the message contracts and external-service clients they share.
//!
//! # Modules
//!
//! - `campaign_client`: Marketing-automation campaign-trigger client.
//! - `config`: Per-stage configuration loaded from the environment.
//! - `crm_handler`: CRM-trigger webhook handler.
//! - `errors`: Error handling types.
//! - `models`: Pipeline message contracts and payload types.
//! - `pubsub`: Push-envelope decoding and the topic publisher.
//! - `services`: External service clients (email validation, contact store).
//! - `verifier_handler`: Email-verification webhook handler.

pub mod campaign_client;
pub mod config;
pub mod crm_handler;
pub mod errors;
pub mod models;
pub mod pubsub;
pub mod services;
pub mod verifier_handler;
