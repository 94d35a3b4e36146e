//! Data models for parsed slips, chat envelopes and configuration.

pub mod chat;
pub mod config;
pub mod slip;
