//! # Prompt Templates
//!
//! Default prompts for every task the service sends to a vision model. The
//! server can override any of them through `config.yml`.

pub mod tasks;
