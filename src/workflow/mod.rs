//! Client-side workflow orchestration.
//!
//! This module owns the upload -> predict -> optimize state machine and the
//! cache of stage results feeding later stages. CLI layers call into this
//! module instead of talking to the service directly, so every state change
//! goes through one gatekeeper.

mod cache;
mod controller;

pub(crate) use controller::WorkflowController;
