//! System utilities and monitoring
//!
//! This module contains metrics exposition and tracing setup.

pub mod logging;
pub mod metrics;
