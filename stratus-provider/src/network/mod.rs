//! Network data sources

pub mod security_events;
