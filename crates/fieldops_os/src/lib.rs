#![forbid(unsafe_code)]

pub mod lifecycle;
pub mod sla_report;
