#![forbid(unsafe_code)]

pub mod checklist;
pub mod evidence;
pub mod geo;
pub mod guard;
pub mod permit;
pub mod sla;
