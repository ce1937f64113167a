#![forbid(unsafe_code)]

pub mod common;
pub mod evidence;
pub mod permit;
pub mod site;
pub mod ticket;
pub mod verdict;

pub use common::{ContractViolation, ReasonCodeId, SchemaVersion, Validate};
