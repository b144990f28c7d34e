//! List resources served by this service.

pub mod customers;
