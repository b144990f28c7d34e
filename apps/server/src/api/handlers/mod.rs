//! HTTP request handlers

pub mod customers;
