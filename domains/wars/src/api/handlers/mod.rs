//! HTTP handlers for the wars domain

pub mod wars;
