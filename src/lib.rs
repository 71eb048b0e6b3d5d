#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! roamlog: a terminal client for a remote trip-planning service.

pub mod api;
pub mod config;
pub mod form;
pub mod model;
pub mod storage;
pub mod tui;
