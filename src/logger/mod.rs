//! Logging: JSONL activity log and the plain-text violation report.

pub mod activity;
pub mod jsonl;
pub mod report;
