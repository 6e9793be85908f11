//! Name remediation: UTF-8-safe naming rules, collision-free allocation, fixes.

pub mod allocate;
pub mod fixer;
pub mod naming;
