//! CLI commands module.

pub mod audit;
pub mod call;
pub mod circuit;
pub mod health;
pub mod logs;
pub mod providers;
pub mod recommend;
