//! Behaviour every backend must share, run against each of them

#[path = "../common/mod.rs"]
mod common;

mod lifecycle;
mod pagination;
mod versions;
