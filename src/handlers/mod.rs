// handlers/mod.rs - HTTP handlers by reach
//
// public    → no tenant database (/, /health)
// protected → one tenant database (/api/:region/:env/:db/*)
// elevated  → tenant lifecycle (/api/:region/:env/root/*)

pub mod elevated;
pub mod protected;
pub mod public;
