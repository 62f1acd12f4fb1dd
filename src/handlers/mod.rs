// handlers/mod.rs - Handler tiers
//
// Public (no auth) → Students (JWT auth, then the per-operation policy gate)
pub mod public;
pub mod students;
