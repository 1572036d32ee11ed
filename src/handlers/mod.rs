// handlers/mod.rs - two-tier handler layout
//
// Public (no auth) → Protected (bearer token resolved to a live user)
pub mod protected; // Tier 2: identity middleware required (/api/*)
pub mod public; // Tier 1: no authentication (/, /api/health, /api/auth/{register,login})
