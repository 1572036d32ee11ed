// handlers/protected/mod.rs - Protected handlers (bearer token required)
//
// Every route here runs behind `identity_middleware`, which attaches the
// resolved account as `CurrentUser`. Resource handlers are generic over
// `Resource` and mounted once per kind.

pub mod auth; // GET /api/auth/me
pub mod resource; // /api/{tasks,notes,goals,routines}[/:id]
pub mod routine; // POST /api/routines/:id/toggle/:date
