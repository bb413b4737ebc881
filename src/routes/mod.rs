/// Router Module Index
///
/// Page routes are split by the access tier the gate enforces for them, so
/// each tier can be read next to its route table in `access`.

/// Pages reachable without a session, plus the health probe.
pub mod public;

/// Pages in the protected table and the dashboard sections.
pub mod authenticated;

/// Pages restricted to the admin role.
pub mod admin;

/// Session endpoints under `/api/auth`. Never gated.
pub mod api;
