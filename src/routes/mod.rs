/// Router Module Index
///
/// Splits the host's routes by access: public routes are reachable by anyone, gated
/// routes sit behind the session gate middleware.

/// Routes served without a session check.
pub mod public;

/// Routes behind `session_gate_middleware`.
pub mod gated;
