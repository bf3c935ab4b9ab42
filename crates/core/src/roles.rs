//! Role names carried in the `role` claim of access tokens.

/// Event producers (chat, community and job fair services) that may address
/// notifications to any recipient.
pub const ROLE_PRODUCER: &str = "producer";

/// Ordinary users. Tokens without a `role` claim are treated as this.
pub const ROLE_USER: &str = "user";
