//! # Session binding
//!
//! Turns the identity provider's sign-in stream plus the signed-in user's
//! profile document into one [`SessionState`], and decides what a gated
//! view may show for it.
//!
//! ```text
//! Unknown ──► Anonymous ◄──────────────┐
//!    │            │                    │ sign-out
//!    └────────────┴─► LoadingProfile ──┼─► Authenticated
//!                          │           │
//!                          └───────────┴─► ProfileMissing
//! ```
//!
//! A session counts as authenticated only once the profile document has
//! arrived; an identity token alone is not enough.

mod gate;
mod identity;
mod login;
mod memory_identity;
mod rest_identity;
mod session;

pub use gate::{GateDecision, Route, ViewGate};
pub use identity::{AuthStateHub, Identity, IdentityCallback, IdentityError, IdentityProvider};
pub use login::{
    preconfigured_profile, sign_in_and_ensure_profile, LoginError, LoginForm, LoginOutcome,
    ProfileTemplate,
};
pub use memory_identity::MemoryIdentityProvider;
pub use rest_identity::{RestIdentityProvider, DEFAULT_IDENTITY_ENDPOINT, DEFAULT_TOKEN_ENDPOINT};
pub use session::{SessionBinding, SessionState, USERS_COLLECTION};

#[cfg(test)]
mod tests;
