//! `onboardly-auth` — pure authentication boundary (zero-trust).
//!
//! This crate is intentionally decoupled from HTTP and storage. The API layer
//! turns a validated token into request-scoped tenant/principal context; the
//! rest of the system never sees the token itself.

pub mod claims;
pub mod jwt;
pub mod principal;
pub mod roles;

pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{AuthError, Hs256JwtValidator, JwtValidator};
pub use principal::PrincipalId;
pub use roles::Role;
