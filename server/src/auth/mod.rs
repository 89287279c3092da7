pub mod error;
pub mod google;
pub mod login;
pub mod token;

pub use error::AuthError;
pub use google::{ExternalIdentity, GoogleVerifier, IdentityVerifier};
pub use token::{AuthContext, IssuedToken, TokenIssuer};
