//! Session and invite authentication for tour operators.

pub mod config;
pub mod error;
pub mod password;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use service::AuthService;
pub use service::{
    AuthContext, BootstrapStatus, InviteValidation, LoginOutput, RegisterInput, RegisterOutput,
};
