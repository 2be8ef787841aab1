pub mod auth;
pub mod claims;
pub mod dao;
pub mod redemption;
pub mod validation;

pub use auth::{AuthService, requires_role};
pub use claims::{ClaimError, ClaimService, ClaimWithDeal};
pub use dao::*;
