pub mod claim;
pub mod deal;
pub mod user;

pub use claim::*;
pub use deal::*;
pub use user::*;
