pub mod base;
pub mod claim;
pub mod deal;
pub mod user;

pub use base::{BaseDao, DaoError, DaoResult};
