pub mod auth;
pub mod claim;
pub mod deal;

use bson::DateTime;

pub(crate) fn rfc3339(at: DateTime) -> String {
    at.try_to_rfc3339_string().unwrap_or_default()
}
