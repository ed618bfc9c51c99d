pub mod project_dto;
pub mod time_entry_dto;
pub mod user_dto;

use serde::{Deserialize, Deserializer};

/// Distinguishes an omitted field from an explicit `null` in patch
/// payloads: `None` = omitted, `Some(None)` = clear, `Some(Some(v))` = set.
/// Use together with `#[serde(default)]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}
