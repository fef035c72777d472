//! Boundary checks. Everything here runs before the store is touched.

use vis_types::{ObjectId, SlotKey, VersionType};

use crate::error::{LedgerError, LedgerResult};

/// Trim `raw` and require it to be non-empty.
pub fn required(field: &str, raw: &str) -> LedgerResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::Validation(format!("{field} is missing")));
    }
    Ok(trimmed.to_string())
}

/// Parse a write-side version type; blank selects the default class.
pub fn version_type(raw: Option<&str>) -> LedgerResult<VersionType> {
    Ok(VersionType::parse_or_default(raw)?)
}

/// Build a slot key from raw write-side fields.
pub fn slot(namespace: &str, repo_id: &str, raw_type: Option<&str>) -> LedgerResult<SlotKey> {
    Ok(SlotKey::new(
        required("namespace", namespace)?,
        required("repo_id", repo_id)?,
        version_type(raw_type)?,
    ))
}

/// Parse a transaction id as handed out by prepare.
///
/// A blank id is a validation error. Anything else that does not parse
/// cannot match a record and fails as [`LedgerError::UnknownTransaction`].
pub fn tx_id(raw: &str) -> LedgerResult<ObjectId> {
    let trimmed = required("tx_id", raw)?;
    ObjectId::from_hex(&trimmed.to_ascii_lowercase())
        .map_err(|_| LedgerError::UnknownTransaction(trimmed))
}
