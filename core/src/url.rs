//! Final URL assembly from a `Target`.

use crate::error::Result;
use crate::http::Target;

/// Append the target's params to its base as a query string.
///
/// Joins with `&` when the base already carries a query, `?` otherwise.
/// A target without params yields its base unchanged.
pub fn build_url(target: &Target) -> Result<String> {
    if target.params.is_empty() {
        return Ok(target.base.clone());
    }
    let query = serde_urlencoded::to_string(&target.params)?;
    let separator = if target.base.contains('?') { '&' } else { '?' };
    Ok(format!("{}{separator}{query}", target.base))
}
