use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::error::{CatalogError, Result};

const VERSION_PREFIX: &str = "v1.";

/// Opaque pagination token handed out with each non-final page.
///
/// The payload is the ordinal of the first record of the next page. Clients
/// must treat the whole string as opaque; only the version prefix is stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor(pub i64);

impl Cursor {
    pub fn encode(&self) -> String {
        format!(
            "{VERSION_PREFIX}{}",
            URL_SAFE_NO_PAD.encode(self.0.to_string())
        )
    }

    pub fn decode(token: &str) -> Result<Cursor> {
        let payload = token
            .strip_prefix(VERSION_PREFIX)
            .ok_or_else(|| CatalogError::InvalidCursor(format!("unsupported token '{token}'")))?;
        let bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|err| CatalogError::InvalidCursor(format!("bad encoding: {err}")))?;
        let text = std::str::from_utf8(&bytes)
            .map_err(|err| CatalogError::InvalidCursor(format!("bad payload: {err}")))?;
        let seq: i64 = text
            .parse()
            .map_err(|err| CatalogError::InvalidCursor(format!("bad ordinal: {err}")))?;
        if seq < 0 {
            return Err(CatalogError::InvalidCursor(format!(
                "negative ordinal {seq}"
            )));
        }
        Ok(Cursor(seq))
    }

    /// Decodes an optional wire token, treating absence as "from the start".
    pub fn decode_opt(token: Option<&str>) -> Result<Option<Cursor>> {
        token.map(Cursor::decode).transpose()
    }
}
