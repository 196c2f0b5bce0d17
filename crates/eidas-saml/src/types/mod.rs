//! SAML 2.0 types and data structures.
//!
//! This module contains the typed view of the response envelope and of the
//! decrypted assertion, parsed from the element tree.

mod assertion;
mod constants;
mod name_id;
mod response;
mod status;

pub use assertion::*;
pub use constants::*;
pub use name_id::*;
pub use response::*;
pub use status::*;

use chrono::{DateTime, Utc};

use crate::error::SamlResult;

/// Parses an `xs:dateTime` value into UTC.
pub(crate) fn parse_instant(value: &str) -> SamlResult<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value.trim())?.with_timezone(&Utc))
}

pub(crate) fn parse_optional_instant(value: Option<&str>) -> SamlResult<Option<DateTime<Utc>>> {
    value.map(parse_instant).transpose()
}
