//! The externally-visible "combined id" format `"{agencyId}_{rawId}"` used
//! for every cross-agency identifier (route, stop, trip, block, shape,
//! vehicle). Parsing splits on the *first* underscore only, since raw ids
//! themselves may contain underscores.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeIdError {
    pub raw: String,
}

impl fmt::Display for CompositeIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a valid combined id", self.raw)
    }
}

impl std::error::Error for CompositeIdError {}

/// Splits a combined id into `(agencyId, rawId)`. Both halves must be
/// non-empty; an id with no underscore, or with the underscore in the
/// first or last position, is rejected.
pub fn parse(combined: &str) -> Result<(&str, &str), CompositeIdError> {
    let Some(separator) = combined.find('_') else {
        return Err(CompositeIdError {
            raw: combined.to_owned(),
        });
    };
    let (agency_id, rest) = combined.split_at(separator);
    let raw_id = &rest[1..];
    if agency_id.is_empty() || raw_id.is_empty() {
        return Err(CompositeIdError {
            raw: combined.to_owned(),
        });
    }
    Ok((agency_id, raw_id))
}

/// Renders `(agencyId, rawId)` as a combined id.
pub fn render(agency_id: &str, raw_id: &str) -> String {
    format!("{agency_id}_{raw_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let (agency, raw) = parse("sh-nah_12345").unwrap();
        assert_eq!(render(agency, raw), "sh-nah_12345");
    }

    #[test]
    fn keeps_underscores_in_raw_id() {
        let (agency, raw) = parse("sh-nah_trip_with_underscores").unwrap();
        assert_eq!(agency, "sh-nah");
        assert_eq!(raw, "trip_with_underscores");
    }

    #[test]
    fn rejects_missing_underscore() {
        assert!(parse("noSeparator").is_err());
    }

    #[test]
    fn rejects_empty_halves() {
        assert!(parse("_onlyRaw").is_err());
        assert!(parse("onlyAgency_").is_err());
    }
}
