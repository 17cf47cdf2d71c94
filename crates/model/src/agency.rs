use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::id::HasId;

/// A transit operator. Created at feed ingest, immutable for the lifetime
/// of a feed load, destroyed wholesale on feed replace (ingest itself is
/// out of scope here; the store just holds whatever was last loaded).
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Agency {
    pub name: String,
    pub url: String,
    /// IANA time zone name, e.g. `"Europe/Berlin"`. Kept as a plain string
    /// in the data model; parsed into a `chrono_tz::Tz` only where service-
    /// day arithmetic actually needs it.
    pub timezone: String,
    pub lang: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub fare_url: Option<String>,
}

impl HasId for Agency {
    type IdType = String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_camel_case() {
        let json = r#"{"name":"erixx schleswig","url":"https://erixx-schleswig.de","timezone":"Europe/Berlin"}"#;
        let agency: Agency = serde_json::from_str(json).unwrap();
        assert_eq!(agency.timezone, "Europe/Berlin");
    }
}
