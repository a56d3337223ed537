use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::job::JobIdentifier;

/// Response of `POST /pipelines/{id}/builds`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerBuildResponse {
    #[serde(default)]
    pub build: Option<Build>,
}

/// A triggered build as returned by the gateway
///
/// The gateway encodes 64-bit ids as JSON strings, older handlers as
/// numbers, so `id` is kept raw and normalised by [`Build::numeric_id`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Build {
    #[serde(default)]
    pub id: JsonValue,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, JsonValue>,
}

impl Build {
    /// Returns the build id when it is a positive integer
    pub fn numeric_id(&self) -> Option<i64> {
        let id = match &self.id {
            JsonValue::Number(n) => n.as_i64(),
            JsonValue::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }?;
        (id > 0).then_some(id)
    }

    pub fn job_identifier(&self) -> Option<JobIdentifier> {
        self.numeric_id().map(JobIdentifier::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_and_number_ids() {
        let resp: TriggerBuildResponse =
            serde_json::from_str(r#"{"build": {"id": "166", "status": "queued"}}"#).unwrap();
        assert_eq!(resp.build.unwrap().numeric_id(), Some(166));

        let resp: TriggerBuildResponse =
            serde_json::from_str(r#"{"build": {"id": 167}}"#).unwrap();
        assert_eq!(
            resp.build.unwrap().job_identifier(),
            Some(JobIdentifier::new("167"))
        );
    }

    #[test]
    fn test_missing_or_zero_id_is_rejected() {
        let resp: TriggerBuildResponse = serde_json::from_str(r#"{"build": {}}"#).unwrap();
        assert_eq!(resp.build.unwrap().numeric_id(), None);

        let resp: TriggerBuildResponse =
            serde_json::from_str(r#"{"build": {"id": "0"}}"#).unwrap();
        assert_eq!(resp.build.unwrap().numeric_id(), None);

        let resp: TriggerBuildResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(resp.build.is_none());
    }
}
