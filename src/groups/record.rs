use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::topology::FaceId;

use super::palette::Color;
use super::GroupId;

/// Persisted shape of one unfold group.
///
/// Serialized as `{id, color, faces, name?, placeAngle?}`; absent optional
/// fields are omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    /// Group id (positive).
    pub id: GroupId,
    /// Display color.
    pub color: Color,
    /// Member faces in membership order.
    pub faces: Vec<FaceId>,
    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Optional layout rotation in radians.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_angle: Option<f64>,
}

/// Parses a JSON group list.
///
/// # Errors
///
/// Returns an error if the text is not a valid group list.
pub fn records_from_json(json: &str) -> Result<Vec<GroupRecord>> {
    Ok(serde_json::from_str(json)?)
}

/// Serializes a group list to JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn records_to_json(records: &[GroupRecord]) -> Result<String> {
    Ok(serde_json::to_string(records)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_persisted_shape() {
        let json = r##"[
            {"id": 1, "color": "#ff0000", "faces": [0, 1, 2]},
            {"id": 2, "color": "#00ff00", "faces": [3], "name": "lid", "placeAngle": 1.5}
        ]"##;
        let records = records_from_json(json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].faces, vec![FaceId(0), FaceId(1), FaceId(2)]);
        assert_eq!(records[0].name, None);
        assert_eq!(records[1].id, GroupId(2));
        assert_eq!(records[1].name.as_deref(), Some("lid"));
        assert_eq!(records[1].place_angle, Some(1.5));
    }

    #[test]
    fn omits_absent_optional_fields() {
        let record = GroupRecord {
            id: GroupId(4),
            color: Color::rgb(1, 2, 3),
            faces: vec![FaceId(9)],
            name: None,
            place_angle: None,
        };
        let json = records_to_json(&[record]).unwrap();
        assert_eq!(json, r##"[{"id":4,"color":"#010203","faces":[9]}]"##);
    }

    #[test]
    fn bad_color_is_rejected() {
        let json = r#"[{"id": 1, "color": "red", "faces": []}]"#;
        assert!(records_from_json(json).is_err());
    }
}
