use serde::{Deserialize, Deserializer, Serialize};

/// Backend ids arrive either as JSON strings or numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(n) => n.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    #[serde(rename = "Id", alias = "id", deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(rename = "Name", alias = "name")]
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    Point,
    Polygon,
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerInfo {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(rename = "data_type")]
    pub data_kind: DataKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_accepts_backend_casing() {
        let json = r#"[{"Id": 4, "Name": "Street lights"}, {"id": "p-2", "name": "Parks"}]"#;
        let projects: Vec<ProjectInfo> = serde_json::from_str(json).unwrap();
        assert_eq!(projects[0].id, "4");
        assert_eq!(projects[0].name, "Street lights");
        assert_eq!(projects[1].id, "p-2");
    }

    #[test]
    fn test_layer_data_kind() {
        let json = r#"[
            {"id": 1, "name": "Lamps", "data_type": "point"},
            {"id": "2", "name": "Districts", "data_type": "polygon"},
            {"id": 3, "name": "Raster", "data_type": "raster"}
        ]"#;
        let layers: Vec<LayerInfo> = serde_json::from_str(json).unwrap();
        assert_eq!(layers[0].data_kind, DataKind::Point);
        assert_eq!(layers[1].data_kind, DataKind::Polygon);
        assert_eq!(layers[1].id, "2");
        assert_eq!(layers[2].data_kind, DataKind::Unsupported);
    }
}
