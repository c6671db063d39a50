mod provider;
mod session;
#[cfg(test)]
mod test_server;
pub use provider::Provider;
pub use session::{Session, EARTHDATA_HOST};

/// Decoding of the ASF search API's GeoJSON output into scene records.
pub mod response {
    use crate::scene::{parse_timestamp, SceneName, SceneRecord};
    use anyhow::{anyhow, Result};
    use serde_json::{Map, Value};

    pub fn parse_feature_collection(body: &Value) -> Result<Vec<SceneRecord>> {
        let features = body
            .get("features")
            .and_then(Value::as_array)
            .ok_or(anyhow!("Response is not a GeoJSON FeatureCollection"))?;

        let mut scenes = vec![];
        for feature in features {
            let Some(properties) = feature.get("properties").and_then(Value::as_object) else {
                log::warn!("Skipping feature without properties");
                continue;
            };
            match scene_from_properties(properties) {
                Ok(scene) => scenes.push(scene),
                Err(e) => log::warn!("Skipping feature: {}", e),
            }
        }
        Ok(scenes)
    }

    fn scene_from_properties(properties: &Map<String, Value>) -> Result<SceneRecord> {
        let title = properties
            .get("sceneName")
            .and_then(Value::as_str)
            .ok_or(anyhow!("Feature has no sceneName"))?;

        let name = SceneName::parse(title).ok();

        let acquired = match properties.get("startTime").and_then(Value::as_str) {
            Some(start) => parse_timestamp(start).or_else(|e| {
                name.as_ref()
                    .map(|n| n.start)
                    .ok_or(anyhow!("Bad startTime '{}' for {}: {}", start, title, e))
            })?,
            None => name
                .as_ref()
                .map(|n| n.start)
                .ok_or(anyhow!("Feature {} has no startTime", title))?,
        };

        let absolute_orbit = properties
            .get("orbit")
            .and_then(as_u64)
            .and_then(|o| u32::try_from(o).ok())
            .or(name.as_ref().map(|n| n.absolute_orbit));

        let path = properties
            .get("pathNumber")
            .and_then(as_u64)
            .and_then(|p| u32::try_from(p).ok());
        let size_bytes = properties.get("bytes").and_then(as_u64).unwrap_or(0);
        let url = properties
            .get("url")
            .and_then(Value::as_str)
            .unwrap_or_default();

        Ok(SceneRecord::new(
            title,
            acquired,
            path,
            absolute_orbit,
            size_bytes,
            url,
        ))
    }

    // Numbers show up as integers, floats or strings depending on the field and API version.
    fn as_u64(value: &Value) -> Option<u64> {
        match value {
            Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f as u64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

}
