//! Options files layered over the defaults
//!
//! Each layer is a YAML document using the camelCase option keys. Layers
//! are deep-merged in the order they are pushed: mappings merge key by
//! key, everything else (scalars, sequences) is replaced by the later
//! layer.

use std::path::Path;

use serde_json::Value as JsonValue;

use crate::error::{CoreError, Result};
use crate::options::InstallOptions;

/// Accumulates options layers on top of [`InstallOptions::default`]
#[derive(Debug, Clone)]
pub struct OptionsLayers {
    merged: JsonValue,
}

impl OptionsLayers {
    pub fn new() -> Result<Self> {
        Ok(Self {
            merged: serde_json::to_value(InstallOptions::default())?,
        })
    }

    /// Merge a YAML document on top of the layers so far
    ///
    /// The document is checked against the option schema on its own first,
    /// so an unknown key is reported against the layer that introduced it.
    pub fn push_yaml(&mut self, yaml: &str) -> Result<()> {
        let layer = parse_layer(yaml)?;
        deep_merge(&mut self.merged, &layer);
        Ok(())
    }

    /// Read and merge an options file
    pub fn push_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let layer = parse_layer(&content).map_err(|e| match e {
            CoreError::YamlParse(source) => CoreError::OptionsFile {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;

        tracing::debug!(path = %path.display(), "merged options file");
        deep_merge(&mut self.merged, &layer);
        Ok(())
    }

    pub fn into_options(self) -> Result<InstallOptions> {
        Ok(serde_json::from_value(self.merged)?)
    }
}

impl InstallOptions {
    /// Defaults overlaid with each options file, in order
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut layers = OptionsLayers::new()?;
        for path in paths {
            layers.push_file(path)?;
        }
        layers.into_options()
    }
}

fn parse_layer(yaml: &str) -> Result<JsonValue> {
    // an empty document is an empty layer
    if yaml.trim().is_empty() {
        return Ok(JsonValue::Object(serde_json::Map::new()));
    }

    serde_yaml::from_str::<InstallOptions>(yaml)?;
    Ok(serde_yaml::from_str(yaml)?)
}

fn deep_merge(base: &mut JsonValue, overlay: &JsonValue) {
    match (base, overlay) {
        (JsonValue::Object(base_map), JsonValue::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_no_layers_gives_defaults() {
        let options = OptionsLayers::new().unwrap().into_options().unwrap();
        assert_eq!(options, InstallOptions::default());
    }

    #[test]
    fn test_later_layers_win() {
        let mut layers = OptionsLayers::new().unwrap();
        layers
            .push_yaml("namespace: first\ncontrollerReplicas: 2\n")
            .unwrap();
        layers.push_yaml("namespace: second\n").unwrap();

        let options = layers.into_options().unwrap();
        assert_eq!(options.namespace, "second");
        assert_eq!(options.controller_replicas, Some(2));
    }

    #[test]
    fn test_nested_sections_merge() {
        let mut layers = OptionsLayers::new().unwrap();
        layers
            .push_yaml("proxy:\n  cpuRequest: 400m\n  ignoreInboundPorts: [25, 443]\n")
            .unwrap();
        layers
            .push_yaml("proxy:\n  memoryRequest: 300Mi\n  ignoreInboundPorts: [8080]\n")
            .unwrap();

        let options = layers.into_options().unwrap();
        assert_eq!(options.proxy.cpu_request.as_deref(), Some("400m"));
        assert_eq!(options.proxy.memory_request.as_deref(), Some("300Mi"));
        // sequences are replaced, not appended
        assert_eq!(options.proxy.ignore_inbound_ports, vec![8080]);
        assert_eq!(options.proxy.inbound_port, 4143);
    }

    #[test]
    fn test_unknown_key_is_rejected_per_layer() {
        let mut layers = OptionsLayers::new().unwrap();
        let err = layers.push_yaml("proxy:\n  cpuRequests: 1\n").unwrap_err();
        assert!(err.to_string().contains("cpuRequests"));
    }

    #[test]
    fn test_empty_layer_is_a_no_op() {
        let mut layers = OptionsLayers::new().unwrap();
        layers.push_yaml("\n").unwrap();
        assert_eq!(layers.into_options().unwrap(), InstallOptions::default());
    }

    #[test]
    fn test_from_files_names_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.yaml");
        let bad = dir.path().join("bad.yaml");
        std::fs::write(&good, "highAvailability: true\n").unwrap();
        std::fs::write(&bad, "replicas: 3\n").unwrap();

        let options = InstallOptions::from_files(&[&good]).unwrap();
        assert!(options.high_availability);

        let err = InstallOptions::from_files(&[&good, &bad]).unwrap_err();
        assert!(matches!(err, CoreError::OptionsFile { .. }));
        assert!(err.to_string().contains("bad.yaml"));
    }

    #[test]
    fn test_deep_merge_replaces_scalars_with_mappings() {
        let mut base = json!({"a": 1, "b": {"c": 2}});
        deep_merge(&mut base, &json!({"a": {"x": true}, "b": {"d": 3}}));
        assert_eq!(base, json!({"a": {"x": true}, "b": {"c": 2, "d": 3}}));
    }
}
