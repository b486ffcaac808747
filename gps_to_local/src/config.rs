use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    constants::{BODY_FRAME, LOCAL_FRAME, PUBLISH_GLOBAL_TO_LOCAL_HZ, SENSOR_FRAME},
    error::StartupError,
    frames::FramesConfig,
};

/// Names of the three frames the pipeline works with
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FrameNames {
    pub sensor: String,
    pub body: String,
    pub local: String,
}

impl Default for FrameNames {
    fn default() -> Self {
        Self {
            sensor: SENSOR_FRAME.to_string(),
            body: BODY_FRAME.to_string(),
            local: LOCAL_FRAME.to_string(),
        }
    }
}

/// Static configuration read once at startup
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub frame_names: FrameNames,
    #[serde(flatten)]
    pub frames: FramesConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, StartupError> {
        let raw = fs::read_to_string(path).map_err(|source| StartupError::ConfigUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| StartupError::ConfigInvalid {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Behaviour selected on the command line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunOptions {
    /// Republish the latest pose at `global_to_local_hz`
    pub publish_global_to_local: bool,
    pub global_to_local_hz: f64,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            publish_global_to_local: false,
            global_to_local_hz: PUBLISH_GLOBAL_TO_LOCAL_HZ,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_names_default_when_absent() {
        let config: Config = serde_json::from_str(
            r#"{"coordinate_frames": {"body": {"relative_to": "local"}}}"#,
        )
        .unwrap();
        assert_eq!(config.frame_names, FrameNames::default());
        assert_eq!(config.frames.root_frame, "local");
    }

    #[test]
    fn frame_names_can_be_overridden() {
        let config: Config = serde_json::from_str(
            r#"{
                "frame_names": {"sensor": "novatel"},
                "root_frame": "odom",
                "max_pose_age_us": 500000,
                "coordinate_frames": {}
            }"#,
        )
        .unwrap();
        assert_eq!(config.frame_names.sensor, "novatel");
        assert_eq!(config.frame_names.body, "body");
        assert_eq!(config.frames.root_frame, "odom");
        assert_eq!(config.frames.max_pose_age_us, Some(500_000));
    }

    #[test]
    fn sample_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../config/frames.json");
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.frame_names, FrameNames::default());
        assert_eq!(config.frames.coordinate_frames.len(), 3);
    }

    #[test]
    fn missing_file_is_unavailable() {
        let err = Config::from_file(Path::new("/nonexistent/frames.json")).unwrap_err();
        assert!(matches!(err, StartupError::ConfigUnavailable { .. }));
    }

    #[test]
    fn invalid_file_is_rejected() {
        let path =
            std::env::temp_dir().join(format!("gps_to_local_invalid_{}.json", std::process::id()));
        fs::write(&path, "{ not json").unwrap();
        let err = Config::from_file(&path).unwrap_err();
        fs::remove_file(&path).unwrap();
        assert!(matches!(err, StartupError::ConfigInvalid { .. }));
    }
}
