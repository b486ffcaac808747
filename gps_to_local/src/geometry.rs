use log::info;

use crate::{error::StartupError, frames::FrameResolver, types::RigidTransform};

/// Static sensor-to-body transform, resolved once while initializing and
/// never refreshed afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct MountingOffset {
    sensor_frame: String,
    body_frame: String,
    transform: RigidTransform,
}

impl MountingOffset {
    /// Resolves `sensor` to `body` through `resolver`. Any failure is fatal to
    /// startup and is not retried.
    pub fn load(
        resolver: &impl FrameResolver,
        sensor: &str,
        body: &str,
        utime: i64,
    ) -> Result<Self, StartupError> {
        let transform =
            resolver
                .resolve(sensor, body, utime)
                .map_err(|source| StartupError::MountingOffset {
                    from: sensor.to_string(),
                    to: body.to_string(),
                    source,
                })?;
        info!(
            "Mounting offset {} -> {}: translation {:?}, rotation {:?}",
            sensor,
            body,
            transform.translation(),
            transform.quat()
        );
        Ok(Self {
            sensor_frame: sensor.to_string(),
            body_frame: body.to_string(),
            transform,
        })
    }

    pub fn sensor_frame(&self) -> &str {
        &self.sensor_frame
    }

    pub fn body_frame(&self) -> &str {
        &self.body_frame
    }

    pub fn transform(&self) -> &RigidTransform {
        &self.transform
    }
}
