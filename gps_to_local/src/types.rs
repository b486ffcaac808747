use nalgebra::{Isometry3, Quaternion, Translation3, UnitQuaternion};
use serde::{Deserialize, Serialize};

/// One decoded position report
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeodeticFix {
    /// Receive time of the sentence [us]
    pub epoch: i64,
    /// Latitude [deg], south is negative
    pub latitude: f64,
    /// Longitude [deg], west is negative
    pub longitude: f64,
    /// Elevation above mean sea level [m]
    pub elevation: f64,
    /// Heading [rad], zero when the sentence carries none
    pub heading: f64,
}

impl GeodeticFix {
    pub fn lat_lon_el_theta(&self) -> [f64; 4] {
        [self.latitude, self.longitude, self.elevation, self.heading]
    }
}

/// Rigid transform mapping points of one frame into another.
///
/// The translation is the origin of the source frame expressed in the
/// destination frame. `utime` is the time the transform was valid at, zero for
/// static transforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    pub isometry: Isometry3<f64>,
    pub utime: i64,
}

impl RigidTransform {
    pub fn identity(utime: i64) -> Self {
        Self {
            isometry: Isometry3::identity(),
            utime,
        }
    }

    /// Builds a transform from a translation and a `[w, x, y, z]` quaternion.
    /// Returns `None` if the quaternion cannot be normalized.
    pub fn from_quat(translation: [f64; 3], quat: [f64; 4], utime: i64) -> Option<Self> {
        let [w, x, y, z] = quat;
        let q = Quaternion::new(w, x, y, z);
        if !q.norm().is_normal() {
            return None;
        }
        Some(Self {
            isometry: Isometry3::from_parts(
                Translation3::new(translation[0], translation[1], translation[2]),
                UnitQuaternion::from_quaternion(q),
            ),
            utime,
        })
    }

    /// Builds a transform from a translation and roll/pitch/yaw angles [rad]
    pub fn from_rpy(translation: [f64; 3], rpy: [f64; 3], utime: i64) -> Self {
        Self {
            isometry: Isometry3::from_parts(
                Translation3::new(translation[0], translation[1], translation[2]),
                UnitQuaternion::from_euler_angles(rpy[0], rpy[1], rpy[2]),
            ),
            utime,
        }
    }

    pub fn translation(&self) -> [f64; 3] {
        let v = &self.isometry.translation.vector;
        [v.x, v.y, v.z]
    }

    /// Rotation as `[w, x, y, z]`
    pub fn quat(&self) -> [f64; 4] {
        let q = self.isometry.rotation.quaternion();
        [q.w, q.i, q.j, q.k]
    }

    pub fn inverse(&self) -> Self {
        Self {
            isometry: self.isometry.inverse(),
            utime: self.utime,
        }
    }

    /// Applies `self` first, then `next`.
    pub fn then(&self, next: &RigidTransform) -> Self {
        Self {
            isometry: next.isometry * self.isometry,
            utime: self.utime.max(next.utime),
        }
    }

    pub fn apply(&self, point: [f64; 3]) -> [f64; 3] {
        let p = self
            .isometry
            .transform_point(&nalgebra::Point3::new(point[0], point[1], point[2]));
        [p.x, p.y, p.z]
    }
}

/// Raw sentence as delivered on the NMEA channel
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NmeaMessage {
    pub utime: i64,
    pub nmea: String,
}

/// Pose of the body in the local frame; used both for the live pose updates
/// and for the periodic global pose.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct PoseMessage {
    pub utime: i64,
    pub pos: [f64; 3],
    /// `[w, x, y, z]`
    pub orientation: [f64; 4],
}

impl PoseMessage {
    pub const IDENTITY_ORIENTATION: [f64; 4] = [1.0, 0.0, 0.0, 0.0];
}

/// Reconciled estimate: where the body was in the local frame when the fix
/// was received.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct GpsToLocalEstimate {
    pub utime: i64,
    pub lat_lon_el_theta: [f64; 4],
    pub local: [f64; 3],
}

impl GpsToLocalEstimate {
    pub fn new(fix: &GeodeticFix, body_to_local: &RigidTransform) -> Self {
        Self {
            utime: fix.epoch,
            lat_lon_el_theta: fix.lat_lon_el_theta(),
            local: body_to_local.translation(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: [f64; 3], b: [f64; 3]) {
        for i in 0..3 {
            assert!((a[i] - b[i]).abs() < 1e-9, "{:?} != {:?}", a, b);
        }
    }

    #[test]
    fn quaternion_must_be_normalizable() {
        assert!(RigidTransform::from_quat([0.0; 3], [0.0; 4], 0).is_none());
        assert!(RigidTransform::from_quat([0.0; 3], [2.0, 0.0, 0.0, 0.0], 0).is_some());
    }

    #[test]
    fn then_composes_in_order() {
        let yaw90 = RigidTransform::from_rpy([0.0; 3], [0.0, 0.0, std::f64::consts::FRAC_PI_2], 0);
        let shift = RigidTransform::from_rpy([1.0, 0.0, 0.0], [0.0; 3], 5);

        let composed = yaw90.then(&shift);
        assert_close(composed.apply([1.0, 0.0, 0.0]), [1.0, 1.0, 0.0]);
        assert_eq!(composed.utime, 5);

        let other_way = shift.then(&yaw90);
        assert_close(other_way.apply([1.0, 0.0, 0.0]), [0.0, 2.0, 0.0]);
    }

    #[test]
    fn inverse_round_trips_points() {
        let t = RigidTransform::from_rpy([1.0, -2.0, 0.5], [0.1, 0.2, 0.3], 0);
        let p = [3.0, 4.0, 5.0];
        assert_close(t.inverse().apply(t.apply(p)), p);
    }

    #[test]
    fn estimate_copies_translation_only() {
        let fix = GeodeticFix {
            epoch: 1_000_000,
            latitude: 37.0,
            longitude: -122.0,
            elevation: 10.0,
            heading: 0.0,
        };
        let pose = RigidTransform::from_rpy([5.0, -3.0, 0.2], [0.0, 0.0, 1.0], 42);
        let estimate = GpsToLocalEstimate::new(&fix, &pose);
        assert_eq!(
            estimate,
            GpsToLocalEstimate {
                utime: 1_000_000,
                lat_lon_el_theta: [37.0, -122.0, 10.0, 0.0],
                local: [5.0, -3.0, 0.2],
            }
        );
    }
}
