//! Joins decoded fixes with the body pose in the local frame

use log::{debug, warn};

use crate::{
    frames::FrameResolver,
    rebroadcast::GlobalPoseSample,
    transport::{OutboundMessage, Publisher},
    types::{GeodeticFix, GpsToLocalEstimate},
};

/// Builds one estimate per fix for which the body-to-local transform can be
/// resolved. Holds no state between fixes.
#[derive(Debug, Clone)]
pub struct FixReconciler {
    body_frame: String,
    local_frame: String,
}

impl FixReconciler {
    pub fn new(body_frame: &str, local_frame: &str) -> Self {
        Self {
            body_frame: body_frame.to_string(),
            local_frame: local_frame.to_string(),
        }
    }

    /// Estimate for `fix`, or `None` when the body pose is unavailable at the
    /// fix epoch. Only the translation of the pose is used.
    pub fn reconcile(
        &self,
        fix: &GeodeticFix,
        resolver: &impl FrameResolver,
    ) -> Option<GpsToLocalEstimate> {
        match resolver.resolve(&self.body_frame, &self.local_frame, fix.epoch) {
            Ok(body_to_local) => Some(GpsToLocalEstimate::new(fix, &body_to_local)),
            Err(e) => {
                debug!(
                    "Dropping fix at {}: {} -> {} unavailable: {}",
                    fix.epoch, self.body_frame, self.local_frame, e
                );
                None
            },
        }
    }

    /// Reconciles `fix`, publishes the estimate and commits it as the latest
    /// global pose. Nothing is published or committed when the pose is
    /// unavailable.
    pub fn handle_fix(
        &self,
        fix: &GeodeticFix,
        resolver: &impl FrameResolver,
        publisher: &mut impl Publisher,
        latest: &mut Option<GlobalPoseSample>,
    ) -> Option<GpsToLocalEstimate> {
        let estimate = self.reconcile(fix, resolver)?;
        if let Err(e) = publisher.publish(&OutboundMessage::GpsToLocal(estimate)) {
            warn!("Failed to publish estimate at {}: {}", estimate.utime, e);
        }
        *latest = Some(GlobalPoseSample::from(&estimate));
        Some(estimate)
    }
}
