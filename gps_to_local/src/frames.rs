//! Coordinate frame tree and transform resolution

use std::collections::{BTreeMap, HashMap};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    constants::LOCAL_FRAME,
    error::{FrameConfigError, FrameError},
    types::{PoseMessage, RigidTransform},
};

/// Resolves the transform between two named frames.
///
/// An unavailable transform is an error, never the identity.
pub trait FrameResolver {
    /// Transform mapping points of `from` into `to`, as valid at `utime` [us]
    fn resolve(&self, from: &str, to: &str, utime: i64) -> Result<RigidTransform, FrameError>;
}

fn default_root_frame() -> String {
    LOCAL_FRAME.to_string()
}

/// Geometry of the coordinate frames, as found in the configuration file
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FramesConfig {
    #[serde(default = "default_root_frame")]
    pub root_frame: String,
    /// Live transforms older than this relative to the query time are
    /// reported stale. No limit when absent.
    #[serde(default)]
    pub max_pose_age_us: Option<i64>,
    pub coordinate_frames: BTreeMap<String, FrameConfig>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct FrameConfig {
    #[serde(default)]
    pub relative_to: Option<String>,
    /// Channel the live transform of this frame is received on
    #[serde(default)]
    pub update_channel: Option<String>,
    #[serde(default)]
    pub initial_transform: InitialTransform,
}

/// Static transform to the parent frame. Rotation is given either as
/// roll/pitch/yaw [rad] or as a `[w, x, y, z]` quaternion.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct InitialTransform {
    #[serde(default)]
    pub translation: [f64; 3],
    #[serde(default)]
    pub rpy: Option<[f64; 3]>,
    #[serde(default)]
    pub quat: Option<[f64; 4]>,
}

impl InitialTransform {
    fn to_transform(&self, frame: &str) -> Result<RigidTransform, FrameConfigError> {
        match (self.rpy, self.quat) {
            (Some(_), Some(_)) => Err(FrameConfigError::InvalidRotation(frame.to_string())),
            (None, Some(quat)) => RigidTransform::from_quat(self.translation, quat, 0)
                .ok_or_else(|| FrameConfigError::InvalidRotation(frame.to_string())),
            (rpy, None) => Ok(RigidTransform::from_rpy(
                self.translation,
                rpy.unwrap_or_default(),
                0,
            )),
        }
    }
}

#[derive(Debug)]
struct FrameNode {
    parent: Option<String>,
    live: bool,
    /// Maps points of this frame into its parent; `None` until a live frame
    /// receives its first update.
    to_parent: Option<RigidTransform>,
}

/// In-memory frame tree.
///
/// Static frames hold their configured transform. Live frames (those with an
/// `update_channel`) are unavailable until their first update arrives, then
/// hold the latest one.
#[derive(Debug)]
pub struct FrameGraph {
    root: String,
    frames: HashMap<String, FrameNode>,
    channels: HashMap<String, String>,
    max_pose_age_us: Option<i64>,
}

impl FrameGraph {
    pub fn from_config(config: &FramesConfig) -> Result<Self, FrameConfigError> {
        let mut frames = HashMap::with_capacity(config.coordinate_frames.len() + 1);
        let mut channels = HashMap::new();
        frames.insert(
            config.root_frame.clone(),
            FrameNode {
                parent: None,
                live: false,
                to_parent: Some(RigidTransform::identity(0)),
            },
        );

        for (name, frame) in config
            .coordinate_frames
            .iter()
            .filter(|(name, _)| **name != config.root_frame)
        {
            let parent = frame
                .relative_to
                .clone()
                .ok_or_else(|| FrameConfigError::MissingParent(name.clone()))?;
            if parent != config.root_frame && !config.coordinate_frames.contains_key(&parent) {
                return Err(FrameConfigError::UnknownParent {
                    frame: name.clone(),
                    parent,
                });
            }
            let initial = frame.initial_transform.to_transform(name)?;
            let live = frame.update_channel.is_some();
            if let Some(channel) = &frame.update_channel {
                if channels.insert(channel.clone(), name.clone()).is_some() {
                    return Err(FrameConfigError::SharedChannel(channel.clone()));
                }
            }
            frames.insert(
                name.clone(),
                FrameNode {
                    parent: Some(parent),
                    live,
                    to_parent: if live { None } else { Some(initial) },
                },
            );
        }

        for name in config.coordinate_frames.keys() {
            let mut current = name.as_str();
            let mut steps = 0;
            while current != config.root_frame {
                let Some(parent) = config
                    .coordinate_frames
                    .get(current)
                    .and_then(|frame| frame.relative_to.as_deref())
                else {
                    break;
                };
                current = parent;
                steps += 1;
                if steps > config.coordinate_frames.len() {
                    return Err(FrameConfigError::Cycle(name.clone()));
                }
            }
        }

        Ok(Self {
            root: config.root_frame.clone(),
            frames,
            channels,
            max_pose_age_us: config.max_pose_age_us,
        })
    }

    pub fn root_frame(&self) -> &str {
        &self.root
    }

    pub fn has_frame(&self, name: &str) -> bool {
        self.frames.contains_key(name)
    }

    /// Frame updated by messages on `channel`, if any
    pub fn frame_for_channel(&self, channel: &str) -> Option<&str> {
        self.channels.get(channel).map(String::as_str)
    }

    pub fn update_channels(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    /// Replaces the transform of `frame` to its parent.
    pub fn set_transform(
        &mut self,
        frame: &str,
        to_parent: RigidTransform,
    ) -> Result<(), FrameError> {
        let node = self
            .frames
            .get_mut(frame)
            .filter(|node| node.parent.is_some())
            .ok_or_else(|| FrameError::UnknownFrame(frame.to_string()))?;
        node.to_parent = Some(to_parent);
        Ok(())
    }

    /// Applies a pose update received on `channel`. Returns `false` when no
    /// frame listens on that channel.
    pub fn handle_pose(&mut self, channel: &str, pose: &PoseMessage) -> Result<bool, FrameError> {
        let Some(frame) = self.frame_for_channel(channel).map(str::to_string) else {
            return Ok(false);
        };
        let transform = RigidTransform::from_quat(pose.pos, pose.orientation, pose.utime)
            .ok_or_else(|| FrameError::InvalidTransform(frame.clone()))?;
        debug!("Frame '{}' updated at {}", frame, pose.utime);
        self.set_transform(&frame, transform)?;
        Ok(true)
    }

    /// Frames from `frame` up to, and including, the root
    fn ancestors<'a>(&'a self, frame: &'a str) -> Result<Vec<&'a str>, FrameError> {
        let mut chain = vec![frame];
        let mut node = self
            .frames
            .get(frame)
            .ok_or_else(|| FrameError::UnknownFrame(frame.to_string()))?;
        while let Some(parent) = node.parent.as_deref() {
            chain.push(parent);
            node = self
                .frames
                .get(parent)
                .ok_or_else(|| FrameError::UnknownFrame(parent.to_string()))?;
        }
        Ok(chain)
    }

    /// Composes the parent transforms of every frame in `chain`, in order
    fn compose(&self, chain: &[&str], utime: i64) -> Result<RigidTransform, FrameError> {
        let mut transform = RigidTransform::identity(0);
        for name in chain {
            let node = &self.frames[*name];
            let step = node
                .to_parent
                .ok_or_else(|| FrameError::NoData(name.to_string()))?;
            if let (true, Some(max_age)) = (node.live, self.max_pose_age_us) {
                let age_us = utime.saturating_sub(step.utime);
                if age_us > max_age {
                    return Err(FrameError::Stale {
                        frame: name.to_string(),
                        age_us,
                    });
                }
            }
            transform = transform.then(&step);
        }
        Ok(transform)
    }
}

impl FrameResolver for FrameGraph {
    fn resolve(&self, from: &str, to: &str, utime: i64) -> Result<RigidTransform, FrameError> {
        let from_chain = self.ancestors(from)?;
        let to_chain = self.ancestors(to)?;

        // Both chains end at the root, so a common ancestor always exists
        let common = from_chain
            .iter()
            .position(|f| to_chain.contains(f))
            .unwrap_or(from_chain.len() - 1);
        let to_common = to_chain
            .iter()
            .position(|f| *f == from_chain[common])
            .unwrap_or(to_chain.len() - 1);

        let from_to_common = self.compose(&from_chain[..common], utime)?;
        let to_to_common = self.compose(&to_chain[..to_common], utime)?;
        Ok(from_to_common.then(&to_to_common.inverse()))
    }
}
