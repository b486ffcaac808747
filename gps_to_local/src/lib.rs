//! # gps_to_local
//!
//! Reconciles GNSS fixes with the pose of a vehicle body in a local frame.
//!
//! Raw NMEA sentences are decoded into a [`GeodeticFix`], joined with the
//! body-to-local transform valid at the fix epoch and published as a
//! [`GpsToLocalEstimate`] on the `GPS_TO_LOCAL` channel. Optionally the latest
//! accepted position is republished at a fixed rate on `GLOBAL_TO_LOCAL`.
//!
//! Decoding Sentences
//! ==================
//!
//! ```
//! use gps_to_local::decode_sentence;
//!
//! let fix = decode_sentence(
//!     "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47",
//!     1_000_000,
//! )
//! .unwrap();
//! assert_eq!(fix.elevation, 545.4);
//! ```
//!
//! Bytes read from a serial port go through a [`SentenceSplitter`] first. Its
//! `consume()` method buffers the data and returns an iterator over the
//! complete sentences:
//! ```
//! use gps_to_local::SentenceSplitter;
//!
//! let mut splitter = SentenceSplitter::new();
//! let mut it = splitter.consume(b"\x00$GPGGA,,,,,,0,,,,M,,M,,\r\n$GPG");
//! assert_eq!(it.next(), Some(Ok("$GPGGA,,,,,,0,,,,M,,M,,".to_string())));
//! assert_eq!(it.next(), None);
//! ```
//!
//! Frames
//! ======
//!
//! Coordinate frames form a tree described in JSON, see [`FramesConfig`].
//! Frames with an `update_channel` follow the pose messages received on that
//! channel and are unavailable until the first one arrives.

pub mod app;
pub mod config;
pub mod constants;
pub mod error;
pub mod frames;
pub mod geometry;
pub mod parser;
pub mod rebroadcast;
pub mod reconciler;
pub mod transport;
pub mod types;

pub use crate::{
    app::{AppContext, Lifecycle},
    config::{Config, FrameNames, RunOptions},
    error::{DecodeError, FrameConfigError, FrameError, StartupError, TransportError},
    frames::{FrameGraph, FrameResolver, FramesConfig},
    geometry::MountingOffset,
    parser::{decode_sentence, FixDecoder, NmeaDecoder, SentenceIter, SentenceSplitter},
    rebroadcast::{GlobalPoseSample, PoseRebroadcaster},
    reconciler::FixReconciler,
    transport::{Event, JsonLinesPublisher, OutboundMessage, Publisher, Subscriptions},
    types::{GeodeticFix, GpsToLocalEstimate, NmeaMessage, PoseMessage, RigidTransform},
};
