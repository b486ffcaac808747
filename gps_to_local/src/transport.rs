//! Line-oriented message transport.
//!
//! Inbound sources run on helper threads and only turn what they read into
//! [`Event`]s sent to the event loop. Outbound messages are written as JSON
//! lines tagged with their channel.

use std::{
    collections::HashSet,
    io::{BufRead, ErrorKind, Read, Write},
    sync::mpsc::Sender,
    thread,
};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    constants::NMEA_SYNC_CHAR,
    error::TransportError,
    parser::SentenceSplitter,
    types::{GpsToLocalEstimate, NmeaMessage, PoseMessage},
};

/// Current wall-clock time [us since the Unix epoch]
pub fn receive_utime() -> i64 {
    chrono::Utc::now().timestamp_micros()
}

/// Everything the event loop reacts to, in delivery order
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Nmea(NmeaMessage),
    Pose { channel: String, pose: PoseMessage },
    /// The named inbound source reached its end
    SourceClosed(String),
    /// Termination was requested
    Shutdown,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "channel")]
pub enum OutboundMessage {
    #[serde(rename = "GPS_TO_LOCAL")]
    GpsToLocal(GpsToLocalEstimate),
    #[serde(rename = "GLOBAL_TO_LOCAL")]
    GlobalToLocal(PoseMessage),
}

impl OutboundMessage {
    pub fn channel(&self) -> &'static str {
        match self {
            OutboundMessage::GpsToLocal(_) => crate::constants::GPS_TO_LOCAL_CHANNEL,
            OutboundMessage::GlobalToLocal(_) => crate::constants::GLOBAL_TO_LOCAL_CHANNEL,
        }
    }
}

pub trait Publisher {
    fn publish(&mut self, message: &OutboundMessage) -> Result<(), TransportError>;
}

/// Keeps every published message, in order
impl Publisher for Vec<OutboundMessage> {
    fn publish(&mut self, message: &OutboundMessage) -> Result<(), TransportError> {
        self.push(message.clone());
        Ok(())
    }
}

/// Writes one JSON object per line, flushing after each message
pub struct JsonLinesPublisher<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesPublisher<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Publisher for JsonLinesPublisher<W> {
    fn publish(&mut self, message: &OutboundMessage) -> Result<(), TransportError> {
        serde_json::to_writer(&mut self.writer, message)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Channels the inbound sources accept
#[derive(Debug, Clone, PartialEq)]
pub struct Subscriptions {
    pub nmea: String,
    pub poses: HashSet<String>,
}

#[derive(Deserialize)]
struct Envelope {
    channel: String,
    #[serde(flatten)]
    body: serde_json::Value,
}

impl Subscriptions {
    /// Parses one inbound line.
    ///
    /// A line starting with `$` is a bare NMEA sentence received at
    /// `receive_utime`; anything else must be a JSON envelope carrying a
    /// `channel` field. Blank lines yield `None`.
    pub fn parse_line(
        &self,
        line: &str,
        receive_utime: i64,
    ) -> Result<Option<Event>, TransportError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        if line.as_bytes()[0] == NMEA_SYNC_CHAR {
            return Ok(Some(Event::Nmea(NmeaMessage {
                utime: receive_utime,
                nmea: line.to_string(),
            })));
        }

        let envelope: Envelope = serde_json::from_str(line)?;
        if envelope.channel == self.nmea {
            Ok(Some(Event::Nmea(serde_json::from_value(envelope.body)?)))
        } else if self.poses.contains(&envelope.channel) {
            Ok(Some(Event::Pose {
                pose: serde_json::from_value(envelope.body)?,
                channel: envelope.channel,
            }))
        } else {
            Err(TransportError::UnknownChannel(envelope.channel))
        }
    }
}

/// Reads `reader` line by line on a new thread, forwarding every accepted
/// message. Lines that are not valid UTF-8 are dropped. Ends with
/// [`Event::SourceClosed`] once the input is exhausted or fails.
pub fn spawn_line_source<R>(
    name: String,
    mut reader: R,
    subscriptions: Subscriptions,
    events: Sender<Event>,
) -> thread::JoinHandle<()>
where
    R: BufRead + Send + 'static,
{
    thread::spawn(move || {
        info!("Reading messages from {}", name);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {},
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!("Error reading {}: {}", name, e);
                    break;
                },
            }
            let Ok(line) = std::str::from_utf8(&buf) else {
                debug!("Ignoring non UTF-8 line from {}", name);
                continue;
            };
            match subscriptions.parse_line(line, receive_utime()) {
                Ok(Some(event)) => {
                    if events.send(event).is_err() {
                        return;
                    }
                },
                Ok(None) => {},
                Err(e) => debug!("Ignoring line from {}: {}", name, e),
            }
        }
        let _ = events.send(Event::SourceClosed(name));
    })
}

/// Reads raw NMEA bytes (e.g. from a serial port) on a new thread and
/// forwards every complete sentence, stamped with its receive time. Read
/// timeouts are retried.
pub fn spawn_byte_source<R>(
    name: String,
    mut reader: R,
    events: Sender<Event>,
) -> thread::JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        info!("Reading NMEA sentences from {}", name);
        let mut splitter = SentenceSplitter::new();
        let mut buf = [0u8; 1024];
        loop {
            let nbytes = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::Interrupted) => {
                    continue
                },
                Err(e) => {
                    warn!("Error reading {}: {}", name, e);
                    break;
                },
            };
            let utime = receive_utime();
            for sentence in splitter.consume(&buf[..nbytes]) {
                match sentence {
                    Ok(nmea) => {
                        if events.send(Event::Nmea(NmeaMessage { utime, nmea })).is_err() {
                            return;
                        }
                    },
                    Err(e) => debug!("Malformed data from {}, ignore it; cause {}", name, e),
                }
            }
        }
        let _ = events.send(Event::SourceClosed(name));
    })
}
