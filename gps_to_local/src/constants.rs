pub const NMEA_SYNC_CHAR: u8 = 0x24; // '$'
pub const NMEA_CHECKSUM_CHAR: u8 = 0x2a; // '*'
pub const NMEA_END_CHAR_1: u8 = 0x0d; // '\r' (<CR>)
pub const NMEA_END_CHAR_2: u8 = 0x0a; // '\n' (<LF>)
pub(crate) const NMEA_MIN_SENTENCE_LENGTH: usize = 6; // sync (1) + talker (2) + msg type (3)
pub const NMEA_MAX_SENTENCE_LENGTH: usize = 82; // Maximum NMEA sentence length, including CR/LF
pub(crate) const NMEA_CHECKSUM_LEN: usize = 2;

/// Channel carrying raw NMEA sentences
pub const NMEA_CHANNEL: &str = "NMEA";
/// Channel the reconciled estimates are published on
pub const GPS_TO_LOCAL_CHANNEL: &str = "GPS_TO_LOCAL";
/// Channel the periodic global pose is published on
pub const GLOBAL_TO_LOCAL_CHANNEL: &str = "GLOBAL_TO_LOCAL";

pub const SENSOR_FRAME: &str = "gps18";
pub const BODY_FRAME: &str = "body";
pub const LOCAL_FRAME: &str = "local";

/// Rate of the optional global pose rebroadcast
pub const PUBLISH_GLOBAL_TO_LOCAL_HZ: f64 = 10.0;
