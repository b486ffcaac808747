//! NMEA sentence decoding

mod checksum;
mod splitter;

pub use splitter::{SentenceIter, SentenceSplitter};

use crate::{
    constants::{
        NMEA_END_CHAR_1, NMEA_END_CHAR_2, NMEA_MAX_SENTENCE_LENGTH, NMEA_MIN_SENTENCE_LENGTH,
        NMEA_SYNC_CHAR,
    },
    error::DecodeError,
    types::{GeodeticFix, NmeaMessage},
};
use checksum::NmeaChecksumCalc;

/// Turns a raw positioning sentence into a fix.
///
/// Implemented by [`NmeaDecoder`]; tests substitute their own.
pub trait FixDecoder {
    fn decode(&self, message: &NmeaMessage) -> Result<GeodeticFix, DecodeError>;
}

/// Decoder for NMEA `GGA` sentences from any talker
#[derive(Debug, Default, Clone, Copy)]
pub struct NmeaDecoder;

impl FixDecoder for NmeaDecoder {
    fn decode(&self, message: &NmeaMessage) -> Result<GeodeticFix, DecodeError> {
        decode_sentence(&message.nmea, message.utime)
    }
}

/// Decodes a single sentence received at `epoch` [us].
///
/// The sentence may or may not carry its trailing CR/LF. A `*HH` checksum is
/// validated when present.
pub fn decode_sentence(sentence: &str, epoch: i64) -> Result<GeodeticFix, DecodeError> {
    let sentence =
        sentence.trim_end_matches([char::from(NMEA_END_CHAR_1), char::from(NMEA_END_CHAR_2)]);
    if sentence.len() + 2 > NMEA_MAX_SENTENCE_LENGTH {
        return Err(DecodeError::TooLong {
            len: sentence.len(),
        });
    }
    if !sentence.is_ascii()
        || sentence.len() < NMEA_MIN_SENTENCE_LENGTH
        || sentence.as_bytes()[0] != NMEA_SYNC_CHAR
    {
        return Err(DecodeError::MalformedSentence);
    }

    let payload = NmeaChecksumCalc::validate_sentence(&sentence[1..])?;
    let fields: Vec<&str> = payload.split(',').collect();
    let address = fields[0];
    if address.len() < 5 {
        return Err(DecodeError::MalformedSentence);
    }
    // Proprietary sentences ($P...) don't follow the talker + type layout
    if address.starts_with('P') {
        return Err(DecodeError::UnsupportedSentence(address.to_string()));
    }

    match &address[address.len() - 3..] {
        "GGA" => parse_gga(&fields, epoch),
        _ => Err(DecodeError::UnsupportedSentence(address.to_string())),
    }
}

/// `$--GGA,hhmmss.ss,llll.ll,a,yyyyy.yy,a,x,xx,x.x,x.x,M,x.x,M,x.x,xxxx`
fn parse_gga(fields: &[&str], epoch: i64) -> Result<GeodeticFix, DecodeError> {
    const GGA: &str = "GGA";
    if fields.len() < 10 {
        return Err(DecodeError::MalformedSentence);
    }

    let quality = fields[6];
    if quality.is_empty() || quality == "0" {
        return Err(DecodeError::NoFix);
    }
    quality.parse::<u8>().map_err(|_| DecodeError::InvalidField {
        sentence: GGA,
        field: "quality",
    })?;

    let latitude = parse_coordinate(fields[2], fields[3], 90.0, ('N', 'S')).ok_or(
        DecodeError::InvalidField {
            sentence: GGA,
            field: "latitude",
        },
    )?;
    let longitude = parse_coordinate(fields[4], fields[5], 180.0, ('E', 'W')).ok_or(
        DecodeError::InvalidField {
            sentence: GGA,
            field: "longitude",
        },
    )?;
    let elevation = fields[9]
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or(DecodeError::InvalidField {
            sentence: GGA,
            field: "altitude",
        })?;

    Ok(GeodeticFix {
        epoch,
        latitude,
        longitude,
        elevation,
        heading: 0.0,
    })
}

/// Converts `(d)ddmm.mmmm` plus hemisphere into signed decimal degrees
fn parse_coordinate(
    raw: &str,
    hemisphere: &str,
    max: f64,
    (pos, neg): (char, char),
) -> Option<f64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return None;
    }
    let dot = raw.find('.').unwrap_or(raw.len());
    if dot < 2 {
        return None;
    }
    let degrees = match &raw[..dot - 2] {
        "" => 0.0,
        d => d.parse::<f64>().ok()?,
    };
    let minutes = raw[dot - 2..].parse::<f64>().ok()?;
    if minutes >= 60.0 {
        return None;
    }
    let value = degrees + minutes / 60.0;
    if value > max {
        return None;
    }

    let mut chars = hemisphere.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c == pos => Some(value),
        (Some(c), None) if c == neg => Some(-value),
        _ => None,
    }
}
