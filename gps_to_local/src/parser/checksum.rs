use crate::{
    constants::{NMEA_CHECKSUM_CHAR, NMEA_CHECKSUM_LEN},
    error::DecodeError,
};

/// NMEA checksum calculator: XOR of every byte between `$` and `*`
#[derive(Default)]
pub(crate) struct NmeaChecksumCalc {
    ck: u8,
}

impl NmeaChecksumCalc {
    pub(crate) const fn new() -> Self {
        Self { ck: 0 }
    }

    pub(crate) const fn update(&mut self, bytes: &[u8]) {
        let mut i = 0;
        while i < bytes.len() {
            self.update_byte(bytes[i]);
            i += 1;
        }
    }

    pub(crate) const fn update_byte(&mut self, byte: u8) {
        self.ck ^= byte;
    }

    pub(crate) const fn result(self) -> u8 {
        self.ck
    }

    pub(crate) const fn validate_result(self, received: u8) -> Result<(), DecodeError> {
        let calculated = self.result();
        if calculated == received {
            Ok(())
        } else {
            Err(DecodeError::InvalidChecksum {
                expect: received,
                got: calculated,
            })
        }
    }

    /// Validates the `*HH` suffix of `body`, if there is one.
    /// `body` excludes the leading `$` and any line ending.
    ///
    /// Returns the part of the sentence covered by the checksum.
    pub(crate) fn validate_sentence(body: &str) -> Result<&str, DecodeError> {
        let Some((payload, checksum)) = body.split_once(char::from(NMEA_CHECKSUM_CHAR)) else {
            return Ok(body);
        };
        if checksum.len() != NMEA_CHECKSUM_LEN {
            return Err(DecodeError::InvalidField {
                sentence: "NMEA",
                field: "checksum",
            });
        }
        let received = u8::from_str_radix(checksum, 16).map_err(|_| DecodeError::InvalidField {
            sentence: "NMEA",
            field: "checksum",
        })?;

        let mut calc = Self::new();
        calc.update(payload.as_bytes());
        calc.validate_result(received)?;
        Ok(payload)
    }
}
