use crate::{
    constants::{NMEA_END_CHAR_1, NMEA_END_CHAR_2, NMEA_MAX_SENTENCE_LENGTH, NMEA_SYNC_CHAR},
    error::DecodeError,
};

/// Streaming splitter turning raw serial bytes into NMEA sentences.
///
/// Data is added with `consume()`, which returns an iterator over the
/// sentences that are complete so far. Incomplete trailing data stays in the
/// internal buffer until the next call.
#[derive(Default)]
pub struct SentenceSplitter {
    buf: Vec<u8>,
}

impl SentenceSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_buffer_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn buffer_len(&self) -> usize {
        self.buf.len()
    }

    pub fn consume<'a>(&'a mut self, new_data: &[u8]) -> SentenceIter<'a> {
        self.buf.extend_from_slice(new_data);
        SentenceIter { buf: &mut self.buf }
    }
}

/// Iterator over sentences stored in the `SentenceSplitter` buffer
pub struct SentenceIter<'a> {
    buf: &'a mut Vec<u8>,
}

impl SentenceIter<'_> {
    fn position_from(&self, from: usize, pred: impl Fn(u8) -> bool) -> Option<usize> {
        self.buf
            .iter()
            .skip(from)
            .position(|b| pred(*b))
            .map(|pos| pos + from)
    }
}

impl Iterator for SentenceIter<'_> {
    type Item = Result<String, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let Some(start) = self.position_from(0, |b| b == NMEA_SYNC_CHAR) else {
            self.buf.clear();
            return None;
        };
        self.buf.drain(..start);

        let end = self.position_from(1, |b| b == NMEA_END_CHAR_1 || b == NMEA_END_CHAR_2);
        // A new sync char before the line ending means the previous sentence
        // was cut short.
        let resync = self.position_from(1, |b| b == NMEA_SYNC_CHAR);
        match (end, resync) {
            (_, Some(next)) if end.is_none_or(|end| next < end) => {
                self.buf.drain(..next);
                Some(Err(DecodeError::MalformedSentence))
            },
            (None, _) => {
                if self.buf.len() + 2 > NMEA_MAX_SENTENCE_LENGTH {
                    let len = self.buf.len();
                    self.buf.drain(..1);
                    return Some(Err(DecodeError::TooLong { len }));
                }
                None
            },
            (Some(end), _) => {
                let sentence: Vec<u8> = self.buf.drain(..=end).take(end).collect();
                if sentence.len() + 2 > NMEA_MAX_SENTENCE_LENGTH {
                    return Some(Err(DecodeError::TooLong {
                        len: sentence.len(),
                    }));
                }
                Some(String::from_utf8(sentence).map_err(|_| DecodeError::MalformedSentence))
            },
        }
    }
}
