//! Payload code walker.
//!
//! A validated payload is a sequence of tagged rows:
//!
//! | Code | Meaning | Layout |
//! |------|---------|--------|
//! | 0x55 | extended-code marker | tag only |
//! | 0x02 | signal quality | tag, value |
//! | 0x03 | heart rate | tag, value |
//! | 0x80 | raw ECG | tag, length (2), i16 big-endian |
//! | other >= 0x80 | ignored | tag, length, data |
//! | other < 0x80 | ignored | tag, value |
//!
//! [`Codes`] yields one [`DataRow`] per tag. Every multi-byte read is bounds
//! checked first; a row that would run past the end yields
//! [`DataRow::Truncated`] and ends the walk.

use crate::protocol::{
    CODE_EXTENDED, CODE_HEART_RATE, CODE_RAW_ECG, CODE_SIGNAL_QUALITY, MULTI_BYTE_CODE_MIN, RAW_ECG_LEN, SENSOR_ON,
};

/// Signal quality as reported by the sensor (0 = off, 200 = on).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SignalQuality(pub u8);

impl SignalQuality {
    /// Electrodes have good contact.
    #[inline]
    pub const fn is_sensor_on(self) -> bool { self.0 == SENSOR_ON }

    /// Raw quality value.
    #[inline]
    pub const fn value(self) -> u8 { self.0 }
}

/// One decoded payload row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataRow {
    SignalQuality(SignalQuality),
    /// Beats per minute.
    HeartRate(u8),
    RawEcg(i16),
    /// A well-formed row the pipeline has no use for.
    Ignored { code: u8 },
    /// A row whose fields run past the payload end. Always the last row.
    Truncated { code: u8 },
}

/// Iterator over the rows of a payload.
pub struct Codes<'a> {
    payload: &'a [u8],
    idx: usize,
}

impl<'a> Codes<'a> {
    pub const fn new(payload: &'a [u8]) -> Self { Self { payload, idx: 0 } }

    fn truncated(
        &mut self,
        code: u8,
    ) -> DataRow {
        self.idx = self.payload.len();
        DataRow::Truncated { code }
    }

    /// Skip a length-prefixed row whose tag sits at `self.idx`.
    fn skip_length_prefixed(
        &mut self,
        code: u8,
    ) -> DataRow {
        let Some(&declared) = self.payload.get(self.idx + 1) else {
            return self.truncated(code);
        };
        let end = self.idx + 2 + usize::from(declared);
        if end > self.payload.len() {
            return self.truncated(code);
        }
        self.idx = end;
        DataRow::Ignored { code }
    }

    fn single_value(&mut self) -> Option<u8> {
        let value = *self.payload.get(self.idx + 1)?;
        self.idx += 2;
        Some(value)
    }
}

impl Iterator for Codes<'_> {
    type Item = DataRow;

    fn next(&mut self) -> Option<DataRow> {
        loop {
            let code = *self.payload.get(self.idx)?;

            let row = match code {
                CODE_EXTENDED => {
                    self.idx += 1;
                    continue;
                }
                CODE_RAW_ECG => match self.payload.get(self.idx + 1..self.idx + 4) {
                    Some(&[RAW_ECG_LEN, hi, lo]) => {
                        self.idx += 4;
                        DataRow::RawEcg(i16::from_be_bytes([hi, lo]))
                    }
                    _ => self.skip_length_prefixed(code),
                },
                code if code >= MULTI_BYTE_CODE_MIN => self.skip_length_prefixed(code),
                _ => match self.single_value() {
                    None => self.truncated(code),
                    Some(value) if code == CODE_SIGNAL_QUALITY => DataRow::SignalQuality(SignalQuality(value)),
                    Some(value) if code == CODE_HEART_RATE => DataRow::HeartRate(value),
                    Some(_) => DataRow::Ignored { code },
                },
            };
            return Some(row);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
