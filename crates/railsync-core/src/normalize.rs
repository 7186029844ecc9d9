//! Scraped-text normalization.
//!
//! The portal renders most text with full-width ASCII and a mix of spacing
//! characters. Normalization makes scraped values comparable and displayable:
//!
//! - full-width ASCII and digits (U+FF01..=U+FF5E) map to their half-width
//!   forms; kana is left untouched
//! - the non-breaking space and the ideographic space become ordinary spaces
//! - the stylized hyphen U+2010 becomes an ASCII hyphen
//!
//! The full-width parenthesis pair falls inside the U+FF01..=U+FF5E range,
//! so it maps along with the rest. `normalize_text` is idempotent.

use crate::reservation::ReservationRecord;

/// Offset between the full-width forms block and ASCII.
const FULLWIDTH_OFFSET: u32 = 0xFEE0;

/// Normalizes one scraped string into its canonical form.
pub fn normalize_text(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '\u{FF01}'..='\u{FF5E}' => {
                char::from_u32(c as u32 - FULLWIDTH_OFFSET).unwrap_or(c)
            }
            '\u{00A0}' | '\u{3000}' => ' ',
            '\u{2010}' => '-',
            _ => c,
        })
        .collect()
}

/// Normalizes every field of a reservation record, preserving its shape.
///
/// Scalar fields are normalized in place; scalar-or-list fields keep their
/// variant and ordering.
pub fn normalize_record(record: &ReservationRecord) -> ReservationRecord {
    ReservationRecord {
        purchase_id: normalize_text(&record.purchase_id),
        purchase_date_time: normalize_text(&record.purchase_date_time),
        ride_date: record.ride_date.map(normalize_text),
        train_name: record.train_name.map(normalize_text),
        adult_count: normalize_text(&record.adult_count),
        child_count: normalize_text(&record.child_count),
        amount: normalize_text(&record.amount),
        car_number: record.car_number.map(normalize_text),
        seat: record.seat.map(normalize_text),
        departure_station: record.departure_station.map(normalize_text),
        departure_time: normalize_text(&record.departure_time),
        arrival_station: record.arrival_station.map(normalize_text),
        arrival_time: normalize_text(&record.arrival_time),
        status: record.status.map(normalize_text),
    }
}

/// Batch-normalizes a collection of records.
pub fn normalize_records(records: &[ReservationRecord]) -> Vec<ReservationRecord> {
    records.iter().map(normalize_record).collect()
}
