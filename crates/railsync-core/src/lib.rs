//! Core types: reservation records, text normalization, portal time parsing

pub mod normalize;
pub mod reservation;
pub mod time;

pub use normalize::{normalize_record, normalize_records, normalize_text};
pub use reservation::{FieldValue, ReservationRecord};
pub use time::{
    TOKYO_TZ_NAME, YearMonth, parse_clock_time, parse_ride_date, ride_datetime, tokyo_offset,
};
