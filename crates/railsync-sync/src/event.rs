//! Calendar event construction from normalized reservations.

use thiserror::Error;

use railsync_core::{ReservationRecord, TOKYO_TZ_NAME, ride_datetime};
use railsync_providers::{EventPayload, EventStamp};

/// Statuses that produce calendar events. Matching is exact.
pub const ALLOWED_STATUSES: [&str; 3] = ["購入済", "運休払戻済", "乗車変更購入済"];

/// Substring marking a refunded reservation, which flips the summary glyph.
const REFUNDED_MARKER: &str = "払戻済";

const GLYPH_TRAIN: &str = "🚆";
const GLYPH_CANCELLED: &str = "🚫";

/// Returns true if the status admits the reservation into the calendar.
pub fn is_allowed_status(status: &str) -> bool {
    ALLOWED_STATUSES.contains(&status)
}

/// Why a reservation could not be turned into an event.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventBuildError {
    #[error("unparseable ride date or departure time")]
    UnparseableStart,
    #[error("unparseable ride date or arrival time")]
    UnparseableEnd,
}

/// Builds the calendar event payload for an admitted reservation.
///
/// Start and end share the ride date; both are wall-clock times in the
/// fixed source timezone. The summary carries the cancellation glyph when
/// the status mentions a refund, the train glyph otherwise.
pub fn build_event(record: &ReservationRecord) -> Result<EventPayload, EventBuildError> {
    let start = ride_datetime(record.ride_date_text(), &record.departure_time)
        .ok_or(EventBuildError::UnparseableStart)?;
    let end = ride_datetime(record.ride_date_text(), &record.arrival_time)
        .ok_or(EventBuildError::UnparseableEnd)?;

    let status = record.status_text();
    let car = record.car_number_text().replace(' ', "");
    let seat = record.seat_text();
    let departure = record.departure_station_text();
    let arrival = record.arrival_station_text();

    let glyph = if status.contains(REFUNDED_MARKER) {
        GLYPH_CANCELLED
    } else {
        GLYPH_TRAIN
    };
    let summary = format!("{glyph} {departure}→{arrival} [{car} {seat}]");

    let description = format!(
        "列車名: {}\n号車: {}\n座席: {}\n人数: 大人 {} / 小児 {}\n金額: {}\nステータス: {}\n購入番号: {}\n",
        record.train_name_text(),
        car,
        seat,
        record.adult_count,
        record.child_count,
        record.amount,
        status,
        record.purchase_id,
    );

    Ok(EventPayload {
        summary,
        description,
        location: format!("{departure}駅"),
        start: EventStamp::new(start, TOKYO_TZ_NAME),
        end: EventStamp::new(end, TOKYO_TZ_NAME),
    })
}
