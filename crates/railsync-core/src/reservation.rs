//! Reservation record types.
//!
//! This module defines [`ReservationRecord`], one purchased trip segment (or
//! its cancellation variant) as reconstructed from the purchase-history
//! listing, and [`FieldValue`], the scalar-or-list value shape the portal
//! produces for some fields.
//!
//! Several fields arrive from the listing as either a single string or an
//! ordered sequence of strings, and the reduction rule is deliberately
//! different per field. Those rules live in named accessor methods on
//! [`ReservationRecord`] rather than being unified:
//!
//! - ride date, train name, stations: first element
//! - status, car number: space-join with duplicates removed
//! - seat: plain space-join

use serde::{Deserialize, Serialize};

/// A field that may carry one value or an ordered sequence of values.
///
/// Serialized untagged, so a JSON string deserializes to `Single` and a
/// JSON array to `Multiple`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A single scalar value.
    Single(String),
    /// An ordered sequence of values.
    Multiple(Vec<String>),
}

impl FieldValue {
    /// Creates a single-valued field.
    pub fn single(value: impl Into<String>) -> Self {
        Self::Single(value.into())
    }

    /// Creates a multi-valued field from an ordered sequence.
    pub fn multiple(values: Vec<String>) -> Self {
        Self::Multiple(values)
    }

    /// Returns true if the field carries no text at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(s) => s.is_empty(),
            Self::Multiple(vs) => vs.iter().all(|v| v.is_empty()),
        }
    }

    /// Reduces to the first element.
    ///
    /// For `Single` this is the value itself; for `Multiple` the first
    /// entry, or the empty string when the sequence is empty.
    pub fn first(&self) -> &str {
        match self {
            Self::Single(s) => s,
            Self::Multiple(vs) => vs.first().map(String::as_str).unwrap_or(""),
        }
    }

    /// Reduces by joining all values with the given separator.
    pub fn join(&self, sep: &str) -> String {
        match self {
            Self::Single(s) => s.clone(),
            Self::Multiple(vs) => vs.join(sep),
        }
    }

    /// Reduces by joining with the given separator, keeping only the first
    /// occurrence of each value (order preserved).
    pub fn join_dedup(&self, sep: &str) -> String {
        match self {
            Self::Single(s) => s.clone(),
            Self::Multiple(vs) => {
                let mut seen = Vec::new();
                for v in vs {
                    if !seen.contains(v) {
                        seen.push(v.clone());
                    }
                }
                seen.join(sep)
            }
        }
    }

    /// Applies a string transformation to every value, preserving the shape.
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(&str) -> String,
    {
        match self {
            Self::Single(s) => Self::Single(f(s)),
            Self::Multiple(vs) => Self::Multiple(vs.iter().map(|v| f(v)).collect()),
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        Self::Single(String::new())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

/// One purchased trip segment from the purchase-history listing.
///
/// A record is anchored by exactly one parent listing fragment; trailing
/// fragments up to the next anchor only refine car/seat or replace the
/// status. The empty string is a valid (unknown) status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReservationRecord {
    /// Purchase number shown on the anchor fragment.
    pub purchase_id: String,
    /// Purchase datetime text.
    pub purchase_date_time: String,
    /// Ride date text (portal format, e.g. `2024年6月10日(月)`).
    pub ride_date: FieldValue,
    /// Train name.
    pub train_name: FieldValue,
    /// Adult passenger count text.
    pub adult_count: String,
    /// Child passenger count text.
    pub child_count: String,
    /// Amount text.
    pub amount: String,
    /// Car number, aggregated from detail fragments.
    pub car_number: FieldValue,
    /// Seat, aggregated from detail fragments.
    pub seat: FieldValue,
    /// Departure station name.
    pub departure_station: FieldValue,
    /// Departure time text.
    pub departure_time: String,
    /// Arrival station name.
    pub arrival_station: FieldValue,
    /// Arrival time text.
    pub arrival_time: String,
    /// Space-joined sub-status labels; empty when unknown.
    pub status: FieldValue,
}

impl ReservationRecord {
    /// Creates an empty record for a freshly seen anchor fragment.
    pub fn new(purchase_id: impl Into<String>) -> Self {
        Self {
            purchase_id: purchase_id.into(),
            ..Self::default()
        }
    }

    /// Ride date text, reduced to the first element.
    pub fn ride_date_text(&self) -> &str {
        self.ride_date.first()
    }

    /// Train name, reduced to the first element.
    pub fn train_name_text(&self) -> &str {
        self.train_name.first()
    }

    /// Departure station, reduced to the first element.
    pub fn departure_station_text(&self) -> &str {
        self.departure_station.first()
    }

    /// Arrival station, reduced to the first element.
    pub fn arrival_station_text(&self) -> &str {
        self.arrival_station.first()
    }

    /// Status labels, space-joined with duplicates removed.
    pub fn status_text(&self) -> String {
        self.status.join_dedup(" ")
    }

    /// Car number, space-joined with duplicates removed.
    pub fn car_number_text(&self) -> String {
        self.car_number.join_dedup(" ")
    }

    /// Seat, plain space-join.
    pub fn seat_text(&self) -> String {
        self.seat.join(" ")
    }
}
