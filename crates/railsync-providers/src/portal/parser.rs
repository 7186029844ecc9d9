//! Block-grouping parser for one purchase-history listing page.
//!
//! The portal renders each reservation as a loose run of `div.pdg-10`
//! fragments: one anchor fragment carrying the purchase details, followed
//! by zero or more detail fragments that refine car/seat or carry the
//! sub-status labels. The parser walks the fragments in document order,
//! keeping a reference to the current record, and attaches trailing
//! fragments to it until the next anchor appears.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use railsync_core::{FieldValue, ReservationRecord};

static FRAGMENT: LazyLock<Selector> = LazyLock::new(|| selector("div.pdg-10"));
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| selector(".contentItem"));
static PURCHASE_DATE: LazyLock<Selector> = LazyLock::new(|| selector(".catgory.item .value"));
static RIDE_DATE: LazyLock<Selector> =
    LazyLock::new(|| selector(".detailsArea .item:nth-of-type(1) .value"));
static TRAIN_NAME: LazyLock<Selector> =
    LazyLock::new(|| selector(".detailsArea .item:nth-of-type(2) .value"));
static STATIONS: LazyLock<Selector> =
    LazyLock::new(|| selector(".detailsArea .item:nth-of-type(3) .station"));
static STATION_NAME: LazyLock<Selector> = LazyLock::new(|| selector(".stationName"));
static STATION_TIME: LazyLock<Selector> = LazyLock::new(|| selector(".time"));
static ADULT_COUNT: LazyLock<Selector> =
    LazyLock::new(|| selector(".detailsArea .item:nth-of-type(4) .value"));
static CHILD_COUNT: LazyLock<Selector> =
    LazyLock::new(|| selector(".detailsArea .item:nth-of-type(5) .value"));
static AMOUNT: LazyLock<Selector> =
    LazyLock::new(|| selector(".detailsArea .item:nth-of-type(6) .value"));
static DETAIL_ITEM: LazyLock<Selector> = LazyLock::new(|| selector(".item"));
static DETAIL_NAME: LazyLock<Selector> = LazyLock::new(|| selector(".name"));
static DETAIL_VALUE: LazyLock<Selector> = LazyLock::new(|| selector(".value"));
static SUB_STATUS: LazyLock<Selector> = LazyLock::new(|| selector(".item.statusArea .status"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

/// Concatenated, whitespace-trimmed text of the first match, or empty.
fn select_text(root: &ElementRef<'_>, sel: &Selector) -> String {
    root.select(sel).next().map(element_text).unwrap_or_default()
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().map(str::trim).collect()
}

/// Parses one listing page into ordered reservation records.
///
/// A page with no anchor fragments yields an empty list; a detail fragment
/// before the first anchor has no record to attach to and is ignored.
pub fn parse_listing_page(html: &str) -> Vec<ReservationRecord> {
    let document = Html::parse_document(html);

    let mut records: Vec<ReservationRecord> = Vec::new();
    let mut current: Option<usize> = None;
    let mut last_fragment: Option<ElementRef<'_>> = None;

    for fragment in document.select(&FRAGMENT) {
        if fragment.select(&ANCHOR).next().is_some() {
            records.push(extract_record(&fragment));
            current = Some(records.len() - 1);
        } else if let Some(idx) = current {
            apply_detail_fragment(&fragment, &mut records[idx]);
        }
        last_fragment = Some(fragment);
    }

    // Status fragments can land after the loop's last anchor evaluation;
    // re-scan the final fragment when the current record is still unmarked.
    if let (Some(idx), Some(last)) = (current, last_fragment) {
        if records[idx].status.is_empty() {
            let statuses = collect_sub_statuses(&last);
            if !statuses.is_empty() {
                records[idx].status = FieldValue::single(statuses.join(" "));
            }
        }
    }

    records
}

/// Extracts the full detail set from an anchor fragment.
fn extract_record(fragment: &ElementRef<'_>) -> ReservationRecord {
    let mut record = ReservationRecord::new(select_text(fragment, &ANCHOR));
    record.purchase_date_time = select_text(fragment, &PURCHASE_DATE);
    record.ride_date = select_text(fragment, &RIDE_DATE).into();
    record.train_name = select_text(fragment, &TRAIN_NAME).into();
    record.adult_count = select_text(fragment, &ADULT_COUNT);
    record.child_count = select_text(fragment, &CHILD_COUNT);
    record.amount = select_text(fragment, &AMOUNT);

    let stations: Vec<_> = fragment.select(&STATIONS).collect();
    if stations.len() >= 2 {
        record.departure_station = select_text(&stations[0], &STATION_NAME).into();
        record.departure_time = select_text(&stations[0], &STATION_TIME);
        record.arrival_station = select_text(&stations[1], &STATION_NAME).into();
        record.arrival_time = select_text(&stations[1], &STATION_TIME);
    }

    record
}

/// Applies a trailing detail fragment to the current record.
///
/// Car/seat labels overwrite (last write wins); status labels, when any
/// are present, replace the record's status with their space-joined form.
fn apply_detail_fragment(fragment: &ElementRef<'_>, record: &mut ReservationRecord) {
    for item in fragment.select(&DETAIL_ITEM) {
        let label = select_text(&item, &DETAIL_NAME);
        let value = select_text(&item, &DETAIL_VALUE);
        if label.contains("号車") {
            record.car_number = value.into();
        } else if label.contains("座席") {
            record.seat = value.into();
        }
    }

    let statuses = collect_sub_statuses(fragment);
    if !statuses.is_empty() {
        record.status = FieldValue::single(statuses.join(" "));
    }
}

fn collect_sub_statuses(fragment: &ElementRef<'_>) -> Vec<String> {
    fragment.select(&SUB_STATUS).map(element_text).collect()
}
