//! Unit conversions shared by the NMEA, SBS-1, and OGN parsers and by the
//! FLARM generator: coordinate encodings, altitude/speed units, and the
//! dB -> RSSI mapping used for Mode-C pseudo-ranging.

/// Converts an NMEA `ddmm.mmmm` coordinate (degrees + decimal minutes, no
/// hemisphere sign applied) into signed decimal degrees.
pub fn nmea_coord_to_degrees(raw: f64) -> f64 {
    ddmm_to_degrees(raw)
}

/// Converts an APRS/OGN `ddmm.mm` coordinate into decimal degrees. APRS
/// beacons encode the same "degrees + decimal minutes" layout as NMEA, just
/// with two fractional digits on the minutes instead of four.
pub fn ogn_coord_to_degrees(raw: f64) -> f64 {
    ddmm_to_degrees(raw)
}

fn ddmm_to_degrees(raw: f64) -> f64 {
    let degrees = (raw / 100.0).trunc();
    let minutes = raw - degrees * 100.0;
    degrees + minutes / 60.0
}

const FEET_PER_METER: f64 = 1.0 / 0.3048;
const METERS_PER_FOOT: f64 = 0.3048;
const MPS_PER_KNOT: f64 = 0.514444;

pub fn feet_to_meters(feet: f64) -> f64 {
    feet * METERS_PER_FOOT
}

pub fn meters_to_feet(meters: f64) -> f64 {
    meters * FEET_PER_METER
}

pub fn knots_to_mps(knots: f64) -> f64 {
    knots * MPS_PER_KNOT
}

/// Maps an SBS-1 MSG,5 `signallevel` (dB) reading to an RSSI-like value in
/// dBm for Mode-C banding.
///
/// The original firmware's `utils.conversion.db_to_rssi` is referenced but
/// not available in the retrieved source (see DESIGN.md, Open Question
/// resolution for `db_to_rssi`). The only observable constraints are that
/// the result is compared directly against negative dBm cutoffs
/// (`0 >= rssi >= cutoff`), so this normalizes the raw dB reading to a
/// non-positive, monotone-decreasing-in-magnitude value rather than
/// inventing a specific log-distance coefficient.
pub fn db_to_rssi(db: f64) -> f64 {
    -db.abs()
}
