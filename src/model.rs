//! Shared data model: `AircraftRecord`, `GnssStatus`, and the `DataHubItem`
//! envelope that crosses the inbound/outbound datahub boundary.

use std::time::Instant;

/// Source of an `AircraftRecord`'s most recent update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// ADS-B / Mode-S, via SBS-1.
    Adsb,
    /// FLARM, via OGN/APRS.
    Flarm,
    /// Mode-C, synthesised from SBS-1 MSG,5 signal level (no position).
    ModeC,
}

/// A single observed aircraft, keyed by `identifier` in the registry.
#[derive(Debug, Clone)]
pub struct AircraftRecord {
    pub identifier: String,
    pub datatype: DataType,
    pub callsign: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Pressure altitude, feet.
    pub altitude_ft: Option<f64>,
    /// Ground speed, knots.
    pub h_speed_kt: Option<f64>,
    /// Vertical speed, feet per minute.
    pub v_speed_fpm: Option<f64>,
    /// True track, degrees [0, 359].
    pub course_deg: Option<f64>,
    /// SBS-1 MSG,5 field 3, dB. Only meaningful for the Mode-C path.
    pub signal_level_db: Option<f64>,
    /// Single hex digit FLARM aircraft-type category, stored as the
    /// already-resolved character.
    pub aircraft_type: char,
    pub last_seen: Instant,
}

impl AircraftRecord {
    pub fn new(identifier: String, datatype: DataType, now: Instant) -> Self {
        Self {
            identifier,
            datatype,
            callsign: None,
            latitude: None,
            longitude: None,
            altitude_ft: None,
            h_speed_kt: None,
            v_speed_fpm: None,
            course_deg: None,
            signal_level_db: None,
            aircraft_type: '0',
            last_seen: now,
        }
    }

    pub fn age(&self, now: Instant) -> std::time::Duration {
        now.saturating_duration_since(self.last_seen)
    }

    pub fn has_position(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

/// Own-ship GNSS state. Each field is independently absent until first set;
/// only the NMEA parser writes it.
#[derive(Debug, Clone, Default)]
pub struct GnssStatus {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Feet.
    pub altitude_ft: Option<f64>,
    /// Knots.
    pub h_speed_kt: Option<f64>,
    /// Degrees.
    pub course_deg: Option<f64>,
}

impl GnssStatus {
    pub fn has_position(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

/// Content-type tag for datahub items crossing the inbound/outbound queues.
#[derive(Debug, Clone)]
pub enum DataHubItem {
    /// Inbound: one NMEA sentence, trailing newline already stripped.
    Nmea(String),
    /// Inbound: one SBS-1 CSV line.
    Sbs1(String),
    /// Inbound: one APRS/OGN line.
    Ogn(String),
    /// Outbound: one serialized FLARM sentence (`$PFLAA,...*XX` or
    /// `$PFLAU,...*XX`, CRLF-terminated).
    Flarm(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_has_no_position_until_set() {
        let rec = AircraftRecord::new("DEADBE".into(), DataType::Adsb, Instant::now());
        assert!(!rec.has_position());
    }

    #[test]
    fn gnss_status_defaults_to_no_fix() {
        let gnss = GnssStatus::default();
        assert!(!gnss.has_position());
    }
}
