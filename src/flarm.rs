//! FLARM PFLAA/PFLAU sentence generation.
//!
//! For each tracked aircraft with a resolvable relative position, emit a
//! PFLAA proximity report, and when that report crosses an alarm threshold,
//! follow it with a PFLAU summary sentence.

use crate::altimeter::Altimeter;
use crate::config::FlarmGeneratorConfig;
use crate::geodesy::{distance_east, distance_m, distance_north, initial_bearing, relative_bearing};
use crate::model::{AircraftRecord, DataType, GnssStatus};
use crate::units::{db_to_rssi, feet_to_meters, knots_to_mps};

/// PFLAA/PFLAU's relative-distance fields saturate at this range:
/// +/-45000 m.
const DISTANCE_M_MIN: f64 = -45_000.0;
const DISTANCE_M_MAX: f64 = 45_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AlarmLevel {
    None,
    Distant,
    Close,
    Urgent,
}

impl AlarmLevel {
    fn digit(self) -> u8 {
        match self {
            AlarmLevel::None => 0,
            AlarmLevel::Distant => 1,
            AlarmLevel::Close => 2,
            AlarmLevel::Urgent => 3,
        }
    }
}

fn clamp_distance(v: f64) -> f64 {
    v.clamp(DISTANCE_M_MIN, DISTANCE_M_MAX)
}

/// ADS-B/FLARM alarm banding: 1.0 NM / +-500 ft, 2.0 NM / +-1000 ft,
/// 5.0 NM / +-2000 ft.
fn classify_adsb_alarm(distance_m: f64, relative_vertical_m: f64) -> AlarmLevel {
    if (0.0..=1852.0).contains(&distance_m) && (-155.0..=155.0).contains(&relative_vertical_m) {
        AlarmLevel::Urgent
    } else if (0.0..=5100.0).contains(&distance_m) && (-310.0..=310.0).contains(&relative_vertical_m) {
        AlarmLevel::Close
    } else if (0.0..=9700.0).contains(&distance_m) && (-620.0..=620.0).contains(&relative_vertical_m) {
        AlarmLevel::Distant
    } else {
        AlarmLevel::None
    }
}

/// One outbound FLARM sentence, still missing its checksum.
struct RawSentence {
    proprietary_id: &'static str,
    fields: Vec<String>,
}

impl RawSentence {
    fn render(&self) -> String {
        let body = format!("P{}", self.proprietary_id);
        let mut sentence = format!("${body}");
        for field in &self.fields {
            sentence.push(',');
            sentence.push_str(field);
        }
        let checksum = nmea_checksum(&sentence[1..]);
        format!("{sentence}*{checksum:02X}\r\n")
    }
}

fn nmea_checksum(s: &str) -> u8 {
    s.bytes().fold(0u8, |acc, b| acc ^ b)
}

fn fmt_opt_i64(v: Option<f64>) -> String {
    v.map(|v| format!("{v:.0}")).unwrap_or_default()
}

fn fmt_opt_f1(v: Option<f64>) -> String {
    v.map(|v| format!("{v:.1}")).unwrap_or_default()
}

struct GeneratedMessages {
    sentences: Vec<String>,
}

/// Generates the FLARM sentence(s) for one aircraft record, or `None` if
/// nothing should be emitted this sweep (no resolvable position, own-ship
/// echo, or out of the protocol's distance range).
pub fn generate_for_aircraft(
    config: &FlarmGeneratorConfig,
    gnss: &GnssStatus,
    altimeter: &dyn Altimeter,
    aircraft: &AircraftRecord,
) -> Option<Vec<String>> {
    if aircraft.identifier == config.my_tail {
        return None;
    }

    let messages = if gnss.has_position() && aircraft.has_position() {
        generate_adsb(gnss, altimeter, aircraft)
    } else if gnss.has_position() && aircraft.altitude_ft.is_some() && !aircraft.has_position() {
        generate_modec(config, altimeter, aircraft)
    } else {
        None
    };

    messages.map(|g| g.sentences)
}

fn generate_adsb(gnss: &GnssStatus, altimeter: &dyn Altimeter, aircraft: &AircraftRecord) -> Option<GeneratedMessages> {
    let (own_lat, own_lon) = (gnss.latitude?, gnss.longitude?);
    let (acft_lat, acft_lon) = (aircraft.latitude?, aircraft.longitude?);

    let distance = distance_m(own_lat, own_lon, acft_lat, acft_lon);
    let bearing_to = initial_bearing(own_lat, own_lon, acft_lat, acft_lon);

    let distance_north_m = distance_north(bearing_to, distance);
    let distance_east_m = distance_east(bearing_to, distance);

    if !(DISTANCE_M_MIN..=DISTANCE_M_MAX).contains(&distance_north_m)
        || !(DISTANCE_M_MIN..=DISTANCE_M_MAX).contains(&distance_east_m)
    {
        return None;
    }

    // FLARM/OGN traffic compares against the GNSS-derived own altitude;
    // ADS-B/SBS-1 traffic compares against the barometric altimeter
    // collaborator instead. Both branches are gated on the GNSS altitude
    // being known, even though the altimeter branch never reads it itself.
    let relative_vertical_m = match (gnss.altitude_ft, aircraft.altitude_ft) {
        (Some(own_alt_ft), Some(acft_alt_ft)) => match aircraft.datatype {
            DataType::Flarm => clamp_distance(feet_to_meters(acft_alt_ft - own_alt_ft)),
            _ => clamp_distance(feet_to_meters(acft_alt_ft) - altimeter.altitude_m()),
        },
        _ => 0.0,
    };

    let (identifier_type, identifier) = if let Some(callsign) = &aircraft.callsign {
        ("1", format!("{}!{}", aircraft.identifier, callsign))
    } else if aircraft.datatype == DataType::Flarm {
        ("2", format!("{}!Mode-F", aircraft.identifier))
    } else {
        ("1", aircraft.identifier.clone())
    };

    let track = aircraft.course_deg.map(|c| c.clamp(0.0, 359.0));
    let ground_speed_mps = aircraft.h_speed_kt.map(|kt| knots_to_mps(kt).clamp(0.0, 32_767.0));
    // fpm -> m/min via a second 0.3048 factor, then /60 to m/s; the +-32.7
    // clamp applies to the final m/s value, after dividing by 60.
    let climb_rate_mps = aircraft
        .v_speed_fpm
        .map(|fpm| (feet_to_meters(fpm * 0.3048) / 60.0).clamp(-32.7, 32.7));

    let alarm = classify_adsb_alarm(distance, relative_vertical_m);
    let alarm_type = if alarm == AlarmLevel::None { "0" } else { "2" };

    let laa_identifier = if alarm != AlarmLevel::None {
        aircraft.identifier.clone()
    } else {
        identifier
    };

    let laa = RawSentence {
        proprietary_id: "FLAA",
        fields: vec![
            alarm.digit().to_string(),
            format!("{:.0}", clamp_distance(distance_north_m)),
            format!("{:.0}", clamp_distance(distance_east_m)),
            format!("{relative_vertical_m:.0}"),
            identifier_type.to_string(),
            laa_identifier,
            fmt_opt_i64(track),
            String::new(),
            fmt_opt_i64(ground_speed_mps),
            fmt_opt_f1(climb_rate_mps),
            aircraft.aircraft_type.to_string(),
        ],
    };

    let mut sentences = vec![laa.render()];

    let lau = if alarm != AlarmLevel::None {
        let bearing = gnss
            .course_deg
            .map(|own_course| relative_bearing(bearing_to, own_course).clamp(-180.0, 180.0));
        RawSentence {
            proprietary_id: "FLAU",
            fields: vec![
                "1".into(),
                "0".into(),
                "2".into(),
                "1".into(),
                alarm.digit().to_string(),
                fmt_opt_i64(bearing),
                alarm_type.to_string(),
                format!("{relative_vertical_m:.0}"),
                format!("{:.0}", distance.clamp(0.0, 2_147_483_647.0)),
                aircraft.identifier.clone(),
            ],
        }
    } else {
        RawSentence {
            proprietary_id: "FLAU",
            fields: vec![
                "1".into(),
                "0".into(),
                "2".into(),
                "1".into(),
                "0".into(),
                String::new(),
                "0".into(),
                "0".into(),
                String::new(),
                String::new(),
            ],
        }
    };
    sentences.push(lau.render());

    Some(GeneratedMessages { sentences })
}

/// Mode-C banding: RSSI thresholds chosen by `modec_det`, distance bucketed
/// to a fixed "ring" since Mode-C carries no bearing.
fn generate_modec(
    config: &FlarmGeneratorConfig,
    altimeter: &dyn Altimeter,
    aircraft: &AircraftRecord,
) -> Option<GeneratedMessages> {
    let acft_alt_ft = aircraft.altitude_ft?;
    let relative_vertical_m = clamp_distance(feet_to_meters(acft_alt_ft) - altimeter.altitude_m());

    // Skip aircraft whose lateral position is in fact known (those go
    // through the ADS-B path), or whose vertical separation is too large to
    // be useful.
    if aircraft.has_position() || relative_vertical_m > 1000.0 {
        return None;
    }

    let signal_level_db = aircraft.signal_level_db?;
    let rssi = (db_to_rssi(signal_level_db) * 100.0).round() / 100.0;

    let (cutoff_3, cutoff_2, cutoff_1) = config.modec_det.cutoffs();

    let (alarm, distance_ring_m) = if rssi <= 0.0 && rssi >= cutoff_3 && (-155.0..=155.0).contains(&relative_vertical_m) {
        (AlarmLevel::Urgent, 1852.0)
    } else if rssi <= 0.0 && rssi >= cutoff_2 && (-310.0..=310.0).contains(&relative_vertical_m) {
        (AlarmLevel::Close, 5100.0)
    } else if rssi <= 0.0 && rssi >= cutoff_1 && (-310.0..=310.0).contains(&relative_vertical_m) {
        (AlarmLevel::Distant, 9700.0)
    } else {
        return None;
    };

    let laa = RawSentence {
        proprietary_id: "FLAA",
        fields: vec![
            alarm.digit().to_string(),
            format!("{distance_ring_m:.0}"),
            String::new(),
            format!("{relative_vertical_m:.0}"),
            "1".into(),
            aircraft.identifier.clone(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            aircraft.aircraft_type.to_string(),
        ],
    };

    let lau = RawSentence {
        proprietary_id: "FLAU",
        fields: vec![
            "1".into(),
            "0".into(),
            "2".into(),
            "1".into(),
            alarm.digit().to_string(),
            String::new(),
            "2".into(),
            format!("{relative_vertical_m:.0}"),
            format!("{distance_ring_m:.0}"),
            aircraft.identifier.clone(),
        ],
    };

    Some(GeneratedMessages {
        sentences: vec![laa.render(), lau.render()],
    })
}
