//! SBS-1 (ADS-B/Mode-S CSV) parser.
//!
//! Each line is a BaseStation-format `MSG` record. Only `MSG,1`..`MSG,5`
//! carry fields this crate consumes; everything else (`SEL`, `ID`, `AIR`,
//! `STA`, `CLK`) is ignored. Parse errors are swallowed and logged.

use std::time::Instant;

use tracing::{debug, warn};

use crate::model::DataType;
use crate::registry::Registry;

/// Applies one SBS-1 CSV line to the registry, creating the aircraft record
/// on first sight.
pub async fn handle_sbs1_line(line: &str, registry: &Registry, now: Instant) {
    if let Err(e) = try_handle(line, registry, now).await {
        warn!("SBS-1 parse failed: {e}");
    }
}

async fn try_handle(line: &str, registry: &Registry, now: Instant) -> Result<(), String> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() <= 16 {
        return Ok(());
    }

    let msg_type = fields[1];
    if !matches!(msg_type, "1" | "2" | "3" | "4" | "5") {
        return Ok(());
    }

    let category = fields[2];
    let icao_id = fields[4];
    if icao_id.is_empty() {
        return Err("empty ICAO id".into());
    }
    let callsign = fields[10].trim();

    registry
        .upsert(icao_id, DataType::Adsb, now, |rec| {
            apply_fields(rec, msg_type, category, fields[3], callsign, fields[11], fields[12], fields[13], fields[14], fields[15], fields[16])
        })
        .await;

    debug!("SBS-1 MSG,{msg_type}: {icao_id}");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn apply_fields(
    rec: &mut crate::model::AircraftRecord,
    msg_type: &str,
    category: &str,
    signal_level: &str,
    callsign: &str,
    altitude: &str,
    h_speed: &str,
    course: &str,
    latitude: &str,
    longitude: &str,
    v_speed: &str,
) -> Result<(), String> {
    match msg_type {
        "1" => {
            if !callsign.is_empty() {
                rec.callsign = Some(callsign.to_string());
            }
        }
        "2" | "3" => {
            if !latitude.is_empty() {
                rec.latitude = Some(latitude.parse::<f64>().map_err(|e| e.to_string())?);
            }
            if !longitude.is_empty() {
                rec.longitude = Some(longitude.parse::<f64>().map_err(|e| e.to_string())?);
            }
            if !altitude.is_empty() {
                rec.altitude_ft = Some(altitude.parse::<f64>().map_err(|e| e.to_string())?);
            }
        }
        "4" => {
            if !h_speed.is_empty() {
                rec.h_speed_kt = Some(h_speed.parse::<f64>().map_err(|e| e.to_string())?);
            }
            if !v_speed.is_empty() {
                rec.v_speed_fpm = Some(v_speed.parse::<f64>().map_err(|e| e.to_string())?);
            }
            if !course.is_empty() {
                rec.course_deg = Some(course.parse::<f64>().map_err(|e| e.to_string())?);
            }
        }
        "5" => {
            if !signal_level.is_empty() {
                rec.signal_level_db = Some(signal_level.parse::<f64>().map_err(|e| e.to_string())?);
            }
            if !altitude.is_empty() {
                rec.altitude_ft = Some(altitude.parse::<f64>().map_err(|e| e.to_string())?);
            }
            rec.aircraft_type = derive_aircraft_type(category, rec.h_speed_kt);
        }
        _ => {}
    }
    Ok(())
}

/// ADS-B emitter category:
/// ```text
/// A0 = No Data          B0 = no Data
/// A1 = Light            B1 = Glider
/// A2 = Medium           B2 = Balloon
/// A3 = Heavy            B3 = skydiver
/// A4 = High-Vortex      B4 = ultralight
/// A5 = Very heavy       B5 = reserved
/// A6 = High perf./speed B6 = Drone
/// A7 = Rotorcraft       B7 = Spacecraft
/// ```
/// mapped to a single FLARM aircraft-type hex digit, with ground speed above
/// 100 kt escalating an otherwise-unmapped category to powered aircraft (`9`).
fn derive_aircraft_type(category: &str, h_speed_kt: Option<f64>) -> char {
    let speed = h_speed_kt.unwrap_or(50.0);

    if matches!(category, "A2" | "A3" | "A4" | "A5" | "A6") {
        '9'
    } else if speed > 100.0 {
        '9'
    } else {
        match category {
            "A1" => '8',
            "A7" => '3',
            "B1" => '1',
            "B2" => 'B',
            _ => '8',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;

    fn msg(msg_type: &str, rest: &str) -> String {
        // MSG,<type>,0,0,<icao>,0,...,<rest from field 10 on>
        format!("MSG,{msg_type},0,0,ABC123,0,0,0,0,0,{rest}")
    }

    #[tokio::test]
    async fn msg1_sets_callsign() {
        let reg = Registry::new();
        let now = Instant::now();
        handle_sbs1_line(&msg("1", "SWISS123,,,,,,"), &reg, now).await;
        let rec = reg.get("ABC123", now).await.unwrap();
        assert_eq!(rec.callsign.as_deref(), Some("SWISS123"));
    }

    #[tokio::test]
    async fn msg3_sets_airborne_position() {
        let reg = Registry::new();
        let now = Instant::now();
        handle_sbs1_line(&msg("3", ",5000,,,47.0,8.5,"), &reg, now).await;
        let rec = reg.get("ABC123", now).await.unwrap();
        assert_eq!(rec.latitude, Some(47.0));
        assert_eq!(rec.longitude, Some(8.5));
        assert_eq!(rec.altitude_ft, Some(5000.0));
    }

    #[tokio::test]
    async fn msg5_derives_default_powered_type_for_unmapped_category() {
        let reg = Registry::new();
        let now = Instant::now();
        handle_sbs1_line(&msg("5", ",5000,,,,,"), &reg, now).await;
        let rec = reg.get("ABC123", now).await.unwrap();
        // category defaults to "0" in the msg() helper, speed default 50kt => '8'
        assert_eq!(rec.aircraft_type, '8');
    }

    #[tokio::test]
    async fn msg5_medium_category_is_always_powered() {
        let reg = Registry::new();
        let now = Instant::now();
        let line = "MSG,5,A2,0,ABC123,0,0,0,0,0,,5000,,,,,";
        handle_sbs1_line(line, &reg, now).await;
        let rec = reg.get("ABC123", now).await.unwrap();
        assert_eq!(rec.aircraft_type, '9');
    }

    #[tokio::test]
    async fn msg5_fast_unmapped_category_becomes_powered() {
        let reg = Registry::new();
        let now = Instant::now();
        handle_sbs1_line(&msg("4", ",,150,,,,"), &reg, now).await;
        handle_sbs1_line(&msg("5", ",5000,,,,,"), &reg, now).await;
        let rec = reg.get("ABC123", now).await.unwrap();
        assert_eq!(rec.aircraft_type, '9');
    }

    #[tokio::test]
    async fn too_few_fields_is_ignored() {
        let reg = Registry::new();
        let now = Instant::now();
        handle_sbs1_line("MSG,3,0,0,ABC123", &reg, now).await;
        assert!(reg.get("ABC123", now).await.is_none());
    }

    #[tokio::test]
    async fn empty_icao_is_an_error_and_does_not_panic() {
        let reg = Registry::new();
        let now = Instant::now();
        handle_sbs1_line(&msg("3", ",5000,,,47.0,8.5,"), &reg, now).await;
        // swap ICAO for empty string
        let line = "MSG,3,0,0,,0,0,0,0,0,,5000,,,47.0,8.5,";
        handle_sbs1_line(line, &reg, now).await;
    }
}
