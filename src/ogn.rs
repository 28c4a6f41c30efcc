//! OGN/APRS (FLARM-over-radio) parser.
//!
//! A beacon line looks like:
//! `FLRDD50E2>APRS,qAR:/121255h0036.43N\00432.58W^000/000/A=001397 !W39! id22DD50E2 -039fpm +0.0rot 40.0dB 0e`
//!
//! The first token is parsed with one regex (position, altitude, optional
//! track/speed). Remaining space-separated tokens are each one "extension":
//! each token's prefix selects a parser from a small fixed-alphabet dispatch
//! table, rather than running a battery of regexes over every token.

use std::time::Instant;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::geodesy::reconstruct_relative;
use crate::model::{DataType, GnssStatus};
use crate::registry::Registry;
use crate::units::ogn_coord_to_degrees;

/// The receiving station's own beacon identifier, excluded from the
/// registry as a self-echo.
pub const SELF_BEACON_IDENTIFIER: &str = "FlightBox";

static BEACON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<id>.+?)>APRS,(?P<receiver>.+?):/(?P<time>\d{6})h(?P<lat>\d{4}\.\d{2})(?P<lat_hem>[NS])(?P<table>.)(?P<lon>\d{5}\.\d{2})(?P<lon_hem>[EW])(?P<symbol>.)(?:(?P<track>\d{3})/(?P<speed>\d{3}))?/A=(?P<alt>\d{6})",
    )
    .expect("static beacon regex is valid")
});

struct BeaconFix {
    identifier: String,
    source_callsign: String,
    latitude: f64,
    longitude: f64,
    track: f64,
    h_speed_kt: f64,
    altitude_ft: f64,
}

fn parse_beacon(token: &str) -> Option<BeaconFix> {
    let caps = BEACON_RE.captures(token)?;

    let id_raw = &caps["id"];
    let source_callsign = id_raw.to_string();
    let identifier = id_raw.chars().rev().take(6).collect::<String>().chars().rev().collect::<String>();

    let mut latitude = ogn_coord_to_degrees(caps["lat"].parse().ok()?);
    if &caps["lat_hem"] == "S" {
        latitude = -latitude;
    }

    let mut longitude = ogn_coord_to_degrees(caps["lon"].parse().ok()?);
    if &caps["lon_hem"] == "W" {
        longitude = -longitude;
    }

    let (track, h_speed_kt) = match (caps.name("track"), caps.name("speed")) {
        (Some(t), Some(s)) => (t.as_str().parse().ok()?, s.as_str().parse().ok()?),
        _ => (0.0, 0.0),
    };

    let altitude_ft: f64 = caps["alt"].parse().ok()?;

    Some(BeaconFix {
        identifier,
        source_callsign,
        latitude,
        longitude,
        track,
        h_speed_kt,
        altitude_ft,
    })
}

/// FLARM ID extension token: `id<type-byte><6-hex-address>`, e.g.
/// `id22DD50E2`. Only the high nibble's aircraft-type bits are consumed;
/// stealth and address-type bits are parsed but not acted on.
fn parse_address_extension(token: &str) -> Option<char> {
    let rest = token.strip_prefix("id")?;
    if rest.len() != 8 {
        return None;
    }
    let type_byte = u8::from_str_radix(&rest[0..2], 16).ok()?;
    let aircraft_type = (type_byte & 0b0111_1100) >> 2;
    Some(std::char::from_digit(aircraft_type as u32, 16)?.to_ascii_uppercase())
}

fn parse_climb_rate(token: &str) -> Option<f64> {
    token.strip_suffix("fpm")?.parse().ok()
}

/// `!Wxy!` precision extension: `x`/`y` are the third decimal digit of the
/// latitude/longitude minute, in 1/1000 minute units.
fn parse_coordinate_extension(token: &str) -> Option<(f64, f64)> {
    let inner = token.strip_prefix("!W")?.strip_suffix('!')?;
    if inner.len() != 2 {
        return None;
    }
    let lat_digit: f64 = inner[0..1].parse().ok()?;
    let lon_digit: f64 = inner[1..2].parse().ok()?;
    Some((lat_digit / 1000.0 / 60.0, lon_digit / 1000.0 / 60.0))
}

/// Applies one OGN/APRS line to the registry. No-op until `gnss` has a fix,
/// since every aircraft position is relative to the receiver's own position.
pub async fn handle_ogn_line(line: &str, registry: &Registry, gnss: &GnssStatus, now: Instant) {
    let (Some(own_lat), Some(own_lon)) = (gnss.latitude, gnss.longitude) else {
        debug!("dropping OGN line: own position unknown");
        return;
    };

    let mut parts = line.split_whitespace();
    let Some(beacon_token) = parts.next() else {
        return;
    };

    let Some(fix) = parse_beacon(beacon_token) else {
        warn!("problem parsing OGN beacon data: {beacon_token}");
        return;
    };

    if fix.source_callsign == SELF_BEACON_IDENTIFIER {
        debug!("discarding receiver beacon");
        return;
    }

    let mut latitude = reconstruct_relative(own_lat, fix.latitude);
    let mut longitude = reconstruct_relative(own_lon, fix.longitude);
    let mut aircraft_type: Option<char> = None;
    let mut v_speed_fpm: Option<f64> = None;

    for token in parts {
        if let Some(c) = parse_address_extension(token) {
            aircraft_type = Some(c);
        } else if let Some(fpm) = parse_climb_rate(token) {
            v_speed_fpm = Some(fpm);
        } else if let Some((dlat, dlon)) = parse_coordinate_extension(token) {
            latitude = reconstruct_relative(own_lat, fix.latitude + dlat);
            longitude = reconstruct_relative(own_lon, fix.longitude + dlon);
        } else {
            // Unrecognised extension tokens (turn rate, signal strength,
            // hear-id, frequency offset, gps/software/hardware version,
            // real id, flight level, receiver-health telemetry) are
            // accepted but not consulted by the FLARM generator.
            debug!("ignoring OGN extension token: {token}");
        }
    }

    registry
        .upsert(&fix.identifier, DataType::Flarm, now, |rec| {
            rec.latitude = Some(latitude);
            rec.longitude = Some(longitude);
            rec.altitude_ft = Some(fix.altitude_ft);
            rec.h_speed_kt = Some(fix.h_speed_kt);
            rec.course_deg = Some(fix.track);
            if let Some(c) = aircraft_type {
                rec.aircraft_type = c;
            }
            if let Some(v) = v_speed_fpm {
                rec.v_speed_fpm = Some(v);
            }
            Ok(())
        })
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gnss_at(lat: f64, lon: f64) -> GnssStatus {
        GnssStatus {
            latitude: Some(lat),
            longitude: Some(lon),
            ..Default::default()
        }
    }

    #[test]
    fn parses_beacon_with_track_and_speed() {
        let fix = parse_beacon("FLRDD50E2>APRS,qAR:/121255h0036.43N\\00432.58W^000/000/A=001397").unwrap();
        assert_eq!(fix.identifier, "DD50E2");
        assert!(fix.latitude > 0.0);
        assert!(fix.longitude < 0.0);
        assert_eq!(fix.altitude_ft, 1397.0);
    }

    #[test]
    fn parses_beacon_without_track_speed_group() {
        let fix = parse_beacon("FLRDD50E2>APRS,qAR:/121255h0036.43N\\00432.58W^/A=001397").unwrap();
        assert_eq!(fix.track, 0.0);
        assert_eq!(fix.h_speed_kt, 0.0);
    }

    #[test]
    fn address_extension_extracts_aircraft_type_nibble() {
        // 0x22 = 0b0010_0010 -> (type_byte & 0b0111_1100) >> 2 = 0b1000 = 8
        assert_eq!(parse_address_extension("id22DD50E2"), Some('8'));
    }

    #[test]
    fn climb_rate_extension_parses_signed_fpm() {
        assert_eq!(parse_climb_rate("-039fpm"), Some(-39.0));
        assert_eq!(parse_climb_rate("+120fpm"), Some(120.0));
    }

    #[test]
    fn coordinate_extension_parses_precision_digits() {
        let (dlat, dlon) = parse_coordinate_extension("!W39!").unwrap();
        assert!((dlat - 3.0 / 1000.0 / 60.0).abs() < 1e-12);
        assert!((dlon - 9.0 / 1000.0 / 60.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn handle_ogn_line_drops_without_own_position() {
        let reg = Registry::new();
        let gnss = GnssStatus::default();
        let now = Instant::now();
        handle_ogn_line(
            "FLRDD50E2>APRS,qAR:/121255h0036.43N\\00432.58W^000/000/A=001397 id22DD50E2",
            &reg,
            &gnss,
            now,
        )
        .await;
        assert!(reg.is_empty().await);
    }

    #[tokio::test]
    async fn handle_ogn_line_drops_self_beacon() {
        let reg = Registry::new();
        let gnss = gnss_at(47.0, 8.0);
        let now = Instant::now();
        handle_ogn_line(
            "FlightBox>APRS,qAR:/121255h0036.43N\\00432.58W^000/000/A=001397",
            &reg,
            &gnss,
            now,
        )
        .await;
        assert!(reg.is_empty().await);
    }

    #[tokio::test]
    async fn handle_ogn_line_upserts_with_reconstructed_position() {
        let reg = Registry::new();
        let gnss = gnss_at(47.0, 8.0);
        let now = Instant::now();
        handle_ogn_line(
            "FLRDD50E2>APRS,qAR:/121255h0036.43N\\00432.58W^000/000/A=001397 id22DD50E2 -039fpm",
            &reg,
            &gnss,
            now,
        )
        .await;
        let rec = reg.get("DD50E2", now).await.unwrap();
        assert!(rec.has_position());
        assert_eq!(rec.v_speed_fpm, Some(-39.0));
        assert_eq!(rec.aircraft_type, '8');
    }
}
