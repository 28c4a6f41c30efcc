//! NMEA-0183 parser: own-ship GNSS sentences `$GPGGA`, `$GPGLL`, `$GPVTG`,
//! each updating `GnssStatus` in place.

use tracing::{debug, trace, warn};

use crate::model::GnssStatus;
use crate::units::{meters_to_feet, nmea_coord_to_degrees};

/// Parses one NMEA sentence and applies any recognised fields to `gnss`.
///
/// Unsupported prefixes are ignored silently (not an error). Recognised
/// prefixes that fail to parse are swallowed and logged at `warn` as "no
/// fix"; empty fields leave the corresponding attribute untouched.
pub fn handle_nmea_sentence(sentence: &str, gnss: &mut GnssStatus) {
    let sentence = sentence.trim();

    if sentence.starts_with("$GPGGA") {
        if let Err(e) = parse_gpgga(sentence, gnss) {
            warn!("no fix (GPGGA parse failed): {e}");
        }
    } else if sentence.starts_with("$GPGLL") {
        if let Err(e) = parse_gpgll(sentence, gnss) {
            warn!("no fix (GPGLL parse failed): {e}");
        }
    } else if sentence.starts_with("$GPVTG") {
        if let Err(e) = parse_gpvtg(sentence, gnss) {
            warn!("no fix (GPVTG parse failed): {e}");
        }
    } else {
        trace!("ignoring unrecognised NMEA sentence: {sentence}");
    }
}

fn fields(sentence: &str) -> Vec<&str> {
    sentence
        .split('*')
        .next()
        .unwrap_or(sentence)
        .split(',')
        .collect()
}

fn apply_lat(gnss: &mut GnssStatus, raw: &str, hemisphere: &str) -> Result<(), String> {
    if raw.is_empty() || hemisphere.is_empty() {
        return Ok(());
    }
    let deg = nmea_coord_to_degrees(raw.parse::<f64>().map_err(|e| e.to_string())?);
    gnss.latitude = Some(match hemisphere {
        "S" => -deg,
        _ => deg,
    });
    Ok(())
}

fn apply_lon(gnss: &mut GnssStatus, raw: &str, hemisphere: &str) -> Result<(), String> {
    if raw.is_empty() || hemisphere.is_empty() {
        return Ok(());
    }
    let deg = nmea_coord_to_degrees(raw.parse::<f64>().map_err(|e| e.to_string())?);
    gnss.longitude = Some(match hemisphere {
        "W" => -deg,
        _ => deg,
    });
    Ok(())
}

/// `$GPGGA,hhmmss.ss,llll.ll,a,yyyyy.yy,a,x,xx,x.x,x.x,M,x.x,M,x.x,xxxx*hh`
fn parse_gpgga(sentence: &str, gnss: &mut GnssStatus) -> Result<(), String> {
    let f = fields(sentence);
    if f.len() < 10 {
        return Err("too few fields".into());
    }

    apply_lat(gnss, f[2], f[3])?;
    apply_lon(gnss, f[4], f[5])?;

    let alt_raw = f[9];
    let alt_units = f.get(10).copied().unwrap_or("");
    if !alt_raw.is_empty() {
        let alt_m = alt_raw.parse::<f64>().map_err(|e| e.to_string())?;
        if alt_units == "M" {
            gnss.altitude_ft = Some(meters_to_feet(alt_m));
        }
    }

    debug!("GPGGA: lat={:?} lon={:?} alt_ft={:?}", gnss.latitude, gnss.longitude, gnss.altitude_ft);
    Ok(())
}

/// `$GPGLL,llll.ll,a,yyyyy.yy,a,hhmmss.ss,A,a*hh`
fn parse_gpgll(sentence: &str, gnss: &mut GnssStatus) -> Result<(), String> {
    let f = fields(sentence);
    if f.len() < 5 {
        return Err("too few fields".into());
    }

    apply_lat(gnss, f[1], f[2])?;
    apply_lon(gnss, f[3], f[4])?;

    Ok(())
}

/// `$GPVTG,x.x,T,x.x,M,x.x,N,x.x,K,a*hh`
fn parse_gpvtg(sentence: &str, gnss: &mut GnssStatus) -> Result<(), String> {
    let f = fields(sentence);
    if f.len() < 8 {
        return Err("too few fields".into());
    }

    let cog_t = f[1];
    let h_speed_kt = f[5];

    if !h_speed_kt.is_empty() {
        gnss.h_speed_kt = Some(h_speed_kt.parse::<f64>().map_err(|e| e.to_string())?);
    }
    if !cog_t.is_empty() {
        gnss.course_deg = Some(cog_t.parse::<f64>().map_err(|e| e.to_string())?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpgga_sets_position_and_altitude() {
        let mut gnss = GnssStatus::default();
        handle_nmea_sentence(
            "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47",
            &mut gnss,
        );
        assert!((gnss.latitude.unwrap() - 48.1173).abs() < 1e-3);
        assert!((gnss.longitude.unwrap() - 11.5167).abs() < 1e-3);
        assert!(gnss.altitude_ft.is_some());
    }

    #[test]
    fn gpgga_south_west_negates() {
        let mut gnss = GnssStatus::default();
        handle_nmea_sentence(
            "$GPGGA,123519,4807.038,S,01131.000,W,1,08,0.9,545.4,M,46.9,M,,*47",
            &mut gnss,
        );
        assert!(gnss.latitude.unwrap() < 0.0);
        assert!(gnss.longitude.unwrap() < 0.0);
    }

    #[test]
    fn gpgll_sets_only_position() {
        let mut gnss = GnssStatus::default();
        handle_nmea_sentence("$GPGLL,4807.038,N,01131.000,E,123519,A*2A", &mut gnss);
        assert!(gnss.latitude.is_some());
        assert!(gnss.longitude.is_some());
        assert!(gnss.altitude_ft.is_none());
    }

    #[test]
    fn gpvtg_sets_course_and_speed() {
        let mut gnss = GnssStatus::default();
        handle_nmea_sentence("$GPVTG,054.7,T,034.4,M,005.5,N,010.2,K,A*34", &mut gnss);
        assert_eq!(gnss.course_deg, Some(54.7));
        assert_eq!(gnss.h_speed_kt, Some(5.5));
    }

    #[test]
    fn gpvtg_empty_fields_leave_attributes_untouched() {
        let mut gnss = GnssStatus::default();
        handle_nmea_sentence("$GPVTG,,T,,M,,N,,K,A*34", &mut gnss);
        assert!(gnss.course_deg.is_none());
        assert!(gnss.h_speed_kt.is_none());
    }

    #[test]
    fn malformed_sentence_is_swallowed_not_panicking() {
        let mut gnss = GnssStatus::default();
        handle_nmea_sentence("$GPGGA,garbage", &mut gnss);
        assert!(gnss.latitude.is_none());
    }

    #[test]
    fn unrecognised_prefix_is_ignored() {
        let mut gnss = GnssStatus::default();
        handle_nmea_sentence("$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A", &mut gnss);
        assert!(gnss.latitude.is_none());
    }
}
