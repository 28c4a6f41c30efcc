//! INI configuration loading: the `[DEFAULT]` section's `my_ICAO`,
//! `modec_sep`, and `modec_det` keys.
//!
//! The web configuration form that writes this file is out of scope here;
//! this module only reads it once at startup.

use ini::Ini;
use std::path::Path;

use crate::error::TransformError;

/// Mode-C sensitivity band, selected by `modec_det` in the INI file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModecSensitivity {
    /// `modec_det = 1`
    UltraShort,
    /// `modec_det = 2`
    Short,
    /// `modec_det = 3`
    Medium,
    /// `modec_det = 4` (default)
    Long,
}

impl ModecSensitivity {
    fn from_value(v: i64) -> Self {
        match v {
            1 => ModecSensitivity::UltraShort,
            2 => ModecSensitivity::Short,
            3 => ModecSensitivity::Medium,
            _ => ModecSensitivity::Long,
        }
    }

    /// `(level 3, level 2, level 1)` RSSI cutoffs in dBm, most-sensitive
    /// first.
    pub fn cutoffs(self) -> (f64, f64, f64) {
        match self {
            ModecSensitivity::UltraShort => (-29.0, -30.0, -31.0),
            ModecSensitivity::Short => (-30.0, -31.0, -32.0),
            ModecSensitivity::Medium => (-31.0, -32.0, -33.0),
            ModecSensitivity::Long => (-32.0, -33.0, -34.0),
        }
    }
}

/// Resolved configuration for the FLARM generator.
#[derive(Debug, Clone)]
pub struct FlarmGeneratorConfig {
    /// Own ship's 6-hex-digit ICAO address.
    pub my_icao: String,
    /// Own ship's tail/identifier string, used to suppress self-echo.
    pub my_tail: String,
    /// Reserved, parsed but not consulted by alarm logic.
    pub modec_sep: f64,
    pub modec_det: ModecSensitivity,
}

impl FlarmGeneratorConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TransformError> {
        let path = path.as_ref();
        let ini = Ini::load_from_file(path)
            .map_err(|e| TransformError::Config(format!("cannot read {}: {e}", path.display())))?;

        let section = ini.section(Some("DEFAULT")).ok_or_else(|| {
            TransformError::Config(format!("{} has no [DEFAULT] section", path.display()))
        })?;

        let my_icao_raw = section
            .get("my_ICAO")
            .ok_or_else(|| TransformError::Config("missing my_ICAO key".into()))?;
        let (my_icao, my_tail) = my_icao_raw
            .split_once(',')
            .ok_or_else(|| TransformError::Config("my_ICAO must be '<icao>,<tail>'".into()))?;

        let modec_sep = section
            .get("modec_sep")
            .ok_or_else(|| TransformError::Config("missing modec_sep key".into()))?
            .parse::<f64>()
            .map_err(|e| TransformError::Config(format!("invalid modec_sep: {e}")))?;

        let modec_det_raw = section
            .get("modec_det")
            .ok_or_else(|| TransformError::Config("missing modec_det key".into()))?
            .parse::<i64>()
            .map_err(|e| TransformError::Config(format!("invalid modec_det: {e}")))?;

        Ok(Self {
            my_icao: my_icao.trim().to_uppercase(),
            my_tail: my_tail.trim().to_string(),
            modec_sep,
            modec_det: ModecSensitivity::from_value(modec_det_raw),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp_ini(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn loads_well_formed_config() {
        let f = write_temp_ini("[DEFAULT]\nmy_ICAO=ABCDEF,FLIGHTBOX\nmodec_sep=0.5\nmodec_det=1\n");
        let cfg = FlarmGeneratorConfig::load(f.path()).unwrap();
        assert_eq!(cfg.my_icao, "ABCDEF");
        assert_eq!(cfg.my_tail, "FLIGHTBOX");
        assert_eq!(cfg.modec_det, ModecSensitivity::UltraShort);
        assert_eq!(cfg.modec_det.cutoffs(), (-29.0, -30.0, -31.0));
    }

    #[test]
    fn defaults_to_long_range_band_for_unknown_modec_det() {
        let f = write_temp_ini("[DEFAULT]\nmy_ICAO=ABCDEF,TAIL\nmodec_sep=0.5\nmodec_det=9\n");
        let cfg = FlarmGeneratorConfig::load(f.path()).unwrap();
        assert_eq!(cfg.modec_det, ModecSensitivity::Long);
    }

    #[test]
    fn rejects_missing_section() {
        let f = write_temp_ini("my_ICAO=ABCDEF,TAIL\n");
        assert!(FlarmGeneratorConfig::load(f.path()).is_err());
    }

    #[test]
    fn rejects_malformed_my_icao() {
        let f = write_temp_ini("[DEFAULT]\nmy_ICAO=ABCDEF\nmodec_sep=0.5\nmodec_det=4\n");
        assert!(FlarmGeneratorConfig::load(f.path()).is_err());
    }
}
