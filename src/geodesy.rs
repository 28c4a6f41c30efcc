//! Great-circle geodesy: bearings, distance, and the N/E decomposition the
//! FLARM generator needs to turn a lat/lon pair into PFLAA's relative-north
//! and relative-east fields.

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two WGS-84 points, in meters.
///
/// Haversine rather than a full geodesic solver — within 0.5% at
/// FLARM-relevant ranges, and cheap enough to run once per aircraft every
/// sweep.
pub fn distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Initial (forward) great-circle bearing from (lat1, lon1) to (lat2, lon2),
/// in degrees, normalized to [0, 360).
pub fn initial_bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let y = delta_lon.sin() * lat2_rad.cos();
    let x = lat1_rad.cos() * lat2_rad.sin() - lat1_rad.sin() * lat2_rad.cos() * delta_lon.cos();

    let bearing = y.atan2(x).to_degrees();
    (bearing + 360.0) % 360.0
}

/// Forward bearing from the target back to the observer, i.e. the initial
/// bearing computed with the two points swapped.
pub fn final_bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    initial_bearing(lat2, lon2, lat1, lon1)
}

/// Decomposes a geodesic distance/bearing pair into north/east offsets, in
/// meters, for PFLAA's `RelativeNorth`/`RelativeEast` fields.
pub fn distance_north(bearing_deg: f64, distance_m: f64) -> f64 {
    distance_m * bearing_deg.to_radians().cos()
}

pub fn distance_east(bearing_deg: f64, distance_m: f64) -> f64 {
    distance_m * bearing_deg.to_radians().sin()
}

/// Smallest signed angle from `own_course` to `target_bearing`, in
/// [-180, 180] degrees.
pub fn relative_bearing(target_bearing: f64, own_course: f64) -> f64 {
    let mut delta = (target_bearing - own_course) % 360.0;
    if delta > 180.0 {
        delta -= 360.0;
    } else if delta < -180.0 {
        delta += 360.0;
    }
    delta
}

/// Reconstructs an absolute coordinate from a relative-to-station OGN FLARM
/// coordinate on a single axis.
///
/// The same plain-addition formula applies to both latitude and longitude,
/// with no cosine-latitude correction on the longitude axis.
pub fn reconstruct_relative(own_axis: f64, relative_axis: f64) -> f64 {
    own_axis + relative_axis
}
