//! Dipole geomagnetic latitude and the NOAA visibility threshold table

/// Geomagnetic north pole used by the dipole approximation (degrees)
pub const GEOMAGNETIC_POLE_LAT: f64 = 80.65;
pub const GEOMAGNETIC_POLE_LON: f64 = -72.68;

/// (minimum |magnetic latitude|, Kp threshold), descending bands
const KP_THRESHOLD_TABLE: [(f64, u8); 8] = [
    (65.0, 0),
    (60.0, 1),
    (55.0, 3),
    (50.0, 4),
    (45.0, 5),
    (40.0, 6),
    (35.0, 7),
    (28.0, 8),
];

/// Geographic to geomagnetic latitude, tilted dipole.
///
/// `asin(sin φp·sin φ + cos φp·cos φ·cos(λ − λp))`, in degrees. The sine is
/// clamped to [-1, 1] so rounding at the poles never yields NaN.
pub fn geo_to_mag_lat(lat: f64, lon: f64) -> f64 {
    let phi = lat.to_radians();
    let lambda = lon.to_radians();
    let phi_p = GEOMAGNETIC_POLE_LAT.to_radians();
    let lambda_p = GEOMAGNETIC_POLE_LON.to_radians();

    let sin_mag = phi_p.sin() * phi.sin() + phi_p.cos() * phi.cos() * (lambda - lambda_p).cos();
    sin_mag.clamp(-1.0, 1.0).asin().to_degrees()
}

/// Minimum Kp at which the auroral oval reaches this magnetic latitude.
/// Hemisphere-symmetric; first matching band wins, 9 below 28°.
pub fn kp_threshold_for_mag_lat(mag_lat: f64) -> u8 {
    let abs_lat = mag_lat.abs();
    KP_THRESHOLD_TABLE
        .iter()
        .find(|(min_lat, _)| abs_lat >= *min_lat)
        .map_or(9, |&(_, kp)| kp)
}
