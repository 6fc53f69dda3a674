//! Web-mercator projection and anti-meridian helpers.

use std::f64::consts::PI;

/// Project WGS84 degrees onto the unit-square web-mercator plane.
///
/// x grows eastward, y grows southward; both land in [0, 1] for
/// coordinates inside [-180,180]x[-90,90].
pub fn project(lon: f64, lat: f64) -> (f64, f64) {
    let x = lon / 360.0 + 0.5;
    let sin = lat.to_radians().sin();
    let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / PI;
    (x, y.clamp(0.0, 1.0))
}

/// Inverse of [`project`].
pub fn unproject(x: f64, y: f64) -> (f64, f64) {
    let lon = (x - 0.5) * 360.0;
    let y2 = (180.0 - y * 360.0).to_radians();
    let lat = 360.0 * y2.exp().atan() / PI - 90.0;
    (lon, lat)
}

/// Unwrap a `[lon, lat]` polyline that crosses the anti-meridian so a
/// renderer draws one continuous line instead of a wrap-around jump.
///
/// Delta-based crossing test: a positive-to-negative longitude step
/// continues past +180 (add 360), a negative-to-positive step
/// continues past -180 (subtract 360).
pub fn correct_antimeridian(coordinates: &mut [[f64; 2]]) {
    for i in 1..coordinates.len() {
        let start = coordinates[i - 1][0];
        let end = coordinates[i][0];

        if start > 0.0 && end < 0.0 {
            coordinates[i][0] += 360.0;
        } else if start < 0.0 && end > 0.0 {
            coordinates[i][0] -= 360.0;
        }
    }
}
