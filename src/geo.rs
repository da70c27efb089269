use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

/// A geographic position as (longitude, latitude) in degrees
pub type LonLat = (f64, f64);

/// Web Mercator latitude limit; keeps `mercator_y` finite
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Raw Mercator ordinate for a latitude in degrees (radians, north positive)
#[inline(always)]
pub fn mercator_y(lat: f64) -> f64 {
    let phi = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    (FRAC_PI_4 + phi / 2.0).tan().ln()
}

/// Inverse of [`mercator_y`], returning degrees
#[inline(always)]
pub fn inverse_mercator_y(y: f64) -> f64 {
    (2.0 * y.exp().atan() - FRAC_PI_2).to_degrees()
}

/// Even-odd point-in-ring test in lon/lat space
pub fn ring_contains(ring: &[LonLat], lon: f64, lat: f64) -> bool {
    let mut inside = false;
    let mut j = ring.len().wrapping_sub(1);
    for i in 0..ring.len() {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if (yi > lat) != (yj > lat) && lon < (xj - xi) * (lat - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}
