//! Pure geodesy routines: Bouguer correction and haversine distance.

/// Crustal density used by the Bouguer correction, kg/m³.
pub const RHO: f64 = 2670.0;

/// Mean Earth radius used by the haversine formula, km.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Free-air gradient, mGal per metre of elevation.
const FREE_AIR_GRADIENT: f64 = 0.3086;

/// Bouguer slab coefficient, mGal per metre per (g/cm³).
const BOUGUER_COEFFICIENT: f64 = 0.0419;

/// Bouguer anomaly for an observed gravity value at a given elevation.
///
/// `bouguer = gravity − 0.3086·elevation + 0.0419·(ρ/1000)·elevation`
/// with ρ fixed at 2670 kg/m³. Inputs in mGal and metres.
#[must_use]
pub fn bouguer_anomaly(gravity: f64, elevation: f64) -> f64 {
    gravity - FREE_AIR_GRADIENT * elevation + BOUGUER_COEFFICIENT * (RHO / 1000.0) * elevation
}

/// Great-circle distance in km between two latitude/longitude points.
#[must_use]
pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1 = lat1.to_radians();
    let lon1 = lon1.to_radians();
    let lat2 = lat2.to_radians();
    let lon2 = lon2.to_radians();

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    EARTH_RADIUS_KM * 2.0 * a.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bouguer_reference_value() {
        // 980000 − 0.3086·100 + 0.0419·2.67·100 = 980000 − 30.86 + 11.1873
        let expected = 980_000.0 - 30.86 + 0.0419 * 2.67 * 100.0;
        let got = bouguer_anomaly(980_000.0, 100.0);
        assert!((got - expected).abs() < 1e-6, "got {got}");
    }

    #[test]
    fn bouguer_is_identity_at_sea_level() {
        let got = bouguer_anomaly(979_500.0, 0.0);
        assert!((got - 979_500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn haversine_one_degree_of_longitude_at_equator() {
        let d = haversine(0.0, 0.0, 0.0, 1.0);
        assert!((d - 111.19).abs() < 0.1, "got {d}");
    }

    #[test]
    fn haversine_zero_distance() {
        let d = haversine(45.0, 7.0, 45.0, 7.0);
        assert!(d.abs() < 1e-9);
    }

    #[test]
    fn haversine_is_symmetric() {
        let a = haversine(10.0, 20.0, 30.0, 40.0);
        let b = haversine(30.0, 40.0, 10.0, 20.0);
        assert!((a - b).abs() < 1e-9);
    }
}
