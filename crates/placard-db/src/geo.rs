//! Spherical distance, registered on each connection as the SQL scalar
//! `distance_sphere(lat1, lng1, lat2, lng2)`.

use anyhow::Result;
use rusqlite::Connection;
use rusqlite::functions::FunctionFlags;

/// Mean earth radius in metres, as used by MySQL's `ST_Distance_Sphere`.
pub const EARTH_RADIUS_M: f64 = 6_370_986.0;

/// Great-circle distance in metres between two points given in degrees.
pub fn haversine_m(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
}

pub fn register(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "distance_sphere",
        4,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let lat1: f64 = ctx.get(0)?;
            let lng1: f64 = ctx.get(1)?;
            let lat2: f64 = ctx.get(2)?;
            let lng2: f64 = ctx.get(3)?;
            Ok(haversine_m(lat1, lng1, lat2, lng2))
        },
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_to_self() {
        assert_eq!(haversine_m(53.3498, -6.2603, 53.3498, -6.2603), 0.0);
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = haversine_m(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111_195.0).abs() < 50.0, "got {d}");
    }

    #[test]
    fn callable_from_sql() {
        let conn = Connection::open_in_memory().unwrap();
        register(&conn).unwrap();
        let d: f64 = conn
            .query_row("SELECT distance_sphere(0.0, 0.0, 0.0, 1.0)", [], |r| r.get(0))
            .unwrap();
        assert!((d - haversine_m(0.0, 0.0, 0.0, 1.0)).abs() < 1e-6);
    }
}
