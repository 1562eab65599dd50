use geo::Coord;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// A single geolocation fix. `time` is in nanoseconds.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LocationSample {
    pub time: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub speed: f64,
    pub bearing: f64,
}

/// A raw 3-axis magnetometer reading in microtesla. `time` is in nanoseconds.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MagnetometerSample {
    pub time: i64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A latitude/longitude pair in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// One magnetometer reading georeferenced onto the location track.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FusedSample {
    pub time: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub mag_x: f64,
    pub mag_y: f64,
    pub mag_z: f64,
    pub magnitude: f64,
}

/// GeoJSON-shaped record for one fused sample. The field names are a stable
/// contract with downstream consumers; encoding to disk stays with them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointFeature {
    #[serde(rename = "type")]
    pub feature_type: String,
    pub geometry: FeatureGeometry,
    pub properties: FeatureProperties,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureGeometry {
    #[serde(rename = "type")]
    pub geometry_type: String,
    /// `[lon, lat, alt]`
    pub coordinates: [f64; 3],
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureProperties {
    pub time: i64,
    pub mag_x: f64,
    pub mag_y: f64,
    pub mag_z: f64,
    pub magnitude: f64,
}

impl LocationSample {
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.altitude.is_finite()
            && self.speed.is_finite()
            && self.bearing.is_finite()
    }
}

impl MagnetometerSample {
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        GeoPoint { lat, lon }
    }

    /// geo convention: x = lon, y = lat
    pub fn coord(self) -> Coord<f64> {
        Coord { x: self.lon, y: self.lat }
    }
}

impl FusedSample {
    /// Build a fused sample, deriving the total field strength from the
    /// three magnetometer axes.
    pub fn new(
        time: i64,
        latitude: f64,
        longitude: f64,
        altitude: f64,
        mag_x: f64,
        mag_y: f64,
        mag_z: f64,
    ) -> Self {
        let magnitude = Vector3::new(mag_x, mag_y, mag_z).norm();
        FusedSample { time, latitude, longitude, altitude, mag_x, mag_y, mag_z, magnitude }
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint { lat: self.latitude, lon: self.longitude }
    }

    pub fn to_feature(&self) -> PointFeature {
        PointFeature {
            feature_type: "Feature".to_string(),
            geometry: FeatureGeometry {
                geometry_type: "Point".to_string(),
                coordinates: [self.longitude, self.latitude, self.altitude],
            },
            properties: FeatureProperties {
                time: self.time,
                mag_x: self.mag_x,
                mag_y: self.mag_y,
                mag_z: self.mag_z,
                magnitude: self.magnitude,
            },
        }
    }
}
