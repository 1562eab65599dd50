// survey.rs — End-to-end survey state
//
// Ties the pipeline together: fuse raw telemetry once, then keep the derived
// products (trajectory fit, field origin, dipole loops) consistent as the
// footprint set changes. Derived products are always recomputed from the
// trace, never edited in place.

use crate::dipole::{line_through_point, static_field_loops, DipoleConfig, FieldLine};
use crate::fusion::fuse_streams;
use crate::spatial::{resolve_field_origin, BuildingFootprint, FieldOrigin};
use crate::trajectory::fit_trajectory;
use crate::types::{FusedSample, GeoPoint, LocationSample, MagnetometerSample, PointFeature};

/// One survey run: the georeferenced trace plus everything derived from it.
#[derive(Clone, Debug)]
pub struct FieldSurvey {
    trace: Vec<FusedSample>,
    trajectory: Vec<GeoPoint>,
    footprints: Vec<BuildingFootprint>,
    origin: Option<FieldOrigin>,
    static_loops: Vec<Vec<GeoPoint>>,
    config: DipoleConfig,
}

impl FieldSurvey {
    /// Fuse the raw streams and derive the field model with default dipole
    /// parameters. Starts with no footprints; the origin falls back to the
    /// strongest sample until [`set_footprints`](Self::set_footprints) runs.
    pub fn new(locations: Vec<LocationSample>, readings: Vec<MagnetometerSample>) -> Self {
        Self::with_config(locations, readings, DipoleConfig::default())
    }

    pub fn with_config(
        locations: Vec<LocationSample>,
        readings: Vec<MagnetometerSample>,
        config: DipoleConfig,
    ) -> Self {
        let trace = fuse_streams(locations, readings);
        let positions: Vec<GeoPoint> = trace.iter().map(FusedSample::position).collect();
        let trajectory = fit_trajectory(&positions);

        let mut survey = FieldSurvey {
            trace,
            trajectory,
            footprints: Vec::new(),
            origin: None,
            static_loops: Vec::new(),
            config,
        };
        survey.recompute_field();
        survey
    }

    /// Replace the footprint set and re-derive origin and static loops.
    pub fn set_footprints(&mut self, footprints: Vec<BuildingFootprint>) {
        self.footprints = footprints;
        self.recompute_field();
    }

    fn recompute_field(&mut self) {
        self.origin = resolve_field_origin(&self.trace, &self.footprints);
        self.static_loops = match &self.origin {
            Some(origin) => static_field_loops(origin.point, &self.config),
            None => Vec::new(),
        };
        if let Some(origin) = &self.origin {
            log::debug!(
                "field origin: {} at ({:.6}, {:.6})",
                origin.source,
                origin.point.lat,
                origin.point.lon
            );
        }
    }

    /// The dipole field line through one fused sample. `NoLine` when the
    /// survey has no origin or the sample sits on the dipole axis.
    pub fn line_through(&self, sample: &FusedSample) -> FieldLine {
        match &self.origin {
            Some(origin) => line_through_point(origin.point, sample.position(), &self.config),
            None => FieldLine::NoLine,
        }
    }

    pub fn trace(&self) -> &[FusedSample] {
        &self.trace
    }

    pub fn trajectory(&self) -> &[GeoPoint] {
        &self.trajectory
    }

    pub fn footprints(&self) -> &[BuildingFootprint] {
        &self.footprints
    }

    pub fn origin(&self) -> Option<&FieldOrigin> {
        self.origin.as_ref()
    }

    pub fn static_loops(&self) -> &[Vec<GeoPoint>] {
        &self.static_loops
    }

    pub fn config(&self) -> &DipoleConfig {
        &self.config
    }

    /// GeoJSON-shaped records for every fused sample, in trace order.
    pub fn features(&self) -> Vec<PointFeature> {
        self.trace.iter().map(FusedSample::to_feature).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::OriginSource;
    use approx::assert_relative_eq;

    fn fix(k: i64) -> LocationSample {
        LocationSample {
            time: k * 1_000_000_000,
            latitude: 32.2 + k as f64 * 1e-4,
            longitude: -110.9 + k as f64 * 1e-4,
            altitude: 700.0,
            speed: 1.0,
            bearing: 45.0,
        }
    }

    fn reading(j: i64, z: f64) -> MagnetometerSample {
        MagnetometerSample { time: j * 100_000_000, x: 20.0, y: 0.0, z }
    }

    /// Five 1 Hz fixes walking northeast, forty 10 Hz readings with a single
    /// strong sample at index 20 (which lands exactly on the third fix).
    fn survey_fixture() -> FieldSurvey {
        let locations = (0..5).map(fix).collect();
        let readings =
            (0..40).map(|j| reading(j, if j == 20 { 80.0 } else { 30.0 })).collect();
        FieldSurvey::new(locations, readings)
    }

    #[test]
    fn test_survey_derives_all_products() {
        let survey = survey_fixture();

        assert_eq!(survey.trace().len(), 40);
        assert_eq!(survey.trajectory().len(), 40);
        assert_eq!(survey.static_loops().len(), 12);
        assert_eq!(survey.features().len(), 40);

        let origin = survey.origin().unwrap();
        assert_eq!(origin.source, OriginSource::PeakSample);
        assert_relative_eq!(origin.point.lat, 32.2002, epsilon = 1e-9);
        assert_relative_eq!(origin.point.lon, -110.8998, epsilon = 1e-9);
    }

    #[test]
    fn test_line_through_peak_degenerates() {
        let survey = survey_fixture();

        // The origin is the peak sample itself, so its line collapses onto
        // the dipole axis.
        assert_eq!(survey.line_through(&survey.trace()[20]), FieldLine::NoLine);

        // A sample east of the origin gets a full line.
        let line = survey.line_through(&survey.trace()[25]);
        assert_eq!(line.points().len(), 51);
    }

    #[test]
    fn test_footprints_reanchor_the_origin() {
        let mut survey = survey_fixture();
        assert_eq!(survey.origin().unwrap().source, OriginSource::PeakSample);

        // A square straddling the track around the peak sample.
        let square = BuildingFootprint::from_latlon(
            7,
            &[
                (32.2001, -110.8999),
                (32.2001, -110.8997),
                (32.2003, -110.8997),
                (32.2003, -110.8999),
            ],
        );
        survey.set_footprints(vec![square]);

        let origin = survey.origin().unwrap();
        assert_eq!(origin.source, OriginSource::TrackIntersection { building_id: 7 });
        assert_relative_eq!(origin.point.lat, 32.2002, epsilon = 1e-9);
        assert_relative_eq!(origin.point.lon, -110.8998, epsilon = 1e-9);
        assert_eq!(survey.static_loops().len(), 12);

        // Clearing the footprints falls back to the raw peak.
        survey.set_footprints(Vec::new());
        assert_eq!(survey.origin().unwrap().source, OriginSource::PeakSample);
    }

    #[test]
    fn test_feature_records_keep_their_shape() {
        let survey = survey_fixture();
        let value = serde_json::to_value(&survey.features()[0]).unwrap();

        assert_eq!(value["type"], "Feature");
        assert_eq!(value["geometry"]["type"], "Point");

        let coordinates = value["geometry"]["coordinates"].as_array().unwrap();
        assert_eq!(coordinates.len(), 3);
        assert_relative_eq!(coordinates[0].as_f64().unwrap(), -110.9, epsilon = 1e-12);
        assert_relative_eq!(coordinates[1].as_f64().unwrap(), 32.2, epsilon = 1e-12);
        assert_relative_eq!(coordinates[2].as_f64().unwrap(), 700.0, epsilon = 1e-12);

        assert_eq!(value["properties"]["time"], 0);
        let magnitude = value["properties"]["magnitude"].as_f64().unwrap();
        assert_relative_eq!(magnitude, 1300.0_f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_empty_survey_degrades_quietly() {
        let survey = FieldSurvey::new(Vec::new(), Vec::new());

        assert!(survey.trace().is_empty());
        assert!(survey.trajectory().is_empty());
        assert!(survey.origin().is_none());
        assert!(survey.static_loops().is_empty());
        assert!(survey.features().is_empty());

        let stray = FusedSample::new(0, 32.2, -110.9, 700.0, 1.0, 2.0, 3.0);
        assert_eq!(survey.line_through(&stray), FieldLine::NoLine);
    }
}
