// lib.rs — Georeferenced magnetic survey pipeline
//
// Fuses location fixes with magnetometer readings into a time-ordered
// georeferenced trace, fits a straight-line trajectory through it, anchors a
// synthetic dipole to the built environment, and renders its field lines.

pub mod dipole;
pub mod fusion;
pub mod geometry;
pub mod spatial;
pub mod survey;
pub mod trajectory;
pub mod types;

pub use survey::FieldSurvey;
pub use types::{FusedSample, GeoPoint, LocationSample, MagnetometerSample};
