//! Kymograph layout editor and dose-response simulation engine.
//!
//! The engine places overlay images on a base image, rotates a pivoted lever,
//! and traces its pen tip onto scrollable kymograph paper while a wash or
//! injection animates. It is host-agnostic: the host feeds pointer, key, and
//! frame events to [`engine::EngineCore`] and applies the returned
//! [`engine::Action`]s. Paper is rasterized in memory and persisted as PNG.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine state, input handling, and run side effects |
//! | [`scene`] | Images, drawable regions, z-order |
//! | [`surface`] | Growable per-region rasters with deferred drawing and snapshots |
//! | [`timeline`] | Wash/inject runs, easing, dose response |
//! | [`viewport`] | Display scale and screen/canonical conversions |
//! | [`geom`] | Points, rects, rotation math |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`hit`] | Hit-testing against images and regions |
//! | [`observations`] | Observation log and percent-response derivation |
//! | [`project`] | JSON project import/export |
//! | [`config`] | Simulator tuning from environment variables |
//! | [`color`] | Paper color parsing |
//! | [`consts`] | Shared layout constants (grid, margins, minimum sizes) |

pub mod color;
pub mod config;
pub mod consts;
pub mod engine;
pub mod geom;
pub mod hit;
pub mod input;
pub mod observations;
pub mod project;
pub mod scene;
pub mod surface;
pub mod timeline;
pub mod viewport;
