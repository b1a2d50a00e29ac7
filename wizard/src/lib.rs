//! Quote-authoring engine for the roof quoting workflow.
//!
//! This crate is the pure core of the product: it owns the six-stage wizard
//! state machine, the interactive dimension canvas with its pan/zoom
//! viewport, and the geometry that turns verified dimensions into areas. It
//! performs no I/O of its own; everything the backend does for a quote is
//! reached through the [`sync::QuoteSync`] trait, so hosts (the CLI, tests)
//! decide how requests actually travel.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`controller`] | Six-stage wizard state machine and the owned quote snapshot |
//! | [`canvas`] | Dimension canvas: overlay handles, edit surface, gestures |
//! | [`viewport`] | Pan/zoom viewport and screen/image coordinate conversions |
//! | [`geometry`] | Plan/real/waste area derivations and roof trigonometry |
//! | [`obstacles`] | Obstacle ledger keyed by kind |
//! | [`quote`] | Snapshot types and numeric-domain validation |
//! | [`sync`] | Backend collaborator trait and payload checks |
//! | [`consts`] | Shared numeric constants (zoom limits, dimension bounds, ...) |

pub mod canvas;
pub mod consts;
pub mod controller;
pub mod geometry;
pub mod obstacles;
pub mod quote;
pub mod sync;
pub mod viewport;
