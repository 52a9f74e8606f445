//! featurewiz library crate
//!
//! A guided wizard that turns a problem statement into data elements, a
//! hypothesis, marketing material and a feature name, with suggestions from
//! an ML API and progress stored in Firestore.

pub mod app;
pub mod config;
pub mod keyring;
pub mod logging;
pub mod onboarding;
pub mod selection;
pub mod session;
pub mod suggest;
pub mod ui;
pub mod util;
pub mod waitlist;
pub mod wizard;
