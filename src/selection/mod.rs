//! Selection, camera follow and label visibility.

pub mod controller;
pub mod label;

pub use controller::{CameraRig, CameraUpdate, FollowState, Selection, SelectionController};
pub use label::LabelFade;
