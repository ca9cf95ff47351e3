//! Orbital mechanics module
//!
//! Kepler solver, closed-form orbit functions and the shared simulation clock.

pub mod elements;
pub mod engine;
pub mod kepler;
pub mod time;

pub use elements::OrbitalElements;
pub use engine::{KeplerOrbit, OrbitSample};
pub use time::SimulationClock;
