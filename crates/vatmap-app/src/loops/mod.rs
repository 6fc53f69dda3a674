//! Polling loops.
//!
//! Each feed gets its own loop on its own cadence. A failed poll is
//! logged and the last-known-good state stays on screen; only an
//! explicitly empty entity payload raises the "no data" flag.

mod detail_loop;
mod entity_loop;
mod fir_loop;
mod weather_loop;

pub use detail_loop::run_detail_loop;
pub use entity_loop::run_entity_loop;
pub use fir_loop::run_fir_loop;
pub use weather_loop::run_weather_loop;
