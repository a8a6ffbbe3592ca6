//! Route handlers. Each game owns one module; all of them render HTML
//! fragments for HTMX to swap into that game's container.

pub mod avalon;
pub mod imposter;
pub mod oh_hell;
pub mod util;
