//! egui rendering: side/top panels and the chart area.

pub mod panels;
pub mod plot;
