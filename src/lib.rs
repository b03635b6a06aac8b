//! E-commerce Analytics Dashboard
//!
//! Loads cleaned transaction exports, filters them by country, category and
//! period, and derives revenue KPIs and breakdowns for the dashboard window,
//! the headless CLI and the PowerPoint report.

pub mod charts;
pub mod cli;
pub mod config;
pub mod data;
pub mod gui;
pub mod pipeline;
pub mod report;

#[cfg(test)]
mod testing;
