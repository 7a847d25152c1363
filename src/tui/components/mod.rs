// Components module - reusable dashboard building blocks
//
// - Charts panel: trend, gauge and bar charts from the chart models
// - Logs panel: captured log entries
// - Toast: notification overlay

pub mod charts_panel;
pub mod logs_panel;
pub mod toast;
