// Domain layer - pure widget, layout and aggregation engine
pub mod aggregation;
pub mod dashboard;
pub mod dataset;
pub mod date_range;
pub mod error;
pub mod format;
pub mod layout;
pub mod palette;
pub mod record;
pub mod renderer;
pub mod settings;
pub mod summary;
pub mod widget;
