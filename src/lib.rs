// Widget dashboard engine - widget model, grid layout and per-widget aggregation
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
