// Application layer - use cases and the ports they depend on
pub mod clock;
pub mod dashboard_repository;
pub mod dashboard_service;
pub mod dataset_repository;
pub mod dataset_service;
