pub mod distance_service;
pub mod distribution_service;
pub mod media_service;
pub mod progression_service;
