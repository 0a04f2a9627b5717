pub mod destination_repository;
pub mod location_log_repository;
pub mod route_repository;
pub mod team_repository;
pub mod team_route_part_repository;
