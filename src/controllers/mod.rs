pub mod distribution_controller;
pub mod route_controller;
pub mod team_destination_controller;
