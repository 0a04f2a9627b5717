pub mod distribution_dto;
pub mod route_dto;
pub mod team_destination_dto;
