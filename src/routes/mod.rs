pub mod route_routes;
pub mod team_destination_routes;
