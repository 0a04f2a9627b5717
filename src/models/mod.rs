//! Modelos del sistema
//!
//! Este módulo contiene todos los modelos de datos que mapean exactamente
//! al schema PostgreSQL (migrations/0001_init.sql).

pub mod destination;
pub mod media_file;
pub mod route;
pub mod team;
pub mod team_route_part;

pub use destination::{Destination, DESTINATION_TYPE_CHOICE, DESTINATION_TYPE_MANDATORY};
pub use media_file::MediaFile;
pub use route::{Route, RoutePart, ROUTE_TYPE_COORDINATE};
pub use team::Team;
pub use team_route_part::TeamRoutePart;
