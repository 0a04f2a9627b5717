use serde::{Deserialize, Serialize};
use validator::Validate;

/// Mover un conjunto de destinations de equipo a una coordenada
#[derive(Debug, Deserialize, Validate)]
pub struct BulkMoveRequest {
    #[validate(length(min = 1))]
    pub ids: Vec<i64>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
}

/// Actualizar campos sueltos de un conjunto de destinations de equipo
#[derive(Debug, Deserialize, Validate)]
pub struct BulkUpdateRequest {
    #[validate(length(min = 1))]
    pub ids: Vec<i64>,
    #[validate(range(min = 1, max = 10000))]
    pub radius: Option<i32>,
    pub confirm_by_user: Option<bool>,
    pub hide_for_user: Option<bool>,
}

impl BulkUpdateRequest {
    /// Al menos un campo a actualizar debe venir en el request
    pub fn has_changes(&self) -> bool {
        self.radius.is_some() || self.confirm_by_user.is_some() || self.hide_for_user.is_some()
    }
}

/// Borrar un conjunto de destinations de equipo
#[derive(Debug, Deserialize, Validate)]
pub struct BulkDeleteRequest {
    #[validate(length(min = 1))]
    pub ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct BulkResponse {
    pub ok: bool,
    pub affected: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_id_set_fails_validation() {
        let request = BulkMoveRequest {
            ids: vec![],
            lat: 52.37,
            lng: 4.89,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn update_without_fields_has_no_changes() {
        let request = BulkUpdateRequest {
            ids: vec![1, 2],
            radius: None,
            confirm_by_user: None,
            hide_for_user: None,
        };
        assert!(request.validate().is_ok());
        assert!(!request.has_changes());
    }

    #[test]
    fn out_of_range_latitude_fails_validation() {
        let request = BulkMoveRequest {
            ids: vec![1],
            lat: 123.0,
            lng: 4.89,
        };
        assert!(request.validate().is_err());
    }
}
