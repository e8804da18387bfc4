use serde::Serialize;

use crate::models::{Approver, Vehicle};

#[derive(Debug, Serialize)]
pub struct VehicleListResponse {
    pub vehicles: Vec<Vehicle>,
}

#[derive(Debug, Serialize)]
pub struct ApproverListResponse {
    pub approvers: Vec<Approver>,
}
