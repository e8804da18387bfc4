#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use expense_service::claims::{ClaimFields, Submission, SubmissionContext, SubmissionError};
use expense_service::models::{
    Approver, CatalogEntry, ClaimType, CreateExpenseRequest, ExpenseRequest, ExpenseRequestSummary, MasterData,
    Recipient, SystemSettings, Vehicle, Zone,
};
use expense_service::services::{DuplicateKey, ExpenseDirectory};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

pub const RECIPIENT_CODE: &str = "10020030";
pub const TRANSPORT_NUMBER: &str = "60501234";

pub fn dec(value: &str) -> Decimal {
    value.parse().unwrap()
}

/// In-memory stand-in for the PostgreSQL directory.
///
/// Enforces the same uniqueness rule as the `expense_requests` index.
#[derive(Default)]
pub struct InMemoryDirectory {
    pub recipients: Mutex<Vec<Recipient>>,
    pub vehicles: Mutex<Vec<Vehicle>>,
    pub zones: Mutex<Vec<Zone>>,
    pub settings: Mutex<Option<SystemSettings>>,
    pub requests: Mutex<Vec<ExpenseRequest>>,
    pub approvers: Mutex<Vec<Approver>>,
    pub areas: Mutex<Vec<CatalogEntry>>,
    pub persist_delay: Mutex<Option<Duration>>,
    /// Makes the duplicate pre-check miss, as when two inserts race.
    pub hide_duplicates: AtomicBool,
    pub fail_persist: AtomicBool,
    pub recipient_lookups: AtomicUsize,
    pub duplicate_checks: AtomicUsize,
}

impl InMemoryDirectory {
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn lookups(&self) -> usize {
        self.recipient_lookups.load(Ordering::SeqCst)
    }

    fn key_of(request: &ExpenseRequest) -> (Uuid, &str, &str, &str) {
        (
            request.requester_id,
            request.transport_number.as_str(),
            request.claim_type.as_str(),
            request.motive.as_str(),
        )
    }
}

#[async_trait]
impl ExpenseDirectory for InMemoryDirectory {
    async fn resolve_recipient_by_code(
        &self,
        code: &str,
    ) -> Result<Option<Recipient>, SubmissionError> {
        self.recipient_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .recipients
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.code == code)
            .cloned())
    }

    async fn find_duplicate(&self, key: &DuplicateKey) -> Result<bool, SubmissionError> {
        self.duplicate_checks.fetch_add(1, Ordering::SeqCst);
        if self.hide_duplicates.load(Ordering::SeqCst) {
            return Ok(false);
        }
        let wanted = (
            key.requester_id,
            key.transport_number.as_str(),
            key.claim_type.as_str(),
            key.motive.as_str(),
        );
        Ok(self
            .requests
            .lock()
            .unwrap()
            .iter()
            .any(|r| Self::key_of(r) == wanted))
    }

    async fn persist_request(
        &self,
        input: CreateExpenseRequest,
    ) -> Result<ExpenseRequest, SubmissionError> {
        let delay = *self.persist_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_persist.load(Ordering::SeqCst) {
            return Err(SubmissionError::PersistenceFailure(
                "connection reset by peer".to_string(),
            ));
        }

        let request = ExpenseRequest {
            request_id: Uuid::new_v4(),
            requester_id: input.requester_id,
            vehicle_id: input.vehicle_id,
            approver_id: input.approver_id,
            recipient_id: input.recipient_id,
            transport_number: input.transport_number,
            invoice_date: input.invoice_date,
            zone: input.zone,
            channel: input.channel,
            claim_type: input.claim_type,
            motive: input.motive,
            false_freight_route: input.false_freight_route,
            declared_volume_m3: input.declared_volume_m3,
            contracted_rate_m3: input.contracted_rate_m3,
            total_amount: input.total_amount,
            justification: input.justification,
            attributable_area_id: input.attributable_area_id,
            status: "pending".to_string(),
            is_historical: false,
            created_utc: Utc::now(),
            updated_utc: None,
        };

        let mut requests = self.requests.lock().unwrap();
        if requests
            .iter()
            .any(|r| Self::key_of(r) == Self::key_of(&request))
        {
            return Err(SubmissionError::DuplicateRequest {
                transport_number: request.transport_number,
                claim_type: ClaimType::from_string(&request.claim_type).unwrap(),
                motive: request.motive,
            });
        }
        requests.push(request.clone());
        Ok(request)
    }

    async fn zone_config(&self) -> Result<Vec<Zone>, SubmissionError> {
        Ok(self.zones.lock().unwrap().clone())
    }

    async fn vehicle_config(&self, vehicle_id: Uuid) -> Result<Option<Vehicle>, SubmissionError> {
        Ok(self
            .vehicles
            .lock()
            .unwrap()
            .iter()
            .find(|v| v.vehicle_id == vehicle_id)
            .cloned())
    }

    async fn system_settings(&self) -> Result<Option<SystemSettings>, SubmissionError> {
        Ok(*self.settings.lock().unwrap())
    }

    async fn vehicles_for_carrier(&self, carrier_id: Uuid) -> Result<Vec<Vehicle>, SubmissionError> {
        Ok(self
            .vehicles
            .lock()
            .unwrap()
            .iter()
            .filter(|v| v.carrier_id == carrier_id)
            .cloned()
            .collect())
    }

    async fn master_data(&self) -> Result<MasterData, SubmissionError> {
        Ok(MasterData {
            zones: self.zones.lock().unwrap().clone(),
            ..Default::default()
        })
    }

    async fn approvers(&self) -> Result<Vec<Approver>, SubmissionError> {
        Ok(self.approvers.lock().unwrap().clone())
    }

    async fn is_approver(&self, profile_id: Uuid) -> Result<bool, SubmissionError> {
        Ok(self
            .approvers
            .lock()
            .unwrap()
            .iter()
            .any(|a| a.profile_id == profile_id))
    }

    async fn area_exists(&self, area_id: Uuid) -> Result<bool, SubmissionError> {
        Ok(self.areas.lock().unwrap().iter().any(|a| a.id == area_id))
    }

    async fn requests_for_requester(
        &self,
        requester_id: Uuid,
    ) -> Result<Vec<ExpenseRequestSummary>, SubmissionError> {
        let mut requests: Vec<_> = self
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.requester_id == requester_id)
            .map(|r| ExpenseRequestSummary {
                request_id: r.request_id,
                created_utc: r.created_utc,
                transport_number: r.transport_number.clone(),
                claim_type: r.claim_type.clone(),
                total_amount: r.total_amount,
                status: r.status.clone(),
                invoice_date: r.invoice_date,
                zone: r.zone.clone(),
                approver_name: Some("Unassigned".to_string()),
            })
            .collect();
        requests.sort_by(|a, b| b.created_utc.cmp(&a.created_utc));
        Ok(requests)
    }
}

/// A carrier with one 100 m3 truck, the Lima zone at 80% and one recipient.
pub struct Fixture {
    pub directory: Arc<InMemoryDirectory>,
    pub requester_id: Uuid,
    pub vehicle_id: Uuid,
    pub approver_id: Uuid,
    pub area_id: Uuid,
}

impl Fixture {
    pub fn new() -> Self {
        let directory = Arc::new(InMemoryDirectory::default());
        let requester_id = Uuid::new_v4();
        let vehicle_id = Uuid::new_v4();
        let approver_id = Uuid::new_v4();
        let area_id = Uuid::new_v4();

        directory.vehicles.lock().unwrap().push(Vehicle {
            vehicle_id,
            carrier_id: requester_id,
            plate: "ABC-123".to_string(),
            capacity_m3: dec("100"),
        });
        directory.zones.lock().unwrap().push(Zone {
            zone_id: Uuid::new_v4(),
            name: "Lima".to_string(),
            minimum_load_percentage: Some(dec("80")),
            active: true,
        });
        directory.recipients.lock().unwrap().push(Recipient {
            recipient_id: Uuid::new_v4(),
            code: RECIPIENT_CODE.to_string(),
            name: "Bodega San Martin".to_string(),
            channel: Some("Mayorista".to_string()),
            sales_office: Some("Lima Norte".to_string()),
        });
        directory.approvers.lock().unwrap().push(Approver {
            profile_id: approver_id,
            full_name: "Rosa Quispe".to_string(),
            role: "approver".to_string(),
        });
        directory.areas.lock().unwrap().push(CatalogEntry {
            id: area_id,
            name: "Operaciones".to_string(),
        });

        Self {
            directory,
            requester_id,
            vehicle_id,
            approver_id,
            area_id,
        }
    }

    /// Registers a vehicle that belongs to some other carrier.
    pub fn add_foreign_vehicle(&self, capacity_m3: &str) -> Uuid {
        let vehicle_id = Uuid::new_v4();
        self.directory.vehicles.lock().unwrap().push(Vehicle {
            vehicle_id,
            carrier_id: Uuid::new_v4(),
            plate: "XYZ-987".to_string(),
            capacity_m3: dec(capacity_m3),
        });
        vehicle_id
    }

    pub fn context(&self) -> SubmissionContext {
        SubmissionContext {
            requester_id: self.requester_id,
            recipient_code: RECIPIENT_CODE.to_string(),
            approver_id: self.approver_id,
            invoice_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            channel: None,
            attributable_area_id: self.area_id,
        }
    }

    /// 70 m3 loaded on a 100 m3 truck at 10 per m3: 100.00 payable.
    pub fn under_minimum_fields(&self) -> ClaimFields {
        ClaimFields {
            claim_type: Some(ClaimType::UnderMinimumLoad),
            transport_number: TRANSPORT_NUMBER.to_string(),
            vehicle_id: Some(self.vehicle_id),
            zone: Some("Lima".to_string()),
            declared_volume_m3: Some(dec("70")),
            contracted_rate_m3: Some(dec("10")),
            low_load_motive: Some("Sin stock".to_string()),
            ..Default::default()
        }
    }

    pub fn last_point_fields(&self, justification: &str) -> ClaimFields {
        ClaimFields {
            claim_type: Some(ClaimType::LastPoint),
            transport_number: TRANSPORT_NUMBER.to_string(),
            vehicle_id: Some(self.vehicle_id),
            zone: Some("Lima".to_string()),
            justification: Some(justification.to_string()),
            amount: Some(dec("80")),
            ..Default::default()
        }
    }

    pub fn submission(&self, fields: ClaimFields) -> Submission {
        Submission {
            context: self.context(),
            fields,
        }
    }
}
