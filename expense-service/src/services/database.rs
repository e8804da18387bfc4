//! Database service for expense-service.

use async_trait::async_trait;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::claims::SubmissionError;
use crate::models::{
    Approver, CatalogEntry, ClaimType, CreateExpenseRequest, ExpenseRequest,
    ExpenseRequestSummary, MasterData, MasterOption, Recipient, SystemSettings, Vehicle, Zone,
};
use crate::services::directory::{DuplicateKey, ExpenseDirectory};
use crate::services::metrics::DB_QUERY_DURATION;

/// Roles allowed to approve expense requests.
pub const APPROVER_ROLES: [&str; 3] = ["admin", "approver", "developer"];

const EXPENSE_REQUEST_COLUMNS: &str = "request_id, requester_id, vehicle_id, approver_id, \
    recipient_id, transport_number, invoice_date, zone, channel, claim_type, motive, \
    false_freight_route, declared_volume_m3, contracted_rate_m3, total_amount, justification, \
    attributable_area_id, status, is_historical, created_utc, updated_utc";

fn lookup_failed(operation: &'static str) -> impl Fn(sqlx::Error) -> SubmissionError {
    move |e| SubmissionError::Lookup(format!("Failed to {}: {}", operation, e))
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "expense-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    async fn catalog(&self, table: &'static str) -> Result<Vec<CatalogEntry>, SubmissionError> {
        let query = format!(
            "SELECT id, name FROM {} WHERE active = TRUE ORDER BY name",
            table
        );
        sqlx::query_as::<_, CatalogEntry>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(lookup_failed("load catalog"))
    }

    async fn active_zones(&self) -> Result<Vec<Zone>, SubmissionError> {
        sqlx::query_as::<_, Zone>(
            r#"
            SELECT zone_id, name, minimum_load_percentage, active
            FROM zones
            WHERE active = TRUE
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(lookup_failed("load zones"))
    }
}

#[async_trait]
impl ExpenseDirectory for Database {
    #[instrument(skip(self))]
    async fn resolve_recipient_by_code(
        &self,
        code: &str,
    ) -> Result<Option<Recipient>, SubmissionError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["resolve_recipient_by_code"])
            .start_timer();

        let recipient = sqlx::query_as::<_, Recipient>(
            r#"
            SELECT recipient_id, code, name, channel, sales_office
            FROM recipients
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(lookup_failed("resolve recipient"))?;

        timer.observe_duration();

        Ok(recipient)
    }

    #[instrument(skip(self, key), fields(requester_id = %key.requester_id, transport_number = %key.transport_number))]
    async fn find_duplicate(&self, key: &DuplicateKey) -> Result<bool, SubmissionError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_duplicate"])
            .start_timer();

        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM expense_requests
                WHERE requester_id = $1
                  AND transport_number = $2
                  AND claim_type = $3
                  AND motive = $4
            )
            "#,
        )
        .bind(key.requester_id)
        .bind(&key.transport_number)
        .bind(key.claim_type.as_str())
        .bind(&key.motive)
        .fetch_one(&self.pool)
        .await
        .map_err(lookup_failed("check for duplicates"))?;

        timer.observe_duration();

        Ok(exists)
    }

    #[instrument(skip(self, input), fields(requester_id = %input.requester_id, claim_type = %input.claim_type))]
    async fn persist_request(
        &self,
        input: CreateExpenseRequest,
    ) -> Result<ExpenseRequest, SubmissionError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["persist_request"])
            .start_timer();

        let request_id = Uuid::new_v4();
        let query = format!(
            r#"
            INSERT INTO expense_requests (
                request_id, requester_id, vehicle_id, approver_id, recipient_id,
                transport_number, invoice_date, zone, channel, claim_type, motive,
                false_freight_route, declared_volume_m3, contracted_rate_m3, total_amount,
                justification, attributable_area_id, status, is_historical
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, 'pending', FALSE)
            RETURNING {}
            "#,
            EXPENSE_REQUEST_COLUMNS
        );

        let request = sqlx::query_as::<_, ExpenseRequest>(&query)
            .bind(request_id)
            .bind(input.requester_id)
            .bind(input.vehicle_id)
            .bind(input.approver_id)
            .bind(input.recipient_id)
            .bind(&input.transport_number)
            .bind(input.invoice_date)
            .bind(&input.zone)
            .bind(&input.channel)
            .bind(&input.claim_type)
            .bind(&input.motive)
            .bind(&input.false_freight_route)
            .bind(input.declared_volume_m3)
            .bind(input.contracted_rate_m3)
            .bind(input.total_amount)
            .bind(&input.justification)
            .bind(input.attributable_area_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                    match ClaimType::from_string(&input.claim_type) {
                        Some(claim_type) => SubmissionError::DuplicateRequest {
                            transport_number: input.transport_number.clone(),
                            claim_type,
                            motive: input.motive.clone(),
                        },
                        None => SubmissionError::PersistenceFailure(e.to_string()),
                    }
                }
                _ => SubmissionError::PersistenceFailure(e.to_string()),
            })?;

        timer.observe_duration();

        info!(request_id = %request.request_id, "Expense request inserted");

        Ok(request)
    }

    #[instrument(skip(self))]
    async fn zone_config(&self) -> Result<Vec<Zone>, SubmissionError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["zone_config"])
            .start_timer();
        let zones = self.active_zones().await?;
        timer.observe_duration();
        Ok(zones)
    }

    #[instrument(skip(self))]
    async fn vehicle_config(&self, vehicle_id: Uuid) -> Result<Option<Vehicle>, SubmissionError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["vehicle_config"])
            .start_timer();

        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT vehicle_id, carrier_id, plate, capacity_m3
            FROM vehicles
            WHERE vehicle_id = $1
            "#,
        )
        .bind(vehicle_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(lookup_failed("load vehicle"))?;

        timer.observe_duration();

        Ok(vehicle)
    }

    #[instrument(skip(self))]
    async fn system_settings(&self) -> Result<Option<SystemSettings>, SubmissionError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["system_settings"])
            .start_timer();

        let length: Option<i32> = sqlx::query_scalar(
            "SELECT transport_number_length FROM system_settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(lookup_failed("load system settings"))?;

        timer.observe_duration();

        Ok(length
            .and_then(|len| usize::try_from(len).ok())
            .filter(|len| *len > 0)
            .map(|transport_number_length| SystemSettings {
                transport_number_length,
            }))
    }

    #[instrument(skip(self))]
    async fn vehicles_for_carrier(&self, carrier_id: Uuid) -> Result<Vec<Vehicle>, SubmissionError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["vehicles_for_carrier"])
            .start_timer();

        let vehicles = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT vehicle_id, carrier_id, plate, capacity_m3
            FROM vehicles
            WHERE carrier_id = $1
            ORDER BY plate
            "#,
        )
        .bind(carrier_id)
        .fetch_all(&self.pool)
        .await
        .map_err(lookup_failed("load vehicles"))?;

        timer.observe_duration();

        Ok(vehicles)
    }

    #[instrument(skip(self))]
    async fn master_data(&self) -> Result<MasterData, SubmissionError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["master_data"])
            .start_timer();

        let options = async {
            sqlx::query_as::<_, MasterOption>(
                r#"
                SELECT option_id, category, value, label, sort_order
                FROM master_options
                WHERE active = TRUE
                ORDER BY sort_order, label
                "#,
            )
            .fetch_all(&self.pool)
            .await
            .map_err(lookup_failed("load master options"))
        };

        let (zones, channels, areas, motives, options) = tokio::try_join!(
            self.active_zones(),
            self.catalog("channels"),
            self.catalog("areas"),
            self.catalog("motives"),
            options,
        )?;

        timer.observe_duration();

        Ok(MasterData {
            zones,
            channels,
            areas,
            motives,
            ..Default::default()
        }
        .with_options(options))
    }

    #[instrument(skip(self))]
    async fn approvers(&self) -> Result<Vec<Approver>, SubmissionError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["approvers"])
            .start_timer();

        let approvers = sqlx::query_as::<_, Approver>(
            r#"
            SELECT profile_id, full_name, role
            FROM profiles
            WHERE role = ANY($1)
            ORDER BY full_name
            "#,
        )
        .bind(&APPROVER_ROLES[..])
        .fetch_all(&self.pool)
        .await
        .map_err(lookup_failed("load approvers"))?;

        timer.observe_duration();

        Ok(approvers)
    }

    #[instrument(skip(self))]
    async fn is_approver(&self, profile_id: Uuid) -> Result<bool, SubmissionError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["is_approver"])
            .start_timer();

        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM profiles
                WHERE profile_id = $1 AND role = ANY($2)
            )
            "#,
        )
        .bind(profile_id)
        .bind(&APPROVER_ROLES[..])
        .fetch_one(&self.pool)
        .await
        .map_err(lookup_failed("check approver"))?;

        timer.observe_duration();

        Ok(exists)
    }

    #[instrument(skip(self))]
    async fn area_exists(&self, area_id: Uuid) -> Result<bool, SubmissionError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["area_exists"])
            .start_timer();

        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM areas WHERE id = $1 AND active = TRUE)",
        )
        .bind(area_id)
        .fetch_one(&self.pool)
        .await
        .map_err(lookup_failed("check attributable area"))?;

        timer.observe_duration();

        Ok(exists)
    }

    #[instrument(skip(self))]
    async fn requests_for_requester(
        &self,
        requester_id: Uuid,
    ) -> Result<Vec<ExpenseRequestSummary>, SubmissionError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["requests_for_requester"])
            .start_timer();

        let requests = sqlx::query_as::<_, ExpenseRequestSummary>(
            r#"
            SELECT r.request_id, r.created_utc, r.transport_number, r.claim_type,
                   r.total_amount, r.status, r.invoice_date, r.zone,
                   COALESCE(p.full_name, 'Unassigned') AS approver_name
            FROM expense_requests r
            LEFT JOIN profiles p ON p.profile_id = r.approver_id
            WHERE r.requester_id = $1
            ORDER BY r.created_utc DESC
            "#,
        )
        .bind(requester_id)
        .fetch_all(&self.pool)
        .await
        .map_err(lookup_failed("load requests"))?;

        timer.observe_duration();

        Ok(requests)
    }
}
