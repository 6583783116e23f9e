//! Database service for settlement-service.

use crate::domain::{self, InventoryLine, InventoryWarning};
use crate::models::{
    Clearance, ClearanceItem, ClearanceStatus, CreateClearance, ListClearancesFilter,
    PlatformSettings, UpdatePlatformSettings,
};
use crate::services::metrics::{
    CLEARANCES_TOTAL, DB_QUERY_DURATION, ERRORS_TOTAL, INVENTORY_WARNINGS_TOTAL,
    SETTLEMENTS_TOTAL, SETTLEMENT_AMOUNT_TOTAL,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{info, instrument, warn};
use uuid::Uuid;

const CLEARANCE_COLUMNS: &str = "clearance_id, rental_id, store_name, brand_name, status, \
    total_sales, total_sales_with_tax, platform_commission_rate, store_commission_rate, \
    platform_commission_amount, store_commission_amount, store_payout_amount, \
    return_inventory_value, brand_total_amount, created_utc, settled_utc, approved_utc";

const CLEARANCE_ITEM_COLUMNS: &str = "item_id, clearance_id, product_id, product_name, \
    localized_name, initial_quantity, sold_quantity, remaining_quantity, unit_price, \
    total_sales_value, total_sales_with_tax, sort_order, created_utc";

static SHARED: OnceCell<Database> = OnceCell::const_new();

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "settlement-service"))]
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
            .map_err(|e| database_error("Failed to connect", e))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Process-wide shared handle, initialized exactly once. Concurrent
    /// first callers share a single in-flight connect (capped at 10s); the
    /// first caller's configuration wins and later calls get the
    /// already-initialized handle back.
    pub async fn shared(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<&'static Database, AppError> {
        SHARED
            .get_or_try_init(|| async {
                tokio::time::timeout(
                    Duration::from_secs(10),
                    Database::new(database_url, max_connections, min_connections),
                )
                .await
                .map_err(|_| {
                    AppError::DatabaseError(anyhow::anyhow!(
                        "Timed out connecting to PostgreSQL after 10s"
                    ))
                })?
            })
            .await
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| database_error("Health check failed", e))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| database_error("Migration failed", e))?;
        info!("Database migrations completed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Platform Settings Operations
    // -------------------------------------------------------------------------

    /// Current platform commission settings. A missing record is the
    /// first-run state and yields the documented defaults (8% / 10%).
    #[instrument(skip(self))]
    pub async fn get_platform_settings(&self) -> Result<PlatformSettings, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_platform_settings"])
            .start_timer();

        let settings = sqlx::query_as::<_, PlatformSettings>(
            "SELECT brand_sales_commission, store_rent_commission, updated_utc \
             FROM platform_settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("Failed to read platform settings", e))?;

        timer.observe_duration();

        Ok(settings.unwrap_or_else(PlatformSettings::first_run))
    }

    /// Update platform commission settings. Rates are constrained to
    /// [0, 100] here, at write time; reads and calculations never re-check.
    #[instrument(skip(self, input))]
    pub async fn update_platform_settings(
        &self,
        input: &UpdatePlatformSettings,
    ) -> Result<PlatformSettings, AppError> {
        for (field, value) in [
            ("brand_sales_commission", input.brand_sales_commission),
            ("store_rent_commission", input.store_rent_commission),
        ] {
            if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "{} must be between 0 and 100 (got {})",
                    field,
                    value
                )));
            }
        }

        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_platform_settings"])
            .start_timer();

        let settings = sqlx::query_as::<_, PlatformSettings>(
            r#"
            INSERT INTO platform_settings (id, brand_sales_commission, store_rent_commission, updated_utc)
            VALUES (1, $1, $2, now())
            ON CONFLICT (id) DO UPDATE
            SET brand_sales_commission = EXCLUDED.brand_sales_commission,
                store_rent_commission = EXCLUDED.store_rent_commission,
                updated_utc = now()
            RETURNING brand_sales_commission, store_rent_commission, updated_utc
            "#,
        )
        .bind(input.brand_sales_commission)
        .bind(input.store_rent_commission)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| database_error("Failed to update platform settings", e))?;

        timer.observe_duration();

        info!(
            brand_sales_commission = %settings.brand_sales_commission,
            store_rent_commission = %settings.store_rent_commission,
            "Platform commission settings updated"
        );

        Ok(settings)
    }

    // -------------------------------------------------------------------------
    // Clearance Operations
    // -------------------------------------------------------------------------

    /// Create a clearance with its inventory lines. Lines are validated
    /// (non-negative quantities and price) before anything is written.
    #[instrument(skip(self, input), fields(rental_id = %input.rental_id))]
    pub async fn create_clearance(
        &self,
        input: &CreateClearance,
    ) -> Result<(Clearance, Vec<ClearanceItem>), AppError> {
        for item in &input.items {
            item.to_inventory_line().validate()?;
        }

        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_clearance"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| database_error("Failed to begin transaction", e))?;

        let clearance_id = Uuid::new_v4();
        let clearance = sqlx::query_as::<_, Clearance>(&format!(
            "INSERT INTO clearances (clearance_id, rental_id, store_name, brand_name, status) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            CLEARANCE_COLUMNS
        ))
        .bind(clearance_id)
        .bind(input.rental_id)
        .bind(&input.store_name)
        .bind(&input.brand_name)
        .bind(ClearanceStatus::PendingSettlement.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| database_error("Failed to create clearance", e))?;

        let mut items = Vec::with_capacity(input.items.len());
        for (index, item) in input.items.iter().enumerate() {
            let row = sqlx::query_as::<_, ClearanceItem>(&format!(
                "INSERT INTO clearance_items (item_id, clearance_id, product_id, product_name, \
                 localized_name, initial_quantity, sold_quantity, remaining_quantity, unit_price, \
                 sort_order) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {}",
                CLEARANCE_ITEM_COLUMNS
            ))
            .bind(Uuid::new_v4())
            .bind(clearance_id)
            .bind(&item.product_id)
            .bind(&item.product_name)
            .bind(&item.localized_name)
            .bind(item.initial_quantity)
            .bind(item.sold_quantity)
            .bind(item.remaining_quantity)
            .bind(item.unit_price)
            .bind(index as i32)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                    AppError::Conflict(anyhow::anyhow!(
                        "Product '{}' appears more than once in this clearance",
                        item.product_id
                    ))
                }
                _ => database_error("Failed to create clearance item", e),
            })?;
            items.push(row);
        }

        tx.commit().await.map_err(|e| database_error("Failed to commit clearance", e))?;

        timer.observe_duration();

        CLEARANCES_TOTAL
            .with_label_values(&[ClearanceStatus::PendingSettlement.as_str()])
            .inc();

        info!(
            clearance_id = %clearance.clearance_id,
            item_count = items.len(),
            "Clearance created"
        );

        Ok((clearance, items))
    }

    /// Fetch a clearance with its inventory lines.
    #[instrument(skip(self))]
    pub async fn get_clearance(
        &self,
        clearance_id: Uuid,
    ) -> Result<Option<(Clearance, Vec<ClearanceItem>)>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_clearance"])
            .start_timer();

        let clearance = sqlx::query_as::<_, Clearance>(&format!(
            "SELECT {} FROM clearances WHERE clearance_id = $1",
            CLEARANCE_COLUMNS
        ))
        .bind(clearance_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("Failed to fetch clearance", e))?;

        let Some(clearance) = clearance else {
            timer.observe_duration();
            return Ok(None);
        };

        let items = sqlx::query_as::<_, ClearanceItem>(&format!(
            "SELECT {} FROM clearance_items WHERE clearance_id = $1 ORDER BY sort_order",
            CLEARANCE_ITEM_COLUMNS
        ))
        .bind(clearance_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("Failed to fetch clearance items", e))?;

        timer.observe_duration();

        Ok(Some((clearance, items)))
    }

    /// List clearances, newest first.
    #[instrument(skip(self))]
    pub async fn list_clearances(
        &self,
        filter: &ListClearancesFilter,
    ) -> Result<Vec<Clearance>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_clearances"])
            .start_timer();

        let clearances = sqlx::query_as::<_, Clearance>(&format!(
            "SELECT {} FROM clearances WHERE ($1::text IS NULL OR status = $1) \
             ORDER BY created_utc DESC LIMIT $2",
            CLEARANCE_COLUMNS
        ))
        .bind(filter.status.map(|s| s.as_str().to_string()))
        .bind(filter.limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("Failed to list clearances", e))?;

        timer.observe_duration();

        Ok(clearances)
    }

    /// Compute and persist the settlement for a clearance.
    ///
    /// Commission rates are read once, before the computation, so a
    /// settings change mid-settlement cannot produce a mixed result. The
    /// clearance must still be pending settlement; recomputation is allowed
    /// until it is approved.
    #[instrument(skip(self))]
    pub async fn settle_clearance(
        &self,
        clearance_id: Uuid,
    ) -> Result<(Clearance, Vec<ClearanceItem>, Vec<InventoryWarning>), AppError> {
        let Some((clearance, items)) = self.get_clearance(clearance_id).await? else {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Clearance {} not found",
                clearance_id
            )));
        };

        if ClearanceStatus::from_string(&clearance.status) != ClearanceStatus::PendingSettlement {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Clearance {} is {} and can no longer be settled",
                clearance_id,
                clearance.status
            )));
        }

        let settings = self.get_platform_settings().await?;
        let lines: Vec<InventoryLine> =
            items.iter().map(ClearanceItem::to_inventory_line).collect();
        let settlement = domain::settle(&lines, settings.rates())?;

        for warning in &settlement.warnings {
            warn!(
                clearance_id = %clearance_id,
                product_id = %warning.product_id,
                initial_quantity = warning.initial_quantity,
                sold_quantity = warning.sold_quantity,
                remaining_quantity = warning.remaining_quantity,
                "Inventory quantities do not reconcile"
            );
            INVENTORY_WARNINGS_TOTAL.inc();
        }

        let timer = DB_QUERY_DURATION
            .with_label_values(&["settle_clearance"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| database_error("Failed to begin transaction", e))?;

        let totals = &settlement.totals;
        let updated = sqlx::query_as::<_, Clearance>(&format!(
            "UPDATE clearances SET total_sales = $2, total_sales_with_tax = $3, \
             platform_commission_rate = $4, store_commission_rate = $5, \
             platform_commission_amount = $6, store_commission_amount = $7, \
             store_payout_amount = $8, return_inventory_value = $9, brand_total_amount = $10, \
             settled_utc = now() WHERE clearance_id = $1 RETURNING {}",
            CLEARANCE_COLUMNS
        ))
        .bind(clearance_id)
        .bind(totals.total_sales)
        .bind(totals.total_sales_with_tax)
        .bind(totals.platform_commission_rate)
        .bind(totals.store_commission_rate)
        .bind(totals.platform_commission_amount)
        .bind(totals.store_commission_amount)
        .bind(totals.store_payout_amount)
        .bind(totals.return_inventory_value)
        .bind(totals.brand_total_amount)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| database_error("Failed to persist settlement", e))?;

        for (item, line) in items.iter().zip(settlement.lines.iter()) {
            sqlx::query(
                "UPDATE clearance_items SET total_sales_value = $2, total_sales_with_tax = $3 \
                 WHERE item_id = $1",
            )
            .bind(item.item_id)
            .bind(line.total_sales_value)
            .bind(line.total_sales_with_tax)
            .execute(&mut *tx)
            .await
            .map_err(|e| database_error("Failed to persist settled line values", e))?;
        }

        tx.commit().await.map_err(|e| database_error("Failed to commit settlement", e))?;

        timer.observe_duration();

        SETTLEMENTS_TOTAL.with_label_values(&["clearance"]).inc();
        record_settlement_amounts(totals);

        info!(
            clearance_id = %clearance_id,
            total_sales = %totals.total_sales,
            store_payout_amount = %totals.store_payout_amount,
            warning_count = settlement.warnings.len(),
            "Clearance settled"
        );

        let items = sqlx::query_as::<_, ClearanceItem>(&format!(
            "SELECT {} FROM clearance_items WHERE clearance_id = $1 ORDER BY sort_order",
            CLEARANCE_ITEM_COLUMNS
        ))
        .bind(clearance_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("Failed to fetch settled items", e))?;

        Ok((updated, items, settlement.warnings))
    }

    /// Approve a settled clearance. The record freezes: settle and approve
    /// both conflict from here on, and a correction needs a new clearance.
    #[instrument(skip(self))]
    pub async fn approve_clearance(&self, clearance_id: Uuid) -> Result<Clearance, AppError> {
        let Some((clearance, _items)) = self.get_clearance(clearance_id).await? else {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Clearance {} not found",
                clearance_id
            )));
        };

        if clearance.settled_utc.is_none() {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Clearance {} has no settlement to approve",
                clearance_id
            )));
        }

        let timer = DB_QUERY_DURATION
            .with_label_values(&["approve_clearance"])
            .start_timer();

        // Status guard in the statement as well: a concurrent approval of
        // the same clearance resolves to exactly one winner.
        let approved = sqlx::query_as::<_, Clearance>(&format!(
            "UPDATE clearances SET status = $2, approved_utc = now() \
             WHERE clearance_id = $1 AND status = $3 RETURNING {}",
            CLEARANCE_COLUMNS
        ))
        .bind(clearance_id)
        .bind(ClearanceStatus::SettlementApproved.as_str())
        .bind(ClearanceStatus::PendingSettlement.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("Failed to approve clearance", e))?;

        timer.observe_duration();

        let Some(approved) = approved else {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Clearance {} is {} and can no longer be approved",
                clearance_id,
                clearance.status
            )));
        };

        CLEARANCES_TOTAL
            .with_label_values(&[ClearanceStatus::SettlementApproved.as_str()])
            .inc();

        info!(clearance_id = %clearance_id, "Clearance settlement approved");

        Ok(approved)
    }
}

fn database_error(context: &str, e: impl std::fmt::Display) -> AppError {
    ERRORS_TOTAL.with_label_values(&["database"]).inc();
    AppError::DatabaseError(anyhow::anyhow!("{}: {}", context, e))
}

fn record_settlement_amounts(totals: &crate::domain::SettlementTotals) {
    for (leg, amount) in [
        ("total_sales", totals.total_sales),
        ("platform_commission", totals.platform_commission_amount),
        ("store_payout", totals.store_payout_amount),
        ("brand_total", totals.brand_total_amount),
    ] {
        SETTLEMENT_AMOUNT_TOTAL
            .with_label_values(&[leg])
            .inc_by(amount.to_f64().unwrap_or_default());
    }
}
