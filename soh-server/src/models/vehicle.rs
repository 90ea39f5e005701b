//! Vehicle registry model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use validator::Validate;

use ev_soh_core::ValuationContext;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub user_id: String,
    pub vehicle_id: String,
    pub battery_type: String,
    pub buying_price: f64,
    pub buying_date: NaiveDate,
    pub manufacture_date: Option<NaiveDate>,
}

/// Body of both register and update
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VehicleRegister {
    #[validate(length(min = 1, message = "user_id is required"))]
    pub user_id: String,
    #[validate(length(min = 1, message = "vehicle_id is required"))]
    pub vehicle_id: String,
    #[validate(length(min = 1, message = "battery_type is required"))]
    pub battery_type: String,
    #[validate(range(min = 0.0, message = "buying_price must be >= 0"))]
    pub buying_price: f64,
    pub buying_date: NaiveDate,
    #[serde(default)]
    pub manufacture_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VehicleList {
    pub vehicles: Vec<Vehicle>,
}

impl Vehicle {
    /// Purchase facts for resale valuation as of `today`
    pub fn valuation(&self, today: NaiveDate) -> ValuationContext {
        ValuationContext {
            buying_price: self.buying_price,
            buying_date: self.buying_date,
            today,
        }
    }

    /// Insert unless (user_id, vehicle_id) exists. Returns false for a duplicate.
    pub async fn register(pool: &SqlitePool, data: &VehicleRegister) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO vehicles (user_id, vehicle_id, battery_type, buying_price, buying_date, manufacture_date)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (user_id, vehicle_id) DO NOTHING
            "#
        )
        .bind(&data.user_id)
        .bind(&data.vehicle_id)
        .bind(&data.battery_type)
        .bind(data.buying_price)
        .bind(data.buying_date)
        .bind(data.manufacture_date)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns false when the vehicle is not registered. An omitted
    /// `manufacture_date` keeps the stored one.
    pub async fn update(pool: &SqlitePool, data: &VehicleRegister) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE vehicles
            SET battery_type = ?3,
                buying_price = ?4,
                buying_date = ?5,
                manufacture_date = COALESCE(?6, manufacture_date),
                updated_at = CURRENT_TIMESTAMP
            WHERE user_id = ?1 AND vehicle_id = ?2
            "#
        )
        .bind(&data.user_id)
        .bind(&data.vehicle_id)
        .bind(&data.battery_type)
        .bind(data.buying_price)
        .bind(data.buying_date)
        .bind(data.manufacture_date)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn find(pool: &SqlitePool, user_id: &str, vehicle_id: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT user_id, vehicle_id, battery_type, buying_price, buying_date, manufacture_date
            FROM vehicles
            WHERE user_id = ?1 AND vehicle_id = ?2
            "#
        )
        .bind(user_id)
        .bind(vehicle_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_by_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT user_id, vehicle_id, battery_type, buying_price, buying_date, manufacture_date
            FROM vehicles
            WHERE user_id = ?1
            ORDER BY created_at, vehicle_id
            "#
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
