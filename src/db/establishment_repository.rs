//! Establishment repository
//!
//! Plain reads go through [`EstablishmentRepository`]. Writes are free
//! functions over a connection so they can only be reached from inside a
//! [`super::UnitOfWork`] transaction.

use anyhow::{Context, Result};
use sqlx::{SqliteConnection, SqlitePool};

use super::{format_db_timestamp, parse_db_timestamp};
use crate::models::{Address, Establishment, EstablishmentStatus};

#[derive(Debug, sqlx::FromRow)]
struct EstablishmentRow {
    cnpj: String,
    legal_name: String,
    trade_name: Option<String>,
    status: String,
    street: String,
    number: Option<String>,
    complement: Option<String>,
    district: Option<String>,
    city_code: Option<String>,
    postal_code: Option<String>,
    responsible_cpf: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    created_at: String,
    updated_at: String,
}

const SELECT_COLUMNS: &str = r#"
    SELECT cnpj, legal_name, trade_name, status, street, number, complement, district,
           city_code, postal_code, responsible_cpf, phone, email, created_at, updated_at
    FROM establishments
"#;

pub struct EstablishmentRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> EstablishmentRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_by_cnpj(&self, cnpj: &str) -> Result<Option<Establishment>> {
        let row = sqlx::query_as::<_, EstablishmentRow>(&format!("{SELECT_COLUMNS} WHERE cnpj = ?"))
            .bind(cnpj)
            .fetch_optional(self.pool)
            .await
            .context("Failed to get establishment")?;

        Ok(row.map(row_to_establishment))
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM establishments")
            .fetch_one(self.pool)
            .await
            .context("Failed to count establishments")?;
        Ok(count)
    }
}

pub(crate) async fn fetch(
    conn: &mut SqliteConnection,
    cnpj: &str,
) -> Result<Option<Establishment>, sqlx::Error> {
    let row = sqlx::query_as::<_, EstablishmentRow>(&format!("{SELECT_COLUMNS} WHERE cnpj = ?"))
        .bind(cnpj)
        .fetch_optional(conn)
        .await?;

    Ok(row.map(row_to_establishment))
}

pub(crate) async fn insert(
    conn: &mut SqliteConnection,
    record: &Establishment,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO establishments (
            cnpj, legal_name, trade_name, status, street, number, complement, district,
            city_code, postal_code, responsible_cpf, phone, email, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.cnpj)
    .bind(&record.legal_name)
    .bind(&record.trade_name)
    .bind(record.status.as_str())
    .bind(&record.address.street)
    .bind(&record.address.number)
    .bind(&record.address.complement)
    .bind(&record.address.district)
    .bind(&record.address.city_code)
    .bind(&record.address.postal_code)
    .bind(&record.responsible_cpf)
    .bind(&record.phone)
    .bind(&record.email)
    .bind(format_db_timestamp(&record.created_at))
    .bind(format_db_timestamp(&record.updated_at))
    .execute(conn)
    .await?;

    Ok(())
}

/// Overwrite every mutable column. Returns the number of rows touched.
pub(crate) async fn update(
    conn: &mut SqliteConnection,
    record: &Establishment,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE establishments
        SET legal_name = ?, trade_name = ?, status = ?, street = ?, number = ?,
            complement = ?, district = ?, city_code = ?, postal_code = ?,
            responsible_cpf = ?, phone = ?, email = ?, updated_at = ?
        WHERE cnpj = ?
        "#,
    )
    .bind(&record.legal_name)
    .bind(&record.trade_name)
    .bind(record.status.as_str())
    .bind(&record.address.street)
    .bind(&record.address.number)
    .bind(&record.address.complement)
    .bind(&record.address.district)
    .bind(&record.address.city_code)
    .bind(&record.address.postal_code)
    .bind(&record.responsible_cpf)
    .bind(&record.phone)
    .bind(&record.email)
    .bind(format_db_timestamp(&record.updated_at))
    .bind(&record.cnpj)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

fn row_to_establishment(row: EstablishmentRow) -> Establishment {
    Establishment {
        cnpj: row.cnpj,
        legal_name: row.legal_name,
        trade_name: row.trade_name,
        // The CHECK constraint keeps status to the two known values.
        status: EstablishmentStatus::parse(&row.status).unwrap_or(EstablishmentStatus::Inactive),
        address: Address {
            street: row.street,
            number: row.number,
            complement: row.complement,
            district: row.district,
            city_code: row.city_code,
            postal_code: row.postal_code,
        },
        responsible_cpf: row.responsible_cpf,
        phone: row.phone,
        email: row.email,
        created_at: parse_db_timestamp(&row.created_at),
        updated_at: parse_db_timestamp(&row.updated_at),
    }
}
