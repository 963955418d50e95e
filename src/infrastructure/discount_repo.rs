use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::discount::{normalize_code, DiscountCode, DiscountKind, DiscountSource};
use crate::domain::errors::{DiscountError, DomainError};
use crate::domain::ports::{DiscountStore, NewDiscountCode};
use crate::schema::{discount_codes, discount_redemptions};

use super::blocking;
use super::models::{DiscountCodeRow, NewDiscountCodeRow};

pub struct DieselDiscountStore {
    pool: DbPool,
}

impl DieselDiscountStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_domain(row: DiscountCodeRow) -> Result<DiscountCode, DomainError> {
    let kind = DiscountKind::parse(&row.kind)
        .ok_or_else(|| DomainError::Internal(format!("unknown discount kind '{}'", row.kind)))?;
    let source = DiscountSource::parse(&row.source)
        .ok_or_else(|| DomainError::Internal(format!("unknown discount source '{}'", row.source)))?;
    Ok(DiscountCode {
        code: row.code,
        kind,
        value: row.value,
        usage_limit: row.usage_limit,
        usage_count: row.usage_count,
        per_customer_limit: row.per_customer_limit,
        minimum_purchase: row.minimum_purchase,
        expires_at: row.expires_at,
        active: row.active,
        source,
    })
}

/// Redeem a code inside an existing transaction: a single conditional
/// increment whose affected-row count decides the outcome. This is the only
/// writer of `usage_count`. The row lock taken by the UPDATE serializes
/// concurrent redemptions of the same code until the surrounding transaction
/// commits, so two checkouts racing for the last unit of a capped code
/// resolve to exactly one success.
pub(crate) fn redeem_within(conn: &mut PgConnection, code: &str) -> Result<(), DomainError> {
    let updated = diesel::update(
        discount_codes::table
            .filter(discount_codes::code.eq(code))
            .filter(discount_codes::active.eq(true))
            .filter(
                discount_codes::usage_limit
                    .is_null()
                    .or(discount_codes::usage_count
                        .nullable()
                        .lt(discount_codes::usage_limit)),
            ),
    )
    .set(discount_codes::usage_count.eq(discount_codes::usage_count + 1))
    .execute(conn)?;

    if updated == 1 {
        return Ok(());
    }

    // Nothing matched: re-read once to report the precise reason.
    let row = discount_codes::table
        .filter(discount_codes::code.eq(code))
        .select(DiscountCodeRow::as_select())
        .first(conn)
        .optional()?;
    match row {
        None => Err(DiscountError::NotFound.into()),
        Some(row) if !row.active => Err(DiscountError::Inactive.into()),
        Some(_) => Err(DiscountError::LimitExceeded.into()),
    }
}

#[async_trait]
impl DiscountStore for DieselDiscountStore {
    async fn find(&self, code: &str) -> Result<Option<DiscountCode>, DomainError> {
        let pool = self.pool.clone();
        let code = normalize_code(code);
        blocking(move || {
            let mut conn = pool.get()?;
            let row = discount_codes::table
                .filter(discount_codes::code.eq(&code))
                .select(DiscountCodeRow::as_select())
                .first(&mut conn)
                .optional()?;
            row.map(row_to_domain).transpose()
        })
        .await
    }

    async fn redemptions_by_customer(&self, code: &str, email: &str) -> Result<i64, DomainError> {
        let pool = self.pool.clone();
        let code = normalize_code(code);
        let email = email.trim().to_lowercase();
        blocking(move || {
            let mut conn = pool.get()?;
            let count: i64 = discount_redemptions::table
                .filter(discount_redemptions::code.eq(&code))
                .filter(discount_redemptions::customer_email.eq(&email))
                .count()
                .get_result(&mut conn)?;
            Ok(count)
        })
        .await
    }

    async fn create(&self, new: NewDiscountCode) -> Result<DiscountCode, DomainError> {
        let pool = self.pool.clone();
        blocking(move || {
            let mut conn = pool.get()?;
            let row = NewDiscountCodeRow {
                id: Uuid::new_v4(),
                code: normalize_code(&new.code),
                kind: new.kind.as_str().to_string(),
                value: new.value,
                usage_limit: new.usage_limit,
                per_customer_limit: new.per_customer_limit,
                minimum_purchase: new.minimum_purchase,
                expires_at: new.expires_at,
                active: true,
                source: new.source.as_str().to_string(),
            };
            let inserted = diesel::insert_into(discount_codes::table)
                .values(&row)
                .get_result::<DiscountCodeRow>(&mut conn)
                .map_err(|e| match e {
                    diesel::result::Error::DatabaseError(
                        DatabaseErrorKind::UniqueViolation,
                        _,
                    ) => DomainError::Validation(format!(
                        "discount code '{}' already exists",
                        row.code
                    )),
                    other => other.into(),
                })?;
            row_to_domain(inserted)
        })
        .await
    }

    async fn deactivate(&self, code: &str) -> Result<(), DomainError> {
        let pool = self.pool.clone();
        let code = normalize_code(code);
        blocking(move || {
            let mut conn = pool.get()?;
            // Soft-deactivate only: codes referenced by orders are never
            // physically deleted.
            let updated = diesel::update(discount_codes::table.filter(discount_codes::code.eq(&code)))
                .set(discount_codes::active.eq(false))
                .execute(&mut conn)?;
            if updated == 0 {
                return Err(DomainError::NotFound);
            }
            Ok(())
        })
        .await
    }

    async fn list(&self) -> Result<Vec<DiscountCode>, DomainError> {
        let pool = self.pool.clone();
        blocking(move || {
            let mut conn = pool.get()?;
            let rows = discount_codes::table
                .order(discount_codes::created_at.desc())
                .select(DiscountCodeRow::as_select())
                .load(&mut conn)?;
            rows.into_iter().map(row_to_domain).collect()
        })
        .await
    }
}
