//! PostgreSQL-backed `CardRepository` using Diesel.
//!
//! The unique constraint on `business_cards.openid` enforces one card per
//! identity; a violating insert surfaces as `CardPersistenceError::Conflict`.

use async_trait::async_trait;
use chrono::Utc;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::warn;

use crate::domain::ports::{CardPersistenceError, CardRepository};
use crate::domain::{CardProfile, NewUserRecord, OpenId, UserId, UserRecord};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{CardRow, CardUpdate, NewCardRow};
use super::pool::DbPool;
use super::schema::business_cards;

/// Diesel implementation of the card store.
#[derive(Clone)]
pub struct DieselCardRepository {
    pool: DbPool,
}

impl DieselCardRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_record(row: CardRow) -> Result<UserRecord, CardPersistenceError> {
    let id = UserId::new(row.id).map_err(|err| CardPersistenceError::query(err.to_string()))?;
    let openid = OpenId::new(row.openid).map_err(|err| {
        warn!(user_id = row.id, "stored card has an invalid openid");
        CardPersistenceError::query(err.to_string())
    })?;
    Ok(UserRecord {
        id,
        openid,
        profile: CardProfile {
            name: row.name,
            title: row.title,
            organization: row.organization,
            address: row.address,
            postcode: row.postcode,
            telephone: row.telephone,
            mobile: row.mobile,
            fax: row.fax,
            email: row.email,
            website: row.website,
        },
    })
}

fn new_row(record: &NewUserRecord) -> NewCardRow<'_> {
    let p = &record.profile;
    NewCardRow {
        openid: record.openid.as_ref(),
        name: p.name.as_deref(),
        title: p.title.as_deref(),
        organization: p.organization.as_deref(),
        address: p.address.as_deref(),
        postcode: p.postcode.as_deref(),
        telephone: p.telephone.as_deref(),
        mobile: p.mobile.as_deref(),
        fax: p.fax.as_deref(),
        email: p.email.as_deref(),
        website: p.website.as_deref(),
    }
}

fn changeset(profile: &CardProfile) -> CardUpdate<'_> {
    CardUpdate {
        name: profile.name.as_deref(),
        title: profile.title.as_deref(),
        organization: profile.organization.as_deref(),
        address: profile.address.as_deref(),
        postcode: profile.postcode.as_deref(),
        telephone: profile.telephone.as_deref(),
        mobile: profile.mobile.as_deref(),
        fax: profile.fax.as_deref(),
        email: profile.email.as_deref(),
        website: profile.website.as_deref(),
        updated_at: Utc::now(),
    }
}

#[async_trait]
impl CardRepository for DieselCardRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, CardPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        business_cards::table
            .find(id.get())
            .select(CardRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_record)
            .transpose()
    }

    async fn find_by_openid(
        &self,
        openid: &OpenId,
    ) -> Result<Option<UserRecord>, CardPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        business_cards::table
            .filter(business_cards::openid.eq(openid.as_ref()))
            .select(CardRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_record)
            .transpose()
    }

    async fn exists_by_id(&self, id: UserId) -> Result<bool, CardPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::select(exists(business_cards::table.find(id.get())))
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn exists_by_openid(&self, openid: &OpenId) -> Result<bool, CardPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::select(exists(
            business_cards::table.filter(business_cards::openid.eq(openid.as_ref())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)
    }

    async fn insert(&self, record: &NewUserRecord) -> Result<UserRecord, CardPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = diesel::insert_into(business_cards::table)
            .values(&new_row(record))
            .returning(CardRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        row_to_record(row)
    }

    async fn update(&self, record: &UserRecord) -> Result<(), CardPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(business_cards::table.find(record.id.get()))
            .set(&changeset(&record.profile))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(CardPersistenceError::query(format!(
                "card {} not found for update",
                record.id
            )));
        }
        Ok(())
    }
}
