use super::lock;
use super::traits::InboundAddressRepository;
use crate::errors::ApiError;
use crate::models::{InboundAddress, NewInboundAddress};
use crate::schema::inbound_addresses;
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct SqliteInboundAddressRepository {
    db: Arc<Mutex<SqliteConnection>>,
}

impl SqliteInboundAddressRepository {
    pub fn new(db: Arc<Mutex<SqliteConnection>>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl InboundAddressRepository for SqliteInboundAddressRepository {
    async fn find_by_email(
        &self,
        email_address: &str,
    ) -> Result<Option<InboundAddress>, ApiError> {
        let mut conn = lock(&self.db)?;
        let result = inbound_addresses::table
            .filter(inbound_addresses::email_address.eq(email_address))
            .select(InboundAddress::as_select())
            .first(&mut *conn)
            .optional()?;
        Ok(result)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<InboundAddress>, ApiError> {
        let mut conn = lock(&self.db)?;
        let result = inbound_addresses::table
            .filter(inbound_addresses::webhook_username.eq(username))
            .select(InboundAddress::as_select())
            .first(&mut *conn)
            .optional()?;
        Ok(result)
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Option<InboundAddress>, ApiError> {
        let mut conn = lock(&self.db)?;
        let result = inbound_addresses::table
            .filter(inbound_addresses::user_id.eq(user_id))
            .select(InboundAddress::as_select())
            .first(&mut *conn)
            .optional()?;
        Ok(result)
    }

    async fn create(&self, address: &NewInboundAddress) -> Result<InboundAddress, ApiError> {
        let mut conn = lock(&self.db)?;
        let result = diesel::insert_into(inbound_addresses::table)
            .values(address)
            .returning(InboundAddress::as_returning())
            .get_result(&mut *conn)?;
        Ok(result)
    }

    async fn update_credentials(
        &self,
        user_id: &str,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<InboundAddress>, ApiError> {
        let mut conn = lock(&self.db)?;
        let result = diesel::update(
            inbound_addresses::table.filter(inbound_addresses::user_id.eq(user_id)),
        )
        .set((
            inbound_addresses::webhook_username.eq(username),
            inbound_addresses::webhook_password_hash.eq(password_hash),
            inbound_addresses::updated_at.eq(chrono::Utc::now().naive_utc()),
        ))
        .returning(InboundAddress::as_returning())
        .get_result(&mut *conn)
        .optional()?;
        Ok(result)
    }
}
