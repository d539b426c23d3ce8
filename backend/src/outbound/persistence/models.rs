//! Diesel row structs for `business_cards`. Never exposed to the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::business_cards;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = business_cards)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CardRow {
    pub id: i32,
    pub openid: String,
    pub name: Option<String>,
    pub title: Option<String>,
    pub organization: Option<String>,
    pub address: Option<String>,
    pub postcode: Option<String>,
    pub telephone: Option<String>,
    pub mobile: Option<String>,
    pub fax: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = business_cards)]
pub(crate) struct NewCardRow<'a> {
    pub openid: &'a str,
    pub name: Option<&'a str>,
    pub title: Option<&'a str>,
    pub organization: Option<&'a str>,
    pub address: Option<&'a str>,
    pub postcode: Option<&'a str>,
    pub telephone: Option<&'a str>,
    pub mobile: Option<&'a str>,
    pub fax: Option<&'a str>,
    pub email: Option<&'a str>,
    pub website: Option<&'a str>,
}

/// Full overwrite of the profile columns; `None` clears a column.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = business_cards)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct CardUpdate<'a> {
    pub name: Option<&'a str>,
    pub title: Option<&'a str>,
    pub organization: Option<&'a str>,
    pub address: Option<&'a str>,
    pub postcode: Option<&'a str>,
    pub telephone: Option<&'a str>,
    pub mobile: Option<&'a str>,
    pub fax: Option<&'a str>,
    pub email: Option<&'a str>,
    pub website: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}
