//! Diesel table definitions; must match `backend/migrations` exactly.

diesel::table! {
    /// One business card per WeChat identity.
    business_cards (id) {
        id -> Int4,
        /// Unique external identity.
        openid -> Text,
        name -> Nullable<Text>,
        title -> Nullable<Text>,
        organization -> Nullable<Text>,
        address -> Nullable<Text>,
        postcode -> Nullable<Text>,
        telephone -> Nullable<Text>,
        mobile -> Nullable<Text>,
        fax -> Nullable<Text>,
        email -> Nullable<Text>,
        website -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}
