//! Business card records.
//!
//! A [`UserRecord`] pairs a WeChat identity with its [`CardProfile`]. Writes
//! arrive as a [`ProfilePatch`] whose present fields overwrite and whose
//! absent fields leave the stored value alone.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::OpenId;

/// Validation errors for card primitives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CardValidationError {
    #[error("user id must be positive, got {0}")]
    NonPositiveId(i32),
}

/// Store-assigned surrogate key of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "i32", into = "i32")]
#[schema(value_type = i32, example = 1)]
pub struct UserId(i32);

impl UserId {
    /// Validate and construct a [`UserId`].
    ///
    /// # Examples
    /// ```
    /// use backend::domain::UserId;
    ///
    /// assert_eq!(UserId::new(7).map(|id| id.get()), Ok(7));
    /// assert!(UserId::new(0).is_err());
    /// ```
    pub fn new(raw: i32) -> Result<Self, CardValidationError> {
        if raw <= 0 {
            return Err(CardValidationError::NonPositiveId(raw));
        }
        Ok(Self(raw))
    }

    /// Raw integer value.
    #[must_use]
    pub fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<UserId> for i32 {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl TryFrom<i32> for UserId {
    type Error = CardValidationError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Descriptive fields of a business card. Every field is optional and
/// serialises as `null` when unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CardProfile {
    #[schema(example = "Alice")]
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

/// Partial card update taken from form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct ProfilePatch {
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

impl ProfilePatch {
    /// Overwrite the fields of `profile` this patch carries.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::{CardProfile, ProfilePatch};
    ///
    /// let mut profile = CardProfile {
    ///     name: Some("Alice".into()),
    ///     email: Some("a@x".into()),
    ///     ..CardProfile::default()
    /// };
    /// let patch = ProfilePatch { email: Some("alice@x".into()), ..ProfilePatch::default() };
    /// patch.apply_to(&mut profile);
    /// assert_eq!(profile.name.as_deref(), Some("Alice"));
    /// assert_eq!(profile.email.as_deref(), Some("alice@x"));
    /// ```
    pub fn apply_to(&self, profile: &mut CardProfile) {
        fn set(slot: &mut Option<String>, value: &Option<String>) {
            if let Some(value) = value {
                *slot = Some(value.clone());
            }
        }

        set(&mut profile.name, &self.name);
        set(&mut profile.title, &self.title);
        set(&mut profile.organization, &self.organization);
        set(&mut profile.address, &self.address);
        set(&mut profile.postcode, &self.postcode);
        set(&mut profile.telephone, &self.telephone);
        set(&mut profile.mobile, &self.mobile);
        set(&mut profile.fax, &self.fax);
        set(&mut profile.email, &self.email);
        set(&mut profile.website, &self.website);
    }

    /// Profile produced by applying this patch to an empty card.
    #[must_use]
    pub fn into_profile(self) -> CardProfile {
        let mut profile = CardProfile::default();
        self.apply_to(&mut profile);
        profile
    }

    /// Combine two patches; fields present in `self` win over `base`.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::ProfilePatch;
    ///
    /// let query = ProfilePatch { name: Some("Alice".into()), ..ProfilePatch::default() };
    /// let body = ProfilePatch {
    ///     name: Some("Bob".into()),
    ///     fax: Some("1".into()),
    ///     ..ProfilePatch::default()
    /// };
    /// let merged = query.merged_over(body);
    /// assert_eq!(merged.name.as_deref(), Some("Alice"));
    /// assert_eq!(merged.fax.as_deref(), Some("1"));
    /// ```
    #[must_use]
    pub fn merged_over(self, base: ProfilePatch) -> ProfilePatch {
        ProfilePatch {
            name: self.name.or(base.name),
            title: self.title.or(base.title),
            organization: self.organization.or(base.organization),
            address: self.address.or(base.address),
            postcode: self.postcode.or(base.postcode),
            telephone: self.telephone.or(base.telephone),
            mobile: self.mobile.or(base.mobile),
            fax: self.fax.or(base.fax),
            email: self.email.or(base.email),
            website: self.website.or(base.website),
        }
    }

    /// Whether the patch carries no fields at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A stored business card.
///
/// Serialises flat: `{"id":1,"openid":"abc","name":"Alice","title":null,...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserRecord {
    pub id: UserId,
    #[schema(value_type = String, example = "oAbc123")]
    pub openid: OpenId,
    #[serde(flatten)]
    pub profile: CardProfile,
}

/// A card awaiting its first insert; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserRecord {
    pub openid: OpenId,
    pub profile: CardProfile,
}
