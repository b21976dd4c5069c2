//! Portal users: administrators and customers

use crate::core::entity::{EntityId, EntitySchema, SortField};
use crate::core::error::BackendError;
use crate::core::feed::{ActivityKind, IntoActivity};
use crate::core::field::{FieldFormat, FieldKind, FieldValue};
use crate::core::service::CollectionService;
use crate::core::session::{Role, SessionUser};
use crate::core::sort::SortDirection::{Asc, Desc};
use crate::core::stats::{Aggregate, count_where};
use crate::core::validation::filters::{blank_to_null, lowercase, trim};
use crate::core::validation::validators::{
    date_format, format, in_list, required, string_length,
};
use crate::core::validation::{FieldRules, Form, FormRules};
use crate::{impl_entity, wire_enum};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

wire_enum! {
    /// Portal role as stored on the user record
    UserRole {
        Customer => "CUSTOMER",
        Admin => "ADMIN",
    }
}

impl UserRole {
    /// Session role, `None` for roles this client cannot sign in
    pub fn session_role(&self) -> Option<Role> {
        match self {
            UserRole::Admin => Some(Role::Admin),
            UserRole::Customer => Some(Role::Customer),
            UserRole::Other(_) => None,
        }
    }
}

wire_enum! {
    /// Account state
    UserStatus {
        Active => "ACTIVE",
        Inactive => "INACTIVE",
        Suspended => "SUSPENDED",
    }
}

/// User record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub id: Option<EntityId>,
    pub username: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
    pub created_date: Option<String>,
    pub updated_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

pub static USER_SCHEMA: EntitySchema = EntitySchema {
    category_field: Some("role"),
    rating_field: None,
    location_field: Some("address"),
    search_fields: &["name", "email", "username"],
    sort_fields: &[
        SortField::new("name", FieldKind::Text, Asc),
        SortField::new("email", FieldKind::Text, Asc),
        SortField::new("username", FieldKind::Text, Asc),
        SortField::new("role", FieldKind::Text, Asc),
        SortField::new("status", FieldKind::Text, Asc),
        SortField::new("createdDate", FieldKind::Date, Desc),
    ],
    default_sort: "createdDate",
};

impl User {
    fn lookup(&self, field: &str) -> Option<FieldValue> {
        let value = match field {
            "id" => self.id.map_or(FieldValue::Null, FieldValue::Integer),
            "username" => FieldValue::text(&self.username),
            "name" => FieldValue::text(&self.name),
            "email" => FieldValue::text(&self.email),
            "phone" => FieldValue::opt_text(self.phone.as_deref()),
            "address" => FieldValue::opt_text(self.address.as_deref()),
            "gender" => FieldValue::opt_text(self.gender.as_deref()),
            "role" => FieldValue::text(self.role.as_str()),
            "status" => FieldValue::text(self.status.as_str()),
            "createdDate" => FieldValue::opt_text(self.created_date.as_deref()),
            _ => return None,
        };
        Some(value)
    }

    pub fn is_customer(&self) -> bool {
        self.role == UserRole::Customer
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    /// Session identity of this user, if it is stored and has a known role
    pub fn session_user(&self) -> Option<SessionUser> {
        Some(SessionUser {
            id: self.id?,
            username: self.username.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role.session_role()?,
        })
    }
}

impl_entity!(User, "users", "user", USER_SCHEMA, User::lookup);

/// User management counters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total: usize,
    pub active: usize,
    /// Everyone not `ACTIVE`, suspended accounts included
    pub inactive: usize,
    pub customers: usize,
    pub admins: usize,
}

impl Aggregate for User {
    type Stats = UserStats;

    fn aggregate(items: &[Self], _now: DateTime<FixedOffset>) -> UserStats {
        let active = count_where(items, User::is_active);
        UserStats {
            total: items.len(),
            active,
            inactive: items.len() - active,
            customers: count_where(items, User::is_customer),
            admins: count_where(items, |u| u.role == UserRole::Admin),
        }
    }
}

impl IntoActivity for User {
    const KIND: ActivityKind = ActivityKind::User;

    fn title(&self) -> String {
        "New Customer Registered".to_string()
    }

    fn description(&self) -> String {
        format!("{} joined the platform", self.name)
    }
}

/// Payload of `POST /users`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl Form for CreateUserRequest {
    fn rules(_today: NaiveDate) -> FormRules {
        FormRules::new()
            .field(
                FieldRules::new("username")
                    .filter(trim())
                    .validate(required())
                    .validate(string_length(3, 50)),
            )
            .field(
                FieldRules::new("password")
                    .validate(required())
                    .validate(string_length(6, usize::MAX)),
            )
            .field(name_rules())
            .field(email_rules())
            .field(FieldRules::new("role").validate(in_list(UserRole::wire_values())))
    }
}

/// Payload of `PUT /users/{id}`, used by both the admin edit form and the
/// profile page.
///
/// Absent optionals are left out of the request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
}

impl UpdateUserRequest {
    /// Prefill from an existing user
    pub fn from_user(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            date_of_birth: user.date_of_birth.clone(),
            gender: user.gender.clone(),
            address: user.address.clone(),
            bio: user.bio.clone(),
            status: Some(user.status.clone()),
        }
    }
}

impl Form for UpdateUserRequest {
    fn rules(_today: NaiveDate) -> FormRules {
        let optional = |path: &'static str| FieldRules::new(path).filter(trim()).filter(blank_to_null());

        FormRules::new()
            .field(name_rules())
            .field(email_rules())
            .field(optional("phone").validate(format(FieldFormat::Phone)))
            .field(optional("dateOfBirth").validate(date_format("%Y-%m-%d")))
            .field(optional("gender"))
            .field(optional("address").validate(string_length(0, 200)))
            .field(optional("bio").validate(string_length(0, 500)))
            .field(FieldRules::new("status").validate(in_list(UserStatus::wire_values())))
    }
}

fn name_rules() -> FieldRules {
    FieldRules::new("name")
        .filter(trim())
        .validate(required())
        .validate(string_length(0, 100))
}

fn email_rules() -> FieldRules {
    FieldRules::new("email")
        .filter(trim())
        .filter(lowercase())
        .validate(required())
        .validate(format(FieldFormat::Email))
}

/// User endpoints beyond the collection fetch
#[async_trait]
pub trait UserService: CollectionService<User> {
    async fn create_user(&self, request: &CreateUserRequest) -> Result<User, BackendError>;

    async fn update_user(
        &self,
        id: EntityId,
        request: &UpdateUserRequest,
    ) -> Result<User, BackendError>;

    async fn update_user_status(
        &self,
        id: EntityId,
        status: &UserStatus,
    ) -> Result<User, BackendError>;

    async fn delete_user(&self, id: EntityId) -> Result<(), BackendError>;
}
