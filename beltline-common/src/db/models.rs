//! Database models
//!
//! Plain row structs; relationships are resolved by explicit queries in the
//! API crate, one per access pattern.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub created: DateTime<Utc>,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_admin: bool,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Level {
    pub id: i64,
    pub created: DateTime<Utc>,
    pub name: String,
}

/// A class within a level ("Class" being a keyword-adjacent name, the row
/// struct is called `ClassGroup`; the API still says "class")
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClassGroup {
    pub id: i64,
    pub created: DateTime<Utc>,
    pub level_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Student {
    pub id: i64,
    pub created: DateTime<Utc>,
    pub user_id: i64,
    pub class_id: i64,
    pub display_name: String,
    /// Display/sort position set by the instructor; unrelated to belt ranks
    pub rank: i64,
    pub can_register_to_waitlist: bool,
}

/// A rank level in the skill-progression ladder.
///
/// `rank` values across all belts always form the dense set `1..=N`; only
/// the rank ledger writes this column.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Belt {
    pub id: i64,
    pub created: DateTime<Utc>,
    pub rank: i64,
    pub name: String,
    pub code: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SkillDomain {
    pub id: i64,
    pub created: DateTime<Utc>,
    pub name: String,
    pub code: String,
}

/// Immutable record of a completed attempt (pass/fail) at a belt within a
/// skill domain; only rewritten by explicit admin edits
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Evaluation {
    pub id: i64,
    pub created: DateTime<Utc>,
    pub student_id: i64,
    pub skill_domain_id: i64,
    pub belt_id: i64,
    pub date: NaiveDate,
    pub success: bool,
}

/// Pending request by a student to be evaluated at a belt/skill-domain pair
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WaitlistEntry {
    pub id: i64,
    pub created: DateTime<Utc>,
    pub student_id: i64,
    pub skill_domain_id: i64,
    pub belt_id: i64,
    pub last_printed: Option<DateTime<Utc>>,
}
