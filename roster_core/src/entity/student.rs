use crate::ids::{AccountId, StudentId};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
    #[sea_orm(string_value = "present")]
    Present,
    #[sea_orm(string_value = "absent")]
    Absent,
}

impl StudentStatus {
    pub fn toggled(self) -> Self {
        match self {
            StudentStatus::Present => StudentStatus::Absent,
            StudentStatus::Absent => StudentStatus::Present,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "present" => Some(StudentStatus::Present),
            "absent" => Some(StudentStatus::Absent),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "student")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: StudentId,
    /// Account that owns this student's roster entry.
    pub teacher_id: AccountId,
    pub first_name: String,
    pub last_initial: String,
    pub status: StudentStatus,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::TeacherId",
        to = "super::account::Column::Id"
    )]
    Teacher,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teacher.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
