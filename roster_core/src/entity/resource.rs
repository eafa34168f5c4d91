use crate::ids::{AccountId, GroupId, ResourceId, StudentId};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    #[sea_orm(string_value = "link")]
    Link,
    #[sea_orm(string_value = "image")]
    Image,
}

impl ResourceKind {
    /// Accepts both the lowercase wire form and the upper-case constants
    /// older clients send (`LINK`, `IMAGE`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "link" => Some(ResourceKind::Link),
            "image" => Some(ResourceKind::Image),
            _ => None,
        }
    }
}

/// A link or image. With neither `group_id` nor `student_id` set the
/// resource is global.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "resource")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: ResourceId,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub group_id: Option<GroupId>,
    pub student_id: Option<StudentId>,
    pub created_by: AccountId,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::group::Entity",
        from = "Column::GroupId",
        to = "super::group::Column::Id"
    )]
    Group,
    #[sea_orm(has_many = "super::project_resource::Entity")]
    ProjectResource,
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl Related<super::project_resource::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProjectResource.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
