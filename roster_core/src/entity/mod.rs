// SeaORM entities, one module per table created by `models::migrator`.

pub mod account;
pub mod group;
pub mod group_member;
pub mod project;
pub mod project_resource;
pub mod resource;
pub mod session;
pub mod student;
pub mod task;


pub mod prelude {
    pub use super::account::{
        ActiveModel as AccountActiveModel, Column as AccountColumn, Entity as Account,
        Model as AccountModel,
    };
    pub use super::group::{
        ActiveModel as GroupActiveModel, Column as GroupColumn, Entity as Group,
        Model as GroupModel,
    };
    pub use super::group_member::{
        ActiveModel as GroupMemberActiveModel, Column as GroupMemberColumn,
        Entity as GroupMember, MemberRole, Model as GroupMemberModel,
    };
    pub use super::project::{
        ActiveModel as ProjectActiveModel, Column as ProjectColumn, Entity as Project,
        Model as ProjectModel, ProjectStatus,
    };
    pub use super::project_resource::{
        ActiveModel as ProjectResourceActiveModel, Column as ProjectResourceColumn,
        Entity as ProjectResource, Model as ProjectResourceModel,
    };
    pub use super::resource::{
        ActiveModel as ResourceActiveModel, Column as ResourceColumn, Entity as Resource,
        Model as ResourceModel, ResourceKind,
    };
    pub use super::session::{
        ActiveModel as SessionActiveModel, Column as SessionColumn, Entity as Session,
        Model as SessionModel,
    };
    pub use super::student::{
        ActiveModel as StudentActiveModel, Column as StudentColumn, Entity as Student,
        Model as StudentModel, StudentStatus,
    };
    pub use super::task::{
        ActiveModel as TaskActiveModel, AssigneeType, Column as TaskColumn, Entity as Task,
        Model as TaskModel, TaskStatus,
    };

    pub use sea_orm::{
        ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
        EntityTrait, IntoActiveModel, ModelTrait, NotSet, PaginatorTrait, QueryFilter,
        QueryOrder, QuerySelect, Set, TransactionTrait,
    };
}
