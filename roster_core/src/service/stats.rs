use std::collections::BTreeMap;

use sea_orm::DatabaseConnection;
use serde::Serialize;
use thiserror::Error;

use crate::{entity::prelude::*, ids::AccountId};

#[derive(Debug, Error)]
pub enum StatsServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("Unauthorized: Admin access required")]
    NotAdmin,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub present: u64,
    pub absent: u64,
}

/// Roster totals across every teacher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_students: u64,
    pub teacher_counts: BTreeMap<AccountId, u64>,
    pub teacher_emails: BTreeMap<AccountId, String>,
    pub status_counts: StatusCounts,
}

#[derive(Clone)]
pub struct StatsService {
    db: DatabaseConnection,
}

impl StatsService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn admin_stats(&self, caller: &AccountModel) -> Result<AdminStats, StatsServiceError> {
        if !caller.is_admin {
            tracing::warn!(account_id = %caller.id, "non-admin requested admin stats");
            return Err(StatsServiceError::NotAdmin);
        }

        let rows: Vec<(AccountId, StudentStatus)> = Student::find()
            .select_only()
            .column(StudentColumn::TeacherId)
            .column(StudentColumn::Status)
            .into_tuple()
            .all(&self.db)
            .await?;

        let mut stats = AdminStats::default();
        for (teacher_id, status) in rows {
            stats.total_students += 1;
            *stats.teacher_counts.entry(teacher_id).or_default() += 1;
            match status {
                StudentStatus::Present => stats.status_counts.present += 1,
                StudentStatus::Absent => stats.status_counts.absent += 1,
            }
        }

        if !stats.teacher_counts.is_empty() {
            let teachers = Account::find()
                .filter(AccountColumn::Id.is_in(stats.teacher_counts.keys().copied()))
                .all(&self.db)
                .await?;
            stats.teacher_emails = teachers.into_iter().map(|t| (t.id, t.email)).collect();
        }

        tracing::debug!(total = stats.total_students, "computed admin stats");
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;

    #[tokio::test]
    async fn test_non_admin_is_rejected() {
        let db = test_utils::setup_test_db().await;
        let teacher = test_utils::insert_account(&db, "Ada", false).await;

        let result = StatsService::new(db).admin_stats(&teacher).await;
        assert!(matches!(result, Err(StatsServiceError::NotAdmin)));
    }

    #[tokio::test]
    async fn test_counts_per_teacher_and_status() {
        let db = test_utils::setup_test_db().await;
        let admin = test_utils::insert_account(&db, "Root", true).await;
        let ada = test_utils::insert_account(&db, "Ada", false).await;
        let grace = test_utils::insert_account(&db, "Grace", false).await;

        test_utils::insert_student(&db, ada.id, "Alan").await;
        test_utils::insert_student(&db, ada.id, "Maya").await;
        let absent = test_utils::insert_student(&db, grace.id, "Zoe").await;

        let mut absent = absent.into_active_model();
        absent.status = Set(StudentStatus::Absent);
        absent.update(&db).await.unwrap();

        let stats = StatsService::new(db).admin_stats(&admin).await.unwrap();

        assert_eq!(stats.total_students, 3);
        assert_eq!(stats.teacher_counts.get(&ada.id), Some(&2));
        assert_eq!(stats.teacher_counts.get(&grace.id), Some(&1));
        assert_eq!(stats.teacher_emails.get(&grace.id).map(String::as_str), Some("grace@school.test"));
        assert_eq!(stats.status_counts, StatusCounts { present: 2, absent: 1 });
    }

    #[test]
    fn test_stats_serialize_camel_case() {
        let json = serde_json::to_value(AdminStats::default()).unwrap();
        assert!(json.get("totalStudents").is_some());
        assert!(json.get("teacherCounts").is_some());
        assert!(json.get("statusCounts").is_some());
    }
}
