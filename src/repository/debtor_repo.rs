// ==========================================
// 债务导入服务 - 债务人仓储
// ==========================================
// 职责: debtors / addresses / phones / contact_persons 的 upsert
// 红线: 空值不覆盖已有值（COALESCE(NULLIF(excluded, ''), old)）
// ==========================================

use chrono::Utc;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::domain::{AddressUpsert, DebtorUpsert, PhoneUpsert};
use crate::repository::error::{RepositoryError, RepositoryResult};

// ==========================================
// DebtorRepository
// ==========================================
/// 债务人仓储
/// 职责: 管理债务人及其从属实体
/// 红线: 不含业务逻辑，只负责数据访问
pub struct DebtorRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DebtorRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按 iin upsert 债务人
    ///
    /// # 返回
    /// - Ok(String): 债务人 id（新建或已有）
    pub fn upsert_debtor(&self, debtor: &DebtorUpsert) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let now = Utc::now().to_rfc3339();
        let id: String = conn.query_row(
            r#"
            INSERT INTO debtors (
                id, iin, last_name, first_name, middle_name, status,
                id_card_number, id_card_authorities_in_granting,
                id_card_start_date, id_card_end_date,
                birth_day, birthplace, nationality,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)
            ON CONFLICT (iin) DO UPDATE SET
                last_name = COALESCE(NULLIF(excluded.last_name, ''), debtors.last_name),
                first_name = COALESCE(NULLIF(excluded.first_name, ''), debtors.first_name),
                middle_name = COALESCE(NULLIF(excluded.middle_name, ''), debtors.middle_name),
                status = COALESCE(NULLIF(excluded.status, ''), debtors.status),
                id_card_number = COALESCE(NULLIF(excluded.id_card_number, ''), debtors.id_card_number),
                id_card_authorities_in_granting = COALESCE(
                    NULLIF(excluded.id_card_authorities_in_granting, ''),
                    debtors.id_card_authorities_in_granting
                ),
                id_card_start_date = COALESCE(excluded.id_card_start_date, debtors.id_card_start_date),
                id_card_end_date = COALESCE(excluded.id_card_end_date, debtors.id_card_end_date),
                birth_day = COALESCE(excluded.birth_day, debtors.birth_day),
                birthplace = COALESCE(NULLIF(excluded.birthplace, ''), debtors.birthplace),
                nationality = COALESCE(NULLIF(excluded.nationality, ''), debtors.nationality),
                updated_at = excluded.updated_at
            RETURNING id
            "#,
            params![
                Uuid::new_v4().to_string(),
                debtor.iin,
                debtor.last_name,
                debtor.first_name,
                debtor.middle_name,
                debtor.status,
                debtor.id_card_number,
                debtor.id_card_authorities_in_granting,
                debtor.id_card_start_date.map(|d| d.to_string()),
                debtor.id_card_end_date.map(|d| d.to_string()),
                debtor.birth_day.map(|d| d.to_string()),
                debtor.birthplace,
                debtor.nationality,
                now,
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// 地址 upsert（每个主体每种类型一条）
    pub fn upsert_address(&self, address: &AddressUpsert) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            r#"
            INSERT INTO addresses (id, subject_type, subject_id, address, type_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ON CONFLICT (subject_type, subject_id, type_id) DO UPDATE SET
                address = excluded.address,
                updated_at = excluded.updated_at
            "#,
            params![
                Uuid::new_v4().to_string(),
                address.subject_type,
                address.subject_id,
                address.address,
                address.type_id,
                now,
            ],
        )?;
        Ok(())
    }

    /// 电话 upsert（同一主体同一号码只保留一条）
    pub fn upsert_phone(&self, phone: &PhoneUpsert) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            r#"
            INSERT INTO phones (id, subject_type, subject_id, phone, type_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ON CONFLICT (subject_type, subject_id, phone) DO UPDATE SET
                type_id = excluded.type_id,
                updated_at = excluded.updated_at
            "#,
            params![
                Uuid::new_v4().to_string(),
                phone.subject_type,
                phone.subject_id,
                phone.phone,
                phone.type_id,
                now,
            ],
        )?;
        Ok(())
    }

    /// 联系人 upsert（冲突键: debtor_id + full_name）
    ///
    /// # 返回
    /// - Ok(String): 联系人 id
    pub fn upsert_contact_person(
        &self,
        debtor_id: &str,
        full_name: &str,
        type_id: i64,
    ) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let now = Utc::now().to_rfc3339();
        let id: String = conn.query_row(
            r#"
            INSERT INTO contact_persons (id, debtor_id, full_name, type_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            ON CONFLICT (debtor_id, full_name) DO UPDATE SET
                type_id = excluded.type_id,
                updated_at = excluded.updated_at
            RETURNING id
            "#,
            params![Uuid::new_v4().to_string(), debtor_id, full_name, type_id, now],
            |row| row.get(0),
        )?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::bootstrap_schema;

    fn setup() -> (DebtorRepository, Arc<Mutex<Connection>>) {
        let conn = Connection::open_in_memory().unwrap();
        bootstrap_schema(&conn).unwrap();
        let shared = Arc::new(Mutex::new(conn));
        (DebtorRepository::from_connection(shared.clone()), shared)
    }

    #[test]
    fn test_upsert_debtor_keeps_existing_values_on_blank() {
        let (repo, conn) = setup();
        let first = DebtorUpsert {
            iin: "900101300123".to_string(),
            last_name: "Иванов".to_string(),
            first_name: "Иван".to_string(),
            birthplace: "Алматы".to_string(),
            ..Default::default()
        };
        let id1 = repo.upsert_debtor(&first).unwrap();

        let second = DebtorUpsert {
            iin: "900101300123".to_string(),
            first_name: "Иван".to_string(),
            nationality: "KZ".to_string(),
            ..Default::default()
        };
        let id2 = repo.upsert_debtor(&second).unwrap();
        assert_eq!(id1, id2);

        let conn = conn.lock().unwrap();
        let (last_name, birthplace, nationality): (String, String, String) = conn
            .query_row(
                "SELECT last_name, birthplace, nationality FROM debtors WHERE id = ?1",
                params![id1],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(last_name, "Иванов");
        assert_eq!(birthplace, "Алматы");
        assert_eq!(nationality, "KZ");
    }

    #[test]
    fn test_phone_and_contact_person_are_idempotent() {
        let (repo, conn) = setup();
        let phone = PhoneUpsert {
            subject_type: "Debtor".to_string(),
            subject_id: "d-1".to_string(),
            phone: "77011112233".to_string(),
            type_id: 1,
        };
        repo.upsert_phone(&phone).unwrap();
        repo.upsert_phone(&phone).unwrap();

        let a = repo.upsert_contact_person("d-1", "Асель", 2).unwrap();
        let b = repo.upsert_contact_person("d-1", "Асель", 2).unwrap();
        assert_eq!(a, b);

        let conn = conn.lock().unwrap();
        let phones: i64 = conn
            .query_row("SELECT COUNT(*) FROM phones", [], |row| row.get(0))
            .unwrap();
        assert_eq!(phones, 1);
    }
}
