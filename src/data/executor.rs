//! 语句执行器
//!
//! 每次调用：预处理 → 按类型描述符绑定 → 执行 → 取生成标识或结果行。
//! 语句在调用返回前释放（包括错误路径）。
//!
//! 只有预处理失败是致命的；参数数量不匹配、绑定失败与执行期错误只记录日志，
//! 调用方总能拿到结果（写入返回 0，读取返回空）。

use crate::data::connection::{Connection, PreparedStatement};
use crate::data::value::{ParamType, Row, Value};
use crate::data::{DataError, Result};

/// 借用连接的执行器
pub struct Executor<'c> {
    conn: &'c dyn Connection,
}

impl<'c> Executor<'c> {
    pub fn new(conn: &'c dyn Connection) -> Self {
        Self { conn }
    }

    /// 执行插入/更新/删除，返回生成的标识（不适用或执行失败时为 0）
    ///
    /// # 示例
    ///
    /// ```rust
    /// let id = Executor::new(&conn).write(
    ///     "INSERT INTO users (name, age) VALUES (?, ?)",
    ///     "si",
    ///     &["Alice".into(), 30.into()],
    /// )?;
    /// ```
    pub fn write(&self, query: &str, types: &str, values: &[Value]) -> Result<i64> {
        let mut stmt = self.prepare_and_bind(query, types, values)?;

        match stmt.execute() {
            Ok(id) => Ok(id),
            Err(e) => {
                tracing::error!(query = query, error = %e, "SQL 执行错误");
                Ok(0)
            }
        }
    }

    /// 执行查询，返回第一行（无匹配时为 None）
    pub fn read_one(&self, query: &str, types: &str, values: &[Value]) -> Result<Option<Row>> {
        let mut stmt = self.prepare_and_bind(query, types, values)?;

        match stmt.query(Some(1)) {
            Ok(rows) => Ok(rows.into_iter().next()),
            Err(e) => {
                tracing::error!(query = query, error = %e, "SQL 执行错误");
                Ok(None)
            }
        }
    }

    /// 执行查询，按数据库返回顺序取出全部行
    pub fn read_all(&self, query: &str, types: &str, values: &[Value]) -> Result<Vec<Row>> {
        let mut stmt = self.prepare_and_bind(query, types, values)?;

        match stmt.query(None) {
            Ok(rows) => Ok(rows),
            Err(e) => {
                tracing::error!(query = query, error = %e, "SQL 执行错误");
                Ok(Vec::new())
            }
        }
    }

    fn prepare_and_bind(
        &self,
        query: &str,
        types: &str,
        values: &[Value],
    ) -> Result<Box<dyn PreparedStatement + 'c>> {
        let mut stmt = match self.conn.prepare(query) {
            Ok(stmt) => stmt,
            Err(e) => {
                let detail = self.conn.last_error().unwrap_or_else(|| e.message.clone());
                tracing::error!(query = query, error = %detail, "预处理语句失败");
                return Err(DataError::Preparation {
                    query: query.to_string(),
                    message: e.message,
                });
            }
        };

        if !types.is_empty() {
            bind_values(stmt.as_mut(), query, types, values);
        }

        let expected = stmt.param_count();
        if expected != values.len() {
            tracing::warn!(
                query = query,
                expected = expected,
                actual = values.len(),
                "参数数量不匹配"
            );
        }

        Ok(stmt)
    }
}

/// 按类型标记逐个绑定；未知标记或缺少标记的值原样绑定，多余标记忽略
fn bind_values(stmt: &mut dyn PreparedStatement, query: &str, types: &str, values: &[Value]) {
    let mut tags = types.chars();

    for (index, value) in values.iter().enumerate() {
        let bound = match tags.next() {
            Some(tag) => match ParamType::from_tag(tag) {
                Some(param_type) => param_type.coerce(value),
                None => {
                    tracing::warn!(query = query, tag = %tag, index = index, "未知的参数类型标记");
                    value.clone()
                }
            },
            None => value.clone(),
        };

        if let Err(e) = stmt.bind(index, &bound) {
            tracing::warn!(query = query, index = index, error = %e, "参数绑定失败");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::connection::{DriverError, SqliteConnection};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn create_test_conn() -> SqliteConnection {
        let conn = SqliteConnection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE users (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                age INTEGER
            )",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_write_returns_generated_id() {
        let conn = create_test_conn();
        let exec = Executor::new(&conn);

        let id1 = exec
            .write(
                "INSERT INTO users (name, age) VALUES (?, ?)",
                "si",
                &["Alice".into(), 30.into()],
            )
            .unwrap();
        let id2 = exec
            .write(
                "INSERT INTO users (name, age) VALUES (?, ?)",
                "si",
                &["Bob".into(), 25.into()],
            )
            .unwrap();

        assert_eq!(id1, 1);
        assert_eq!(id2, 2);
    }

    #[test]
    fn test_write_generated_id_per_table() {
        let conn = create_test_conn();
        conn.execute_batch("CREATE TABLE groups (id INTEGER PRIMARY KEY, title TEXT)")
            .unwrap();
        let exec = Executor::new(&conn);

        let user_id = exec
            .write("INSERT INTO users (name) VALUES (?)", "s", &["Alice".into()])
            .unwrap();
        let group_id = exec
            .write("INSERT INTO groups (title) VALUES (?)", "s", &["admins".into()])
            .unwrap();
        let updated = exec
            .write("UPDATE groups SET title = ?", "s", &["owners".into()])
            .unwrap();

        assert_eq!(user_id, 1);
        assert_eq!(group_id, 1);
        assert_eq!(updated, 0);
    }

    #[test]
    fn test_write_preparation_failure_is_fatal() {
        let conn = create_test_conn();
        let exec = Executor::new(&conn);

        let err = exec
            .write("INSERT INTO missing (x) VALUES (?)", "i", &[1.into()])
            .unwrap_err();
        assert!(matches!(err, DataError::Preparation { .. }));

        let rows = exec.read_all("SELECT * FROM users", "", &[]).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_write_execution_error_returns_zero() {
        let conn = create_test_conn();
        let exec = Executor::new(&conn);

        // NOT NULL 约束失败：记录日志，返回 0
        let id = exec
            .write(
                "INSERT INTO users (name, age) VALUES (?, ?)",
                "si",
                &[Value::Null, 1.into()],
            )
            .unwrap();
        assert_eq!(id, 0);
    }

    #[test]
    fn test_param_count_mismatch_still_executes() {
        let conn = create_test_conn();
        let exec = Executor::new(&conn);

        // 少一个参数：age 绑定为 NULL，仍然执行
        let id = exec
            .write(
                "INSERT INTO users (name, age) VALUES (?, ?)",
                "s",
                &["Alice".into()],
            )
            .unwrap();
        assert_eq!(id, 1);

        let row = exec
            .read_one("SELECT age FROM users WHERE id = ?", "i", &[1.into()])
            .unwrap()
            .unwrap();
        assert_eq!(row.get("age"), Some(&Value::Null));
    }

    #[test]
    fn test_type_tags_coerce_values() {
        let conn = create_test_conn();
        let exec = Executor::new(&conn);

        exec.write(
            "INSERT INTO users (name, age) VALUES (?, ?)",
            "si",
            &[42.into(), "31 years".into()],
        )
        .unwrap();

        let row = exec
            .read_one("SELECT name, age FROM users", "", &[])
            .unwrap()
            .unwrap();
        assert_eq!(row.get("name"), Some(&Value::from("42")));
        assert_eq!(row.get("age"), Some(&Value::Integer(31)));
    }

    #[test]
    fn test_read_one_and_read_all() {
        let conn = create_test_conn();
        conn.execute_batch(
            "INSERT INTO users (name, age) VALUES ('Alice', 30);
             INSERT INTO users (name, age) VALUES ('Bob', 25);
             INSERT INTO users (name, age) VALUES ('Bob', 25);",
        )
        .unwrap();
        let exec = Executor::new(&conn);

        let first = exec
            .read_one("SELECT name FROM users ORDER BY id", "", &[])
            .unwrap();
        assert_eq!(first.unwrap().get("name"), Some(&Value::from("Alice")));

        let none = exec
            .read_one("SELECT * FROM users WHERE id = ?", "i", &[99.into()])
            .unwrap();
        assert!(none.is_none());

        // 重复行按原样保留
        let rows = exec
            .read_all(
                "SELECT name, age FROM users WHERE name = ?",
                "s",
                &["Bob".into()],
            )
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], rows[1]);
    }

    #[test]
    fn test_read_preparation_failure() {
        let conn = create_test_conn();
        let exec = Executor::new(&conn);

        let err = exec.read_one("SELECT FROM", "", &[]).unwrap_err();
        assert!(matches!(err, DataError::Preparation { .. }));
        let err = exec.read_all("SELECT FROM", "", &[]).unwrap_err();
        assert!(matches!(err, DataError::Preparation { .. }));
    }

    #[test]
    fn test_empty_types_binds_nothing() {
        let conn = create_test_conn();
        conn.execute_batch("INSERT INTO users (name, age) VALUES ('Alice', 30)")
            .unwrap();
        let exec = Executor::new(&conn);

        // 未提供类型描述符时不绑定，占位符为 NULL
        let row = exec
            .read_one("SELECT * FROM users WHERE name = ?", "", &["Alice".into()])
            .unwrap();
        assert!(row.is_none());
    }

    /// 计数桩连接：记录预处理次数并返回固定行
    pub(crate) struct CountingConnection {
        pub prepares: Arc<AtomicUsize>,
        pub rows: Vec<Row>,
        pub fail_prepare: bool,
    }

    impl CountingConnection {
        pub fn new(rows: Vec<Row>) -> Self {
            Self {
                prepares: Arc::new(AtomicUsize::new(0)),
                rows,
                fail_prepare: false,
            }
        }

        pub fn prepare_count(&self) -> usize {
            self.prepares.load(Ordering::SeqCst)
        }
    }

    struct CountingStatement {
        rows: Vec<Row>,
    }

    impl Connection for CountingConnection {
        fn prepare<'c>(
            &'c self,
            _sql: &str,
        ) -> std::result::Result<Box<dyn PreparedStatement + 'c>, DriverError> {
            if self.fail_prepare {
                return Err(DriverError::new("syntax error"));
            }
            self.prepares.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(CountingStatement {
                rows: self.rows.clone(),
            }))
        }

        fn last_error(&self) -> Option<String> {
            None
        }
    }

    impl PreparedStatement for CountingStatement {
        fn param_count(&self) -> usize {
            0
        }

        fn bind(&mut self, _index: usize, _value: &Value) -> std::result::Result<(), DriverError> {
            Ok(())
        }

        fn execute(&mut self) -> std::result::Result<i64, DriverError> {
            Ok(7)
        }

        fn query(&mut self, limit: Option<usize>) -> std::result::Result<Vec<Row>, DriverError> {
            let take = limit.unwrap_or(self.rows.len());
            Ok(self.rows.iter().take(take).cloned().collect())
        }
    }

    #[test]
    fn test_each_call_prepares_once() {
        let conn = CountingConnection::new(vec![]);
        let exec = Executor::new(&conn);

        exec.read_all("SELECT 1", "", &[]).unwrap();
        exec.write("DELETE FROM t", "", &[]).unwrap();
        assert_eq!(conn.prepare_count(), 2);
    }
}
