use crate::database::connection::{DatabaseError, PgPooledConnection};
use crate::database::models::User;
use crate::database::schema::users;
use diesel::prelude::*;
use std::sync::Arc;

/// User lookups needed by the notification dispatcher
pub trait UserRepository: Send + Sync {
    /// Find user by ID; `Ok(None)` when the row does not exist
    fn get_by_id(&self, user_id: i64) -> Result<Option<User>, DatabaseError>;
}

pub struct UserRepositoryImpl {
    get_conn: Arc<dyn Fn() -> Result<PgPooledConnection, DatabaseError> + Send + Sync>,
}

impl UserRepositoryImpl {
    pub fn new<F>(get_conn: F) -> Self
    where
        F: Fn() -> Result<PgPooledConnection, DatabaseError> + Send + Sync + 'static,
    {
        Self {
            get_conn: Arc::new(get_conn),
        }
    }
}

impl UserRepository for UserRepositoryImpl {
    fn get_by_id(&self, user_id: i64) -> Result<Option<User>, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        users::table
            .filter(users::id.eq(user_id))
            .first::<User>(&mut conn)
            .optional()
            .map_err(DatabaseError::from)
    }
}
