use tracing::{info, warn};

use super::error::{DbError, DbResult};
use super::mapper::{delete_by_id, fetch_by_id};
use super::models::{UserGear, UserGearLink};
use super::pool::Database;
use super::users::unlink_registration;

/// Delete one registration and every container link touching it.
/// Returns the joined view of the registration as it was.
pub async fn delete_registration_cascade(db: &Database, registration_id: i64) -> DbResult<UserGear> {
    let mut tx = db.begin().await?;

    let outcome = async {
        let view = fetch_by_id::<UserGear>(&mut *tx, registration_id).await?;
        unlink_registration(&mut *tx, registration_id).await?;
        delete_by_id::<UserGearLink>(&mut *tx, registration_id).await?;
        Ok::<_, DbError>(view)
    }
    .await;

    match outcome {
        Ok(view) => {
            tx.commit().await?;
            info!(registration_id, "Deleted gear registration");
            Ok(view)
        }
        Err(err) => {
            warn!(registration_id, error = %err, "Registration delete failed, rolling back");
            if let Err(rollback) = tx.rollback().await {
                warn!(registration_id, error = %rollback, "Rollback failed");
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::mapper::insert;
    use crate::database::models::UserContainer;
    use crate::database::test_support::{memory_db, seed_catalog};

    #[tokio::test]
    async fn deleting_a_container_registration_unpacks_it() {
        let db = memory_db().await;
        let (backpack, tent) = {
            let mut conn = db.acquire().await.unwrap();
            let seeded = seed_catalog(&mut conn).await;
            let reg = |gear: i64| {
                format!(
                    r#"{{"usergear_gear_id":{},"usergear_user_id":{}}}"#,
                    gear, seeded.user_id
                )
            };
            let backpack: UserGearLink = insert(&mut conn, reg(seeded.container_gear_id).as_bytes())
                .await
                .unwrap();
            let tent: UserGearLink = insert(&mut conn, reg(seeded.gear_id).as_bytes())
                .await
                .unwrap();
            let link = format!(
                r#"{{"user_container_id":{},"user_gear_registration_id":{}}}"#,
                backpack.usergear_registration_id.unwrap(),
                tent.usergear_registration_id.unwrap()
            );
            insert::<UserContainer>(&mut conn, link.as_bytes())
                .await
                .unwrap();
            (
                backpack.usergear_registration_id.unwrap(),
                tent.usergear_registration_id.unwrap(),
            )
        };

        let view = delete_registration_cascade(&db, backpack).await.unwrap();
        assert!(view.gear_is_container);

        let mut conn = db.acquire().await.unwrap();
        let tent_view: UserGear = fetch_by_id(&mut conn, tent).await.unwrap();
        assert_eq!(tent_view.container_registration_id, None);
        assert!(
            fetch_by_id::<UserGearLink>(&mut conn, backpack)
                .await
                .unwrap_err()
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn failed_registration_delete_keeps_its_links() {
        let db = memory_db().await;
        let backpack = {
            let mut conn = db.acquire().await.unwrap();
            let seeded = seed_catalog(&mut conn).await;
            let reg = |gear: i64| {
                format!(
                    r#"{{"usergear_gear_id":{},"usergear_user_id":{}}}"#,
                    gear, seeded.user_id
                )
            };
            let backpack: UserGearLink = insert(&mut conn, reg(seeded.container_gear_id).as_bytes())
                .await
                .unwrap();
            let tent: UserGearLink = insert(&mut conn, reg(seeded.gear_id).as_bytes())
                .await
                .unwrap();
            let link = format!(
                r#"{{"user_container_id":{},"user_gear_registration_id":{}}}"#,
                backpack.usergear_registration_id.unwrap(),
                tent.usergear_registration_id.unwrap()
            );
            insert::<UserContainer>(&mut conn, link.as_bytes())
                .await
                .unwrap();
            sqlx::query(
                "CREATE TRIGGER registrations_locked BEFORE DELETE ON user_gear_registrations
                 BEGIN SELECT RAISE(ABORT, 'registrations are locked'); END",
            )
            .execute(&mut *conn)
            .await
            .unwrap();
            backpack.usergear_registration_id.unwrap()
        };

        assert!(delete_registration_cascade(&db, backpack).await.is_err());

        let mut conn = db.acquire().await.unwrap();
        let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_container_registration")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(links, 1);
        assert!(fetch_by_id::<UserGearLink>(&mut conn, backpack).await.is_ok());
    }

    #[tokio::test]
    async fn missing_registration_is_not_found() {
        let db = memory_db().await;
        let err = delete_registration_cascade(&db, 5).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
