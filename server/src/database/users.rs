use std::collections::BTreeSet;

use sqlx::SqliteConnection;
use tracing::{debug, info, warn};

use super::descriptor::Record;
use super::error::{DbError, DbResult};
use super::mapper::{delete_by_id, fetch_by_id, list_by_field};
use super::models::{User, UserContainer, UserGearLink};
use super::pool::Database;

/// Identity of a user authenticated by an external provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalProfile {
    pub email: String,
    pub name: String,
}

pub async fn find_by_id(conn: &mut SqliteConnection, user_id: i64) -> DbResult<Option<User>> {
    match fetch_by_id::<User>(conn, user_id).await {
        Ok(user) => Ok(Some(user)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err),
    }
}

pub async fn find_by_email(conn: &mut SqliteConnection, email: &str) -> DbResult<Option<User>> {
    let users = list_by_field::<User>(conn, "userEmail", email).await?;
    Ok(users.into_iter().next())
}

/// Resolve a token subject: a numeric user id first, then an e-mail address.
pub async fn resolve_subject(conn: &mut SqliteConnection, subject: &str) -> DbResult<User> {
    let subject = subject.trim();

    if let Ok(id) = subject.parse::<i64>() {
        if let Some(user) = find_by_id(conn, id).await? {
            return Ok(user);
        }
    }

    find_by_email(conn, subject)
        .await?
        .ok_or_else(|| DbError::not_found(User::TABLE, subject))
}

/// How many usernames to try for a new external account before giving up.
const USERNAME_ATTEMPTS: u32 = 5;

/// Find the user registered under `profile.email`, creating an external
/// account on first sight.
///
/// Two first logins for the same address can race. The loser of the race
/// hits the unique index on `userEmail` and re-reads the winner's row. The
/// username is the e-mail address, suffixed with `-2`, `-3`, ... when another
/// account already holds it.
pub async fn ensure_external_user(
    conn: &mut SqliteConnection,
    profile: &ExternalProfile,
) -> DbResult<User> {
    if let Some(user) = find_by_email(conn, &profile.email).await? {
        return Ok(user);
    }

    for attempt in 0..USERNAME_ATTEMPTS {
        let username = external_username(&profile.email, attempt);
        match insert_external(conn, profile, &username).await {
            Ok(user) => {
                info!(user_id = ?user.user_id, email = %profile.email, "Created external user");
                return Ok(user);
            }
            Err(err) if err.is_unique_violation() => {
                if let Some(user) = find_by_email(conn, &profile.email).await? {
                    info!(email = %profile.email, "External user created concurrently, reusing row");
                    return Ok(user);
                }
                debug!(username = %username, "Username taken, trying the next one");
            }
            Err(err) => {
                warn!(email = %profile.email, error = %err, "Failed to create external user");
                return Err(err);
            }
        }
    }

    warn!(email = %profile.email, "No free username for external user");
    Err(DbError::UniqueViolation(format!(
        "{}.userUsername",
        User::TABLE
    )))
}

fn external_username(email: &str, attempt: u32) -> String {
    match attempt {
        0 => email.to_string(),
        n => format!("{}-{}", email, n + 1),
    }
}

async fn insert_external(
    conn: &mut SqliteConnection,
    profile: &ExternalProfile,
    username: &str,
) -> DbResult<User> {
    let result = sqlx::query(
        "INSERT INTO users (userUsername, userPassword, userName, userEmail, userIsAdmin, userIsExternal)
         VALUES (?, '', ?, ?, 0, 1)",
    )
    .bind(username)
    .bind(&profile.name)
    .bind(&profile.email)
    .execute(&mut *conn)
    .await?;

    fetch_by_id::<User>(conn, result.last_insert_rowid()).await
}

/// Store an already-hashed password.
pub async fn set_password(
    conn: &mut SqliteConnection,
    user_id: i64,
    password_hash: &str,
) -> DbResult<()> {
    let result = sqlx::query("UPDATE users SET userPassword = ? WHERE userId = ?")
        .bind(password_hash)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found(User::TABLE, user_id));
    }
    Ok(())
}

/// Remove every container link that references `registration_id`, either as
/// the container or as the packed item. A link naming the registration on
/// both sides is removed once.
pub(crate) async fn unlink_registration(
    conn: &mut SqliteConnection,
    registration_id: i64,
) -> DbResult<()> {
    let mut links =
        list_by_field::<UserContainer>(conn, "userGearRegistrationId", registration_id).await?;
    links.extend(list_by_field::<UserContainer>(conn, "userContainerId", registration_id).await?);

    let ids: BTreeSet<i64> = links
        .iter()
        .filter_map(|link| link.container_registration_id)
        .collect();
    for id in ids {
        delete_by_id::<UserContainer>(conn, id).await?;
    }
    Ok(())
}

/// Delete a user together with their registrations and container links.
///
/// Runs in one transaction: either everything goes or nothing does.
pub async fn delete_user_cascade(db: &Database, user_id: i64) -> DbResult<User> {
    let mut tx = db.begin().await?;

    match cascade(&mut *tx, user_id).await {
        Ok(user) => {
            tx.commit().await?;
            info!(user_id, "Deleted user and registrations");
            Ok(user)
        }
        Err(err) => {
            warn!(user_id, error = %err, "User delete failed, rolling back");
            if let Err(rollback) = tx.rollback().await {
                warn!(user_id, error = %rollback, "Rollback failed");
            }
            Err(err)
        }
    }
}

async fn cascade(conn: &mut SqliteConnection, user_id: i64) -> DbResult<User> {
    let user = fetch_by_id::<User>(conn, user_id).await?;

    let registrations = list_by_field::<UserGearLink>(conn, "userId", user_id).await?;
    // Links first so no registration is deleted while another still points
    // at it.
    for registration in &registrations {
        if let Some(id) = registration.usergear_registration_id {
            unlink_registration(conn, id).await?;
        }
    }
    for registration in &registrations {
        if let Some(id) = registration.usergear_registration_id {
            delete_by_id::<UserGearLink>(conn, id).await?;
        }
    }

    delete_by_id::<User>(conn, user_id).await?;
    Ok(user)
}
