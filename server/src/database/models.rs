//! Table records and join projections.
//!
//! Base records map one table each and are [`Writable`]. Projections read
//! across joins with table-qualified columns and are read-only.

use serde::{Deserialize, Serialize};

use super::descriptor::{Writable, record};

const GEAR_JOINS: [&str; 3] = [
    "LEFT JOIN manufacture ON gear.gearManufactureId = manufacture.manufactureId",
    "LEFT JOIN gear_top_category ON gear.gearTopCategoryId = gear_top_category.topCategoryId",
    "LEFT JOIN gear_category ON gear.gearCategoryId = gear_category.categoryId",
];

// ---------------------------------------------------------------------------
// Base records
// ---------------------------------------------------------------------------

record! {
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Gear in "gear" {
        #[serde(default)]
        pub gear_id: Option<i64> => "gearId";
        pub gear_top_category_id: i64 => "gearTopCategoryId",
        pub gear_category_id: i64 => "gearCategoryId",
        pub gear_manufacture_id: i64 => "gearManufactureId",
        #[serde(default)]
        pub gear_is_container: bool => "gearIsContainer",
        pub gear_name: String => "gearName",
        #[serde(default)]
        pub gear_size_definition: String => "gearSizeDefinition",
        #[serde(default)]
        pub gear_weight: i64 => "gearWeight",
        #[serde(default)]
        pub gear_height: i64 => "gearHeight",
        #[serde(default)]
        pub gear_length: i64 => "gearLength",
        #[serde(default)]
        pub gear_width: i64 => "gearWidth",
        #[serde(default)]
        pub gear_status: bool => "gearStatus",
    }
}

impl Writable for Gear {}

record! {
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Category in "gear_category" {
        #[serde(default)]
        pub category_id: Option<i64> => "categoryId";
        pub category_top_category_id: i64 => "categoryTopCategoryId",
        pub category_name: String => "categoryName",
    }
}

impl Writable for Category {}

record! {
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct TopCategory in "gear_top_category" {
        #[serde(default)]
        pub top_category_id: Option<i64> => "topCategoryId";
        pub top_category_name: String => "topCategoryName",
        #[serde(default)]
        pub top_category_icon: Option<String> => "topCategoryIcon",
    }
}

impl Writable for TopCategory {}

record! {
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Manufacture in "manufacture" {
        #[serde(default)]
        pub manufacture_id: Option<i64> => "manufactureId";
        pub manufacture_name: String => "manufactureName",
    }
}

impl Writable for Manufacture {}

// `userPassword` is not part of the descriptor. It is written only through
// `users::set_password` and never read back.
record! {
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct User in "users" {
        #[serde(default)]
        pub user_id: Option<i64> => "userId";
        pub user_username: String => "userUsername",
        #[serde(default)]
        pub user_name: String => "userName",
        #[serde(default)]
        pub user_email: Option<String> => "userEmail",
        #[serde(default)]
        pub user_is_admin: bool => "userIsAdmin",
    }
}

impl Writable for User {}

impl User {
    pub fn email(&self) -> Option<&str> {
        self.user_email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }
}

record! {
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct UserGearLink in "user_gear_registrations" {
        #[serde(default)]
        pub usergear_registration_id: Option<i64> => "userGearRegistrationId";
        pub usergear_gear_id: i64 => "gearId",
        pub usergear_user_id: i64 => "userId",
    }
}

impl Writable for UserGearLink {}

record! {
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct UserContainer in "user_container_registration" {
        #[serde(default)]
        pub container_registration_id: Option<i64> => "containerRegistrationId";
        pub user_container_id: i64 => "userContainerId",
        pub user_gear_registration_id: i64 => "userGearRegistrationId",
    }
}

impl Writable for UserContainer {}

// ---------------------------------------------------------------------------
// Projections
// ---------------------------------------------------------------------------

record! {
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct FullGear in "gear" join GEAR_JOINS {
        pub gear_id: i64 => "gear.gearId";
        pub gear_top_category_id: i64 => "gear.gearTopCategoryId",
        pub gear_category_id: i64 => "gear.gearCategoryId",
        pub gear_manufacture_id: i64 => "gear.gearManufactureId",
        pub gear_is_container: bool => "gear.gearIsContainer",
        pub gear_name: String => "gear.gearName",
        pub gear_size_definition: String => "gear.gearSizeDefinition",
        pub gear_weight: i64 => "gear.gearWeight",
        pub gear_height: i64 => "gear.gearHeight",
        pub gear_length: i64 => "gear.gearLength",
        pub gear_width: i64 => "gear.gearWidth",
        pub gear_status: bool => "gear.gearStatus",
        pub manufacture_id: i64 => "manufacture.manufactureId",
        pub manufacture_name: String => "manufacture.manufactureName",
        pub top_category_id: i64 => "gear_top_category.topCategoryId",
        pub top_category_name: String => "gear_top_category.topCategoryName",
        pub category_id: i64 => "gear_category.categoryId",
        pub category_name: String => "gear_category.categoryName",
        pub category_top_category_id: i64 => "gear_category.categoryTopCategoryId",
    }
}

record! {
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct GearListItem in "gear" join GEAR_JOINS {
        pub gear_id: i64 => "gear.gearId";
        pub gear_top_category_id: i64 => "gear.gearTopCategoryId",
        pub gear_category_id: i64 => "gear.gearCategoryId",
        pub gear_manufacture_id: i64 => "gear.gearManufactureId",
        pub gear_is_container: bool => "gear.gearIsContainer",
        pub gear_name: String => "gear.gearName",
        pub gear_size_definition: String => "gear.gearSizeDefinition",
        pub manufacture_id: i64 => "manufacture.manufactureId",
        pub manufacture_name: String => "manufacture.manufactureName",
        pub top_category_id: i64 => "gear_top_category.topCategoryId",
        pub top_category_name: String => "gear_top_category.topCategoryName",
        pub category_id: i64 => "gear_category.categoryId",
        pub category_name: String => "gear_category.categoryName",
        pub category_top_category_id: i64 => "gear_category.categoryTopCategoryId",
    }
}

const CATEGORY_JOINS: [&str; 1] = [
    "LEFT JOIN gear_top_category ON gear_category.categoryTopCategoryId = gear_top_category.topCategoryId",
];

record! {
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct CategoryListItem in "gear_category" join CATEGORY_JOINS {
        pub category_id: i64 => "gear_category.categoryId";
        pub category_top_category_id: i64 => "gear_category.categoryTopCategoryId",
        pub category_name: String => "gear_category.categoryName",
        pub top_category_id: Option<i64> => "gear_top_category.topCategoryId",
        pub top_category_name: Option<String> => "gear_top_category.topCategoryName",
        pub top_category_icon: Option<String> => "gear_top_category.topCategoryIcon",
    }
}

const USER_GEAR_JOINS: [&str; 6] = [
    "LEFT JOIN user_container_registration ON user_gear_registrations.userGearRegistrationId = user_container_registration.userGearRegistrationId",
    "LEFT JOIN gear ON user_gear_registrations.gearId = gear.gearId",
    "LEFT JOIN users ON user_gear_registrations.userId = users.userId",
    "LEFT JOIN manufacture ON gear.gearManufactureId = manufacture.manufactureId",
    "LEFT JOIN gear_top_category ON gear.gearTopCategoryId = gear_top_category.topCategoryId",
    "LEFT JOIN gear_category ON gear.gearCategoryId = gear_category.categoryId",
];

// A registration belongs to at most one container (unique index on
// `user_container_registration.userGearRegistrationId`), so the container
// join never fans out.
record! {
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct UserGear in "user_gear_registrations" join USER_GEAR_JOINS {
        pub usergear_registration_id: i64 => "user_gear_registrations.userGearRegistrationId";
        pub usergear_gear_id: i64 => "user_gear_registrations.gearId",
        pub usergear_user_id: i64 => "user_gear_registrations.userId",
        pub user_id: i64 => "users.userId",
        pub user_username: String => "users.userUsername",
        pub user_name: String => "users.userName",
        pub gear_id: i64 => "gear.gearId",
        pub gear_top_category_id: i64 => "gear.gearTopCategoryId",
        pub gear_category_id: i64 => "gear.gearCategoryId",
        pub gear_manufacture_id: i64 => "gear.gearManufactureId",
        pub gear_name: String => "gear.gearName",
        pub gear_weight: i64 => "gear.gearWeight",
        pub gear_height: i64 => "gear.gearHeight",
        pub gear_length: i64 => "gear.gearLength",
        pub gear_width: i64 => "gear.gearWidth",
        pub gear_status: bool => "gear.gearStatus",
        pub gear_is_container: bool => "gear.gearIsContainer",
        pub container_link_id: Option<i64> => "user_container_registration.containerRegistrationId",
        pub container_registration_id: Option<i64> => "user_container_registration.userContainerId",
        pub manufacture_id: i64 => "manufacture.manufactureId",
        pub manufacture_name: String => "manufacture.manufactureName",
        pub top_category_id: i64 => "gear_top_category.topCategoryId",
        pub top_category_name: String => "gear_top_category.topCategoryName",
        pub category_id: i64 => "gear_category.categoryId",
        pub category_name: String => "gear_category.categoryName",
        pub category_top_category_id: i64 => "gear_category.categoryTopCategoryId",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::descriptor::Record;
    use crate::database::mapper::{fetch_by_id, insert};
    use crate::database::test_support::{memory_db, seed_catalog};

    #[test]
    fn gear_payload_without_id_decodes() {
        let gear: Gear = serde_json::from_str(
            r#"{"gear_top_category_id":1,"gear_category_id":2,"gear_manufacture_id":3,"gear_name":"Tarp"}"#,
        )
        .unwrap();
        assert_eq!(gear.gear_id, None);
        assert_eq!(gear.gear_weight, 0);
        assert!(!gear.gear_status);
    }

    #[test]
    fn user_json_never_mentions_password() {
        let user = User {
            user_id: Some(1),
            user_username: "kari".into(),
            user_name: "Kari".into(),
            user_email: Some("kari@example.com".into()),
            user_is_admin: false,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("user_password").is_none());
        assert!(User::FIELDS.iter().all(|f| f.column != "userPassword"));
    }

    #[test]
    fn blank_email_is_treated_as_missing() {
        let user = User {
            user_id: None,
            user_username: "x".into(),
            user_name: String::new(),
            user_email: Some("  ".into()),
            user_is_admin: false,
        };
        assert_eq!(user.email(), None);
    }

    #[test]
    fn projections_are_keyed_on_qualified_columns() {
        assert_eq!(FullGear::FIELDS[0].column, "gear.gearId");
        assert_eq!(
            UserGear::FIELDS[0].column,
            "user_gear_registrations.userGearRegistrationId"
        );
        assert_eq!(UserGear::JOINS.len(), 6);
        assert!(Gear::JOINS.is_empty());
    }

    #[tokio::test]
    async fn full_gear_joins_names() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();
        let seeded = seed_catalog(&mut conn).await;

        let full: FullGear = fetch_by_id(&mut conn, seeded.gear_id).await.unwrap();
        assert_eq!(full.manufacture_name, "Hilleberg");
        assert_eq!(full.top_category_name, "Shelter");
        assert_eq!(full.category_name, "Tents");
        assert_eq!(full.category_top_category_id, full.top_category_id);
    }

    #[tokio::test]
    async fn user_gear_without_container_has_null_links() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();
        let seeded = seed_catalog(&mut conn).await;

        let payload = format!(
            r#"{{"usergear_gear_id":{},"usergear_user_id":{}}}"#,
            seeded.gear_id, seeded.user_id
        );
        let link: UserGearLink = insert(&mut conn, payload.as_bytes()).await.unwrap();

        let view: UserGear = fetch_by_id(&mut conn, link.usergear_registration_id.unwrap())
            .await
            .unwrap();
        assert_eq!(view.user_username, "kari");
        assert_eq!(view.gear_name, "Keron 3 GT");
        assert_eq!(view.container_link_id, None);
        assert_eq!(view.container_registration_id, None);
    }
}
