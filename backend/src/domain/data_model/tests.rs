//! Entity rules checked against the migrated table definitions.

use chrono::{NaiveDate, Utc};
use rstest::{fixture, rstest};
use uuid::Uuid;

use super::*;
use crate::domain::constraints::{ConstraintViolation, TableRows};
use crate::domain::migrations::MigrationChain;
use crate::domain::schema::SchemaDefinition;

#[fixture]
fn schema() -> SchemaDefinition {
    MigrationChain::pantry()
        .and_then(|chain| chain.final_schema())
        .expect("chain applies")
}

fn rows_for<T: TableRow>(schema: &SchemaDefinition) -> TableRows {
    TableRows::new(schema.table(T::TABLE).expect("table exists").clone())
}

fn user(email: &str, phone: &str, country_code: &str) -> User {
    User::new(
        Uuid::new_v4(),
        Email::new(email).expect("valid email"),
        phone,
        country_code,
        "Ada",
        "hash",
    )
    .expect("valid user")
}

#[rstest]
fn same_phone_in_same_country_is_rejected(schema: SchemaDefinition) {
    let mut users = rows_for::<User>(&schema);
    users
        .insert(user("a@example.com", "5551234", "+1").to_row())
        .expect("first user");
    let err = users
        .insert(user("b@example.com", "5551234", "+1").to_row())
        .expect_err("duplicate phone");
    assert_eq!(
        err,
        ConstraintViolation::Unique {
            table: "users".into(),
            constraint: "unique_phone_per_country".into()
        }
    );
}

#[rstest]
fn same_phone_in_another_country_is_accepted(schema: SchemaDefinition) {
    let mut users = rows_for::<User>(&schema);
    users
        .insert(user("a@example.com", "5551234", "+1").to_row())
        .expect("first user");
    users
        .insert(user("b@example.com", "5551234", "+44").to_row())
        .expect("different country");
    assert_eq!(users.len(), 2);
}

#[rstest]
fn emails_are_unique_case_insensitively(schema: SchemaDefinition) {
    let mut users = rows_for::<User>(&schema);
    users
        .insert(user("Ada@Example.com", "1", "+1").to_row())
        .expect("first user");
    let err = users
        .insert(user("ada@example.com", "2", "+1").to_row())
        .expect_err("same email");
    assert!(matches!(
        err,
        ConstraintViolation::Unique { constraint, .. } if constraint == "users_email_key"
    ));
}

#[rstest]
#[case("", "+1", "phone")]
#[case("1234567890123456", "+1", "phone")]
#[case("12-34", "+1", "phone")]
#[case("123", "+12345", "country_code")]
#[case("123", "uk", "country_code")]
fn invalid_phone_details_are_rejected(
    #[case] phone: &str,
    #[case] country_code: &str,
    #[case] field: &str,
) {
    let err = User::new(
        Uuid::new_v4(),
        Email::new("a@example.com").expect("valid email"),
        phone,
        country_code,
        "Ada",
        "hash",
    )
    .expect_err("invalid");
    let reported = match err {
        DataModelError::Empty { field }
        | DataModelError::TooLong { field, .. }
        | DataModelError::Invalid { field, .. } => field,
        other => panic!("unexpected error {other:?}"),
    };
    assert_eq!(reported, field);
}

#[rstest]
fn self_friendship_is_rejected() {
    let id = Uuid::new_v4();
    assert_eq!(FriendPair::new(id, id), Err(DataModelError::SelfRelation));
}

#[rstest]
fn symmetric_friendship_is_rejected(schema: SchemaDefinition) {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let mut friendships = rows_for::<Friendship>(&schema);
    let forward = Friendship::new(Uuid::new_v4(), FriendPair::new(a, b).expect("pair"));
    let backward = Friendship::new(Uuid::new_v4(), FriendPair::new(b, a).expect("pair"));
    assert_eq!(forward.pair(), backward.pair());

    friendships.insert(forward.to_row()).expect("first friendship");
    let err = friendships
        .insert(backward.to_row())
        .expect_err("symmetric duplicate");
    assert_eq!(
        err,
        ConstraintViolation::Unique {
            table: "friendships".into(),
            constraint: "unique_friendship".into()
        }
    );
}

#[rstest]
fn friend_requests_are_directed(schema: SchemaDefinition) {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let mut requests = rows_for::<FriendRequest>(&schema);
    let request = |from, to| {
        FriendRequest::new(Uuid::new_v4(), from, to, None)
            .expect("distinct users")
            .to_row()
    };

    requests.insert(request(a, b)).expect("a to b");
    requests.insert(request(b, a)).expect("b to a");
    let err = requests.insert(request(a, b)).expect_err("repeat");
    assert!(matches!(
        err,
        ConstraintViolation::Unique { constraint, .. } if constraint == "unique_friend_request"
    ));
}

#[rstest]
fn self_friend_request_is_rejected_by_entity_and_table(schema: SchemaDefinition) {
    let a = Uuid::new_v4();
    assert_eq!(
        FriendRequest::new(Uuid::new_v4(), a, a, None),
        Err(DataModelError::SelfRelation)
    );

    let mut requests = rows_for::<FriendRequest>(&schema);
    let mut row = FriendRequest::new(Uuid::new_v4(), a, Uuid::new_v4(), None)
        .expect("distinct users")
        .to_row();
    row.insert("to_user_id".into(), uuid_value(a));
    assert!(matches!(
        requests.insert(row),
        Err(ConstraintViolation::Check { constraint, .. }) if constraint == "no_self_friend_request"
    ));
}

#[rstest]
fn accepting_a_request_creates_a_canonical_friendship() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let mut request = FriendRequest::new(Uuid::new_v4(), b, a, Some("hi".into())).expect("request");
    let friendship = request.accept(Uuid::new_v4(), Utc::now()).expect("pending");
    assert_eq!(request.status(), FriendRequestStatus::Accepted);
    assert!(request.responded_at().is_some());
    assert_eq!(friendship.pair(), FriendPair::new(a, b).expect("pair"));
    assert!(request.reject(Utc::now()).is_err());
}

#[rstest]
fn collaborators_are_unique_per_list(schema: SchemaDefinition) {
    let (list, user) = (Uuid::new_v4(), Uuid::new_v4());
    let mut collaborators = rows_for::<ListCollaborator>(&schema);
    let invite = ListCollaborator::invite(Uuid::new_v4(), list, user, PermissionLevel::Editor);
    collaborators.insert(invite.to_row()).expect("first");
    let again = ListCollaborator::invite(Uuid::new_v4(), list, user, PermissionLevel::Viewer);
    assert!(collaborators.insert(again.to_row()).is_err());
}

#[rstest]
fn collaborator_invitations_answer_once() {
    let mut invite = ListCollaborator::invite(
        Uuid::new_v4(),
        Uuid::new_v4(),
        Uuid::new_v4(),
        PermissionLevel::Viewer,
    );
    invite.accept(Utc::now()).expect("pending");
    assert_eq!(invite.status(), CollaboratorStatus::Accepted);
    assert!(invite.joined_at().is_some());
    assert!(invite.decline().is_err());
}

#[rstest]
#[case(0.0)]
#[case(-1.0)]
#[case(f64::NAN)]
fn shopping_item_quantity_must_be_positive(#[case] quantity: f64) {
    assert!(ShoppingItem::new(Uuid::new_v4(), Uuid::new_v4(), "Milk", quantity, "l").is_err());
}

#[rstest]
fn priced_items_carry_a_currency() {
    let mut item =
        ShoppingItem::new(Uuid::new_v4(), Uuid::new_v4(), "Milk", 2.0, "l").expect("valid item");
    assert_eq!(item.currency(), None);
    item.set_estimated_price(3.5, CurrencyCode::new("eur").expect("code"))
        .expect("price");
    assert_eq!(item.currency().map(CurrencyCode::as_str), Some("EUR"));
    item.complete(Utc::now(), None).expect("complete");
    assert!(item.is_completed());
}

#[rstest]
#[case("US")]
#[case("USDX")]
#[case("U5D")]
fn currency_codes_are_three_letters(#[case] code: &str) {
    assert!(CurrencyCode::new(code).is_err());
}

#[rstest]
fn pantry_quantities_may_be_zero_but_not_negative() {
    let mut item =
        PantryItem::new(Uuid::new_v4(), Uuid::new_v4(), "Rice", 0.0, "kg").expect("zero stock");
    assert!(item.is_low_stock());
    assert!(item.set_quantity(-0.5).is_err());
    assert!(item.set_low_stock_threshold(-1.0).is_err());
    item.set_quantity(5.0).expect("restock");
    assert!(!item.is_low_stock());
}

#[rstest]
fn pantry_expiry_is_inclusive() {
    let mut item =
        PantryItem::new(Uuid::new_v4(), Uuid::new_v4(), "Milk", 1.0, "l").expect("valid item");
    let day = NaiveDate::from_ymd_opt(2025, 9, 15).expect("valid date");
    assert!(!item.is_expired(day));
    item.expiration_date = Some(day);
    assert!(item.is_expired(day));
    assert!(!item.is_expired(day.pred_opt().expect("previous day")));
}

#[rstest]
fn security_settings_reject_zero_values() {
    let mut settings = SecuritySettings::defaults_for(Uuid::new_v4(), Uuid::new_v4());
    assert_eq!(settings.session_timeout(), 1800);
    assert_eq!(settings.max_sessions(), 5);
    assert!(settings.set_session_timeout(0).is_err());
    assert!(settings.set_max_sessions(0).is_err());
    settings.set_max_sessions(3).expect("positive");
    assert_eq!(settings.max_sessions(), 3);
}

#[rstest]
fn preference_defaults_match_the_table(schema: SchemaDefinition) {
    let preferences = UserPreferences::defaults_for(Uuid::new_v4(), Uuid::new_v4());
    let row = preferences.to_row();
    let table = schema.table("user_preferences").expect("table exists");
    for column in ["theme", "language", "currency", "notification_settings", "privacy_settings"] {
        let default = table
            .find_column(column)
            .and_then(|c| c.default.clone())
            .expect("column has a default");
        let expected = match default {
            crate::domain::schema::ColumnDefault::Text(text) => serde_json::Value::from(text),
            crate::domain::schema::ColumnDefault::Json(json) => json,
            other => panic!("unexpected default {other:?}"),
        };
        assert_eq!(row.get(column), Some(&expected), "default of {column}");
    }
}

#[rstest]
fn preferences_are_one_per_user(schema: SchemaDefinition) {
    let user_id = Uuid::new_v4();
    let mut preferences = rows_for::<UserPreferences>(&schema);
    preferences
        .insert(UserPreferences::defaults_for(Uuid::new_v4(), user_id).to_row())
        .expect("first");
    assert!(
        preferences
            .insert(UserPreferences::defaults_for(Uuid::new_v4(), user_id).to_row())
            .is_err()
    );
}

#[rstest]
#[case("#00ff7f", Ok("#00FF7F"))]
#[case("00ff7f", Err(()))]
#[case("#00ff7", Err(()))]
#[case("#00ffzz", Err(()))]
fn category_colours_are_hex(#[case] raw: &str, #[case] expected: Result<&str, ()>) {
    let parsed = HexColor::new(raw);
    assert_eq!(parsed.as_ref().map(HexColor::as_str).map_err(|_| ()), expected);
}

#[rstest]
#[case("archived", Ok(ListStatus::Archived))]
#[case("deleted", Err(()))]
fn list_statuses_parse(#[case] raw: &str, #[case] expected: Result<ListStatus, ()>) {
    assert_eq!(raw.parse::<ListStatus>().map_err(|_| ()), expected);
}

#[rstest]
fn activity_tags_are_bounded() {
    assert!(ActivityLog::record(Uuid::new_v4(), Uuid::new_v4(), "list", None, "created").is_ok());
    assert!(
        ActivityLog::record(Uuid::new_v4(), Uuid::new_v4(), "x".repeat(51), None, "created")
            .is_err()
    );
}
