//! Tests for the auth service.

use std::sync::Arc;

use super::*;
use crate::domain::ports::{MockPasswordHasher, MockTokenIssuer, MockUserRepository};
use crate::domain::{EmailAddress, PersonName, TokenPair};
use rstest::{fixture, rstest};

type Service = AuthService<MockUserRepository, MockPasswordHasher, MockTokenIssuer>;

fn make_service(
    users: MockUserRepository,
    hasher: MockPasswordHasher,
    tokens: MockTokenIssuer,
) -> Service {
    AuthService::new(Arc::new(users), Arc::new(hasher), Arc::new(tokens))
}

#[fixture]
fn account() -> UserAccount {
    let now = Utc::now();
    UserAccount {
        user: User {
            id: UserId::random(),
            email: EmailAddress::new("ada@example.com").expect("valid email"),
            first_name: PersonName::from_trusted("Ada".to_owned()),
            last_name: PersonName::from_trusted("Lovelace".to_owned()),
            role: UserRole::Customer,
            created_at: now,
            updated_at: now,
        },
        password_hash: HashedPassword::new("$argon2id$stub"),
        refresh_token: Some(RefreshTokenFingerprint::of("current-refresh")),
    }
}

fn registration() -> RegistrationDetails {
    RegistrationDetails::try_from_parts("Ada@Example.com", "correct horse", "Ada", "Lovelace")
        .expect("valid registration")
}

fn issuing_tokens(access: &'static str, refresh: &'static str) -> MockTokenIssuer {
    let mut tokens = MockTokenIssuer::new();
    tokens.expect_issue().returning(move |_| {
        Ok(TokenPair {
            access_token: access.to_owned(),
            refresh_token: refresh.to_owned(),
        })
    });
    tokens
}

#[rstest]
#[tokio::test]
async fn register_creates_customer_and_stores_refresh_fingerprint() {
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_email()
        .times(1)
        .return_once(|_| Ok(None));
    users
        .expect_insert()
        .withf(|account: &UserAccount| {
            account.user.email.as_ref() == "ada@example.com"
                && account.user.role == UserRole::Customer
                && account.password_hash.as_str() == "hashed"
                && account.refresh_token == Some(RefreshTokenFingerprint::of("refresh-1"))
        })
        .times(1)
        .return_once(|_| Ok(()));
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_hash()
        .withf(|password| password == "correct horse")
        .times(1)
        .return_once(|_| Ok(HashedPassword::new("hashed")));

    let service = make_service(users, hasher, issuing_tokens("access-1", "refresh-1"));
    let session = service.register(registration()).await.expect("registered");

    assert_eq!(session.tokens.access_token, "access-1");
    assert_eq!(session.user.first_name.as_ref(), "Ada");
}

#[rstest]
#[tokio::test]
async fn register_rejects_duplicate_email(account: UserAccount) {
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_email()
        .return_once(move |_| Ok(Some(account)));
    users.expect_insert().times(0);
    let mut hasher = MockPasswordHasher::new();
    hasher.expect_hash().times(0);

    let service = make_service(users, hasher, MockTokenIssuer::new());
    let error = service
        .register(registration())
        .await
        .expect_err("duplicate email");

    assert_eq!(error.code(), ErrorCode::Conflict);
    assert_eq!(error.message(), "User with this email already exists");
}

#[rstest]
#[tokio::test]
async fn register_maps_insert_race_to_conflict() {
    let mut users = MockUserRepository::new();
    users.expect_find_by_email().return_once(|_| Ok(None));
    users
        .expect_insert()
        .return_once(|_| Err(UserPersistenceError::duplicate_email()));
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_hash()
        .return_once(|_| Ok(HashedPassword::new("hashed")));

    let service = make_service(users, hasher, issuing_tokens("a", "r"));
    let error = service
        .register(registration())
        .await
        .expect_err("duplicate email");

    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn register_wraps_unexpected_failures() {
    let mut users = MockUserRepository::new();
    users.expect_find_by_email().return_once(|_| Ok(None));
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_hash()
        .return_once(|_| Err(PasswordHashError::hash("out of memory")));

    let service = make_service(users, hasher, MockTokenIssuer::new());
    let error = service
        .register(registration())
        .await
        .expect_err("hash failure");

    assert_eq!(error.code(), ErrorCode::InternalError);
    assert_eq!(error.message(), REGISTRATION_FAILED);
}

#[rstest]
#[case::unknown_email(false, true)]
#[case::wrong_password(true, false)]
#[tokio::test]
async fn login_rejects_bad_credentials_uniformly(
    account: UserAccount,
    #[case] known: bool,
    #[case] password_matches: bool,
) {
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_email()
        .return_once(move |_| Ok(known.then_some(account)));
    users.expect_set_refresh_token().times(0);
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_verify()
        .returning(move |_, _| Ok(password_matches));

    let service = make_service(users, hasher, MockTokenIssuer::new());
    let credentials =
        LoginCredentials::try_from_parts("ada@example.com", "guess").expect("credentials");
    let error = service.login(credentials).await.expect_err("rejected");

    assert_eq!(error.code(), ErrorCode::Unauthorized);
    assert_eq!(error.message(), INVALID_CREDENTIALS);
}

#[rstest]
#[tokio::test]
async fn login_rotates_refresh_fingerprint(account: UserAccount) {
    let user_id = account.user.id;
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_email()
        .return_once(move |_| Ok(Some(account)));
    users
        .expect_set_refresh_token()
        .withf(move |id, fingerprint| {
            *id == user_id && *fingerprint == Some(RefreshTokenFingerprint::of("refresh-2"))
        })
        .times(1)
        .return_once(|_, _| Ok(()));
    let mut hasher = MockPasswordHasher::new();
    hasher.expect_verify().return_once(|_, _| Ok(true));

    let service = make_service(users, hasher, issuing_tokens("access-2", "refresh-2"));
    let credentials =
        LoginCredentials::try_from_parts("ada@example.com", "correct horse").expect("credentials");
    let session = service.login(credentials).await.expect("logged in");

    assert_eq!(session.user.id, user_id);
    assert_eq!(session.tokens.refresh_token, "refresh-2");
}

#[rstest]
#[tokio::test]
async fn refresh_rejects_token_that_is_not_current(account: UserAccount) {
    let user_id = account.user.id;
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(account)));
    users.expect_set_refresh_token().times(0);

    let service = make_service(users, MockPasswordHasher::new(), MockTokenIssuer::new());
    let error = service
        .refresh(RefreshRequest {
            user_id,
            token: Zeroizing::new("stale-refresh".to_owned()),
        })
        .await
        .expect_err("revoked");

    assert_eq!(error.code(), ErrorCode::Unauthorized);
    assert_eq!(error.message(), "Refresh token revoked");
}

#[rstest]
#[tokio::test]
async fn refresh_rejects_after_logout(mut account: UserAccount) {
    account.refresh_token = None;
    let user_id = account.user.id;
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(account)));

    let service = make_service(users, MockPasswordHasher::new(), MockTokenIssuer::new());
    let error = service
        .refresh(RefreshRequest {
            user_id,
            token: Zeroizing::new("current-refresh".to_owned()),
        })
        .await
        .expect_err("logged out");

    assert_eq!(error.message(), "Refresh token revoked");
}

#[rstest]
#[tokio::test]
async fn refresh_rejects_unknown_user() {
    let mut users = MockUserRepository::new();
    users.expect_find_by_id().return_once(|_| Ok(None));

    let service = make_service(users, MockPasswordHasher::new(), MockTokenIssuer::new());
    let error = service
        .refresh(RefreshRequest {
            user_id: UserId::random(),
            token: Zeroizing::new("anything".to_owned()),
        })
        .await
        .expect_err("unknown user");

    assert_eq!(error.message(), "User not found");
}

#[rstest]
#[tokio::test]
async fn refresh_issues_new_pair_for_current_token(account: UserAccount) {
    let user_id = account.user.id;
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(account)));
    users
        .expect_set_refresh_token()
        .times(1)
        .return_once(|_, _| Ok(()));

    let service = make_service(
        users,
        MockPasswordHasher::new(),
        issuing_tokens("access-3", "refresh-3"),
    );
    let session = service
        .refresh(RefreshRequest {
            user_id,
            token: Zeroizing::new("current-refresh".to_owned()),
        })
        .await
        .expect("refreshed");

    assert_eq!(session.tokens.refresh_token, "refresh-3");
}

#[rstest]
#[tokio::test]
async fn logout_clears_refresh_fingerprint() {
    let user_id = UserId::random();
    let mut users = MockUserRepository::new();
    users
        .expect_set_refresh_token()
        .withf(move |id, fingerprint| *id == user_id && fingerprint.is_none())
        .times(1)
        .return_once(|_, _| Ok(()));

    let service = make_service(users, MockPasswordHasher::new(), MockTokenIssuer::new());
    service.logout(&user_id).await.expect("logged out");
}
