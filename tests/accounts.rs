//! Account flows driven through the full router: registration with email
//! confirmation, login, the guest account, logout and profile updates.

use campus_hub::apps::accounts::repository as users;
use campus_hub::test_utils::{TEST_PASSWORD, TestApp, TestClient, TestUser};
use chrono::Duration;
use hyper::StatusCode;
use rstest::rstest;

async fn user_count(app: &TestApp) -> i64 {
	sqlx::query_scalar("SELECT COUNT(*) FROM users")
		.fetch_one(app.pool())
		.await
		.unwrap()
}

fn registration<'a>(username: &'a str, email: &'a str) -> Vec<(&'a str, &'a str)> {
	vec![
		("username", username),
		("email", email),
		("password", "s3cret-pass"),
		("confirm_password", "s3cret-pass"),
	]
}

/// Register and consume the resulting flash message.
async fn register(client: &mut TestClient, username: &str, email: &str) {
	let response = client.post_form("/auth/register", &registration(username, email)).await;
	client.follow(&response).await;
}

/// The confirmation token from the last mail sent.
fn mailed_token(app: &TestApp) -> String {
	let mail = app.mailer.messages().pop().expect("confirmation mail");
	let (_, token) = mail.body().split_once("/auth/confirm/").expect("confirmation link");
	token.trim().to_string()
}

#[rstest]
#[tokio::test]
async fn test_registration_mails_link_and_sets_rate_limit() {
	// Arrange
	let app = TestApp::new().await;
	let mut client = app.client();

	// Act
	let response = client
		.post_form("/auth/register", &registration("alice", "alice@campus.test"))
		.await;

	// Assert
	assert_eq!(response.status(), StatusCode::FOUND);
	assert_eq!(response.location(), Some("/auth/login"));
	assert!(client.cookie("rate_limit").is_some());
	let user = users::find_by_username(app.pool(), "alice").await.unwrap().unwrap();
	assert!(!user.is_confirmed);
	let mail = app.mailer.messages().pop().unwrap();
	assert_eq!(mail.to(), ["alice@campus.test".to_string()]);
	assert!(mail.body().contains("http://testserver/auth/confirm/"));
	let page = client.follow(&response).await;
	assert_eq!(
		page.message_texts(),
		vec!["Registration successful! Please check your email to confirm your account."]
	);
}

#[rstest]
#[tokio::test]
async fn test_second_registration_within_a_minute_is_rate_limited() {
	// Arrange
	let app = TestApp::new().await;
	let mut client = app.client();
	register(&mut client, "alice", "alice@campus.test").await;

	// Act
	let response = client
		.post_form("/auth/register", &registration("bob", "bob@campus.test"))
		.await;

	// Assert
	assert_eq!(response.location(), Some("/auth/register"));
	assert!(users::find_by_username(app.pool(), "bob").await.unwrap().is_none());
	let page = client.follow(&response).await;
	assert_eq!(page.message_texts(), vec!["Rate-limited. Wait a minute."]);

	app.clock.advance(Duration::seconds(61));
	let later = client
		.post_form("/auth/register", &registration("bob", "bob@campus.test"))
		.await;
	assert_eq!(later.location(), Some("/auth/login"));
	assert!(users::find_by_username(app.pool(), "bob").await.unwrap().is_some());
}

#[rstest]
#[case("alice", "other@campus.test")]
#[case("other", "alice@campus.test")]
#[case("temp", "temp@campus.test")]
#[tokio::test]
async fn test_duplicate_registration_creates_no_row(#[case] username: &str, #[case] email: &str) {
	// Arrange
	let app = TestApp::new().await;
	TestUser::new("alice").email("alice@campus.test").insert(app.pool()).await;
	let mut client = app.client();

	// Act
	let response = client
		.post_form("/auth/register", &registration(username, email))
		.await;

	// Assert
	assert_eq!(response.location(), Some("/auth/register"));
	assert_eq!(user_count(&app).await, 1);
	assert_eq!(app.mailer.count(), 0);
	let page = client.follow(&response).await;
	assert_eq!(
		page.message_texts(),
		vec!["Username or email already exists. Please choose another."]
	);
}

#[rstest]
#[tokio::test]
async fn test_password_mismatch_is_rejected() {
	let app = TestApp::new().await;
	let mut client = app.client();

	let response = client
		.post_form(
			"/auth/register",
			&[
				("username", "alice"),
				("email", "alice@campus.test"),
				("password", "one"),
				("confirm_password", "two"),
			],
		)
		.await;

	assert_eq!(user_count(&app).await, 0);
	let page = client.follow(&response).await;
	assert_eq!(page.message_texts(), vec!["Passwords don't match."]);
}

#[rstest]
#[tokio::test]
async fn test_mail_failure_keeps_account_without_rate_limit() {
	// Arrange
	let app = TestApp::new().await;
	app.mailer.set_failure(Some("smtp down"));
	let mut client = app.client();

	// Act
	let response = client
		.post_form("/auth/register", &registration("alice", "alice@campus.test"))
		.await;

	// Assert
	assert_eq!(response.location(), Some("/auth/login"));
	assert!(client.cookie("rate_limit").is_none());
	assert!(users::find_by_username(app.pool(), "alice").await.unwrap().is_some());
	let page = client.follow(&response).await;
	assert_eq!(
		page.message_texts(),
		vec!["Failed to send confirmation email. Please contact support."]
	);
}

#[rstest]
#[tokio::test]
async fn test_confirmation_link_confirms_account() {
	// Arrange
	let app = TestApp::new().await;
	let mut client = app.client();
	register(&mut client, "alice", "alice@campus.test").await;
	let token = mailed_token(&app);

	// Act
	let response = client.get(&format!("/auth/confirm/{}", token)).await;

	// Assert
	assert_eq!(response.location(), Some("/auth/login"));
	let user = users::find_by_username(app.pool(), "alice").await.unwrap().unwrap();
	assert!(user.is_confirmed);
	let page = client.follow(&response).await;
	assert_eq!(page.message_texts(), vec!["Email confirmed! You can now log in."]);
}

#[rstest]
#[case::expired(Duration::hours(1) + Duration::seconds(1), false, "The confirmation link has expired.")]
#[case::tampered(Duration::zero(), true, "Invalid confirmation link.")]
#[tokio::test]
async fn test_bad_confirmation_link_leaves_account_unconfirmed(
	#[case] wait: Duration,
	#[case] tamper: bool,
	#[case] expected: &str,
) {
	// Arrange
	let app = TestApp::new().await;
	let mut client = app.client();
	register(&mut client, "alice", "alice@campus.test").await;
	let mut token = mailed_token(&app);
	if tamper {
		token.insert(0, 'x');
	}
	app.clock.advance(wait);

	// Act
	let response = client.get(&format!("/auth/confirm/{}", token)).await;

	// Assert
	let user = users::find_by_username(app.pool(), "alice").await.unwrap().unwrap();
	assert!(!user.is_confirmed);
	let page = client.follow(&response).await;
	assert_eq!(page.message_texts(), vec![expected]);
}

#[rstest]
#[tokio::test]
async fn test_confirmation_for_unknown_user() {
	let app = TestApp::new().await;
	let token = app.state.signer.sign("ghost@campus.test");
	let mut client = app.client();

	let response = client.get(&format!("/auth/confirm/{}", token)).await;

	let page = client.follow(&response).await;
	assert_eq!(page.message_texts(), vec!["User not found."]);
}

#[rstest]
#[tokio::test]
async fn test_unconfirmed_login_establishes_no_session() {
	// Arrange
	let app = TestApp::new().await;
	TestUser::new("alice").unconfirmed().insert(app.pool()).await;
	let mut client = app.client();

	// Act
	let response = client
		.post_form("/auth/login", &[("username", "alice"), ("password", TEST_PASSWORD)])
		.await;

	// Assert
	assert_eq!(response.location(), Some("/auth/login"));
	let page = client.follow(&response).await;
	assert_eq!(
		page.message_texts(),
		vec!["Please confirm your email before logging in."]
	);
	let dashboard = client.get("/lost-and-found/").await;
	assert!(dashboard.location().unwrap().starts_with("/auth/login?next="));
}

#[rstest]
#[case("alice", "wrong-password")]
#[case("nobody", TEST_PASSWORD)]
#[tokio::test]
async fn test_bad_credentials_share_one_message(#[case] username: &str, #[case] password: &str) {
	let app = TestApp::new().await;
	TestUser::new("alice").insert(app.pool()).await;
	let mut client = app.client();

	let response = client
		.post_form("/auth/login", &[("username", username), ("password", password)])
		.await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(response.message_texts(), vec!["Invalid username or password"]);
	assert!(client.cookie("sessionid").is_none());
}

#[rstest]
#[case("/marketplace/", "/marketplace/")]
#[case("//evil.example/", "/lost-and-found/")]
#[case("https://evil.example/", "/lost-and-found/")]
#[tokio::test]
async fn test_login_redirects_to_safe_next(#[case] next: &str, #[case] expected: &str) {
	// Arrange
	let app = TestApp::new().await;
	let alice = TestUser::new("alice").insert(app.pool()).await;
	let mut client = app.client();

	// Act
	let response = client
		.post_form(
			"/auth/login",
			&[("username", "alice"), ("password", TEST_PASSWORD), ("next", next)],
		)
		.await;

	// Assert
	assert_eq!(response.location(), Some(expected));
	assert!(client.cookie("sessionid").is_some());
	let stored = users::find_by_id(app.pool(), alice.id).await.unwrap().unwrap();
	assert!(stored.last_login.is_some());
}

#[rstest]
#[tokio::test]
async fn test_anonymous_requests_are_sent_to_login() {
	let app = TestApp::new().await;
	let mut client = app.client();

	let response = client.get("/marketplace/item/3").await;

	assert_eq!(response.status(), StatusCode::FOUND);
	assert_eq!(
		response.location(),
		Some("/auth/login?next=%2Fmarketplace%2Fitem%2F3")
	);
}

#[rstest]
#[tokio::test]
async fn test_root_redirect_follows_authentication() {
	let app = TestApp::new().await;
	TestUser::new("alice").insert(app.pool()).await;

	let anonymous = app.client().get("/").await;
	let mut client = app.login("alice").await;
	let authenticated = client.get("/").await;

	assert_eq!(anonymous.location(), Some("/auth/login"));
	assert_eq!(authenticated.location(), Some("/lost-and-found/"));
}

#[rstest]
#[tokio::test]
async fn test_continue_without_login() {
	// Arrange
	let app = TestApp::new().await;
	let mut client = app.client();

	// Act
	let missing = client.get("/auth/continue_without_login").await;
	users::ensure_guest(app.pool(), app.state.hasher.as_ref(), app.state.now())
		.await
		.unwrap();
	let present = client.get("/auth/continue_without_login").await;

	// Assert
	assert_eq!(missing.location(), Some("/auth/login"));
	assert_eq!(present.location(), Some("/lost-and-found/"));
	let dashboard = client.get("/lost-and-found/").await;
	assert_eq!(dashboard.json()["user"]["username"], "temp");
}

#[rstest]
#[tokio::test]
async fn test_logout_ends_session() {
	let app = TestApp::new().await;
	TestUser::new("alice").insert(app.pool()).await;
	let mut client = app.login("alice").await;

	let response = client.get("/auth/logout").await;

	assert_eq!(response.location(), Some("/auth/login"));
	let page = client.follow(&response).await;
	assert_eq!(page.message_texts(), vec!["You have been logged out."]);
	let dashboard = client.get("/lost-and-found/").await;
	assert!(dashboard.location().unwrap().starts_with("/auth/login"));
}

#[rstest]
#[case::username_taken(&[("username", "bob")], "Username already taken.")]
#[case::guest_name_reserved(&[("username", "temp")], "Username already taken.")]
#[case::email_taken(&[("email", "bob@campus.test")], "Email already taken.")]
#[case::mismatch(
	&[("new_password", "new-pass"), ("confirm_password", "other"), ("current_password", TEST_PASSWORD)],
	"Passwords do not match."
)]
#[case::wrong_current(
	&[("new_password", "new-pass"), ("confirm_password", "new-pass"), ("current_password", "nope")],
	"Current password is incorrect."
)]
#[tokio::test]
async fn test_rejected_profile_update_writes_nothing(#[case] fields: &[(&str, &str)], #[case] expected: &str) {
	// Arrange
	let app = TestApp::new().await;
	let alice = TestUser::new("alice").insert(app.pool()).await;
	TestUser::new("bob").insert(app.pool()).await;
	let mut client = app.login("alice").await;
	let mut form = vec![("role", "staff")];
	form.extend_from_slice(fields);

	// Act
	let response = client.post_form("/auth/update_profile", &form).await;

	// Assert
	assert_eq!(response.location(), Some("/auth/profile"));
	let stored = users::find_by_id(app.pool(), alice.id).await.unwrap().unwrap();
	assert_eq!(
		(&stored.username, &stored.email, &stored.role, &stored.password),
		(&alice.username, &alice.email, &alice.role, &alice.password)
	);
	let page = client.follow(&response).await;
	assert_eq!(page.message_texts(), vec![expected]);
}

#[rstest]
#[tokio::test]
async fn test_profile_update_changes_password() {
	// Arrange
	let app = TestApp::new().await;
	let alice = TestUser::new("alice").insert(app.pool()).await;
	let mut client = app.login("alice").await;

	// Act
	let response = client
		.post_form(
			"/auth/update_profile",
			&[
				("username", "alice2"),
				("role", "staff"),
				("current_password", TEST_PASSWORD),
				("new_password", "new-pass"),
				("confirm_password", "new-pass"),
			],
		)
		.await;

	// Assert
	let page = client.follow(&response).await;
	assert_eq!(page.message_texts(), vec!["Profile updated successfully."]);
	let stored = users::find_by_id(app.pool(), alice.id).await.unwrap().unwrap();
	assert_eq!(stored.username, "alice2");
	assert_eq!(stored.role, "staff");
	assert!(app.state.hasher.verify("new-pass", &stored.password).unwrap());
}

#[rstest]
#[tokio::test]
async fn test_unknown_path_and_wrong_method() {
	let app = TestApp::new().await;
	let mut client = app.client();

	let missing = client.get("/nowhere").await;
	let wrong_method = client.post_form("/auth/confirm/abc", &[]).await;

	assert_eq!(missing.status(), StatusCode::NOT_FOUND);
	assert!(missing.json()["error"].is_string());
	assert_eq!(wrong_method.status(), StatusCode::METHOD_NOT_ALLOWED);
}
