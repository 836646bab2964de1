#![allow(dead_code)]

use barter_backend::auth::hash_password;
use barter_backend::client::ApiClient;
use barter_backend::config::AppConfig;
use barter_backend::models::*;
use barter_backend::repositories::*;
use barter_backend::workflow::BarterKind;
use barter_backend::AppState;
use sqlx::PgPool;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::net::TcpListener;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "correct horse battery";

/// Repositories over a `#[sqlx::test]` pool
pub struct TestDatabase {
    pub pool: PgPool,
    pub user_repo: Arc<UserRepository>,
    pub skill_repo: Arc<SkillRepository>,
    pub item_repo: Arc<ItemRepository>,
    pub barter_repo: Arc<BarterRepository>,
    pub tracking_repo: Arc<TrackingRepository>,
    pub session_repo: Arc<SessionRepository>,
    pub poll_repo: Arc<PollRepository>,
    pub message_repo: Arc<MessageRepository>,
}

impl TestDatabase {
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            user_repo: Arc::new(UserRepository::new(pool.clone())),
            skill_repo: Arc::new(SkillRepository::new(pool.clone())),
            item_repo: Arc::new(ItemRepository::new(pool.clone())),
            barter_repo: Arc::new(BarterRepository::new(pool.clone())),
            tracking_repo: Arc::new(TrackingRepository::new(pool.clone())),
            session_repo: Arc::new(SessionRepository::new(pool.clone())),
            poll_repo: Arc::new(PollRepository::new(pool.clone())),
            message_repo: Arc::new(MessageRepository::new(pool.clone())),
            pool,
        }
    }

    pub async fn create_user(&self, username: &str, points: i32) -> User {
        let password_hash = hash_password(TEST_PASSWORD).expect("Failed to hash password");
        self.user_repo
            .create(
                username,
                &format!("{}@example.org", username),
                &password_hash,
                points,
            )
            .await
            .expect("Failed to create user")
    }
}

/// Two users with one skill and one item each
pub struct TestFixtures {
    pub alice: User,
    pub bob: User,
    pub alice_skill: Skill,
    pub bob_skill: Skill,
    pub alice_item: Item,
    pub bob_item: Item,
}

impl TestFixtures {
    pub async fn create(db: &TestDatabase) -> Self {
        let alice = db.create_user("alice", 100).await;
        let bob = db.create_user("bob", 100).await;

        let alice_skill = db
            .skill_repo
            .create(alice.id, &new_skill("Sourdough baking", "cooking"))
            .await
            .expect("Failed to create skill");
        let bob_skill = db
            .skill_repo
            .create(bob.id, &new_skill("Guitar basics", "music"))
            .await
            .expect("Failed to create skill");
        let alice_item = db
            .item_repo
            .create(alice.id, &new_item("Camping tent", "outdoors"))
            .await
            .expect("Failed to create item");
        let bob_item = db
            .item_repo
            .create(bob.id, &new_item("Cordless drill", "tools"))
            .await
            .expect("Failed to create item");

        Self {
            alice,
            bob,
            alice_skill,
            bob_skill,
            alice_item,
            bob_item,
        }
    }

    /// Alice asks for Bob's drill in exchange for her tent
    pub fn item_request(&self) -> NewBarterRequest {
        NewBarterRequest {
            request_type: BarterKind::Item,
            to_user_id: self.bob.id,
            from_skill_id: None,
            to_skill_id: None,
            from_item_id: Some(self.alice_item.id),
            to_item_id: Some(self.bob_item.id),
            message: Some("Need it for a weekend".to_string()),
            barter_period: Some("1 week".to_string()),
        }
    }

    /// Alice offers baking lessons for guitar lessons
    pub fn skill_request(&self) -> NewBarterRequest {
        NewBarterRequest {
            request_type: BarterKind::Skill,
            to_user_id: self.bob.id,
            from_skill_id: Some(self.alice_skill.id),
            to_skill_id: Some(self.bob_skill.id),
            from_item_id: None,
            to_item_id: None,
            message: None,
            barter_period: None,
        }
    }
}

pub fn new_skill(title: &str, category: &str) -> NewSkill {
    NewSkill {
        title: title.to_string(),
        description: None,
        category: category.to_string(),
        proficiency: Proficiency::Intermediate,
    }
}

pub fn new_item(title: &str, category: &str) -> NewItem {
    NewItem {
        title: title.to_string(),
        description: Some("Well kept".to_string()),
        category: category.to_string(),
        condition: ItemCondition::Good,
        image_url: None,
    }
}

/// Full application served on an ephemeral port
pub struct TestApp {
    pub state: Arc<AppState>,
    pub base_url: String,
    _audit_dir: TempDir,
}

impl TestApp {
    pub async fn spawn(pool: PgPool) -> Self {
        let audit_dir = TempDir::new().expect("Failed to create audit dir");
        let config = AppConfig {
            audit_log_dir: audit_dir.path().to_path_buf(),
            ..AppConfig::default()
        };
        let state = Arc::new(AppState::new(pool, config).expect("Failed to build state"));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("listener address");
        let app = barter_backend::http::router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server error");
        });

        Self {
            state,
            base_url: format!("http://{}", addr),
            _audit_dir: audit_dir,
        }
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(self.base_url.clone())
    }

    /// Register `username` and return a logged-in client
    pub async fn register(&self, username: &str) -> (ApiClient, User) {
        let mut client = self.client();
        let auth = client
            .register(&RegisterRequest {
                username: username.to_string(),
                email: format!("{}@example.org", username),
                password: TEST_PASSWORD.to_string(),
                display_name: None,
            })
            .await
            .expect("Failed to register");
        (client, auth.user)
    }
}

pub fn assert_uuid_set_eq(mut left: Vec<Uuid>, mut right: Vec<Uuid>) {
    left.sort();
    right.sort();
    assert_eq!(left, right);
}
