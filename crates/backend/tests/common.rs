#![expect(clippy::unwrap_used)]

use log::LevelFilter;
use std::{
    ops::Deref,
    sync::{
        Once,
        atomic::{AtomicI32, Ordering},
    },
};
use threadlab::start;
use threadlab_api_client::{
    ApiClient,
    article::CreateArticleParams,
};
use threadlab_database::{
    common::{article::Article, comment::Comment, newtypes::CommentId},
    config::{StoreBackend, ThreadlabConfig, ThreadlabConfigDatabase, ThreadlabConfigSetup},
};
use tokio::{sync::oneshot, task::JoinHandle};

pub const ADMIN_TOKEN: &str = "test-admin-token";

/// Server with in-memory storage, an admin client and a reader client. Each client keeps its
/// own cookies, so they act like two different browsers.
pub struct TestServer {
    pub admin: ApiClient,
    pub reader: ApiClient,
    pub hostname: String,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        static INIT: Once = Once::new();
        INIT.call_once(|| {
            env_logger::builder()
                .filter_level(LevelFilter::Warn)
                //.filter_module("threadlab", LevelFilter::Debug)
                .init();
        });

        // Run things on different ports to allow parallel tests
        static COUNTER: AtomicI32 = AtomicI32::new(0);
        let port = 8200 + COUNTER.fetch_add(1, Ordering::Relaxed);

        let config = ThreadlabConfig {
            database: ThreadlabConfigDatabase {
                backend: StoreBackend::Memory,
                ..Default::default()
            },
            setup: ThreadlabConfigSetup {
                admin_token: Some(ADMIN_TOKEN.to_string()),
                seed_example_article: false,
            },
            ..Default::default()
        };
        let hostname = format!("localhost:{port}");
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::task::spawn(async move {
            let bind = format!("127.0.0.1:{port}");
            start(config, Some(bind.parse().unwrap()), Some(tx))
                .await
                .unwrap();
        });
        // wait for the backend to start
        rx.await.unwrap();
        Self {
            admin: ApiClient::new(hostname.clone())
                .unwrap()
                .with_admin_token(ADMIN_TOKEN),
            reader: ApiClient::new(hostname.clone()).unwrap(),
            hostname,
            handle,
        }
    }

    pub fn stop(self) {
        self.handle.abort();
    }

    pub async fn create_article(&self, default_comments: Vec<Comment>) -> Article {
        self.create_article_with(default_comments, true).await
    }

    pub async fn create_article_with(
        &self,
        default_comments: Vec<Comment>,
        show_default_comments: bool,
    ) -> Article {
        let params = CreateArticleParams {
            title: "City council passes budget".to_string(),
            author: "Newsroom".to_string(),
            text: TEST_ARTICLE_TEXT.to_string(),
            study_id: None,
            show_default_comments,
            default_comments,
        };
        self.admin.create_article(&params).await.unwrap()
    }
}

impl Deref for TestServer {
    type Target = ApiClient;

    fn deref(&self) -> &Self::Target {
        &self.reader
    }
}

pub const TEST_ARTICLE_TEXT: &str = "The council approved the budget.\n";

pub fn seed_comment(id: &str, content: &str, replies: Vec<Comment>) -> Comment {
    Comment {
        id: CommentId::from(id),
        content: content.to_string(),
        name: "Researcher".to_string(),
        created_at: chrono::Utc::now(),
        upvotes: 2,
        downvotes: 1,
        parent_id: None,
        grand_parent_id: None,
        response_id: None,
        replies,
    }
}
