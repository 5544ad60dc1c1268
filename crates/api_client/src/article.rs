use super::{ApiClient, ClientResult};
use serde::{Deserialize, Serialize};
use threadlab_database::common::{
    article::{Article, ArticleView, Study},
    comment::Comment,
    newtypes::{ArticleId, StudyId},
};

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct GetArticleParams {
    pub id: ArticleId,
    /// Survey response id passed along from the survey, stored with the view in the logs
    pub response_id: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct ListArticlesParams {
    pub study_id: Option<StudyId>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct CreateArticleParams {
    pub title: String,
    pub author: String,
    pub text: String,
    pub study_id: Option<StudyId>,
    #[serde(default = "default_true")]
    pub show_default_comments: bool,
    /// Seed threads, ids are generated where missing
    #[serde(default)]
    pub default_comments: Vec<Comment>,
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct CreateStudyParams {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl ApiClient {
    pub async fn get_article(&self, params: &GetArticleParams) -> ClientResult<ArticleView> {
        self.get("/api/v1/article", Some(params)).await
    }

    pub async fn list_articles(&self, params: &ListArticlesParams) -> ClientResult<Vec<Article>> {
        self.get("/api/v1/article/list", Some(params)).await
    }

    pub async fn create_article(&self, params: &CreateArticleParams) -> ClientResult<Article> {
        self.post("/api/v1/article", Some(params)).await
    }

    pub async fn create_study(&self, params: &CreateStudyParams) -> ClientResult<Study> {
        self.post("/api/v1/study", Some(params)).await
    }

    pub async fn list_studies(&self) -> ClientResult<Vec<Study>> {
        self.get("/api/v1/study/list", None::<()>).await
    }
}
