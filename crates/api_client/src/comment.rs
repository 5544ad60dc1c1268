use super::{ApiClient, ClientResult};
use serde::{Deserialize, Serialize};
use threadlab_database::common::{
    comment::Comment,
    newtypes::{ArticleId, CommentId},
};
use threadlab_discussion::voting::{VoteOutcome, VoteState};

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct CreateCommentParams {
    pub article_id: ArticleId,
    pub content: String,
    pub name: Option<String>,
    /// Empty for a top-level comment, otherwise the ids from the top-level comment down to
    /// the comment being replied to
    #[serde(default)]
    pub ancestor_ids: Vec<CommentId>,
    pub response_id: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct DeleteCommentParams {
    pub article_id: ArticleId,
    pub comment_id: CommentId,
    pub parent_id: Option<CommentId>,
    pub grand_parent_id: Option<CommentId>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct DeleteCommentResponse {
    pub deleted: usize,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct VoteParams {
    pub article_id: ArticleId,
    pub comment_id: CommentId,
    #[serde(default)]
    pub ancestor_ids: Vec<CommentId>,
    /// State the vote of this browser should have afterwards
    pub vote: VoteState,
    pub response_id: Option<String>,
}

impl ApiClient {
    pub async fn create_comment(&self, params: &CreateCommentParams) -> ClientResult<Comment> {
        self.post("/api/v1/comment", Some(params)).await
    }

    pub async fn delete_comment(
        &self,
        params: &DeleteCommentParams,
    ) -> ClientResult<DeleteCommentResponse> {
        self.delete("/api/v1/comment", Some(params)).await
    }

    pub async fn vote(&self, params: &VoteParams) -> ClientResult<VoteOutcome> {
        self.post("/api/v1/comment/vote", Some(params)).await
    }
}
