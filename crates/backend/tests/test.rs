#![expect(clippy::unwrap_used)]

mod common;

use anyhow::Result;
use common::{TestServer, seed_comment};
use pretty_assertions::assert_eq;
use threadlab_api_client::{
    article::{CreateStudyParams, GetArticleParams, ListArticlesParams},
    comment::{CreateCommentParams, DeleteCommentParams, VoteParams},
    dashboard::{DashboardCommentsParams, DashboardLogsParams, LogInteractionParams},
};
use threadlab_database::common::{
    ANONYMOUS_NAME,
    comment::Comment,
    newtypes::{ArticleId, CommentId},
};
use threadlab_discussion::voting::{VoteCounts, VoteState};

fn comment_params(
    article_id: ArticleId,
    content: &str,
    name: Option<&str>,
    ancestor_ids: Vec<CommentId>,
) -> CreateCommentParams {
    CreateCommentParams {
        article_id,
        content: content.to_string(),
        name: name.map(str::to_string),
        ancestor_ids,
        response_id: Some("R_test".to_string()),
    }
}

fn get_params(id: ArticleId) -> GetArticleParams {
    GetArticleParams {
        id,
        response_id: Some("R_test".to_string()),
    }
}

#[tokio::test]
async fn test_comment_reply_and_delete() -> Result<()> {
    let data = TestServer::start().await;
    let article = data.create_article(vec![]).await;

    // top-level comment
    let first = data
        .create_comment(&comment_params(article.id, "Great read", Some("Alice"), vec![]))
        .await?;
    let view = data.get_article(&get_params(article.id)).await?;
    assert_eq!(1, view.comments.len());
    let node = &view.comments[0];
    assert_eq!(first.id, node.id);
    assert_eq!("Great read", node.content);
    assert_eq!("Alice", node.name);
    assert_eq!(None, node.parent_id);
    assert_eq!((0, 0), (node.upvotes, node.downvotes));
    assert!(!node.id.is_seed());

    // reply
    let reply = data
        .create_comment(&comment_params(article.id, "Agreed", None, vec![first.id.clone()]))
        .await?;
    assert_eq!(Some(first.id.clone()), reply.parent_id);
    assert_eq!(ANONYMOUS_NAME, reply.name);
    let view = data.get_article(&get_params(article.id)).await?;
    assert_eq!(1, view.comments[0].replies.len());
    assert_eq!(reply.id, view.comments[0].replies[0].id);

    // sub-reply carries both ancestors
    let sub_reply = data
        .create_comment(&comment_params(
            article.id,
            "Not sure",
            Some("Bob"),
            vec![first.id.clone(), reply.id.clone()],
        ))
        .await?;
    assert_eq!(Some(reply.id.clone()), sub_reply.parent_id);
    assert_eq!(Some(first.id.clone()), sub_reply.grand_parent_id);

    // no further nesting
    let too_deep = data
        .create_comment(&comment_params(
            article.id,
            "Too deep",
            None,
            vec![first.id.clone(), reply.id.clone(), sub_reply.id.clone()],
        ))
        .await;
    assert!(too_deep.is_err());

    // deleting needs admin
    let params = DeleteCommentParams {
        article_id: article.id,
        comment_id: first.id.clone(),
        parent_id: None,
        grand_parent_id: None,
    };
    assert!(data.delete_comment(&params).await.is_err());

    // delete cascades to all replies
    let res = data.admin.delete_comment(&params).await?;
    assert_eq!(3, res.deleted);
    let view = data.get_article(&get_params(article.id)).await?;
    assert!(view.comments.is_empty());

    // second delete finds nothing
    let res = data.admin.delete_comment(&params).await?;
    assert_eq!(0, res.deleted);

    data.stop();
    Ok(())
}

#[tokio::test]
async fn test_invalid_comments() -> Result<()> {
    let data = TestServer::start().await;
    let article = data
        .create_article(vec![seed_comment("default_intro", "Seed thread", vec![])])
        .await;

    let empty = comment_params(article.id, "  ", None, vec![]);
    assert!(data.create_comment(&empty).await.is_err());

    let unknown_parent = comment_params(article.id, "Hello", None, vec![CommentId::from("nope")]);
    assert!(data.create_comment(&unknown_parent).await.is_err());

    let seed_parent = comment_params(
        article.id,
        "Hello",
        None,
        vec![CommentId::from("default_intro")],
    );
    assert!(data.create_comment(&seed_parent).await.is_err());

    let unknown_article = comment_params(ArticleId(9999), "Hello", None, vec![]);
    assert!(data.create_comment(&unknown_article).await.is_err());

    // parent from a different article
    let other = data.create_article(vec![]).await;
    let parent = data
        .create_comment(&comment_params(other.id, "Elsewhere", None, vec![]))
        .await?;
    let wrong_article = comment_params(article.id, "Hello", None, vec![parent.id]);
    assert!(data.create_comment(&wrong_article).await.is_err());

    data.stop();
    Ok(())
}

#[tokio::test]
async fn test_vote_transitions() -> Result<()> {
    let data = TestServer::start().await;
    let article = data.create_article(vec![]).await;
    let comment = data
        .create_comment(&comment_params(article.id, "Great read", Some("Alice"), vec![]))
        .await?;
    let vote = |vote| VoteParams {
        article_id: article.id,
        comment_id: comment.id.clone(),
        ancestor_ids: vec![],
        vote,
        response_id: None,
    };
    let stored = |view: &threadlab_database::common::article::ArticleView| VoteCounts {
        upvotes: view.comments[0].upvotes,
        downvotes: view.comments[0].downvotes,
    };

    let up = data.vote(&vote(VoteState::Upvoted)).await?;
    assert_eq!(VoteState::Neutral, up.previous);
    assert_eq!(VoteCounts { upvotes: 1, downvotes: 0 }, up.counts);
    assert_eq!(1, up.persisted);
    let view = data.get_article(&get_params(article.id)).await?;
    assert_eq!(up.counts, stored(&view));

    // same state again changes nothing
    let again = data.vote(&vote(VoteState::Upvoted)).await?;
    assert_eq!(VoteState::Upvoted, again.previous);
    assert_eq!(0, again.persisted);

    // switching withdraws the upvote first
    let down = data.vote(&vote(VoteState::Downvoted)).await?;
    assert_eq!(VoteState::Upvoted, down.previous);
    assert_eq!(VoteCounts { upvotes: 0, downvotes: 1 }, down.counts);
    assert_eq!(2, down.persisted);

    // another browser votes independently
    let admin_vote = data.admin.vote(&vote(VoteState::Downvoted)).await?;
    assert_eq!(VoteState::Neutral, admin_vote.previous);
    assert_eq!(VoteCounts { upvotes: 0, downvotes: 2 }, admin_vote.counts);

    let neutral = data.vote(&vote(VoteState::Neutral)).await?;
    assert_eq!(VoteCounts { upvotes: 0, downvotes: 1 }, neutral.counts);
    let view = data.get_article(&get_params(article.id)).await?;
    assert_eq!(VoteCounts { upvotes: 0, downvotes: 1 }, stored(&view));

    data.stop();
    Ok(())
}

#[tokio::test]
async fn test_seed_votes_not_persisted() -> Result<()> {
    let data = TestServer::start().await;
    let article = data
        .create_article(vec![seed_comment(
            "default_a",
            "Seed thread",
            vec![seed_comment("", "Seed reply", vec![])],
        )])
        .await;
    let seed_reply: &Comment = &article.default_comments[0].replies[0];
    assert!(seed_reply.id.is_seed());
    assert_eq!(Some(CommentId::from("default_a")), seed_reply.parent_id);

    let params = |vote| VoteParams {
        article_id: article.id,
        comment_id: seed_reply.id.clone(),
        ancestor_ids: vec![CommentId::from("default_a")],
        vote,
        response_id: None,
    };
    for state in [VoteState::Upvoted, VoteState::Downvoted, VoteState::Upvoted] {
        let outcome = data.vote(&params(state)).await?;
        assert_eq!(0, outcome.persisted);
        assert_eq!(0, outcome.failed);
    }
    let outcome = data.vote(&params(VoteState::Upvoted)).await?;
    assert_eq!(VoteCounts { upvotes: 3, downvotes: 1 }, outcome.counts);

    // stored seed counters are unchanged, only this browser sees its own vote
    let view = data.admin.get_article(&get_params(article.id)).await?;
    assert_eq!(article.default_comments, view.article.default_comments);
    let view = data.get_article(&get_params(article.id)).await?;
    let shown = &view.article.default_comments[0].replies[0];
    assert_eq!((3, 1), (shown.upvotes, shown.downvotes));
    let top = &view.article.default_comments[0];
    assert_eq!((2, 1), (top.upvotes, top.downvotes));

    // unknown seed id
    let mut missing = params(VoteState::Upvoted);
    missing.comment_id = CommentId::from("default_missing");
    assert!(data.vote(&missing).await.is_err());

    data.stop();
    Ok(())
}

#[tokio::test]
async fn test_hidden_default_comments() -> Result<()> {
    let data = TestServer::start().await;
    let seeds = vec![seed_comment("default_0", "Seed thread", vec![])];
    let hidden = data.create_article_with(seeds.clone(), false).await;
    assert!(!hidden.show_default_comments);

    let view = data.get_article(&get_params(hidden.id)).await?;
    assert!(view.article.default_comments.is_empty());
    assert!(view.comments.is_empty());

    let shown = data.create_article_with(seeds, true).await;
    let view = data.get_article(&get_params(shown.id)).await?;
    assert_eq!(1, view.article.default_comments.len());

    data.stop();
    Ok(())
}

#[tokio::test]
async fn test_admin_endpoints_protected() -> Result<()> {
    let data = TestServer::start().await;
    let study = CreateStudyParams {
        name: "Pilot".to_string(),
        description: String::new(),
    };
    assert!(data.create_study(&study).await.is_err());
    let study = data.admin.create_study(&study).await?;
    assert_eq!(vec![study.clone()], data.list_studies().await?);

    assert!(
        data.dashboard_comments(&DashboardCommentsParams::default())
            .await
            .is_err()
    );
    assert!(
        data.dashboard_logs(&DashboardLogsParams::default())
            .await
            .is_err()
    );

    let article = data.create_article(vec![]).await;
    let listed = data
        .list_articles(&ListArticlesParams {
            study_id: Some(study.id),
        })
        .await?;
    assert!(listed.is_empty());
    let listed = data.list_articles(&ListArticlesParams::default()).await?;
    assert_eq!(vec![article], listed);

    data.stop();
    Ok(())
}

#[tokio::test]
async fn test_dashboard_exports() -> Result<()> {
    let data = TestServer::start().await;
    let article = data
        .create_article(vec![seed_comment("default_0", "Seed thread", vec![])])
        .await;
    data.get_article(&get_params(article.id)).await?;
    let first = data
        .create_comment(&comment_params(article.id, "Great read", Some("Alice"), vec![]))
        .await?;
    data.create_comment(&comment_params(article.id, "Agreed", None, vec![first.id.clone()]))
        .await?;
    data.vote(&VoteParams {
        article_id: article.id,
        comment_id: first.id.clone(),
        ancestor_ids: vec![],
        vote: VoteState::Upvoted,
        response_id: Some("R_test".to_string()),
    })
    .await?;
    data.log_interaction(&LogInteractionParams {
        action: "scroll_to_comments".to_string(),
        details: serde_json::json!({ "percent": 80 }),
        article_id: Some(article.id),
        url: None,
        response_id: Some("R_test".to_string()),
    })
    .await?;

    let params = DashboardCommentsParams {
        show_default: true,
        ..Default::default()
    };
    let export = data.admin.dashboard_comments(&params).await?;
    // newest first by default
    assert_eq!(first.id, export.rows[1].id);
    assert!(export.rows[2].is_default);
    assert_eq!(3, export.summary.total);
    assert_eq!(1, export.summary.default_comments);
    assert_eq!(1, export.summary.replies);
    let reply_count = export
        .rows
        .iter()
        .find(|r| r.id == first.id)
        .map(|r| r.reply_count);
    assert_eq!(Some(1), reply_count);

    let csv = data.admin.dashboard_comments_csv(&params).await?;
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().starts_with("\"articleId\","));
    assert_eq!(3, lines.count());

    let logs = data.admin.dashboard_logs(&DashboardLogsParams::default()).await?;
    let actions: Vec<_> = logs.rows.iter().map(|l| l.action.as_str()).collect();
    assert_eq!(
        vec![
            "view_article",
            "post_comment",
            "post_reply",
            "vote",
            "scroll_to_comments"
        ],
        actions
    );
    assert_eq!(1, logs.summary.unique_users);
    assert!(
        logs.rows
            .iter()
            .all(|l| l.response_id.as_deref() == Some("R_test"))
    );
    assert_eq!(Some(article.title.as_str()), logs.rows[0].article_title.as_deref());

    let votes = data
        .admin
        .dashboard_logs_csv(&DashboardLogsParams {
            action: Some("vote".to_string()),
            ..Default::default()
        })
        .await?;
    let mut lines = votes.lines();
    assert!(lines.next().unwrap().contains("\"qualtricsResponseId\""));
    assert_eq!(1, lines.count());

    data.stop();
    Ok(())
}
