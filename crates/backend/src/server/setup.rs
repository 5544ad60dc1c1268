use chrono::Utc;
use log::info;
use threadlab_database::{
    common::{
        article::{ArticleForm, StudyForm},
        comment::Comment,
        newtypes::CommentId,
    },
    error::BackendError,
    impls::ThreadlabContext,
};

const EXAMPLE_ARTICLE_TEXT: &str = "The city council approved next year's budget on Tuesday \
after a four hour session. Spending on public transit rises by twelve percent, while the \
road maintenance budget stays flat.

Several residents spoke against the plan during the public comment period.";

fn seed(content: &str, name: &str, upvotes: i32, replies: Vec<Comment>) -> Comment {
    Comment {
        // assigned on creation
        id: CommentId::default(),
        content: content.to_string(),
        name: name.to_string(),
        created_at: Utc::now(),
        upvotes,
        downvotes: 0,
        parent_id: None,
        grand_parent_id: None,
        response_id: None,
        replies,
    }
}

/// Create an example study with one article and a few seed threads, so that a fresh
/// installation has something to show.
pub fn setup(context: &ThreadlabContext) -> Result<(), BackendError> {
    let study = context.store.create_study(StudyForm {
        name: "Example study".to_string(),
        description: "Created automatically, can be ignored".to_string(),
    })?;
    let default_comments = vec![
        seed(
            "Finally some money for buses. The 12 line is always packed.",
            "Maria",
            14,
            vec![seed(
                "Packed buses are a sign that people use them, not that they need more money.",
                "",
                3,
                vec![seed("Both can be true.", "Maria", 5, vec![])],
            )],
        ),
        seed(
            "Nobody asked the people who drive to work every day.",
            "Tom",
            6,
            vec![],
        ),
    ];
    let article = context.store.create_article(ArticleForm {
        title: "City council passes transit-heavy budget".to_string(),
        author: "Newsroom".to_string(),
        text: EXAMPLE_ARTICLE_TEXT.to_string(),
        study_id: Some(study.id),
        show_default_comments: true,
        default_comments,
    })?;
    info!("Created example article {} ({})", article.id, article.slug);
    Ok(())
}
