use std::sync::Arc;

use linkage_orm::{
    EagerLoader, MemoryDatabase, Model, ModelError, OrmConfig, RelationRegistry, RelationType, Schema, Session,
};
use serde_json::json;

/// Blog schema used through the public API only
struct Author;

impl Model for Author {
    fn model_name() -> &'static str {
        "Author"
    }

    fn table_name() -> &'static str {
        "authors"
    }

    fn relations(registry: &mut RelationRegistry) {
        registry
            .define("articles", |r| r.has_many::<Article>())
            .define("badges", |r| r.belongs_to_many::<Badge>().with_pivot(&["level"]).with_timestamps());
    }
}

struct Article;

impl Model for Article {
    fn model_name() -> &'static str {
        "Article"
    }

    fn table_name() -> &'static str {
        "articles"
    }

    fn uses_soft_deletes() -> bool {
        true
    }

    fn relations(registry: &mut RelationRegistry) {
        registry
            .define("author", |r| r.belongs_to::<Author>())
            .define("reactions", |r| r.morph_many::<Reaction>("reactable"));
    }
}

struct Badge;

impl Model for Badge {
    fn model_name() -> &'static str {
        "Badge"
    }

    fn table_name() -> &'static str {
        "badges"
    }
}

struct Reaction;

impl Model for Reaction {
    fn model_name() -> &'static str {
        "Reaction"
    }

    fn table_name() -> &'static str {
        "reactions"
    }

    fn relations(registry: &mut RelationRegistry) {
        registry.define("reactable", |r| r.morph_to());
    }
}

fn setup() -> (Session, Arc<MemoryDatabase>) {
    let schema = Schema::new()
        .register::<Author>()
        .register::<Article>()
        .register::<Badge>()
        .register::<Reaction>()
        .morph_map("article", "Article");

    let db = Arc::new(
        MemoryDatabase::new()
            .table(
                "authors",
                vec![
                    json!({"id": 1, "name": "Ursula"}),
                    json!({"id": 2, "name": "Terry"}),
                ],
            )
            .table(
                "articles",
                vec![
                    json!({"id": 1, "author_id": 1, "title": "Earthsea", "deleted_at": null}),
                    json!({"id": 2, "author_id": 1, "title": "Drafts", "deleted_at": "2024-03-01T00:00:00+00:00"}),
                    json!({"id": 3, "author_id": 2, "title": "Discworld", "deleted_at": null}),
                ],
            )
            .table(
                "badges",
                vec![
                    json!({"id": 1, "label": "classic"}),
                ],
            )
            .table(
                "author_badge",
                vec![
                    json!({"author_id": 1, "badge_id": 1, "level": 3, "created_at": "2024-01-01", "updated_at": "2024-01-02"}),
                ],
            )
            .table(
                "reactions",
                vec![
                    json!({"id": 1, "reactable_type": "article", "reactable_id": 1, "kind": "star"}),
                    json!({"id": 2, "reactable_type": "article", "reactable_id": 3, "kind": "laugh"}),
                    json!({"id": 3, "reactable_type": "article", "reactable_id": 3, "kind": "star"}),
                ],
            ),
    );

    (Session::new(schema, db.clone()), db)
}

#[tokio::test]
async fn test_nested_eager_load_round_trip() {
    let (session, db) = setup();

    let authors = session
        .query::<Author>()
        .with("articles.reactions.reactable")
        .with("badges")
        .order_by("id")
        .get()
        .await
        .unwrap();

    // authors, articles, badges, reactions, reactables (one type)
    assert_eq!(db.query_count(), 5);

    let articles = authors[0].loaded_relation("articles").unwrap();
    let articles = articles.as_many().unwrap();
    assert_eq!(articles.pluck("title").into_vec(), vec![json!("Earthsea")]);

    let reactions = articles[0].loaded_relation("reactions").unwrap();
    let star = reactions.as_many().unwrap().first().cloned().unwrap();
    let target = star.loaded_relation("reactable").unwrap();
    assert_eq!(target.as_one().unwrap().get("title").unwrap(), json!("Earthsea"));

    let badges = authors[0].loaded_relation("badges").unwrap();
    let classic = badges.as_many().unwrap().first().cloned().unwrap();
    let pivot = classic.pivot().unwrap();
    assert_eq!(pivot.get("level"), Some(&json!(3)));
    assert_eq!(pivot.get("updated_at"), Some(&json!("2024-01-02")));
    assert!(!classic.attributes().contains_key("pivot_level"));
    assert!(authors[1].loaded_relation("badges").unwrap().is_empty());
}

#[tokio::test]
async fn test_lazy_and_eager_resolution_agree() {
    let (session, _db) = setup();

    let eager = session.query::<Author>().with("articles").order_by("id").get().await.unwrap();
    let lazy = session.query::<Author>().order_by("id").get().await.unwrap();

    for (eager, lazy) in eager.iter().zip(lazy.iter()) {
        let expected = eager.loaded_relation("articles").unwrap();
        let actual = lazy.relation("articles").await.unwrap();
        assert_eq!(
            expected.as_many().unwrap().model_keys(),
            actual.as_many().unwrap().model_keys()
        );
    }
}

#[tokio::test]
async fn test_records_stay_immutable() {
    let (session, _db) = setup();
    let author = session.query::<Author>().first_or_fail().await.unwrap();

    let err = author.set_attribute("name", "Le Guin").unwrap_err();
    assert!(matches!(err, ModelError::Immutable(_)));
    assert_eq!(author.get("name").unwrap(), json!("Ursula"));
}

#[tokio::test]
async fn test_relation_descriptors_are_inspectable() {
    let (session, _db) = setup();
    let relation = session.schema().relation("Author", "badges").unwrap().unwrap();

    assert_eq!(relation.relation_type, RelationType::BelongsToMany);
    let pivot = relation.pivot.as_ref().unwrap();
    assert_eq!(pivot.table, "author_badge");
    assert_eq!(pivot.selected_columns(&relation.foreign_key), vec![
        "author_id",
        "badge_id",
        "level",
        "created_at",
        "updated_at"
    ]);
}

#[tokio::test]
async fn test_custom_configuration() {
    let (_, db) = setup();
    let config = OrmConfig::default().with_pivot_accessor("membership").with_max_eager_depth(1);
    let schema = Schema::new()
        .register::<Author>()
        .register::<Article>()
        .register::<Badge>()
        .register::<Reaction>();
    let session = Session::with_config(schema, db, config).unwrap();

    let authors = session.query::<Author>().with("badges").order_by("id").get().await.unwrap();
    let badges = authors[0].loaded_relation("badges").unwrap();
    let classic = badges.as_many().unwrap().first().cloned().unwrap();
    assert!(classic.pivot_as("membership").is_some());

    let parents: Vec<_> = authors.iter().map(|a| a.as_ref()).collect();
    let err = EagerLoader::from_paths(&["articles.author"])
        .load(&session, &parents)
        .await
        .unwrap_err();
    assert!(err.is_configuration());
}
