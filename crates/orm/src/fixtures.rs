//! Shared models and seed data for the in-crate tests

use std::sync::Arc;

use serde_json::json;

use crate::backends::MemoryDatabase;
use crate::model::{Model, Schema};
use crate::relationships::RelationRegistry;
use crate::session::Session;

pub struct User;
impl Model for User {
    fn model_name() -> &'static str {
        "User"
    }
    fn table_name() -> &'static str {
        "users"
    }
    fn uses_soft_deletes() -> bool {
        true
    }
    fn relations(registry: &mut RelationRegistry) {
        registry
            .define("posts", |r| r.has_many::<Post>())
            .define("latest_post", |r| r.has_one::<Post>())
            .define("country", |r| r.belongs_to::<Country>())
            .define("roles", |r| r.belongs_to_many::<Role>().with_pivot(&["active"]))
            .define("memberships", |r| {
                r.belongs_to_many::<Role>().with_pivot(&["active"]).as_accessor("membership")
            })
            .define("avatar", |r| r.morph_one::<Image>("imageable"));
    }
}

pub struct Post;
impl Model for Post {
    fn model_name() -> &'static str {
        "Post"
    }
    fn table_name() -> &'static str {
        "posts"
    }
    fn relations(registry: &mut RelationRegistry) {
        registry
            .define("user", |r| r.belongs_to::<User>())
            .define("comments", |r| r.morph_many::<Comment>("commentable"))
            .define("all_comments", |r| r.morph_many::<Comment>("commentable").with_trashed())
            .define("tags", |r| r.morph_to_many::<Tag>("taggable"))
            .define("cover", |r| r.morph_one::<Image>("imageable"));
    }
}

pub struct Comment;
impl Model for Comment {
    fn model_name() -> &'static str {
        "Comment"
    }
    fn table_name() -> &'static str {
        "comments"
    }
    fn uses_soft_deletes() -> bool {
        true
    }
    fn relations(registry: &mut RelationRegistry) {
        registry.define("commentable", |r| r.morph_to());
    }
}

pub struct Video;
impl Model for Video {
    fn model_name() -> &'static str {
        "Video"
    }
    fn table_name() -> &'static str {
        "videos"
    }
    fn relations(registry: &mut RelationRegistry) {
        registry
            .define("comments", |r| r.morph_many::<Comment>("commentable"))
            .define("tags", |r| r.morph_to_many::<Tag>("taggable"));
    }
}

pub struct Role;
impl Model for Role {
    fn model_name() -> &'static str {
        "Role"
    }
    fn table_name() -> &'static str {
        "roles"
    }
    fn relations(registry: &mut RelationRegistry) {
        registry.define("users", |r| r.belongs_to_many::<User>().with_pivot(&["active"]));
    }
}

pub struct Tag;
impl Model for Tag {
    fn model_name() -> &'static str {
        "Tag"
    }
    fn table_name() -> &'static str {
        "tags"
    }
    fn relations(registry: &mut RelationRegistry) {
        registry
            .define("posts", |r| r.morphed_by_many::<Post>("taggable"))
            .define("videos", |r| r.morphed_by_many::<Video>("taggable"));
    }
}

pub struct Country;
impl Model for Country {
    fn model_name() -> &'static str {
        "Country"
    }
    fn table_name() -> &'static str {
        "countries"
    }
    fn relations(registry: &mut RelationRegistry) {
        registry
            .define("posts", |r| r.has_many_through::<Post, User>())
            .define("all_posts", |r| r.has_many_through::<Post, User>().with_trashed_parents())
            .define("first_post", |r| r.has_one_through::<Post, User>());
    }
}

pub struct Image;
impl Model for Image {
    fn model_name() -> &'static str {
        "Image"
    }
    fn table_name() -> &'static str {
        "images"
    }
    fn relations(registry: &mut RelationRegistry) {
        registry.define("imageable", |r| r.morph_to());
    }
}

pub fn schema() -> Schema {
    Schema::new()
        .register::<User>()
        .register::<Post>()
        .register::<Comment>()
        .register::<Video>()
        .register::<Role>()
        .register::<Tag>()
        .register::<Country>()
        .register::<Image>()
        .morph_map("user", "User")
        .morph_map("post", "Post")
        .morph_map("video", "Video")
}

pub fn database() -> MemoryDatabase {
    MemoryDatabase::new()
        .table(
            "users",
            vec![
                json!({"id": 1, "name": "Ada", "country_id": 1, "deleted_at": null}),
                json!({"id": 2, "name": "Grace", "country_id": 1, "deleted_at": "2024-01-01T00:00:00+00:00"}),
                json!({"id": 3, "name": "Linus", "country_id": 2, "deleted_at": null}),
                json!({"id": 4, "name": "Ghost", "country_id": null, "deleted_at": null}),
            ],
        )
        .table(
            "posts",
            vec![
                json!({"id": 10, "user_id": 1, "title": "Engines"}),
                json!({"id": 11, "user_id": 1, "title": "Notes"}),
                json!({"id": 12, "user_id": 2, "title": "Compilers"}),
                json!({"id": 13, "user_id": 3, "title": "Kernels"}),
            ],
        )
        .table(
            "comments",
            vec![
                json!({"id": 100, "commentable_type": "post", "commentable_id": 10, "body": "first", "deleted_at": null}),
                json!({"id": 101, "commentable_type": "post", "commentable_id": 10, "body": "second", "deleted_at": null}),
                json!({"id": 102, "commentable_type": "video", "commentable_id": 50, "body": "clip", "deleted_at": null}),
                json!({"id": 103, "commentable_type": "post", "commentable_id": 11, "body": "gone", "deleted_at": "2024-02-01T00:00:00+00:00"}),
                json!({"id": 104, "commentable_type": null, "commentable_id": null, "body": "orphan", "deleted_at": null}),
                json!({"id": 105, "commentable_type": "post", "commentable_id": 13, "body": "third", "deleted_at": null}),
            ],
        )
        .table(
            "videos",
            vec![
                json!({"id": 50, "title": "Intro"}),
                json!({"id": 51, "title": "Outro"}),
            ],
        )
        .table(
            "roles",
            vec![
                json!({"id": 1, "name": "admin"}),
                json!({"id": 2, "name": "editor"}),
            ],
        )
        .table(
            "role_user",
            vec![
                json!({"user_id": 1, "role_id": 1, "active": true}),
                json!({"user_id": 1, "role_id": 2, "active": false}),
                json!({"user_id": 3, "role_id": 2, "active": true}),
            ],
        )
        .table(
            "tags",
            vec![
                json!({"id": 1, "name": "rust"}),
                json!({"id": 2, "name": "sql"}),
            ],
        )
        .table(
            "taggables",
            vec![
                json!({"tag_id": 1, "taggable_id": 10, "taggable_type": "post"}),
                json!({"tag_id": 2, "taggable_id": 10, "taggable_type": "post"}),
                json!({"tag_id": 1, "taggable_id": 50, "taggable_type": "video"}),
            ],
        )
        .table(
            "countries",
            vec![
                json!({"id": 1, "name": "Norway"}),
                json!({"id": 2, "name": "Peru"}),
                json!({"id": 3, "name": "Chile"}),
            ],
        )
        .table(
            "images",
            vec![
                json!({"id": 1, "imageable_type": "user", "imageable_id": 1, "url": "ada.png"}),
                json!({"id": 2, "imageable_type": "post", "imageable_id": 10, "url": "engines.png"}),
            ],
        )
}

/// Session over the seeded database, plus a handle for inspecting its query log
pub fn session() -> (Session, Arc<MemoryDatabase>) {
    session_with(database())
}

pub fn session_with(db: MemoryDatabase) -> (Session, Arc<MemoryDatabase>) {
    let db = Arc::new(db);
    (Session::new(schema(), db.clone()), db)
}
