//! SQLite backend integration tests.
//!
//! These tests exercise the SQLite backend through the `DataSource` API.

#![cfg(feature = "sqlite")]

use skinstore_persistence::backends::sqlite::SqliteBackend;
use skinstore_persistence::core::{BackendCapability, DataSource, DeleteSemantics};
use skinstore_persistence::error::{ResourceError, StorageError};
use skinstore_persistence::types::{
    Address, ArticlePatch, ArticleQuery, CommentStatus, EntityKind, LineItem, NewArticle,
    ListItem, NewComment, NewOrder, NewProduct, NewReview, NewUser, Product, ProductPatch,
    StructuredItem, UserPatch,
};

fn create_backend() -> SqliteBackend {
    SqliteBackend::in_memory()
}

fn serum() -> NewProduct {
    NewProduct {
        name: "Hydrating Serum".to_string(),
        price: 24.5,
        category: "serum".to_string(),
        needs: vec!["dry", "dull"].into(),
        ..Default::default()
    }
}

fn article(title: &str, slug: &str, published: bool) -> NewArticle {
    NewArticle {
        title: title.to_string(),
        slug: slug.to_string(),
        content: format!("All about {title}"),
        category: "tips".to_string(),
        is_published: published,
        ..Default::default()
    }
}

// ============================================================================
// Product Tests
// ============================================================================

#[tokio::test]
async fn test_product_lifecycle() {
    let backend = create_backend();

    let created = backend.create_product(serum()).await.unwrap();
    assert!(!created.id.is_empty());
    assert_eq!(created.needs, vec!["dry", "dull"]);
    assert!(created.created_at > 0);
    assert_eq!(created.created_at, created.updated_at);

    let fetched = backend.get_product_by_id(&created.id).await.unwrap().unwrap();
    assert_eq!(fetched, created);

    assert!(backend.delete_product(&created.id).await.unwrap());
    assert!(backend.get_product_by_id(&created.id).await.unwrap().is_none());
    assert!(!backend.delete_product(&created.id).await.unwrap());
}

#[tokio::test]
async fn test_get_all_newest_first() {
    let backend = create_backend();

    for name in ["First", "Second", "Third"] {
        backend
            .create_product(NewProduct {
                name: name.to_string(),
                ..serum()
            })
            .await
            .unwrap();
    }

    let names: Vec<_> = backend
        .get_all_products()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["Third", "Second", "First"]);
}

#[tokio::test]
async fn test_partial_update_preserves_other_fields() {
    let backend = create_backend();
    let created = backend.create_product(serum()).await.unwrap();

    let updated = backend
        .update_product(
            &created.id,
            ProductPatch {
                price: Some(19.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.price, 19.0);
    assert_eq!(updated.name, "Hydrating Serum");
    assert_eq!(updated.needs, vec!["dry", "dull"]);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);
}

#[tokio::test]
async fn test_repeated_update_is_idempotent() {
    let backend = create_backend();
    let created = backend
        .create_product(NewProduct {
            tagline: "Plumps overnight".to_string(),
            original_price: Some(30.0),
            discount: Some(10.0),
            description: Some("Hyaluronic gel".to_string()),
            benefits: vec![
                ListItem::from(StructuredItem::new("Hydrates")),
                ListItem::from("Soothes"),
            ]
            .into(),
            ingredients: vec!["Hyaluronic Acid", "Panthenol"].into(),
            ..serum()
        })
        .await
        .unwrap();

    let patch = || ProductPatch {
        price: Some(21.0),
        ..Default::default()
    };
    let first = backend.update_product(&created.id, patch()).await.unwrap();
    let second = backend.update_product(&created.id, patch()).await.unwrap();

    assert_eq!(
        Product {
            updated_at: 0,
            ..first
        },
        Product {
            updated_at: 0,
            ..second.clone()
        }
    );
    assert_eq!(second.price, 21.0);
    assert_eq!(
        Product {
            price: created.price,
            updated_at: created.updated_at,
            ..second
        },
        created
    );
}

#[tokio::test]
async fn test_update_unknown_id_is_not_found() {
    let backend = create_backend();

    let result = backend
        .update_product("missing", ProductPatch::default())
        .await;
    assert!(matches!(
        result,
        Err(StorageError::Resource(ResourceError::NotFound { .. }))
    ));
}

#[tokio::test]
async fn test_invalid_input_is_rejected() {
    let backend = create_backend();

    let result = backend
        .create_product(NewProduct {
            name: "   ".to_string(),
            ..serum()
        })
        .await;
    assert!(matches!(result, Err(StorageError::Validation(_))));
    assert!(backend.get_all_products().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_blocked_by_foreign_key_returns_false() {
    let backend = create_backend();
    let product = backend.create_product(serum()).await.unwrap();
    backend
        .create_review(NewReview {
            product_id: product.id.clone(),
            reviewer_name: "Lan".to_string(),
            rating: 4.5,
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(!backend.delete_product(&product.id).await.unwrap());
    assert!(backend.get_product_by_id(&product.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_malformed_composite_column_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.db");
    let backend = SqliteBackend::open(&path);
    let product = backend.create_product(serum()).await.unwrap();

    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute(
        "UPDATE products SET needs = 'dry, oily', benefits = '{oops' WHERE id = ?1",
        [&product.id],
    )
    .unwrap();

    let fetched = backend.get_product_by_id(&product.id).await.unwrap().unwrap();
    assert!(fetched.needs.is_empty());
    assert!(fetched.benefits.is_empty());
    assert_eq!(fetched.name, "Hydrating Serum");
}

#[tokio::test]
async fn test_file_database_persists_across_backends() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.db");

    let id = {
        let backend = SqliteBackend::open(&path);
        backend.create_product(serum()).await.unwrap().id
    };

    let reopened = SqliteBackend::open(&path);
    let product = reopened.get_product_by_id(&id).await.unwrap().unwrap();
    assert_eq!(product.price, 24.5);
}

// ============================================================================
// User Tests
// ============================================================================

#[tokio::test]
async fn test_user_password_is_hashed() {
    let backend = create_backend();

    let user = backend
        .create_user(NewUser {
            email: "Mai@Example.com".to_string(),
            name: "Mai".to_string(),
            password: Some("s3cret-pass".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(user.email, "mai@example.com");
    let hash = user.password_hash.clone().unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(user.verify_password("s3cret-pass"));
    assert!(!user.verify_password("wrong"));

    let by_email = backend
        .get_user_by_email("MAI@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_email.id, user.id);

    let updated = backend
        .update_user(
            &user.id,
            UserPatch {
                password: Some("n3w-pass".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(updated.verify_password("n3w-pass"));
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    let backend = create_backend();
    let user = NewUser {
        email: "an@example.com".to_string(),
        name: "An".to_string(),
        ..Default::default()
    };
    backend.create_user(user.clone()).await.unwrap();

    let result = backend
        .create_user(NewUser {
            email: "AN@example.com".to_string(),
            ..user
        })
        .await;
    assert!(matches!(
        result,
        Err(StorageError::Resource(ResourceError::AlreadyExists { .. }))
    ));
}

#[tokio::test]
async fn test_legacy_mixed_case_email_is_found() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.db");
    let backend = SqliteBackend::open(&path);
    let user = backend
        .create_user(NewUser {
            email: "mai@example.com".to_string(),
            name: "Mai".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute(
        "UPDATE users SET email = 'Mai.Tran@Example.com' WHERE id = ?1",
        [&user.id],
    )
    .unwrap();

    let found = backend
        .get_user_by_email("mai.tran@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, user.id);

    let clash = backend
        .create_user(NewUser {
            email: "MAI.TRAN@example.com".to_string(),
            name: "Other".to_string(),
            ..Default::default()
        })
        .await;
    assert!(matches!(
        clash,
        Err(StorageError::Resource(ResourceError::AlreadyExists { .. }))
    ));
}

// ============================================================================
// Order Tests
// ============================================================================

#[tokio::test]
async fn test_order_total_stored_as_given() {
    let backend = create_backend();
    let items = vec![
        LineItem::new("p1", "Serum", 2, 10.0),
        LineItem::new("p2", "Toner", 1, 5.5),
    ];

    let order = backend
        .create_order(NewOrder {
            customer_name: "Hoa".to_string(),
            items,
            total: 99.0,
            shipping_address: Some(Address {
                street: "12 Le Loi".to_string(),
                district: Some("1".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(order.total, 99.0);
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.items[0].line_total, 20.0);
    assert!(order.order_number.starts_with("ORD-"));
    assert_eq!(order.address.as_deref(), Some("12 Le Loi"));
    assert_eq!(order.district.as_deref(), Some("1"));
    assert_eq!(order.shipping_address.street, "12 Le Loi");

    let by_number = backend
        .get_order_by_number(&order.order_number)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_number.id, order.id);
}

// ============================================================================
// Review and Comment Tests
// ============================================================================

#[tokio::test]
async fn test_lookups_by_product() {
    let backend = create_backend();
    let product = backend.create_product(serum()).await.unwrap();
    let other = backend.create_product(serum()).await.unwrap();

    backend
        .create_review(NewReview {
            product_id: product.id.clone(),
            reviewer_name: "Lan".to_string(),
            rating: 5.0,
            review_date: "12/01/2024".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    for (status, product_id) in [
        (CommentStatus::Approved, &product.id),
        (CommentStatus::Pending, &product.id),
        (CommentStatus::Approved, &other.id),
    ] {
        backend
            .create_comment(NewComment {
                product_id: product_id.clone(),
                user_id: "u1".to_string(),
                content: "Lovely texture".to_string(),
                rating: 4,
                status,
                ..Default::default()
            })
            .await
            .unwrap();
    }

    let reviews = backend.get_reviews_by_product(&product.id).await.unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].review_date, "12/01/2024");

    let all = backend
        .get_comments_by_product(&product.id, None)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
    let approved = backend
        .get_comments_by_product(&product.id, Some(CommentStatus::Approved))
        .await
        .unwrap();
    assert_eq!(approved.len(), 1);
}

// ============================================================================
// Article Tests
// ============================================================================

#[tokio::test]
async fn test_article_queries() {
    let backend = create_backend();
    backend
        .create_article(article("Sunscreen Basics", "spf-basics", true))
        .await
        .unwrap();
    backend
        .create_article(NewArticle {
            is_featured: true,
            category: "routines".to_string(),
            ..article("Night Routine", "night-routine", true)
        })
        .await
        .unwrap();
    backend
        .create_article(article("Draft on SPF", "spf-draft", false))
        .await
        .unwrap();

    let published = backend
        .get_all_articles(&ArticleQuery::published())
        .await
        .unwrap();
    assert_eq!(published.len(), 2);
    assert_eq!(published[0].slug, "night-routine");

    let everything = ArticleQuery {
        include_unpublished: true,
        ..Default::default()
    };
    assert_eq!(backend.count_articles(&everything).await.unwrap(), 3);

    let search = backend
        .get_all_articles(&ArticleQuery::published().with_search("sUnScReEn"))
        .await
        .unwrap();
    assert_eq!(search.len(), 1);
    assert_eq!(search[0].slug, "spf-basics");

    let featured = ArticleQuery {
        is_featured: Some(true),
        ..Default::default()
    };
    assert_eq!(backend.get_all_articles(&featured).await.unwrap().len(), 1);

    let routines = ArticleQuery::published().with_category("routines");
    assert_eq!(backend.count_articles(&routines).await.unwrap(), 1);

    let related = ArticleQuery {
        exclude_slug: Some("spf-basics".to_string()),
        ..Default::default()
    };
    let related = backend.get_all_articles(&related).await.unwrap();
    assert!(related.iter().all(|a| a.slug != "spf-basics"));

    let page = backend
        .get_all_articles(&everything.clone().with_page(1, 1))
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].slug, "night-routine");
}

#[tokio::test]
async fn test_article_search_folds_non_ascii_case() {
    let backend = create_backend();
    backend
        .create_article(article("Bí quyết da đẹp", "da-dep", true))
        .await
        .unwrap();
    backend
        .create_article(article("Chống nắng", "chong-nang", true))
        .await
        .unwrap();

    let query = ArticleQuery::published().with_search("ĐẸP");
    let found = backend.get_all_articles(&query).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].slug, "da-dep");
    assert_eq!(backend.count_articles(&query).await.unwrap(), 1);

    let paged = query.clone().with_page(1, 5);
    assert!(backend.get_all_articles(&paged).await.unwrap().is_empty());
    assert_eq!(backend.count_articles(&paged).await.unwrap(), 1);
}

#[tokio::test]
async fn test_article_slug_unique_and_lookup() {
    let backend = create_backend();
    let created = backend
        .create_article(article("Toner 101", "toner-101", true))
        .await
        .unwrap();

    let duplicate = backend
        .create_article(article("Toner again", "toner-101", true))
        .await;
    assert!(matches!(
        duplicate,
        Err(StorageError::Resource(ResourceError::AlreadyExists { .. }))
    ));

    // Renaming an article to its own slug is not a conflict.
    let updated = backend
        .update_article(
            &created.id,
            ArticlePatch {
                slug: Some("toner-101".to_string()),
                title: Some("Toner 102".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "Toner 102");

    let found = backend.get_article_by_slug("toner-101").await.unwrap().unwrap();
    assert_eq!(found.id, created.id);
}

// ============================================================================
// Capability Tests
// ============================================================================

#[tokio::test]
async fn test_capabilities_and_health() {
    let backend = create_backend();
    backend.health_check().await.unwrap();

    assert!(backend.supports(BackendCapability::HardDelete));
    assert!(!backend.supports(BackendCapability::SoftDelete));
    assert_eq!(
        backend.delete_semantics(EntityKind::Article),
        DeleteSemantics::Hard
    );
}
