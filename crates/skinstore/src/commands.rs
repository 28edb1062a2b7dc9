//! Operator commands.

use std::sync::Arc;

use anyhow::Context;
use serde_json::Value;
use tracing::info;

use skinstore_persistence::core::{BackendCapability, DataSource};
use skinstore_persistence::types::{
    ArticleQuery, EntityKind, ListItem, NewArticle, NewCategory, NewProduct, StructuredItem,
};

/// Prints the backend, its capabilities and a record count per entity.
pub async fn status(source: Arc<dyn DataSource>) -> anyhow::Result<()> {
    source
        .health_check()
        .await
        .context("data source is not reachable")?;

    println!("data source: {}", source.kind());
    let capabilities: Vec<String> = BackendCapability::ALL
        .into_iter()
        .filter(|capability| source.supports(*capability))
        .map(|capability| capability.to_string())
        .collect();
    println!("capabilities: {}", capabilities.join(", "));

    for kind in EntityKind::ALL {
        let count = source.list_records(kind).await?.len();
        println!(
            "{:<10} {:>6}  (delete: {})",
            kind,
            count,
            source.delete_semantics(kind)
        );
    }
    Ok(())
}

/// Prints every live record of an entity as JSON. Password hashes are never
/// printed.
pub async fn list(source: Arc<dyn DataSource>, entity: &str) -> anyhow::Result<()> {
    let kind: EntityKind = entity.parse().map_err(anyhow::Error::msg)?;
    let records: Vec<Value> = source
        .list_records(kind)
        .await?
        .into_iter()
        .map(|mut record| {
            record.remove("password");
            Value::Object(record)
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

/// Adds a small demo catalog unless products already exist.
pub async fn seed(source: Arc<dyn DataSource>) -> anyhow::Result<()> {
    if !source.get_all_products().await?.is_empty() {
        info!("Products already present, skipping seed");
        return Ok(());
    }

    for (name, slug) in [("Cleansers", "cleansers"), ("Serums", "serums")] {
        source
            .create_category(NewCategory {
                name: name.to_string(),
                slug: Some(slug.to_string()),
                ..Default::default()
            })
            .await?;
    }

    let products = [
        NewProduct {
            name: "Gentle Foam Cleanser".to_string(),
            tagline: "Low-pH daily wash".to_string(),
            price: 14.0,
            category: "cleansers".to_string(),
            needs: vec!["sensitive", "oily"].into(),
            benefits: vec![ListItem::from(StructuredItem::new("Keeps the barrier intact"))].into(),
            ingredients: vec!["Glycerin", "Panthenol"].into(),
            ..Default::default()
        },
        NewProduct {
            name: "Niacinamide 10% Serum".to_string(),
            tagline: "Refines pores".to_string(),
            price: 22.0,
            original_price: Some(26.0),
            discount: Some(15.0),
            category: "serums".to_string(),
            needs: vec!["oily", "dull"].into(),
            ingredients: vec!["Niacinamide", "Zinc PCA"].into(),
            ..Default::default()
        },
    ];
    for product in products {
        let created = source.create_product(product).await?;
        info!(id = %created.id, name = %created.name, "Seeded product");
    }

    let guide = "layering-basics";
    if source.get_article_by_slug(guide).await?.is_none() {
        source
            .create_article(NewArticle {
                title: "Layering Basics".to_string(),
                slug: guide.to_string(),
                content: "Apply from thinnest to thickest texture.".to_string(),
                excerpt: Some("Which step goes first".to_string()),
                category: "routines".to_string(),
                is_published: true,
                ..Default::default()
            })
            .await?;
    }

    let articles = source.count_articles(&ArticleQuery::published()).await?;
    info!(articles, "Seed complete");
    Ok(())
}
