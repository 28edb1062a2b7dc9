//! Static storage schemas for every entity.
//!
//! An [`EntitySchema`] names where an entity lives in each backend (table,
//! collection, sheet) and lists its fields with their canonical name, their
//! relational column and their [`FieldType`]. The codec, the resolver and all
//! three adapters are driven from these tables, so a field is declared once.

use crate::types::{CommentStatus, EntityKind, OrderStatus, Role};

/// How a field is interpreted and stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Plain text.
    Text,
    /// Floating point number.
    Number,
    /// Whole number.
    Integer,
    /// Boolean flag.
    Boolean,
    /// Unix epoch seconds.
    Timestamp,
    /// Ordered list of tag strings.
    Tags,
    /// List of plain strings or structured items with a `name`.
    Items,
    /// Order line items.
    LineItems,
    /// Shipping address composite. Only the document backend stores it;
    /// elsewhere it is rebuilt from the flat address parts.
    Address,
    /// One flat component of the shipping address, mapped to the composite
    /// key it mirrors.
    AddressPart(&'static str),
    /// Closed set of values; the first one is the default.
    Choice(&'static [&'static str]),
}

impl FieldType {
    /// Returns `true` for list and object valued types.
    pub fn is_composite(self) -> bool {
        matches!(
            self,
            FieldType::Tags | FieldType::Items | FieldType::LineItems | FieldType::Address
        )
    }

    /// Relational column affinity.
    pub fn sql_type(self) -> &'static str {
        match self {
            FieldType::Number => "REAL",
            FieldType::Integer | FieldType::Boolean | FieldType::Timestamp => "INTEGER",
            _ => "TEXT",
        }
    }
}

/// A single field of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Canonical camelCase name.
    pub name: &'static str,
    /// Relational column name.
    pub column: &'static str,
    pub ty: FieldType,
    /// Whether the canonical record may hold `null`.
    pub nullable: bool,
    pub unique: bool,
    /// Lookups on this field ignore letter case.
    pub ignore_case: bool,
    /// Table referenced by a foreign key.
    pub references: Option<&'static str>,
}

impl FieldSpec {
    pub const fn new(name: &'static str, column: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            column,
            ty,
            nullable: false,
            unique: false,
            ignore_case: false,
            references: None,
        }
    }

    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub const fn ignore_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }

    pub const fn references(mut self, table: &'static str) -> Self {
        self.references = Some(table);
        self
    }

    /// Returns `true` if the relational backend has a column for this field.
    pub fn has_column(&self) -> bool {
        self.ty != FieldType::Address
    }
}

/// Canonical name of the identifier.
pub const ID: &str = "id";
pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";
pub const IS_DELETED: &str = "isDeleted";
pub const DELETED_AT: &str = "deletedAt";

/// Fields every entity carries besides its own.
pub static BOOKKEEPING: [FieldSpec; 4] = [
    FieldSpec::new(CREATED_AT, "created_at", FieldType::Timestamp),
    FieldSpec::new(UPDATED_AT, "updated_at", FieldType::Timestamp),
    FieldSpec::new(IS_DELETED, "is_deleted", FieldType::Boolean),
    FieldSpec::new(DELETED_AT, "deleted_at", FieldType::Timestamp).nullable(),
];

/// Storage layout of one entity.
#[derive(Debug)]
pub struct EntitySchema {
    pub kind: EntityKind,
    /// Relational table.
    pub table: &'static str,
    /// Document collection.
    pub collection: &'static str,
    /// Spreadsheet tab.
    pub sheet: &'static str,
    pub fields: &'static [FieldSpec],
}

impl EntitySchema {
    /// Looks up a field by canonical name, bookkeeping fields included.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.all_fields().find(|field| field.name == name)
    }

    /// Own fields followed by the bookkeeping fields.
    pub fn all_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().chain(BOOKKEEPING.iter())
    }

    /// Fields holding a per-backend unique value.
    pub fn unique_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|field| field.unique)
    }

    /// Returns `true` if this entity has a shipping address.
    pub fn has_address(&self) -> bool {
        self.fields.iter().any(|field| field.ty == FieldType::Address)
    }

    /// Relational column for a canonical field name.
    pub fn column(&self, name: &str) -> Option<&'static str> {
        if name == ID {
            return Some(ID);
        }
        self.field(name)
            .filter(|field| field.has_column())
            .map(|field| field.column)
    }
}

use FieldType::*;

pub static PRODUCT: EntitySchema = EntitySchema {
    kind: EntityKind::Product,
    table: "products",
    collection: "products",
    sheet: "Products",
    fields: &[
        FieldSpec::new("name", "name", Text),
        FieldSpec::new("tagline", "tagline", Text),
        FieldSpec::new("price", "price", Number),
        FieldSpec::new("originalPrice", "original_price", Number).nullable(),
        FieldSpec::new("discount", "discount", Number).nullable(),
        FieldSpec::new("category", "category", Text),
        FieldSpec::new("needs", "needs", Tags),
        FieldSpec::new("image", "image", Text),
        FieldSpec::new("hoverImage", "hover_image", Text),
        FieldSpec::new("description", "description", Text).nullable(),
        FieldSpec::new("howToUse", "how_to_use", Text).nullable(),
        FieldSpec::new("benefits", "benefits", Items),
        FieldSpec::new("ingredients", "ingredients", Items),
    ],
};

pub static CATEGORY: EntitySchema = EntitySchema {
    kind: EntityKind::Category,
    table: "categories",
    collection: "categories",
    sheet: "Categories",
    fields: &[
        FieldSpec::new("name", "name", Text),
        FieldSpec::new("slug", "slug", Text).nullable(),
        FieldSpec::new("description", "description", Text).nullable(),
    ],
};

pub static USER: EntitySchema = EntitySchema {
    kind: EntityKind::User,
    table: "users",
    collection: "users",
    sheet: "Users",
    fields: &[
        FieldSpec::new("email", "email", Text).unique().ignore_case(),
        FieldSpec::new("name", "name", Text),
        FieldSpec::new("phone", "phone", Text).nullable(),
        FieldSpec::new("address", "address", Text).nullable(),
        FieldSpec::new("role", "role", Choice(Role::VALUES)),
        FieldSpec::new("password", "password_hash", Text).nullable(),
    ],
};

pub static ORDER: EntitySchema = EntitySchema {
    kind: EntityKind::Order,
    table: "orders",
    collection: "orders",
    sheet: "Orders",
    fields: &[
        FieldSpec::new("orderNumber", "order_number", Text).unique(),
        FieldSpec::new("customerName", "customer_name", Text),
        FieldSpec::new("customerEmail", "customer_email", Text),
        FieldSpec::new("customerPhone", "customer_phone", Text),
        FieldSpec::new("userId", "user_id", Text).nullable(),
        FieldSpec::new("shippingAddress", "shipping_address", Address),
        FieldSpec::new("address", "address", AddressPart("street")).nullable(),
        FieldSpec::new("ward", "ward", AddressPart("ward")).nullable(),
        FieldSpec::new("district", "district", AddressPart("district")).nullable(),
        FieldSpec::new("province", "province", AddressPart("province")).nullable(),
        FieldSpec::new("status", "status", Choice(OrderStatus::VALUES)),
        FieldSpec::new("paymentMethod", "payment_method", Text),
        FieldSpec::new("items", "items", LineItems),
        FieldSpec::new("total", "total", Number),
        FieldSpec::new("notes", "notes", Text).nullable(),
    ],
};

pub static REVIEW: EntitySchema = EntitySchema {
    kind: EntityKind::Review,
    table: "reviews",
    collection: "reviews",
    sheet: "Reviews",
    fields: &[
        FieldSpec::new("productId", "product_id", Text).references("products"),
        FieldSpec::new("reviewerName", "reviewer_name", Text),
        FieldSpec::new("rating", "rating", Number),
        FieldSpec::new("review", "review", Text),
        FieldSpec::new("reviewDate", "review_date", Text),
    ],
};

pub static COMMENT: EntitySchema = EntitySchema {
    kind: EntityKind::Comment,
    table: "comments",
    collection: "comments",
    sheet: "Comments",
    fields: &[
        FieldSpec::new("productId", "product_id", Text).references("products"),
        FieldSpec::new("userId", "user_id", Text),
        FieldSpec::new("userName", "user_name", Text).nullable(),
        FieldSpec::new("userEmail", "user_email", Text).nullable(),
        FieldSpec::new("content", "content", Text),
        FieldSpec::new("rating", "rating", Integer),
        FieldSpec::new("status", "status", Choice(CommentStatus::VALUES)),
    ],
};

pub static ARTICLE: EntitySchema = EntitySchema {
    kind: EntityKind::Article,
    table: "articles",
    collection: "articles",
    sheet: "Articles",
    fields: &[
        FieldSpec::new("title", "title", Text),
        FieldSpec::new("slug", "slug", Text).unique(),
        FieldSpec::new("content", "content", Text),
        FieldSpec::new("excerpt", "excerpt", Text).nullable(),
        FieldSpec::new("featuredImage", "featured_image", Text).nullable(),
        FieldSpec::new("author", "author", Text).nullable(),
        FieldSpec::new("category", "category", Text),
        FieldSpec::new("isFeatured", "is_featured", Boolean),
        FieldSpec::new("publishedAt", "published_at", Timestamp).nullable(),
        FieldSpec::new("isPublished", "is_published", Boolean),
        FieldSpec::new("createdBy", "created_by", Text).nullable(),
        FieldSpec::new("updatedBy", "updated_by", Text).nullable(),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_a_schema() {
        for kind in EntityKind::ALL {
            let schema = kind.schema();
            assert_eq!(schema.kind, kind);
            assert!(!schema.fields.is_empty());
        }
    }

    #[test]
    fn test_field_lookup_includes_bookkeeping() {
        assert_eq!(PRODUCT.column("hoverImage"), Some("hover_image"));
        assert_eq!(PRODUCT.column("createdAt"), Some("created_at"));
        assert_eq!(PRODUCT.column("id"), Some("id"));
        assert_eq!(PRODUCT.column("unknown"), None);
    }

    #[test]
    fn test_address_composite_has_no_column() {
        assert!(ORDER.has_address());
        assert_eq!(ORDER.column("shippingAddress"), None);
        assert_eq!(ORDER.column("ward"), Some("ward"));
        assert!(!PRODUCT.has_address());
    }

    #[test]
    fn test_unique_fields() {
        let unique: Vec<_> = ARTICLE.unique_fields().map(|f| f.name).collect();
        assert_eq!(unique, vec!["slug"]);
        let unique: Vec<_> = USER.unique_fields().map(|f| f.name).collect();
        assert_eq!(unique, vec!["email"]);
    }
}
