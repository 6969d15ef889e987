use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    error::FieldError,
    protocol::{id_text, lenient_f64, lenient_i64, lenient_text, parse_price, parse_stock},
};

/// Identifier assigned by the product backend. Opaque to the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(#[serde(deserialize_with = "id_text")] pub String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A persisted product as returned by the backend.
///
/// Decodes from documents keyed by `id`, `_id` or both; always encodes `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProductDocument")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: f64,
    pub description: String,
    pub category: String,
    pub stock: i64,
}

#[derive(Deserialize)]
struct ProductDocument {
    #[serde(default)]
    id: Option<ProductId>,
    #[serde(default, rename = "_id")]
    document_id: Option<ProductId>,
    #[serde(flatten)]
    fields: ProductDraft,
}

impl TryFrom<ProductDocument> for Product {
    type Error = FieldError;

    fn try_from(document: ProductDocument) -> Result<Self, Self::Error> {
        let id = document
            .id
            .or(document.document_id)
            .ok_or(FieldError::MissingId)?;
        Ok(Product::from_draft(id, document.fields))
    }
}

impl Product {
    pub fn from_draft(id: ProductId, draft: ProductDraft) -> Self {
        Self {
            id,
            name: draft.name,
            price: draft.price,
            description: draft.description,
            category: draft.category,
            stock: draft.stock,
        }
    }

    pub fn to_draft(&self) -> ProductDraft {
        ProductDraft {
            name: self.name.clone(),
            price: self.price,
            description: self.description.clone(),
            category: self.category.clone(),
            stock: self.stock,
        }
    }
}

/// Product payload without an identifier, used for create and update calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: f64,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub stock: i64,
}

impl ProductDraft {
    /// Fixed placeholder inserted by the "add new product" action.
    pub fn dummy() -> Self {
        Self {
            name: "New Dummy".to_string(),
            price: 20000.0,
            description: "New Description".to_string(),
            category: "New Category".to_string(),
            stock: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductField {
    Name,
    Price,
    Description,
    Category,
    Stock,
}

impl ProductField {
    pub const ALL: [ProductField; 5] = [
        ProductField::Name,
        ProductField::Price,
        ProductField::Description,
        ProductField::Category,
        ProductField::Stock,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProductField::Name => "name",
            ProductField::Price => "price",
            ProductField::Description => "description",
            ProductField::Category => "category",
            ProductField::Stock => "stock",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ProductField::Price | ProductField::Stock)
    }
}

impl fmt::Display for ProductField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductField {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        ProductField::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| FieldError::UnknownField(name.to_string()))
    }
}

/// Uncommitted copy of a product being edited.
///
/// Values are kept as the text an input control produced; nothing is parsed
/// until [`EditDraft::to_draft`] runs on save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditDraft {
    pub name: String,
    pub price: String,
    pub description: String,
    pub category: String,
    pub stock: String,
}

impl EditDraft {
    pub fn get(&self, field: ProductField) -> &str {
        match field {
            ProductField::Name => &self.name,
            ProductField::Price => &self.price,
            ProductField::Description => &self.description,
            ProductField::Category => &self.category,
            ProductField::Stock => &self.stock,
        }
    }

    pub fn set(&mut self, field: ProductField, value: impl Into<String>) {
        let slot = match field {
            ProductField::Name => &mut self.name,
            ProductField::Price => &mut self.price,
            ProductField::Description => &mut self.description,
            ProductField::Category => &mut self.category,
            ProductField::Stock => &mut self.stock,
        };
        *slot = value.into();
    }

    pub fn to_draft(&self) -> Result<ProductDraft, FieldError> {
        let price = parse_price(&self.price)
            .ok_or_else(|| FieldError::invalid_number(ProductField::Price, &self.price))?;
        let stock = parse_stock(&self.stock)
            .ok_or_else(|| FieldError::invalid_number(ProductField::Stock, &self.stock))?;
        Ok(ProductDraft {
            name: self.name.clone(),
            price,
            description: self.description.clone(),
            category: self.category.clone(),
            stock,
        })
    }
}

impl From<&Product> for EditDraft {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            price: product.price.to_string(),
            description: product.description.clone(),
            category: product.category.clone(),
            stock: product.stock.to_string(),
        }
    }
}
