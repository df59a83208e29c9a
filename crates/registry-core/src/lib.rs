use std::collections::BTreeMap;

use common::{AttrValue, NewProduct, Product, ProductDetails};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HydrationSource {
    LocalCache,
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    AlreadyHydrated,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyHydrated => write!(f, "session store is already hydrated"),
        }
    }
}

impl std::error::Error for StoreError {}

#[derive(Debug, Default)]
pub struct SessionStore {
    records: Vec<Product>,
    hydrated_from: Option<HydrationSource>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[Product] {
        &self.records
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }

    pub fn is_hydrated(&self) -> bool {
        self.hydrated_from.is_some()
    }

    pub fn hydration_source(&self) -> Option<HydrationSource> {
        self.hydrated_from
    }

    pub fn hydrate(
        &mut self,
        records: Vec<Product>,
        source: HydrationSource,
    ) -> Result<usize, StoreError> {
        if self.hydrated_from.is_some() {
            return Err(StoreError::AlreadyHydrated);
        }

        self.records = records;
        self.hydrated_from = Some(source);
        Ok(self.records.len())
    }

    pub fn append(&mut self, record: Product) {
        self.records.push(record);
    }

    // Removing an absent id leaves the store untouched.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.records.len();
        self.records.retain(|record| record.id != id);
        self.records.len() != before
    }

    pub fn find(&self, id: &str) -> Option<&Product> {
        self.records.iter().find(|record| record.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingField(&'static str),
    InvalidPrice(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "required field is empty: {field}"),
            Self::InvalidPrice(raw) => write!(f, "price is not a number: {raw:?}"),
        }
    }
}

impl std::error::Error for ValidationError {}

// The five form fields, exactly as entered. No payload is built while any
// of them is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormInput {
    pub name: String,
    pub memory: String,
    pub storage: String,
    pub color: String,
    pub price: String,
}

impl FormInput {
    pub fn validate(&self) -> Result<NewProduct, ValidationError> {
        let required = [
            ("name", &self.name),
            ("memory", &self.memory),
            ("storage", &self.storage),
            ("color", &self.color),
            ("price", &self.price),
        ];

        for (field, value) in required {
            if value.is_empty() {
                return Err(ValidationError::MissingField(field));
            }
        }

        let price = self
            .price
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| ValidationError::InvalidPrice(self.price.clone()))?;

        Ok(NewProduct {
            name: self.name.clone(),
            details: ProductDetails {
                price: Some(price),
                attributes: BTreeMap::from([
                    ("color".to_string(), AttrValue::from(self.color.clone())),
                    ("memory".to_string(), AttrValue::from(self.memory.clone())),
                    ("storage".to_string(), AttrValue::from(self.storage.clone())),
                ]),
            },
        })
    }
}
