//! Shop feed records, category chips and filtering.

use serde_json::Value;
use tracing::warn;

/// Category chip that matches every shop.
pub const ALL_CATEGORY: &str = "All";

/// Category of a shop with neither cuisine nor type.
pub const OTHER_CATEGORY: &str = "Other";

/// A shop from `GET /shops/all`.
///
/// Records are loosely typed upstream, so parsing is field-by-field and the
/// original JSON is kept in `raw`.
#[derive(Debug, Clone, PartialEq)]
pub struct Shop {
    pub id: String,
    pub name: String,
    pub cuisine: Option<String>,
    pub kind: Option<String>,
    pub shop_types: Vec<String>,
    pub distance: Option<String>,
    pub wait_info: Option<String>,
    pub raw: Value,
}

fn text(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| value.get(*key))
        .find_map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

fn type_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(_) => match value.get("name") {
            Some(Value::String(name)) if !name.is_empty() => Some(name.clone()),
            Some(Value::Null) | None => Some(value.to_string()),
            Some(other) => Some(other.to_string()),
        },
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

impl Shop {
    /// Parse one feed item. Non-object items are rejected.
    pub fn from_value(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }

        let shop_types = match value.get("shopTypes") {
            Some(Value::Array(items)) => items.iter().filter_map(type_label).collect(),
            Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
            _ => text(value, &["shopType"]).into_iter().collect(),
        };

        Some(Self {
            id: text(value, &["id", "_id"]).unwrap_or_default(),
            name: text(value, &["name", "shopName"]).unwrap_or_default(),
            cuisine: text(value, &["cuisine"]),
            kind: text(value, &["type"]),
            shop_types,
            distance: text(value, &["distance"]),
            wait_info: text(value, &["waitInfo", "waitTime"]),
            raw: value.clone(),
        })
    }

    /// Parse a feed, skipping items that are not objects.
    pub fn from_values(values: Vec<Value>) -> Vec<Self> {
        values
            .iter()
            .filter_map(|value| {
                let shop = Self::from_value(value);
                if shop.is_none() {
                    warn!(item = %value, "Skipping malformed shop record");
                }
                shop
            })
            .collect()
    }

    /// Cuisine, else type, else "Other".
    pub fn category(&self) -> &str {
        self.cuisine
            .as_deref()
            .or(self.kind.as_deref())
            .unwrap_or(OTHER_CATEGORY)
    }

    /// Shop types joined for display.
    pub fn type_label(&self) -> String {
        self.shop_types.join(", ")
    }

    pub fn matches_category(&self, category: &str) -> bool {
        category == ALL_CATEGORY
            || self.category() == category
            || self.type_label() == category
            || self.shop_types.iter().any(|t| t == category)
    }
}

/// Category chips: "All" followed by each distinct category and shop type,
/// in first-seen order.
pub fn categories(shops: &[Shop]) -> Vec<String> {
    let mut found = vec![ALL_CATEGORY.to_string()];
    for shop in shops {
        let labels = std::iter::once(shop.category()).chain(shop.shop_types.iter().map(String::as_str));
        for label in labels {
            if !label.is_empty() && !found.iter().any(|f| f == label) {
                found.push(label.to_string());
            }
        }
    }
    found
}

pub fn filter_by_category<'a>(shops: &'a [Shop], category: &str) -> Vec<&'a Shop> {
    shops.iter().filter(|s| s.matches_category(category)).collect()
}

/// Case-insensitive match on name, cuisine, type and shop types.
pub fn search<'a>(shops: &'a [Shop], query: &str) -> Vec<&'a Shop> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return shops.iter().collect();
    }

    shops
        .iter()
        .filter(|shop| {
            std::iter::once(shop.name.as_str())
                .chain(shop.cuisine.as_deref())
                .chain(shop.kind.as_deref())
                .chain(shop.shop_types.iter().map(String::as_str))
                .any(|field| field.to_lowercase().contains(&needle))
        })
        .collect()
}
