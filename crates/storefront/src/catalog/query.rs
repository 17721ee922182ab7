//! Sort and filter criteria, and the query key they derive.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Field the catalog is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Name,
    Price,
}

impl SortField {
    /// The field's rendering inside a query key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Price => "price",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction the active sort field is ordered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    /// The direction's rendering inside a query key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }

    /// The opposite direction.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The catalog's sort criteria: exactly one field, with a direction.
///
/// Defaults to name ascending, the order the page opens with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct OrderCriteria {
    pub field: SortField,
    pub direction: SortDirection,
}

impl OrderCriteria {
    /// Applies a click on a sort control.
    ///
    /// Toggling the already-active field flips the direction; selecting the
    /// other field activates it in ascending order.
    pub fn toggle(&mut self, field: SortField) {
        if self.field == field {
            self.direction = self.direction.flipped();
        } else {
            *self = Self {
                field,
                direction: SortDirection::Ascending,
            };
        }
    }
}

impl fmt::Display for OrderCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.field, self.direction)
    }
}

/// The catalog's filter criteria.
///
/// The text and the promo flag are stored independently: switching promo on
/// hides the text's effect without erasing it, so switching promo back off
/// restores the text filter as it was.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterCriteria {
    /// Free-text filter, matched against product names by the server.
    pub text: String,
    /// Restrict the catalog to products sold at their promotional price.
    pub promo_only: bool,
}

/// A derived, deterministic key describing one catalog query.
///
/// Renders as `{field}_{direction}` plus at most one filter suffix:
/// `/promo` when the promo flag is set, else `/name={text}` when the text
/// filter is non-empty. Equal criteria always derive an equal key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    order: OrderCriteria,
    filter: QueryFilter,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum QueryFilter {
    None,
    Promo,
    Name(String),
}

impl QueryKey {
    /// Derives the key for the given criteria.
    ///
    /// The promo flag wins over the text filter; only one suffix ever
    /// appears.
    #[must_use]
    pub fn derive(order: OrderCriteria, filter: &FilterCriteria) -> Self {
        let filter = if filter.promo_only {
            QueryFilter::Promo
        } else if filter.text.is_empty() {
            QueryFilter::None
        } else {
            QueryFilter::Name(filter.text.clone())
        };
        Self { order, filter }
    }

    /// The key as raw, unencoded path segments in request order.
    #[must_use]
    pub fn segments(&self) -> Vec<String> {
        let mut segments = vec![self.order.to_string()];
        match &self.filter {
            QueryFilter::None => {}
            QueryFilter::Promo => segments.push("promo".to_owned()),
            QueryFilter::Name(text) => segments.push(format!("name={text}")),
        }
        segments
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments().join("/"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn key_for(order: OrderCriteria, text: &str, promo_only: bool) -> String {
        QueryKey::derive(
            order,
            &FilterCriteria {
                text: text.to_owned(),
                promo_only,
            },
        )
        .to_string()
    }

    #[test]
    fn test_default_key_is_name_ascending() {
        assert_eq!(key_for(OrderCriteria::default(), "", false), "name_asc");
    }

    #[test]
    fn test_toggle_same_field_flips_direction() {
        let mut order = OrderCriteria::default();
        order.toggle(SortField::Name);
        assert_eq!(order.to_string(), "name_desc");
        order.toggle(SortField::Name);
        assert_eq!(order.to_string(), "name_asc");
    }

    #[test]
    fn test_toggle_twice_returns_to_start() {
        // Two toggles of the active field are an identity, whatever the
        // starting direction.
        for direction in [SortDirection::Ascending, SortDirection::Descending] {
            let start = OrderCriteria {
                field: SortField::Price,
                direction,
            };
            let mut order = start;
            order.toggle(SortField::Price);
            order.toggle(SortField::Price);
            assert_eq!(order, start);
        }
    }

    #[test]
    fn test_toggle_other_field_resets_ascending() {
        let mut order = OrderCriteria {
            field: SortField::Name,
            direction: SortDirection::Descending,
        };
        order.toggle(SortField::Price);
        assert_eq!(
            order,
            OrderCriteria {
                field: SortField::Price,
                direction: SortDirection::Ascending,
            }
        );
    }

    #[test]
    fn test_text_filter_suffix() {
        assert_eq!(
            key_for(OrderCriteria::default(), "caneca", false),
            "name_asc/name=caneca"
        );
    }

    #[test]
    fn test_empty_text_has_no_suffix() {
        let order = OrderCriteria {
            field: SortField::Price,
            direction: SortDirection::Descending,
        };
        assert_eq!(key_for(order, "", false), "price_desc");
    }

    #[test]
    fn test_promo_wins_over_text() {
        assert_eq!(
            key_for(OrderCriteria::default(), "caneca", true),
            "name_asc/promo"
        );
    }

    #[test]
    fn test_clearing_promo_restores_text_suffix() {
        let filter = FilterCriteria {
            text: "caneca".to_owned(),
            promo_only: true,
        };
        let promo_key = QueryKey::derive(OrderCriteria::default(), &filter);
        assert_eq!(promo_key.to_string(), "name_asc/promo");

        let restored = FilterCriteria {
            promo_only: false,
            ..filter
        };
        let text_key = QueryKey::derive(OrderCriteria::default(), &restored);
        assert_eq!(text_key.to_string(), "name_asc/name=caneca");
    }

    #[test]
    fn test_key_depends_only_on_current_state() {
        // Two different mutation paths that land on the same criteria must
        // derive the same key.
        let mut a = OrderCriteria::default();
        a.toggle(SortField::Name);
        a.toggle(SortField::Price);

        let mut b = OrderCriteria::default();
        b.toggle(SortField::Price);

        assert_eq!(a, b);
        assert_eq!(key_for(a, "x", false), key_for(b, "x", false));
    }

    #[test]
    fn test_segments_split_key_and_suffix() {
        let key = QueryKey::derive(
            OrderCriteria::default(),
            &FilterCriteria {
                text: "caneca azul".to_owned(),
                promo_only: false,
            },
        );
        assert_eq!(
            key.segments(),
            vec!["name_asc".to_owned(), "name=caneca azul".to_owned()]
        );
    }

    #[test]
    fn test_sort_direction_serde_uses_short_names() {
        assert_eq!(
            serde_json::to_string(&SortDirection::Ascending).unwrap(),
            "\"asc\""
        );
        assert_eq!(
            serde_json::to_string(&SortDirection::Descending).unwrap(),
            "\"desc\""
        );
    }
}
