use serde::Deserialize;
use serde_json::Value;

/// Most suggestions kept from a single search response.
pub const MAX_SUGGESTIONS: usize = 10;

/// A candidate city returned by a search, not yet committed to a draft.
#[derive(Debug, Clone, PartialEq)]
pub struct CitySuggestion {
    pub name: String,
    pub country: Option<String>,
    /// The element exactly as the service returned it.
    pub raw: Value,
}

impl CitySuggestion {
    /// Builds a suggestion from one search result element.
    ///
    /// Accepts an object with a `name` or a bare string. Returns `None` when
    /// the element carries no usable name.
    pub fn from_value(raw: Value) -> Option<Self> {
        let (name, country) = match &raw {
            Value::String(s) => (s.trim().to_string(), None),
            Value::Object(map) => {
                let name = map.get("name").and_then(Value::as_str)?.trim().to_string();
                let country = map
                    .get("country")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string);
                (name, country)
            }
            _ => return None,
        };
        if name.is_empty() {
            return None;
        }
        Some(Self { name, country, raw })
    }

    /// Dropdown text, e.g. `Paris, France`.
    pub fn display(&self) -> String {
        match &self.country {
            Some(country) => format!("{}, {country}", self.name),
            None => self.name.clone(),
        }
    }
}

/// The two response shapes the city search endpoint is known to return.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CitySearchResponse {
    /// A bare JSON array of cities.
    Flat(Vec<Value>),
    /// An object wrapping the cities in a `data` array.
    Enveloped { data: Vec<Value> },
}

impl CitySearchResponse {
    /// Normalizes either shape into at most [`MAX_SUGGESTIONS`] suggestions,
    /// preserving the service's order and duplicates.
    pub fn into_suggestions(self) -> Vec<CitySuggestion> {
        let (Self::Flat(items) | Self::Enveloped { data: items }) = self;
        items
            .into_iter()
            .filter_map(CitySuggestion::from_value)
            .take(MAX_SUGGESTIONS)
            .collect()
    }
}

/// Parses a city search response body of either shape.
pub fn parse_city_search(body: Value) -> Result<Vec<CitySuggestion>, serde_json::Error> {
    serde_json::from_value::<CitySearchResponse>(body).map(CitySearchResponse::into_suggestions)
}

/// Body of the per-city default image lookup.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityImage {
    #[serde(default)]
    pub image_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn names(suggestions: &[CitySuggestion]) -> Vec<&str> {
        suggestions.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn flat_array() {
        let parsed = parse_city_search(json!([
            {"id": 1, "name": "Paris", "country": "France"},
            {"id": 2, "name": "Parma", "country": "Italy"}
        ]))
        .unwrap();
        assert_eq!(names(&parsed), vec!["Paris", "Parma"]);
        assert_eq!(parsed[0].country.as_deref(), Some("France"));
        assert_eq!(parsed[0].raw["id"], json!(1));
    }

    #[test]
    fn enveloped_array() {
        let parsed = parse_city_search(json!({"data": [{"name": "Cairo"}]})).unwrap();
        assert_eq!(names(&parsed), vec!["Cairo"]);
        assert_eq!(parsed[0].country, None);
    }

    #[test]
    fn tags_the_shape() {
        let flat: CitySearchResponse = serde_json::from_value(json!([])).unwrap();
        let env: CitySearchResponse = serde_json::from_value(json!({"data": []})).unwrap();
        assert_eq!(flat, CitySearchResponse::Flat(vec![]));
        assert_eq!(env, CitySearchResponse::Enveloped { data: vec![] });
    }

    #[test]
    fn bare_strings_accepted() {
        let parsed = parse_city_search(json!(["Canada", "California"])).unwrap();
        assert_eq!(names(&parsed), vec!["Canada", "California"]);
    }

    #[test]
    fn nameless_entries_skipped() {
        let parsed =
            parse_city_search(json!([{"country": "Nowhere"}, {"name": ""}, 42, {"name": "Oslo"}]))
                .unwrap();
        assert_eq!(names(&parsed), vec!["Oslo"]);
    }

    #[test]
    fn truncates_to_ten() {
        let cities: Vec<Value> = (0..25).map(|i| json!({"name": format!("City {i}")})).collect();
        let parsed = parse_city_search(Value::Array(cities)).unwrap();
        assert_eq!(parsed.len(), MAX_SUGGESTIONS);
        assert_eq!(parsed[9].name, "City 9");
    }

    #[test]
    fn duplicates_kept() {
        let parsed = parse_city_search(json!(["Paris", "Paris"])).unwrap();
        assert_eq!(names(&parsed), vec!["Paris", "Paris"]);
    }

    #[test]
    fn unexpected_shape_is_error() {
        assert!(parse_city_search(json!({"cities": []})).is_err());
    }

    #[test]
    fn display_includes_country() {
        let s = CitySuggestion::from_value(json!({"name": "Paris", "country": "France"})).unwrap();
        assert_eq!(s.display(), "Paris, France");
    }

    #[test]
    fn city_image_body() {
        let image: CityImage =
            serde_json::from_value(json!({"imageUrl": "https://img.example/x.jpg"})).unwrap();
        assert_eq!(image.image_url.as_deref(), Some("https://img.example/x.jpg"));
    }
}
