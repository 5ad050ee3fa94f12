// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::common::i18n::DEFAULT_LANG;

// Idioma preferido do cliente (só a parte primária: "pt-BR" -> "pt")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(pub String);

impl Default for Locale {
    fn default() -> Self {
        Locale(DEFAULT_LANG.to_string())
    }
}

impl Locale {
    pub fn from_header(value: &str) -> Self {
        accept_language::parse(value)
            .first()
            .map(|tag| tag.split('-').next().unwrap_or(tag).to_lowercase())
            .filter(|lang| !lang.is_empty() && lang != "*")
            .map(Locale)
            .unwrap_or_default()
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let locale = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok())
            .map(Locale::from_header)
            .unwrap_or_default();

        Ok(locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_primary_subtag_of_preferred_language() {
        assert_eq!(Locale::from_header("pt-BR,pt;q=0.9,en;q=0.8").0, "pt");
        assert_eq!(Locale::from_header("en-US").0, "en");
    }

    #[test]
    fn respects_quality_ordering() {
        assert_eq!(Locale::from_header("en;q=0.5, pt;q=0.9").0, "pt");
    }

    #[test]
    fn falls_back_to_english() {
        assert_eq!(Locale::from_header("").0, "en");
        assert_eq!(Locale::from_header("*").0, "en");
    }
}
