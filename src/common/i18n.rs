// src/common/i18n.rs

use std::{collections::HashMap, sync::OnceLock};

pub const DEFAULT_LANG: &str = "en";

// Catálogos embutidos no binário (um JSON por idioma, chave = código do erro)
const CATALOGS: &[(&str, &str)] = &[
    ("en", include_str!("../../locales/en.json")),
    ("pt", include_str!("../../locales/pt.json")),
];

#[derive(Debug, Clone, Default)]
pub struct I18nStore {
    messages: HashMap<String, HashMap<String, String>>,
}

impl I18nStore {
    pub fn load() -> anyhow::Result<Self> {
        let mut messages = HashMap::new();
        for (lang, raw) in CATALOGS {
            let catalog: HashMap<String, String> = serde_json::from_str(raw)
                .map_err(|e| anyhow::anyhow!("Catálogo de mensagens '{}' inválido: {}", lang, e))?;
            messages.insert(lang.to_string(), catalog);
        }
        Ok(Self { messages })
    }

    /// Instância compartilhada para quem não recebe o store pelo AppState.
    pub fn builtin() -> &'static I18nStore {
        static STORE: OnceLock<I18nStore> = OnceLock::new();
        STORE.get_or_init(|| Self::load().unwrap_or_default())
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.messages.keys().map(String::as_str)
    }

    /// Procura a mensagem no idioma pedido, cai para o inglês e, por fim, devolve None.
    pub fn translate(&self, lang: &str, key: &str, params: &[(&str, String)]) -> Option<String> {
        let template = self
            .messages
            .get(lang)
            .and_then(|catalog| catalog.get(key))
            .or_else(|| self.messages.get(DEFAULT_LANG).and_then(|c| c.get(key)))?;

        let mut message = template.clone();
        for (name, value) in params {
            message = message.replace(&format!("{{{}}}", name), value);
        }
        Some(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogs_share_the_same_keys() {
        let store = I18nStore::load().unwrap();
        let en = &store.messages["en"];
        for lang in store.languages() {
            let catalog = &store.messages[lang];
            for key in en.keys() {
                assert!(catalog.contains_key(key), "'{lang}' is missing '{key}'");
            }
        }
    }

    #[test]
    fn interpolates_params() {
        let store = I18nStore::load().unwrap();
        let msg = store
            .translate("en", "ISBN_ALREADY_EXISTS", &[("isbn", "978-0".to_string())])
            .unwrap();
        assert_eq!(msg, "A book with ISBN '978-0' already exists.");
    }

    #[test]
    fn unknown_key_is_none() {
        assert!(I18nStore::builtin().translate("pt", "NOPE", &[]).is_none());
    }
}
