use std::borrow::Cow;

use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DbConfig {
    url: String,
    pub name: String,
}

impl DbConfig {
    const URL_VAR: &'static str = "WORDHUNT_DB_URL";

    pub fn url(&self) -> Cow<str> {
        if let Ok(db_url) = std::env::var(Self::URL_VAR) {
            tracing::trace!(db_url, "using db url override from environment");
            return db_url.into();
        }

        (&self.url).into()
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "mongodb://localhost:27017".to_owned(),
            name: "wordhunt".to_owned(),
        }
    }
}
