use std::collections::BTreeMap;

/// Label key present on every generated resource, holding the application name.
pub const LABEL_KEY_APP_NAME: &str = "app";

/// Create labels that can be used as a unique selector for a given app name.
pub fn selector_labels(app: &str) -> Option<BTreeMap<String, String>> {
    Some(BTreeMap::from_iter(vec![(
        LABEL_KEY_APP_NAME.to_owned(),
        app.to_owned(),
    )]))
}
