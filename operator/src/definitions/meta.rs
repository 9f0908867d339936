use std::collections::BTreeMap;

use kube::{core::ObjectMeta, Resource};
use tracing::debug;

use crate::{labels::LABEL_KEY_APP_NAME, CONTROLLER_NAME};

/// Annotation naming the operator managing the resource.
pub const ANNOTATION_MANAGED_BY: &str = "org.kie.kogito/managed-by";
/// Annotation naming the custom resource kind owning the resource.
pub const ANNOTATION_OPERATOR_CRD: &str = "org.kie.kogito/operator-crd";
/// Value of [`ANNOTATION_MANAGED_BY`].
pub const MANAGED_BY: &str = CONTROLLER_NAME;
/// Value of [`ANNOTATION_OPERATOR_CRD`].
pub const OPERATOR_CRD: &str = "KogitoApp";

/// Identity of the application on whose behalf resources are generated.
pub trait ApplicationDescriptor {
    /// Logical application name, used as the `app` label.
    fn app_name(&self) -> &str;
}

impl ApplicationDescriptor for str {
    fn app_name(&self) -> &str {
        self
    }
}

/// Annotations every generated resource carries.
pub fn default_annotations() -> BTreeMap<String, String> {
    BTreeMap::from_iter([
        (ANNOTATION_MANAGED_BY.to_owned(), MANAGED_BY.to_owned()),
        (ANNOTATION_OPERATOR_CRD.to_owned(), OPERATOR_CRD.to_owned()),
    ])
}

/// Overlay the default annotations and labels on `meta`.
///
/// Entries under other keys are kept; entries under the default keys are replaced.
/// Applying it again with the same application changes nothing.
pub fn add_default_meta<A>(meta: &mut ObjectMeta, app: &A)
where
    A: ApplicationDescriptor + ?Sized,
{
    let annotations = meta.annotations.get_or_insert_with(BTreeMap::new);
    for (key, value) in default_annotations() {
        overlay(annotations, key, value);
    }
    add_default_labels(meta.labels.get_or_insert_with(BTreeMap::new), app);
}

/// Same as [`add_default_meta`], doing nothing when there is no metadata.
pub fn add_default_meta_if_present<A>(meta: Option<&mut ObjectMeta>, app: &A)
where
    A: ApplicationDescriptor + ?Sized,
{
    if let Some(meta) = meta {
        add_default_meta(meta, app);
    }
}

/// Overlay the `app` label on `labels`.
pub fn add_default_labels<A>(labels: &mut BTreeMap<String, String>, app: &A)
where
    A: ApplicationDescriptor + ?Sized,
{
    overlay(labels, LABEL_KEY_APP_NAME.to_owned(), app.app_name().to_owned());
}

fn overlay(map: &mut BTreeMap<String, String>, key: String, value: String) {
    if let Some(previous) = map.get(&key) {
        if *previous != value {
            debug!(%key, %previous, %value, "replacing reserved metadata entry");
        }
    }
    map.insert(key, value);
}

/// Applies the operator's identity to whole resources.
pub trait DefaultMetaExt: Resource + Sized {
    /// Overlay the default annotations and labels, see [`add_default_meta`].
    fn with_default_meta<A>(mut self, app: &A) -> Self
    where
        A: ApplicationDescriptor + ?Sized,
    {
        add_default_meta(self.meta_mut(), app);
        self
    }
}

impl<K: Resource> DefaultMetaExt for K {}
