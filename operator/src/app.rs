//! KogitoApp is the custom resource on whose behalf resources are generated.
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::definitions::ApplicationDescriptor;

/// Primary CRD describing a Kogito application.
#[derive(CustomResource, Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[kube(
    group = "app.kiegroup.org",
    version = "v1alpha1",
    kind = "KogitoApp",
    plural = "kogitoapps",
    derive = "PartialEq",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct KogitoAppSpec {
    /// Application name, used as the `app` label of every generated resource.
    pub name: String,
}

impl ApplicationDescriptor for KogitoApp {
    fn app_name(&self) -> &str {
        &self.spec.name
    }
}
