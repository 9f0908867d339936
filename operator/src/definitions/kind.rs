use std::{fmt, str::FromStr};

use kube::core::{ApiResource, DynamicObject, GroupVersionKind, TypeMeta};

/// API group and version a kind is served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupVersion {
    /// API group, empty for the core group.
    pub group: &'static str,
    /// API version.
    pub version: &'static str,
}

impl GroupVersion {
    const fn new(group: &'static str, version: &'static str) -> Self {
        Self { group, version }
    }

    /// Value of the `apiVersion` field: `group/version`, or `version` for the core group.
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.to_owned()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

const CORE_V1: GroupVersion = GroupVersion::new("", "v1");
const RBAC_V1: GroupVersion = GroupVersion::new("rbac.authorization.k8s.io", "v1");
const OPENSHIFT_APPS_V1: GroupVersion = GroupVersion::new("apps.openshift.io", "v1");
const OPENSHIFT_BUILD_V1: GroupVersion = GroupVersion::new("build.openshift.io", "v1");
const OPENSHIFT_IMAGE_V1: GroupVersion = GroupVersion::new("image.openshift.io", "v1");
const OPENSHIFT_ROUTE_V1: GroupVersion = GroupVersion::new("route.openshift.io", "v1");

/// Flavor of the cluster resources are created on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterFlavor {
    /// Plain Kubernetes, without the OpenShift extension APIs.
    Kubernetes,
    /// OpenShift, serving both Kubernetes and OpenShift APIs.
    OpenShift,
}

/// Every kind of resource the operator emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionKind {
    /// Core Service.
    Service,
    /// OpenShift BuildConfig.
    BuildConfig,
    /// OpenShift DeploymentConfig.
    DeploymentConfig,
    /// RBAC RoleBinding.
    RoleBinding,
    /// Core ServiceAccount.
    ServiceAccount,
    /// OpenShift Route.
    Route,
    /// OpenShift ImageStreamTag.
    ImageStreamTag,
    /// OpenShift BuildRequest.
    BuildRequest,
}

impl DefinitionKind {
    /// The complete catalog.
    pub const ALL: [DefinitionKind; 8] = [
        DefinitionKind::Service,
        DefinitionKind::BuildConfig,
        DefinitionKind::DeploymentConfig,
        DefinitionKind::RoleBinding,
        DefinitionKind::ServiceAccount,
        DefinitionKind::Route,
        DefinitionKind::ImageStreamTag,
        DefinitionKind::BuildRequest,
    ];

    /// Kind name as written in the `kind` field.
    pub const fn name(self) -> &'static str {
        match self {
            DefinitionKind::Service => "Service",
            DefinitionKind::BuildConfig => "BuildConfig",
            DefinitionKind::DeploymentConfig => "DeploymentConfig",
            DefinitionKind::RoleBinding => "RoleBinding",
            DefinitionKind::ServiceAccount => "ServiceAccount",
            DefinitionKind::Route => "Route",
            DefinitionKind::ImageStreamTag => "ImageStreamTag",
            DefinitionKind::BuildRequest => "BuildRequest",
        }
    }

    /// API the kind is served from.
    pub const fn group_version(self) -> GroupVersion {
        match self {
            DefinitionKind::Service | DefinitionKind::ServiceAccount => CORE_V1,
            DefinitionKind::RoleBinding => RBAC_V1,
            DefinitionKind::DeploymentConfig => OPENSHIFT_APPS_V1,
            DefinitionKind::BuildConfig | DefinitionKind::BuildRequest => OPENSHIFT_BUILD_V1,
            DefinitionKind::ImageStreamTag => OPENSHIFT_IMAGE_V1,
            DefinitionKind::Route => OPENSHIFT_ROUTE_V1,
        }
    }

    /// Reports whether the kind only exists on OpenShift clusters.
    ///
    /// Creating such a resource on plain Kubernetes is expected to fail.
    pub const fn is_openshift_only(self) -> bool {
        match self {
            DefinitionKind::Service
            | DefinitionKind::ServiceAccount
            | DefinitionKind::RoleBinding => false,
            DefinitionKind::BuildConfig
            | DefinitionKind::DeploymentConfig
            | DefinitionKind::Route
            | DefinitionKind::ImageStreamTag
            | DefinitionKind::BuildRequest => true,
        }
    }

    /// Reports whether resources of this kind can be created on `flavor`.
    pub fn is_available_on(self, flavor: ClusterFlavor) -> bool {
        match flavor {
            ClusterFlavor::OpenShift => true,
            ClusterFlavor::Kubernetes => !self.is_openshift_only(),
        }
    }

    /// Value of the `apiVersion` field.
    pub fn api_version(self) -> String {
        self.group_version().api_version()
    }

    /// Group, version and kind for use with the dynamic API.
    pub fn gvk(self) -> GroupVersionKind {
        let gv = self.group_version();
        GroupVersionKind::gvk(gv.group, gv.version, self.name())
    }

    /// API resource for use with the dynamic API.
    pub fn api_resource(self) -> ApiResource {
        ApiResource::from_gvk(&self.gvk())
    }

    /// Type information identifying this kind.
    pub fn type_meta(self) -> TypeMeta {
        TypeMeta {
            api_version: self.api_version(),
            kind: self.name().to_owned(),
        }
    }

    /// Empty dynamic object of this kind, already stamped.
    pub fn dynamic_object(self, name: &str) -> DynamicObject {
        DynamicObject::new(name, &self.api_resource())
    }

    /// Stamp api version and kind on a dynamic object.
    pub fn stamp(self, object: &mut DynamicObject) {
        set_group_version_kind(object.types.get_or_insert_with(TypeMeta::default), self);
    }

    /// Find the kind identified by stamped type information.
    pub fn from_type_meta(type_meta: &TypeMeta) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| {
            kind.name() == type_meta.kind && kind.api_version() == type_meta.api_version
        })
    }
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a kind name is not in the catalog.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown resource kind: {0}")]
pub struct ParseKindError(String);

impl FromStr for DefinitionKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ParseKindError(s.to_owned()))
    }
}

/// Kinds that can be created on a cluster of the given flavor.
pub fn kinds_available_on(flavor: ClusterFlavor) -> impl Iterator<Item = DefinitionKind> {
    DefinitionKind::ALL
        .into_iter()
        .filter(move |kind| kind.is_available_on(flavor))
}

/// Set the api version and kind of a resource from the catalog entry of `kind`.
pub fn set_group_version_kind(type_meta: &mut TypeMeta, kind: DefinitionKind) {
    type_meta.api_version = kind.api_version();
    type_meta.kind = kind.name().to_owned();
}
