//! Identity of generated resources: the catalog of kinds the operator emits and the
//! ownership metadata every resource carries.
mod kind;
mod meta;

pub use kind::{
    kinds_available_on, set_group_version_kind, ClusterFlavor, DefinitionKind, GroupVersion,
    ParseKindError,
};
pub use meta::{
    add_default_labels, add_default_meta, add_default_meta_if_present, default_annotations,
    ApplicationDescriptor, DefaultMetaExt, ANNOTATION_MANAGED_BY, ANNOTATION_OPERATOR_CRD,
    MANAGED_BY, OPERATOR_CRD,
};
