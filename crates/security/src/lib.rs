//! Access-control assembly.
//!
//! This crate assembles the *effective* ACL for a stream from three layers;
//! it does not enforce anything. Enforcement is explicitly a collaborator's
//! job, never this one's (see the index-read-path's non-goals).

#![warn(missing_docs)]
#![warn(clippy::all)]

use logindex_core::metadata::EntryAcl;
use serde::{Deserialize, Serialize};

/// One resolved ACL field, together with which layer it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AclSource {
    StreamMetadata,
    SystemSettings,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvenancedRoles {
    pub roles: Vec<String>,
    pub source: AclSource,
}

/// The fully assembled ACL for a stream, one field per permission, each
/// tagged with the layer it was resolved from so callers can reason about
/// provenance (e.g. for diagnostics).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveAcl {
    pub read: ProvenancedRoles,
    pub write: ProvenancedRoles,
    pub delete: ProvenancedRoles,
    pub metadata_read: ProvenancedRoles,
    pub metadata_write: ProvenancedRoles,
}

/// A full ACL layer: either the stream's own metadata ACL or a
/// system-settings/default ACL, all fields optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclLayer {
    pub read: Option<Vec<String>>,
    pub write: Option<Vec<String>>,
    pub delete: Option<Vec<String>>,
    pub metadata_read: Option<Vec<String>>,
    pub metadata_write: Option<Vec<String>>,
}

impl From<EntryAcl> for AclLayer {
    fn from(acl: EntryAcl) -> Self {
        AclLayer {
            read: acl.read_roles,
            write: acl.write_roles,
            delete: acl.delete_roles,
            metadata_read: acl.metadata_read_roles,
            metadata_write: acl.metadata_write_roles,
        }
    }
}

/// Backend-held configuration: separate default ACLs for user streams and
/// system streams, used as the system-settings layer in ACL assembly.
#[derive(Debug, Clone)]
pub struct SystemSettings {
    pub user_stream_default_acl: AclLayer,
    pub system_stream_default_acl: AclLayer,
}

impl Default for SystemSettings {
    fn default() -> Self {
        SystemSettings {
            user_stream_default_acl: AclLayer::default(),
            system_stream_default_acl: AclLayer {
                read: Some(vec!["$admins".to_string()]),
                write: Some(vec!["$admins".to_string()]),
                delete: Some(vec!["$admins".to_string()]),
                metadata_read: Some(vec!["$admins".to_string()]),
                metadata_write: Some(vec!["$admins".to_string()]),
            },
        }
    }
}

/// The hardcoded, last-resort ACL layer: world-readable, admin-writable.
pub fn default_acl() -> AclLayer {
    AclLayer {
        read: Some(vec!["$all".to_string()]),
        write: Some(vec!["$admins".to_string()]),
        delete: Some(vec!["$admins".to_string()]),
        metadata_read: Some(vec!["$all".to_string()]),
        metadata_write: Some(vec!["$admins".to_string()]),
    }
}

/// Combine the three ACL layers, first non-`None` wins per field:
/// `stream_acl` (the stream's own `$acl` metadata), then
/// `system_settings_acl` (differs for system vs user streams), then
/// `fallback_default`.
pub fn assemble_effective_acl(
    stream_acl: Option<&AclLayer>,
    system_settings_acl: &AclLayer,
    fallback_default: &AclLayer,
) -> EffectiveAcl {
    EffectiveAcl {
        read: resolve_field(stream_acl, system_settings_acl, fallback_default, |l| &l.read),
        write: resolve_field(stream_acl, system_settings_acl, fallback_default, |l| &l.write),
        delete: resolve_field(stream_acl, system_settings_acl, fallback_default, |l| &l.delete),
        metadata_read: resolve_field(stream_acl, system_settings_acl, fallback_default, |l| {
            &l.metadata_read
        }),
        metadata_write: resolve_field(stream_acl, system_settings_acl, fallback_default, |l| {
            &l.metadata_write
        }),
    }
}

fn resolve_field(
    stream_acl: Option<&AclLayer>,
    system_settings_acl: &AclLayer,
    fallback_default: &AclLayer,
    field: impl Fn(&AclLayer) -> &Option<Vec<String>>,
) -> ProvenancedRoles {
    if let Some(stream_acl) = stream_acl {
        if let Some(roles) = field(stream_acl) {
            return ProvenancedRoles {
                roles: roles.clone(),
                source: AclSource::StreamMetadata,
            };
        }
    }
    if let Some(roles) = field(system_settings_acl) {
        return ProvenancedRoles {
            roles: roles.clone(),
            source: AclSource::SystemSettings,
        };
    }
    ProvenancedRoles {
        roles: field(fallback_default).clone().unwrap_or_default(),
        source: AclSource::Default,
    }
}

/// Which system-settings ACL layer applies, based on whether the stream
/// being read is itself a system stream.
pub fn system_settings_layer_for<'a>(settings: &'a SystemSettings, is_system_stream: bool) -> &'a AclLayer {
    if is_system_stream {
        &settings.system_stream_default_acl
    } else {
        &settings.user_stream_default_acl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_acl_wins_when_present() {
        let stream_acl = AclLayer {
            read: Some(vec!["owner".to_string()]),
            ..AclLayer::default()
        };
        let settings = SystemSettings::default();
        let layer = system_settings_layer_for(&settings, false);
        let effective = assemble_effective_acl(Some(&stream_acl), layer, &default_acl());
        assert_eq!(effective.read.roles, vec!["owner".to_string()]);
        assert_eq!(effective.read.source, AclSource::StreamMetadata);
    }

    #[test]
    fn falls_through_to_system_settings_then_default() {
        let settings = SystemSettings::default();
        let layer = system_settings_layer_for(&settings, true);
        let effective = assemble_effective_acl(None, layer, &default_acl());
        assert_eq!(effective.read.source, AclSource::SystemSettings);
        assert_eq!(effective.read.roles, vec!["$admins".to_string()]);
    }

    #[test]
    fn user_stream_with_no_settings_falls_to_default() {
        let settings = SystemSettings::default();
        let layer = system_settings_layer_for(&settings, false);
        let effective = assemble_effective_acl(None, layer, &default_acl());
        assert_eq!(effective.read.source, AclSource::Default);
        assert_eq!(effective.read.roles, vec!["$all".to_string()]);
    }

    #[test]
    fn partial_stream_acl_falls_through_field_by_field() {
        let stream_acl = AclLayer {
            read: Some(vec!["owner".to_string()]),
            write: None,
            ..AclLayer::default()
        };
        let settings = SystemSettings::default();
        let layer = system_settings_layer_for(&settings, false);
        let effective = assemble_effective_acl(Some(&stream_acl), layer, &default_acl());
        assert_eq!(effective.read.source, AclSource::StreamMetadata);
        assert_eq!(effective.write.source, AclSource::Default);
    }
}
