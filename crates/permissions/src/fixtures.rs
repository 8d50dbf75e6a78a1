//! Shared test fixtures

use std::sync::Arc;

use crate::catalog::InMemoryCatalog;
use crate::model::{Permission, PermissionGroup, ProtectionLevel};

pub const APP: &str = "com.example.app";

pub const CAMERA: &str = "android.permission-group.CAMERA";
pub const STORAGE: &str = "android.permission-group.STORAGE";
pub const LOCATION: &str = "android.permission-group.LOCATION";
pub const PHONE: &str = "android.permission-group.PHONE";
pub const CALL_LOG: &str = "android.permission-group.CALL_LOG";
pub const CONTACTS: &str = "android.permission-group.CONTACTS";
pub const CALENDAR: &str = "android.permission-group.CALENDAR";
pub const SMS: &str = "android.permission-group.SMS";
pub const MICROPHONE: &str = "android.permission-group.MICROPHONE";
pub const NETWORK: &str = "android.permission-group.NETWORK";
pub const VENDOR: &str = "com.vendor.permission-group.TELEMETRY";

pub const READ_CALL_LOG: &str = "android.permission.READ_CALL_LOG";
pub const CALL_PHONE: &str = "android.permission.CALL_PHONE";
pub const SEND_SMS: &str = "android.permission.SEND_SMS";

fn granted(name: &str, group: &str) -> Permission {
    Permission::new(name, group).granted()
}

/// Catalog for [`APP`] covering every group shape the controller cares about
pub fn catalog() -> Arc<InMemoryCatalog> {
    let catalog = InMemoryCatalog::new();

    catalog.insert_group(
        APP,
        PermissionGroup::new(CAMERA).with_permission(granted("android.permission.CAMERA", CAMERA)),
    );

    let mut storage = PermissionGroup::new(STORAGE)
        .with_permission(granted("android.permission.READ_EXTERNAL_STORAGE", STORAGE))
        .with_permission(granted("android.permission.WRITE_EXTERNAL_STORAGE", STORAGE));
    storage.has_granted_by_default_permission = true;
    catalog.insert_group(APP, storage);

    catalog.insert_group(
        APP,
        PermissionGroup::new(LOCATION)
            .with_permission(granted("android.permission.ACCESS_FINE_LOCATION", LOCATION))
            .with_permission(granted("android.permission.ACCESS_COARSE_LOCATION", LOCATION)),
    );

    catalog.insert_group(
        APP,
        PermissionGroup::new(PHONE)
            .with_permission(granted(CALL_PHONE, PHONE))
            .with_permission(granted("android.permission.READ_PHONE_STATE", PHONE))
            .with_permission(granted(READ_CALL_LOG, CALL_LOG))
            .with_permission(
                Permission::new("android.permission.MODIFY_PHONE_STATE", PHONE)
                    .with_protection_level(ProtectionLevel::Normal),
            ),
    );

    catalog.insert_group(
        APP,
        PermissionGroup::new(CALL_LOG)
            .with_permission(granted(READ_CALL_LOG, CALL_LOG))
            .with_permission(granted("android.permission.WRITE_CALL_LOG", CALL_LOG)),
    );

    for name in [CONTACTS, CALENDAR] {
        let mut legacy = PermissionGroup::new(name)
            .with_permission(granted(&format!("{}_READ", name), name));
        legacy.supports_runtime_permissions = false;
        catalog.insert_group(APP, legacy);
    }

    let mut sms = PermissionGroup::new(SMS)
        .with_permission(granted(SEND_SMS, SMS))
        .with_permission(granted("android.permission.RECEIVE_SMS", SMS))
        .with_permission(granted("android.permission.READ_SMS", SMS))
        .with_permission(Permission::new("android.permission.RECEIVE_WAP_PUSH", SMS))
        .with_permission(Permission::new("android.permission.RECEIVE_MMS", SMS));
    sms.individually_controlled = true;
    catalog.insert_group(APP, sms);

    let mut microphone = PermissionGroup::new(MICROPHONE)
        .with_permission(granted("android.permission.RECORD_AUDIO", MICROPHONE));
    microphone.policy_fixed = true;
    microphone.enforcing_admin = Some("Example MDM".to_string());
    catalog.insert_group(APP, microphone);

    catalog.insert_group(
        APP,
        PermissionGroup::new(NETWORK).with_permission(
            Permission::new("android.permission.INTERNET", NETWORK)
                .with_protection_level(ProtectionLevel::Normal)
                .granted(),
        ),
    );

    let mut vendor = PermissionGroup::new(VENDOR)
        .with_permission(granted("com.vendor.permission.TELEMETRY", VENDOR));
    vendor.declaring_package_is_platform = false;
    catalog.insert_group(APP, vendor);

    Arc::new(catalog)
}
