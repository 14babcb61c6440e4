//! Per-family upload field sets
//!
//! Each artifact family sends a different set of text parts alongside
//! the file. Builders here enforce the required fields after resolution
//! has run, producing a field-named error for anything still missing.

use crate::locate::dart::DartPlatform;

use super::{AppFields, MetadataError, UploadMetadata};

/// Fields for a native-library (NDK) upload.
pub fn android_ndk_fields(
    app: &AppFields,
    project_root: Option<&str>,
    shared_object_name: &str,
    overwrite: bool,
) -> Result<UploadMetadata, MetadataError> {
    let mut fields = UploadMetadata::new();

    fields.set(
        "apiKey",
        app.api_key.as_deref().ok_or(MetadataError::MissingApiKey)?,
    );
    fields.set(
        "appId",
        app.application_id
            .as_deref()
            .ok_or(MetadataError::MissingApplicationId)?,
    );
    fields.set(
        "versionCode",
        app.version_code
            .as_deref()
            .ok_or(MetadataError::MissingVersionCode)?,
    );
    fields.set(
        "versionName",
        app.version_name
            .as_deref()
            .ok_or(MetadataError::MissingVersionName)?,
    );

    if let Some(root) = project_root {
        fields.set("projectRoot", root);
    }
    if !shared_object_name.is_empty() {
        fields.set("sharedObjectName", shared_object_name);
    }
    fields.set_overwrite(overwrite);

    Ok(fields)
}

/// Fields for a dSYM upload. Only the api key is required; the UUID
/// travels as the deduplication token on the request itself.
pub fn dsym_fields(
    api_key: Option<&str>,
    project_root: Option<&str>,
    overwrite: bool,
) -> Result<UploadMetadata, MetadataError> {
    let mut fields = UploadMetadata::new();

    fields.set("apiKey", api_key.ok_or(MetadataError::MissingApiKey)?);
    if let Some(root) = project_root {
        fields.set("projectRoot", root);
    }
    fields.set_overwrite(overwrite);

    Ok(fields)
}

/// Fields for a Dart symbol-file upload. The version pair differs by
/// platform: Android sends a version code, iOS a bundle version.
pub fn dart_fields(
    api_key: Option<&str>,
    build_id: &str,
    platform: DartPlatform,
    app_version: Option<&str>,
    extra_version: Option<&str>,
    overwrite: bool,
) -> Result<UploadMetadata, MetadataError> {
    let mut fields = UploadMetadata::new();

    fields.set("apiKey", api_key.ok_or(MetadataError::MissingApiKey)?);
    fields.set("buildId", build_id);
    fields.set("platform", platform.as_str());
    fields.set_overwrite(overwrite);

    if let Some(version) = app_version {
        fields.set("appVersion", version);
    }
    if let Some(extra) = extra_version {
        match platform {
            DartPlatform::Android => fields.set("appVersionCode", extra),
            DartPlatform::Ios => fields.set("appBundleVersion", extra),
        }
    }

    Ok(fields)
}
