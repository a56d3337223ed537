//! Manifest patching
//!
//! Rewrites the image reference a chart file carries. Structured patches
//! round-trip the document through `serde_yaml`; the line patch leaves
//! everything except `image:` lines byte-for-byte intact, which keeps Helm
//! template expressions working.

use serde_yaml::{Mapping, Value};
use std::path::Path;
use tracing::info;

use crate::error::{DeployError, Result};
use crate::service::{ImageTag, ManifestPatch};

/// Patches the manifest at `path` in place
///
/// # Arguments
/// * `repository` - image without tag (e.g. `localhost:31500/user-service`)
/// * `tag` - the new tag
pub fn apply(path: &Path, patch: ManifestPatch, repository: &str, tag: &ImageTag) -> Result<()> {
    let manifest_error = |reason: String| DeployError::Manifest {
        path: path.display().to_string(),
        reason,
    };

    let text = std::fs::read_to_string(path)
        .map_err(|e| manifest_error(format!("cannot read: {}", e)))?;
    let image = format!("{}:{}", repository, tag);

    let updated = match patch {
        ManifestPatch::ContainerImage { container } => {
            let (updated, previous) =
                set_container_image(&text, container, &image).map_err(manifest_error)?;
            info!(
                "Image of container {} changed from {} to {}",
                container,
                previous.as_deref().unwrap_or("<none>"),
                image
            );
            updated
        }
        ManifestPatch::ImageLines => {
            let (updated, count) = replace_image_lines(&text, &image);
            if count == 0 {
                return Err(manifest_error("no image: line found".to_string()));
            }
            info!("Rewrote {} image line(s) to {}", count, image);
            updated
        }
        ManifestPatch::HelmValues { section } => {
            let updated =
                set_values_image(&text, section, repository, tag.as_str()).map_err(manifest_error)?;
            info!("Set {}.image to {}", section, image);
            updated
        }
    };

    std::fs::write(path, updated).map_err(|e| manifest_error(format!("cannot write: {}", e)))?;
    Ok(())
}

/// Sets the image of one container in a Deployment document
///
/// Returns the new document and the image it replaced.
pub fn set_container_image(
    text: &str,
    container: &str,
    image: &str,
) -> std::result::Result<(String, Option<String>), String> {
    let mut doc: Value = serde_yaml::from_str(text).map_err(|e| e.to_string())?;

    let containers = doc
        .get_mut("spec")
        .and_then(|v| v.get_mut("template"))
        .and_then(|v| v.get_mut("spec"))
        .and_then(|v| v.get_mut("containers"))
        .and_then(Value::as_sequence_mut)
        .ok_or_else(|| "spec.template.spec.containers not found".to_string())?;

    let entry = containers
        .iter_mut()
        .find(|c| c.get("name").and_then(Value::as_str) == Some(container))
        .and_then(Value::as_mapping_mut)
        .ok_or_else(|| format!("container '{}' not found", container))?;

    let previous = entry
        .insert(Value::from("image"), Value::from(image))
        .and_then(|v| v.as_str().map(str::to_string));

    let out = serde_yaml::to_string(&doc).map_err(|e| e.to_string())?;
    Ok((out, previous))
}

/// Replaces the value of every `image:` line, keeping its indentation
///
/// Returns the new text and how many lines changed.
pub fn replace_image_lines(text: &str, image: &str) -> (String, usize) {
    let mut count = 0;
    let mut out: Vec<String> = text
        .lines()
        .map(|line| {
            let trimmed = line.trim_start();
            if trimmed.starts_with("image:") {
                count += 1;
                let indent = &line[..line.len() - trimmed.len()];
                format!("{}image: {}", indent, image)
            } else {
                line.to_string()
            }
        })
        .collect();
    out.push(String::new());
    (out.join("\n"), count)
}

/// Points `<section>.image` of a values document at `repository:tag`
///
/// Also marks the section enabled and keeps an existing `pullPolicy`.
pub fn set_values_image(
    text: &str,
    section: &str,
    repository: &str,
    tag: &str,
) -> std::result::Result<String, String> {
    let mut doc: Value = serde_yaml::from_str(text).map_err(|e| e.to_string())?;
    if doc.is_null() {
        doc = Value::Mapping(Mapping::new());
    }

    let root = doc
        .as_mapping_mut()
        .ok_or_else(|| "values document is not a mapping".to_string())?;
    let section = child_mapping(root, section)?;
    section.insert(Value::from("enabled"), Value::from(true));

    let image = child_mapping(section, "image")?;
    image.insert(Value::from("repository"), Value::from(repository));
    image.insert(Value::from("tag"), Value::from(tag));
    if !image.contains_key("pullPolicy") {
        image.insert(Value::from("pullPolicy"), Value::from("IfNotPresent"));
    }

    serde_yaml::to_string(&doc).map_err(|e| e.to_string())
}

/// Gets a nested mapping, creating it when missing or null
fn child_mapping<'a>(
    parent: &'a mut Mapping,
    key: &str,
) -> std::result::Result<&'a mut Mapping, String> {
    let slot = parent
        .entry(Value::from(key))
        .or_insert_with(|| Value::Mapping(Mapping::new()));
    if slot.is_null() {
        *slot = Value::Mapping(Mapping::new());
    }
    slot.as_mapping_mut()
        .ok_or_else(|| format!("'{}' is not a mapping", key))
}
