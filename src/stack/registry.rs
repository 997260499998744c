//! Image pipeline: container registry plus the build-and-push declaration

use crate::config::StackSettings;
use crate::error::GraphError;
use crate::graph::{ResourceGraph, ResourceId};
use crate::resources::{ImageSpec, RepositorySpec, ResourceSpec};

/// Local build context the image is produced from
const BUILD_CONTEXT: &str = "./app";

/// Declare the registry and the application image. The actual build and
/// push are the external pipeline's job; the image node exposes
/// `image_uri` once pushed.
pub fn declare(
    g: &mut ResourceGraph,
    settings: &StackSettings,
) -> Result<(ResourceId, ResourceId), GraphError> {
    let repository = g.add(
        "repository",
        ResourceSpec::Repository(RepositorySpec {
            force_delete: true,
            tags: settings.tags.clone(),
        }),
        &[],
    )?;

    let repository_url = g.ref_attr(repository, "url");
    let image = g.add(
        "service-image",
        ResourceSpec::Image(ImageSpec {
            repository_url,
            context_path: BUILD_CONTEXT.to_string(),
        }),
        &[],
    )?;

    Ok((repository, image))
}
