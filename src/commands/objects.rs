use anyhow::Result;
use tracing::{info, warn};

use crate::artifacts::ArtifactSet;
use crate::cli::ObjectsArgs;
use crate::config::resolve_model_config;
use crate::metrics::{ImageRole, ModelRegistry};
use crate::model::{ObjectsView, RoleObjectsView};
use crate::objects::{ObjectSet, detected_labels, matched_objects, object_match_score};
use crate::util::write_json_stdout;

pub fn run(args: ObjectsArgs) -> Result<()> {
    let config = resolve_model_config(&args.models)?;
    let models = ModelRegistry::from_config(&config)?;
    let artifacts = ArtifactSet::load(&args.storage_root, &args.run_id)?;

    let view = build_view(&models, &artifacts)?;
    info!(
        run_id = %view.run_id,
        description_objects = view.description_objects.len(),
        "objects listed"
    );

    if args.json {
        return write_json_stdout(&view);
    }

    println!("Description objects: {}", view.description_objects.join(", "));
    for role in &view.roles {
        match &role.error {
            Some(error) => println!("{} objects: unavailable ({error})", role.role),
            None => println!(
                "{} objects: {} (matched: {}; score {:.2})",
                role.role,
                role.detected_objects.join(", "),
                role.matched_objects.join(", "),
                role.object_match_score
            ),
        }
    }

    Ok(())
}

pub fn build_view(models: &ModelRegistry, artifacts: &ArtifactSet) -> Result<ObjectsView> {
    let description_objects = models.text_objects.extract(&artifacts.description)?;

    let roles = ImageRole::ALL
        .into_iter()
        .map(|role| role_view(models, artifacts, role, &description_objects))
        .collect();

    Ok(ObjectsView {
        run_id: artifacts.run_id.clone(),
        description_objects: description_objects.into_iter().collect(),
        roles,
    })
}

fn role_view(
    models: &ModelRegistry,
    artifacts: &ArtifactSet,
    role: ImageRole,
    description_objects: &ObjectSet,
) -> RoleObjectsView {
    match detected_labels(models.detector.as_ref(), artifacts.image(role)) {
        Ok(detected) => RoleObjectsView {
            role: role.as_str().to_string(),
            matched_objects: matched_objects(description_objects, &detected),
            object_match_score: object_match_score(description_objects, &detected),
            detected_objects: detected.into_iter().collect(),
            error: None,
        },
        Err(err) => {
            warn!(role = role.as_str(), error = %err, "object detection failed");
            RoleObjectsView {
                role: role.as_str().to_string(),
                detected_objects: Vec::new(),
                matched_objects: Vec::new(),
                object_match_score: 0.0,
                error: Some(format!("{err:#}")),
            }
        }
    }
}
