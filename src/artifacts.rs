use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::metrics::ImageRole;
use crate::model::ArtifactDigest;
use crate::util::sha256_file;

pub const ORIGINAL_IMAGE_FILE: &str = "original.png";
pub const GENERATED_IMAGE_FILE: &str = "generated.png";
pub const DESCRIPTION_FILE: &str = "description.txt";

#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub run_dir: PathBuf,
    pub original_image: PathBuf,
    pub generated_image: PathBuf,
    pub description: PathBuf,
}

impl ArtifactPaths {
    pub fn resolve(storage_root: &Path, run_id: &str) -> Result<Self> {
        validate_run_id(run_id)?;
        let run_dir = storage_root.join(run_id);

        Ok(Self {
            original_image: run_dir.join(ORIGINAL_IMAGE_FILE),
            generated_image: run_dir.join(GENERATED_IMAGE_FILE),
            description: run_dir.join(DESCRIPTION_FILE),
            run_dir,
        })
    }

    pub fn image(&self, role: ImageRole) -> &Path {
        match role {
            ImageRole::Original => &self.original_image,
            ImageRole::Generated => &self.generated_image,
        }
    }

    pub fn labelled(&self) -> [(&'static str, &Path); 3] {
        [
            ("original", &self.original_image),
            ("generated", &self.generated_image),
            ("description", &self.description),
        ]
    }
}

/// The artifact triple for one run, loaded and checked up front.
#[derive(Debug, Clone)]
pub struct ArtifactSet {
    pub run_id: String,
    pub paths: ArtifactPaths,
    pub description: String,
}

impl ArtifactSet {
    pub fn load(storage_root: &Path, run_id: &str) -> Result<Self> {
        let paths = ArtifactPaths::resolve(storage_root, run_id)?;

        let description = fs::read_to_string(&paths.description).with_context(|| {
            format!(
                "failed to read description artifact: {}",
                paths.description.display()
            )
        })?;

        for role in ImageRole::ALL {
            let image = paths.image(role);
            if !image.is_file() {
                bail!(
                    "missing {} image artifact for run {}: {}",
                    role.as_str(),
                    run_id,
                    image.display()
                );
            }
        }

        Ok(Self {
            run_id: run_id.to_string(),
            paths,
            description,
        })
    }

    pub fn image(&self, role: ImageRole) -> &Path {
        self.paths.image(role)
    }

    pub fn digests(&self) -> Result<Vec<ArtifactDigest>> {
        self.paths
            .labelled()
            .into_iter()
            .map(|(role, path)| digest_artifact(role, path))
            .collect()
    }
}

pub fn digest_artifact(role: &str, path: &Path) -> Result<ArtifactDigest> {
    let metadata = fs::metadata(path)
        .with_context(|| format!("failed to stat artifact: {}", path.display()))?;

    Ok(ArtifactDigest {
        role: role.to_string(),
        path: path.display().to_string(),
        bytes: metadata.len(),
        sha256: sha256_file(path)?,
    })
}

fn validate_run_id(run_id: &str) -> Result<()> {
    let trimmed = run_id.trim();
    if trimmed.is_empty() {
        bail!("run id must not be empty");
    }
    if trimmed != run_id {
        bail!("run id must not carry surrounding whitespace: {run_id:?}");
    }
    if run_id == "." || run_id == ".." || run_id.contains(['/', '\\']) {
        bail!("run id must be a single path component: {run_id:?}");
    }
    Ok(())
}
