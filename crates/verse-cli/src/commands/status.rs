//! The `status` command

use anyhow::Result;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::warn;
use verse_image_gen::manifest::MANIFEST_FILE;
use verse_image_gen::run::inspect;
use verse_image_gen::sequence::canonical_order;
use verse_image_gen::theme::validate_theme_name;
use verse_image_gen::{document, ProjectLayout, ThemeManifest, ThemeProfile};

pub fn run(
    layout: &ProjectLayout,
    theme_name: &str,
    prompts_file: Option<PathBuf>,
) -> Result<ExitCode> {
    validate_theme_name(theme_name)?;

    let prompts_path = prompts_file.unwrap_or_else(|| layout.prompts_file());
    let scenes = document::parse_file(&prompts_path)?;
    let sequence = canonical_order(&scenes);

    let theme_dir = layout.theme_dir(theme_name);
    let manifest = match ThemeManifest::load_or_new(&theme_dir.join(MANIFEST_FILE), theme_name) {
        Ok(manifest) => manifest,
        Err(e) => {
            warn!(error = %e, "Ignoring unreadable manifest");
            ThemeManifest::new(theme_name)
        }
    };

    println!("Theme:  {}", theme_name);
    match ThemeProfile::find(&layout.themes_dir(), theme_name) {
        Some(profile) => println!(
            "Style:  {}",
            profile.style_modifier.as_deref().unwrap_or("(none)")
        ),
        None => println!("Style:  (no theme file, defaults apply)"),
    }
    println!("Output: {}", theme_dir.display());
    println!();

    let status = inspect(&theme_dir, &sequence);
    for (id, present) in &status {
        let detail = manifest
            .get(id)
            .filter(|_| *present)
            .map(|e| format!("  {} ({} attempt(s))", e.generated_at, e.attempts))
            .unwrap_or_default();
        let mark = if *present { "done   " } else { "missing" };
        println!("  {} {}{}", mark, id, detail);
    }

    let done = status.iter().filter(|(_, present)| *present).count();
    println!();
    println!("{}/{} images present", done, status.len());

    Ok(ExitCode::SUCCESS)
}
