//! The `generate` command

use anyhow::{Context, Result};
use clap::Args;
use dialoguer::Confirm;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use tracing::{debug, info};
use verse_core::{OutputId, VerseError};
use verse_image_gen::document::{self, SceneMap};
use verse_image_gen::provider::ProviderStatus;
use verse_image_gen::sequence::{canonical_order, resume_from};
use verse_image_gen::theme::validate_theme_name;
use verse_image_gen::{
    force_clear, prompt, providers, regenerate_subset, run_all, ClearOutcome, GenerationClient,
    GenerationSettings, ImageQuality, ImageSize, ImageStyle, ProjectLayout, RunResult,
    SettingsOverrides, ThemeProfile, VerseConfig,
};

#[derive(Args)]
pub struct GenerateArgs {
    /// Theme name (lowercase letters, numbers, hyphens)
    #[arg(long)]
    pub theme_name: String,

    /// Visual style appended to every prompt (replaces the theme entirely)
    #[arg(long)]
    pub style: Option<String>,

    /// OpenAI API key (overrides OPENAI_API_KEY and config files)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Resume from this illustration, e.g. verse-15.png
    #[arg(long)]
    pub start_from: Option<String>,

    /// Image size: 1024x1024, 1024x1792, 1792x1024
    #[arg(long)]
    pub size: Option<String>,

    /// Image quality: standard, hd
    #[arg(long)]
    pub quality: Option<String>,

    /// Image style: natural, vivid
    #[arg(long)]
    pub style_type: Option<String>,

    /// Delete every existing illustration of the theme first (asks to confirm)
    #[arg(long)]
    pub force: bool,

    /// Comma-separated illustrations to delete and generate again
    #[arg(long)]
    pub regenerate: Option<String>,

    /// Provider to use (openai, mock)
    #[arg(long, default_value = "openai")]
    pub provider: String,

    /// Prompts document (defaults to docs/image-prompts.md)
    #[arg(long)]
    pub prompts_file: Option<PathBuf>,

    /// Attempts per illustration before giving up
    #[arg(long)]
    pub retries: Option<u32>,

    /// Print the composed prompts without generating or deleting anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Run the command; `interrupt` is set by the Ctrl-C handler, which is
/// installed before anything here runs
pub fn run(
    layout: &ProjectLayout,
    args: GenerateArgs,
    interrupt: &AtomicBool,
) -> Result<ExitCode> {
    validate_theme_name(&args.theme_name)?;
    if args.force && args.regenerate.is_some() {
        return Err(VerseError::ConflictingOptions(
            "--force and --regenerate cannot be used together".to_string(),
        )
        .into());
    }

    let overrides = SettingsOverrides {
        style_modifier: args.style.clone(),
        size: args.size.as_deref().map(str::parse::<ImageSize>).transpose()?,
        quality: args
            .quality
            .as_deref()
            .map(str::parse::<ImageQuality>)
            .transpose()?,
        style: args
            .style_type
            .as_deref()
            .map(str::parse::<ImageStyle>)
            .transpose()?,
        retry_limit: args.retries,
    };
    let start_from = args.start_from.as_deref().map(OutputId::parse).transpose()?;
    let regenerate = args
        .regenerate
        .as_deref()
        .map(parse_id_list)
        .transpose()?;

    let config = VerseConfig::load(layout.root())
        .context("Failed to load configuration")?
        .with_api_key(args.api_key.clone());

    let theme = ThemeProfile::find(&layout.themes_dir(), &args.theme_name);
    let settings = GenerationSettings::resolve(&overrides, theme.as_ref(), &config);

    let prompts_path = args
        .prompts_file
        .clone()
        .unwrap_or_else(|| layout.prompts_file());
    let scenes = document::parse_file(&prompts_path)?;
    let sequence = resume_from(canonical_order(&scenes), start_from.as_ref());

    if args.dry_run {
        print_prompts(&sequence, &scenes, &settings);
        return Ok(ExitCode::SUCCESS);
    }

    let provider = providers::create_provider(&args.provider, &config)?;
    match provider.health_check()? {
        ProviderStatus::Available => {}
        ProviderStatus::NoApiKey => {
            return Err(VerseError::MissingApiKey(format!(
                "provider '{}' has no credential",
                provider.name()
            ))
            .into())
        }
        ProviderStatus::Unavailable(reason) => {
            return Err(VerseError::Provider(reason).into());
        }
    }

    let theme_dir = layout.theme_dir(&args.theme_name);
    if args.force {
        match force_clear(&theme_dir, confirm_deletion)? {
            ClearOutcome::Aborted => {
                println!("Aborted. No images were deleted.");
                return Ok(ExitCode::SUCCESS);
            }
            ClearOutcome::Cleared { removed } => {
                println!("Deleted {} images from {}", removed, theme_dir.display());
            }
            ClearOutcome::NoDirectory | ClearOutcome::NothingToClear => {}
        }
    } else if let Some(ids) = &regenerate {
        let outcome = regenerate_subset(&theme_dir, ids)?;
        println!(
            "Regenerating {} images ({} not found, will generate)",
            outcome.deleted.len(),
            outcome.not_found.len()
        );
    }

    let client = GenerationClient::new(
        provider.as_ref(),
        &settings,
        &args.theme_name,
        &theme_dir,
    )?
    .with_interrupt(interrupt);

    println!("Theme:    {}", args.theme_name);
    println!("Provider: {}", provider.name());
    println!(
        "Params:   {} / {} / {}",
        settings.size, settings.quality, settings.style
    );
    println!("Output:   {}", theme_dir.display());
    println!("Images:   {}", sequence.len());
    println!();

    let result = run_all(&sequence, &scenes, &client);
    print_summary(&result);

    if result.is_interrupted() {
        println!();
        match &result.interrupted_at {
            Some(next) => println!(
                "Interrupted. Resume with: verse-images generate --theme-name {} --start-from {}",
                args.theme_name, next
            ),
            None => println!("Interrupted after the last image; nothing left to resume."),
        }
        return Ok(ExitCode::FAILURE);
    }

    info!(theme = %args.theme_name, "Generation complete");
    Ok(ExitCode::SUCCESS)
}

fn parse_id_list(list: &str) -> verse_core::Result<Vec<OutputId>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(OutputId::parse)
        .collect()
}

fn confirm_deletion(count: usize, dir: &Path) -> verse_core::Result<bool> {
    println!("Found {} existing images in {}", count, dir.display());
    Confirm::new()
        .with_prompt("Delete all of them and regenerate?")
        .default(false)
        .interact()
        .map_err(|e| VerseError::Config(format!("Failed to get user input: {}", e)))
}

fn print_prompts(sequence: &[OutputId], scenes: &SceneMap, settings: &GenerationSettings) {
    debug!(count = sequence.len(), "Dry run");
    for id in sequence {
        let Some(scene) = scenes.get(id) else {
            continue;
        };
        println!("=== {} ===", id);
        println!("{}", prompt::compose(scene, &settings.style_modifier));
        println!();
    }
    println!(
        "{} prompts ({} / {} / {})",
        sequence.len(),
        settings.size,
        settings.quality,
        settings.style
    );
}

fn print_summary(result: &RunResult) {
    let summary = result.summary();
    println!();
    println!("Summary: {}", summary);
    if !summary.failed_ids.is_empty() {
        println!("Failed:");
        for id in &summary.failed_ids {
            println!("  {}", id);
        }
        println!("Run the same command again to retry the failed images.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> PathBuf {
        let root =
            std::env::temp_dir().join(format!("verse_generate_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(root.join("docs")).unwrap();
        std::fs::create_dir_all(root.join(".verse")).unwrap();
        std::fs::write(
            root.join("docs").join("image-prompts.md"),
            "### Verse 1:\n**Scene Description**: first\n\n### Verse 2:\n**Scene Description**: second\n",
        )
        .unwrap();
        std::fs::write(
            root.join(".verse").join("config.toml"),
            "[generation]\npacing_secs = 0\nbackoff_secs = 0\n",
        )
        .unwrap();
        root
    }

    fn mock_args(theme_name: &str) -> GenerateArgs {
        GenerateArgs {
            theme_name: theme_name.to_string(),
            style: None,
            api_key: None,
            start_from: None,
            size: None,
            quality: None,
            style_type: None,
            force: false,
            regenerate: None,
            provider: "mock".to_string(),
            prompts_file: None,
            retries: None,
            dry_run: false,
        }
    }

    fn code_of(code: ExitCode) -> String {
        format!("{:?}", code)
    }

    #[test]
    fn test_generates_with_mock_provider() {
        let root = project();
        let layout = ProjectLayout::new(&root);
        let flag = AtomicBool::new(false);

        let code = run(&layout, mock_args("mock-theme"), &flag).unwrap();

        assert_eq!(code_of(code), code_of(ExitCode::SUCCESS));
        assert!(layout.theme_dir("mock-theme").join("verse-01.png").exists());
        assert!(layout.theme_dir("mock-theme").join("verse-02.png").exists());
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_interrupt_before_run_exits_with_failure() {
        let root = project();
        let layout = ProjectLayout::new(&root);
        let flag = AtomicBool::new(true);

        let code = run(&layout, mock_args("mock-theme"), &flag).unwrap();

        assert_eq!(code_of(code), code_of(ExitCode::FAILURE));
        assert!(!layout.theme_dir("mock-theme").join("verse-01.png").exists());
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_force_and_regenerate_conflict() {
        let root = project();
        let layout = ProjectLayout::new(&root);
        let args = GenerateArgs {
            force: true,
            regenerate: Some("verse-01.png".to_string()),
            ..mock_args("mock-theme")
        };
        let err = run(&layout, args, &AtomicBool::new(false)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<VerseError>(),
            Some(VerseError::ConflictingOptions(_))
        ));
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_parse_id_list() {
        let ids = parse_id_list("verse-05.png, verse-09.png,").unwrap();
        assert_eq!(ids, vec![OutputId::verse(5), OutputId::verse(9)]);
    }

    #[test]
    fn test_parse_id_list_rejects_paths() {
        assert!(matches!(
            parse_id_list("verse-01.png,../secret"),
            Err(VerseError::InvalidOutputId(_))
        ));
    }
}
