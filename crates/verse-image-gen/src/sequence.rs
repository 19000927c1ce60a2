//! Canonical generation order

use tracing::{info, warn};
use verse_core::OutputId;

use crate::document::SceneMap;

const OPENING_DOHAS: u32 = 2;
const SIMPLE_VERSES: u32 = 40;

/// The order in which illustrations are generated.
///
/// Chapter-verse documents are ordered by `(chapter, verse)`; only their
/// `chapter-*` ids are generated. Simple-verse documents follow the fixed
/// template: title page, opening dohas 1-2, verses 1-40, closing doha,
/// restricted to ids that have a scene description.
pub fn canonical_order(scenes: &SceneMap) -> Vec<OutputId> {
    let order = if scenes.keys().any(OutputId::is_chapter_verse) {
        chapter_verse_order(scenes)
    } else {
        simple_verse_template()
            .into_iter()
            .filter(|id| scenes.contains_key(id))
            .collect()
    };

    let unordered: Vec<&OutputId> = scenes.keys().filter(|id| !order.contains(id)).collect();
    if !unordered.is_empty() {
        warn!(
            count = unordered.len(),
            ids = ?unordered,
            "Scene descriptions outside the canonical order will not be generated"
        );
    }

    order
}

fn chapter_verse_order(scenes: &SceneMap) -> Vec<OutputId> {
    let mut keyed: Vec<((u32, u32), OutputId)> = scenes
        .keys()
        .filter_map(|id| id.chapter_verse_numbers().map(|key| (key, id.clone())))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.into_iter().map(|(_, id)| id).collect()
}

fn simple_verse_template() -> Vec<OutputId> {
    let mut ids = vec![OutputId::title_page()];
    ids.extend((1..=OPENING_DOHAS).map(OutputId::opening_doha));
    ids.extend((1..=SIMPLE_VERSES).map(OutputId::verse));
    ids.push(OutputId::closing_doha());
    ids
}

/// Drop everything before `start_from`.
///
/// An unknown `start_from` is not an error: the full sequence is returned
/// and a warning is logged.
pub fn resume_from(sequence: Vec<OutputId>, start_from: Option<&OutputId>) -> Vec<OutputId> {
    let Some(start) = start_from else {
        return sequence;
    };
    match sequence.iter().position(|id| id == start) {
        Some(index) => {
            info!(%start, skipped = index, "Resuming");
            sequence.into_iter().skip(index).collect()
        }
        None => {
            warn!(%start, "Resume point not found, starting from the beginning");
            sequence
        }
    }
}
