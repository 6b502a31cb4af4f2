//! The pipeline stages behind the CLI subcommands.
//!
//! Every stage follows the same discipline: it always produces a
//! well-formed output message, even when its input is unusable, so the
//! next stage never reads garbage from a stage that started.

pub mod aggregate;
pub mod image;
pub mod music;
pub mod parse;
pub mod video;

use storyreel_provider::KlingTaskKind;

/// Model for a Kling stage: explicit override, then `KLING_MODEL_NAME`,
/// then the task kind's default.
pub(crate) fn resolve_model(kind: KlingTaskKind, override_name: Option<&str>) -> String {
    override_name
        .map(str::to_string)
        .or_else(|| {
            std::env::var("KLING_MODEL_NAME")
                .ok()
                .filter(|s| !s.is_empty())
        })
        .unwrap_or_else(|| kind.default_model().to_string())
}
