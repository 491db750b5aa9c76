//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Later sources override earlier ones key by key; `sources` is a list and is replaced
/// wholesale by the highest layer that defines it.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("generation.batch_size", 30)?
        .set_default("generation.max_target", 1000)?
        .set_default("generation.default_country", "Brasil")?
        .set_default("storage.store_path", ".leadgen/store")?
        .set_default("storage.journal_path", ".leadgen/journal")?
        .set_default("storage.export_dir", ".leadgen/exports")
}
