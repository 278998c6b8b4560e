use anyhow::{Context, Result};
use tissea_network::{NetworkService, NetworkStore, NewLine, NewStop};

use crate::manifest::{LineManifest, NetworkManifest};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportStats {
    pub categories: usize,
    pub lines: usize,
    pub skipped_lines: usize,
    pub stops_attached: usize,
}

impl ImportStats {
    pub fn log_summary(&self) {
        log::info!("=== Import Summary ===");
        log::info!("Categories: {}", self.categories);
        log::info!("Lines created: {}", self.lines);
        log::info!("Lines skipped (already present): {}", self.skipped_lines);
        log::info!("Stops attached: {}", self.stops_attached);
    }
}

/// Create every category and line of `manifest`, attaching stops in file order.
///
/// A line whose number already exists in its category is left alone, so the
/// same file can be imported twice.
pub fn import_network<S: NetworkStore>(
    service: &NetworkService<S>,
    manifest: &NetworkManifest,
) -> Result<ImportStats> {
    let mut stats = ImportStats::default();

    for category_entry in &manifest.categories {
        let category = service
            .create_category(&category_entry.name)
            .with_context(|| format!("Failed to create category {:?}", category_entry.name))?;
        stats.categories += 1;
        log::info!("Category {} (id {})", category.name, category.id);

        let (_, existing) = service.category_lines(category.id)?;

        for line_entry in &category_entry.lines {
            if existing.iter().any(|l| l.number.as_ref() == line_entry.number) {
                log::warn!("  Line {} already present, skipping", line_entry.number);
                stats.skipped_lines += 1;
                continue;
            }

            let new_line = new_line(category.id, line_entry);
            let line = service
                .create_line(&new_line)
                .with_context(|| format!("Failed to create line {}", line_entry.number))?;
            stats.lines += 1;

            for stop in &line_entry.stops {
                service
                    .attach_stop(line.id, &NewStop::new(stop.name.as_str(), stop.latitude, stop.longitude))
                    .with_context(|| {
                        format!("Failed to attach {:?} to line {}", stop.name, line_entry.number)
                    })?;
                stats.stops_attached += 1;
            }
            log::info!(
                "  Line {} (id {}): {} stops",
                line_entry.number,
                line.id,
                line_entry.stops.len()
            );
        }
    }

    Ok(stats)
}

fn new_line(category_id: tissea_network::CategoryId, entry: &LineManifest) -> NewLine {
    NewLine {
        color: entry.color.clone(),
        start_time: entry.start_time,
        end_time: entry.end_time,
        line_type: entry.line_type.clone(),
        description: entry.description.clone(),
        ..NewLine::new(category_id, entry.name.as_str(), entry.number.as_str())
    }
}
