//! Core models to wire bodies.

use tissea_api_types::*;
use tissea_network::{Category, Line, LineDetail, LineSummary, NetworkStats, OrderedStop, Stop};

pub fn stop(stop: &Stop) -> StopResponse {
    StopResponse {
        id: stop.id.get(),
        name: stop.name.to_string(),
        latitude: stop.latitude(),
        longitude: stop.longitude(),
    }
}

pub fn line_stop(ordered: &OrderedStop) -> LineStopResponse {
    LineStopResponse {
        id: ordered.stop.id.get(),
        name: ordered.stop.name.to_string(),
        latitude: ordered.stop.latitude(),
        longitude: ordered.stop.longitude(),
        order: ordered.order,
    }
}

pub fn line(line: &Line, category: &str) -> LineResponse {
    LineResponse {
        id: line.id.get(),
        category_id: line.category_id.get(),
        category: category.to_string(),
        name: line.name.to_string(),
        number: line.number.to_string(),
        color: line.color.as_deref().map(str::to_string),
        start_time: line.start_time,
        end_time: line.end_time,
        line_type: line.line_type.as_deref().map(str::to_string),
        description: line.description.as_deref().map(str::to_string),
    }
}

pub fn line_summary(summary: &LineSummary) -> LineSummaryResponse {
    LineSummaryResponse {
        line: line(&summary.line, &summary.category),
        stops_count: summary.stops_count,
    }
}

pub fn line_detail(detail: &LineDetail) -> LineDetailResponse {
    LineDetailResponse {
        line: line(&detail.line, &detail.category),
        stops: detail.stops.iter().map(line_stop).collect(),
    }
}

pub fn category_lines(category: &Category, lines: &[Line]) -> CategoryLinesResponse {
    CategoryLinesResponse {
        category: CategoryResponse {
            id: category.id.get(),
            name: category.name.to_string(),
        },
        lines: lines.iter().map(|l| line(l, &category.name)).collect(),
    }
}

pub fn stats(stats: NetworkStats) -> StatsResponse {
    StatsResponse {
        categories: stats.categories,
        lines: stats.lines,
        stops: stats.stops,
        relations: stats.relations,
    }
}
